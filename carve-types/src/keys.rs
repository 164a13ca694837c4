//! Scene-wide element keys.
//!
//! Edit operations routinely span several meshes, so grabbed elements are
//! addressed by (mesh, element) pairs rather than bare ids.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{FaceId, MeshId, VertexId};

/// Key of a vertex across the whole scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexKey {
    /// Owning mesh.
    pub mesh_id: MeshId,
    /// Vertex within that mesh.
    pub vertex_id: VertexId,
}

impl VertexKey {
    /// Create a vertex key.
    #[inline]
    #[must_use]
    pub const fn new(mesh_id: MeshId, vertex_id: VertexId) -> Self {
        Self { mesh_id, vertex_id }
    }
}

/// Key of a face across the whole scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaceKey {
    /// Owning mesh.
    pub mesh_id: MeshId,
    /// Face within that mesh.
    pub face_id: FaceId,
}

impl FaceKey {
    /// Create a face key.
    #[inline]
    #[must_use]
    pub const fn new(mesh_id: MeshId, face_id: FaceId) -> Self {
        Self { mesh_id, face_id }
    }
}

/// Key of an edge across the whole scene.
///
/// An edge is the unordered pair of its endpoint vertex ids; the
/// constructor normalizes the pair so equality and hashing are symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeKey {
    /// Owning mesh.
    pub mesh_id: MeshId,
    a: VertexId,
    b: VertexId,
}

impl EdgeKey {
    /// Create an edge key; endpoint order does not matter.
    ///
    /// # Example
    ///
    /// ```
    /// use carve_types::{EdgeKey, MeshId, VertexId};
    ///
    /// let ab = EdgeKey::new(MeshId(0), VertexId(1), VertexId(2));
    /// let ba = EdgeKey::new(MeshId(0), VertexId(2), VertexId(1));
    /// assert_eq!(ab, ba);
    /// ```
    #[must_use]
    pub fn new(mesh_id: MeshId, v0: VertexId, v1: VertexId) -> Self {
        let (a, b) = if v0 <= v1 { (v0, v1) } else { (v1, v0) };
        Self { mesh_id, a, b }
    }

    /// The two endpoints, smaller id first.
    #[inline]
    #[must_use]
    pub const fn endpoints(&self) -> (VertexId, VertexId) {
        (self.a, self.b)
    }

    /// Whether `vertex` is one of the endpoints.
    #[inline]
    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.a == vertex || self.b == vertex
    }

    /// The endpoint opposite `vertex`, or `None` if `vertex` is not an
    /// endpoint.
    #[must_use]
    pub fn other(&self, vertex: VertexId) -> Option<VertexId> {
        if vertex == self.a {
            Some(self.b)
        } else if vertex == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn edge_key_is_symmetric() {
        let ab = EdgeKey::new(MeshId(3), VertexId(7), VertexId(2));
        let ba = EdgeKey::new(MeshId(3), VertexId(2), VertexId(7));
        assert_eq!(ab, ba);
        assert_eq!(hash_of(&ab), hash_of(&ba));
    }

    #[test]
    fn edge_key_distinguishes_meshes() {
        let a = EdgeKey::new(MeshId(0), VertexId(1), VertexId(2));
        let b = EdgeKey::new(MeshId(1), VertexId(1), VertexId(2));
        assert_ne!(a, b);
    }

    #[test]
    fn edge_other_endpoint() {
        let edge = EdgeKey::new(MeshId(0), VertexId(5), VertexId(9));
        assert_eq!(edge.other(VertexId(5)), Some(VertexId(9)));
        assert_eq!(edge.other(VertexId(9)), Some(VertexId(5)));
        assert_eq!(edge.other(VertexId(1)), None);
    }
}
