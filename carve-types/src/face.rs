//! Polygonal faces.

use nalgebra::Vector3;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{FaceId, VertexId};

/// Face-level material and surface tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaceProperties {
    /// Index into the application's material palette.
    pub material_id: u32,
}

impl FaceProperties {
    /// Create properties for the given material.
    #[inline]
    #[must_use]
    pub const fn new(material_id: u32) -> Self {
        Self { material_id }
    }
}

/// Storage for a face's winding.
///
/// Most faces are triangles or quads, so four ids live inline.
pub(crate) type Winding = SmallVec<[VertexId; 4]>;

/// A polygonal face of a boundary-representation mesh.
///
/// The winding is the cyclic order of vertex ids and defines the outward
/// normal by the right-hand rule. A well-formed face has at least three
/// distinct vertex ids and no cyclically consecutive repeats; the
/// transaction layer enforces this on construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Face {
    /// Identifier, unique within the owning mesh.
    pub id: FaceId,
    /// Vertex ids in winding order.
    pub vertex_ids: SmallVec<[VertexId; 4]>,
    /// Material and surface tags.
    pub properties: FaceProperties,
    /// Cached outward unit normal, recomputed on commit.
    pub normal: Option<Vector3<f64>>,
}

impl Face {
    /// Create a face with the given winding.
    #[must_use]
    pub fn new(id: FaceId, vertex_ids: impl Into<Winding>, properties: FaceProperties) -> Self {
        Self {
            id,
            vertex_ids: vertex_ids.into(),
            properties,
            normal: None,
        }
    }

    /// Number of vertices (and therefore edges) in the winding.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_ids.len()
    }

    /// Whether the winding references the given vertex.
    #[inline]
    #[must_use]
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertex_ids.contains(&vertex)
    }

    /// Iterate the face's directed edges in winding order, including the
    /// closing edge from the last vertex back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        let n = self.vertex_ids.len();
        (0..n).map(move |i| (self.vertex_ids[i], self.vertex_ids[(i + 1) % n]))
    }

    /// Whether the winding contains the directed or reversed edge `(a, b)`.
    #[must_use]
    pub fn has_edge(&self, a: VertexId, b: VertexId) -> bool {
        self.edges().any(|(p, q)| (p == a && q == b) || (p == b && q == a))
    }

    /// Reverse the winding in place, flipping the face's orientation.
    ///
    /// The cached normal is cleared; commit recomputes it.
    pub fn reverse_winding(&mut self) {
        self.vertex_ids.reverse();
        self.normal = None;
    }

    /// The face's vertex ids as a sorted set, for identity comparisons.
    #[must_use]
    pub fn sorted_vertex_ids(&self) -> Winding {
        let mut ids = self.vertex_ids.clone();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Face {
        Face::new(
            FaceId(0),
            vec![VertexId(0), VertexId(1), VertexId(2), VertexId(3)],
            FaceProperties::default(),
        )
    }

    #[test]
    fn edges_wrap_around() {
        let face = quad();
        let edges: Vec<_> = face.edges().collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3], (VertexId(3), VertexId(0)));
    }

    #[test]
    fn has_edge_is_direction_agnostic() {
        let face = quad();
        assert!(face.has_edge(VertexId(1), VertexId(2)));
        assert!(face.has_edge(VertexId(2), VertexId(1)));
        assert!(!face.has_edge(VertexId(0), VertexId(2)));
    }

    #[test]
    fn reverse_winding_clears_normal() {
        let mut face = quad();
        face.normal = Some(Vector3::z());
        face.reverse_winding();
        assert_eq!(
            face.vertex_ids.as_slice(),
            &[VertexId(3), VertexId(2), VertexId(1), VertexId(0)]
        );
        assert!(face.normal.is_none());
    }

    #[test]
    fn sorted_ids_ignore_winding() {
        let mut face = quad();
        let before = face.sorted_vertex_ids();
        face.reverse_winding();
        assert_eq!(before, face.sorted_vertex_ids());
    }
}
