//! Element identifiers.
//!
//! Ids are plain integers wrapped for type safety. Within one mesh, vertex
//! and face ids are allocated monotonically and never reused, so a stale id
//! can never silently alias a newer element.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a mesh within the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshId(pub u32);

/// Identifier of a vertex within its owning mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexId(pub u32);

/// Identifier of a face within its owning mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaceId(pub u32);

/// Identifier of a mesh group.
///
/// Grouped meshes move and transform together. Ungrouped meshes carry
/// [`GroupId::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupId(pub u32);

impl GroupId {
    /// Sentinel for "not in any group".
    pub const NONE: Self = Self(0);

    /// Check whether this id denotes a real group.
    #[inline]
    #[must_use]
    pub const fn is_group(self) -> bool {
        self.0 != Self::NONE.0
    }
}

impl std::fmt::Display for MeshId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl std::fmt::Display for FaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_none_is_not_a_group() {
        assert!(!GroupId::NONE.is_group());
        assert!(GroupId(7).is_group());
    }

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", MeshId(3)), "mesh#3");
        assert_eq!(format!("{}", VertexId(12)), "v12");
        assert_eq!(format!("{}", FaceId(5)), "f5");
    }
}
