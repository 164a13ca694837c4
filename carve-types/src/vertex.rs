//! Mesh vertices.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::VertexId;

/// A vertex of a boundary-representation mesh.
///
/// Positions are in mesh-local space. A vertex is owned exclusively by its
/// mesh and referenced by id from that mesh's faces.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Identifier, unique within the owning mesh.
    pub id: VertexId,
    /// Position in mesh-local space.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a vertex at the given mesh-local position.
    #[inline]
    #[must_use]
    pub const fn new(id: VertexId, position: Point3<f64>) -> Self {
        Self { id, position }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use carve_types::{Vertex, VertexId};
    ///
    /// let v = Vertex::from_coords(VertexId(0), 1.0, 2.0, 3.0);
    /// assert_eq!(v.position.y, 2.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_coords(id: VertexId, x: f64, y: f64, z: f64) -> Self {
        Self::new(id, Point3::new(x, y, z))
    }
}
