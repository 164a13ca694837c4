//! Render-layer handoff.
//!
//! The kernel never calls rendering APIs; it hands the render layer a
//! plain-geometry snapshot of whatever should be on screen this frame.

use hashbrown::HashMap;

use carve_types::{Mesh, Point3, VertexId};

/// RGB color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexColor {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
}

impl VertexColor {
    /// Create a new color from RGB components.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color (255, 255, 255).
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// The error-outline tint shown while an edit is invalid.
    pub const ERROR: Self = Self::new(229, 57, 53);
}

impl Default for VertexColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A plain-geometry snapshot handed to the render layer.
///
/// Positions are model-space, faces are fan-triangulated, and every
/// vertex carries one color. The snapshot owns its data; the render
/// layer never sees the live mesh.
#[derive(Debug, Clone, Default)]
pub struct PreviewMesh {
    /// Vertex positions in model space.
    pub positions: Vec<Point3<f64>>,
    /// Triangle indices into `positions`, one fan per source face.
    pub triangles: Vec<[u32; 3]>,
    /// Per-vertex color, parallel to `positions`.
    pub colors: Vec<VertexColor>,
}

impl PreviewMesh {
    /// Snapshot a mesh with a uniform vertex color.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: preview vertex counts stay far below u32::MAX
    pub fn from_mesh(mesh: &Mesh, color: VertexColor) -> Self {
        let mut positions = Vec::with_capacity(mesh.vertex_count());
        let mut colors = Vec::with_capacity(mesh.vertex_count());
        let mut index_of: HashMap<VertexId, u32> = HashMap::with_capacity(mesh.vertex_count());

        for vertex in mesh.vertices() {
            index_of.insert(vertex.id, positions.len() as u32);
            positions.push(mesh.mesh_to_model(vertex.position));
            colors.push(color);
        }

        let mut triangles = Vec::new();
        for face in mesh.faces() {
            let ids = &face.vertex_ids;
            let indices: Vec<u32> = ids
                .iter()
                .filter_map(|id| index_of.get(id).copied())
                .collect();
            if indices.len() != ids.len() {
                continue;
            }
            for i in 1..indices.len() - 1 {
                triangles.push([indices[0], indices[i], indices[i + 1]]);
            }
        }

        Self {
            positions,
            triangles,
            colors,
        }
    }

    /// Whether the snapshot has nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
