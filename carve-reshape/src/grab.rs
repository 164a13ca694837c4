//! Grab selections.

use hashbrown::{HashMap, HashSet};

use carve_model::Model;
use carve_types::{EdgeKey, FaceKey, MeshId, Vector3, VertexId, VertexKey};

use crate::error::{ReshapeError, ReshapeResult};

/// How a grabbed vertex follows the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DragRule {
    /// Free 6-DOF translate and rotate about the controller pivot.
    Free,
    /// Part of a grabbed face: under snapping, the delta is projected
    /// onto the face's model-space normal.
    FaceNormal(Vector3<f64>),
    /// The gesture's only element: under snapping, prefers the nearest
    /// existing vertex, else the grid.
    Isolated,
}

/// The set of elements one gesture grabbed.
///
/// Edges and faces imply their vertices; the reshaper only ever moves
/// vertices.
#[derive(Debug, Clone, Default)]
pub struct GrabSelection {
    vertices: HashSet<VertexKey>,
    edges: HashSet<EdgeKey>,
    faces: HashSet<FaceKey>,
}

impl GrabSelection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grab a single vertex.
    pub fn grab_vertex(&mut self, key: VertexKey) {
        self.vertices.insert(key);
    }

    /// Grab an edge (implies both endpoints).
    pub fn grab_edge(&mut self, key: EdgeKey) {
        self.edges.insert(key);
    }

    /// Grab a face (implies its whole winding).
    pub fn grab_face(&mut self, key: FaceKey) {
        self.faces.insert(key);
    }

    /// Whether nothing is grabbed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    /// Whether the gesture is exactly one directly grabbed vertex.
    #[must_use]
    pub fn is_single_vertex(&self) -> bool {
        self.vertices.len() == 1 && self.edges.is_empty() && self.faces.is_empty()
    }

    /// The single grabbed vertex, when the selection is one.
    #[must_use]
    pub fn single_vertex(&self) -> Option<VertexKey> {
        if self.is_single_vertex() {
            self.vertices.iter().next().copied()
        } else {
            None
        }
    }

    /// Resolve the selection against the model: the implied vertex set
    /// per mesh and each vertex's drag rule.
    ///
    /// Face-implied vertices get the face's model-space normal; when a
    /// vertex belongs to several grabbed faces, the lowest face id wins.
    ///
    /// # Errors
    ///
    /// [`ReshapeError::EmptySelection`] for an empty grab and
    /// [`ReshapeError::UnknownMesh`] when a key references a mesh the
    /// model does not hold. Keys referencing missing vertices or faces
    /// inside a known mesh are ignored.
    pub(crate) fn resolve(
        &self,
        model: &Model,
    ) -> ReshapeResult<HashMap<MeshId, HashMap<VertexId, DragRule>>> {
        if self.is_empty() {
            return Err(ReshapeError::EmptySelection);
        }

        let mut per_mesh: HashMap<MeshId, HashMap<VertexId, DragRule>> = HashMap::new();
        let mesh_of = |mesh_id: MeshId| -> ReshapeResult<()> {
            if model.mesh(mesh_id).is_none() {
                return Err(ReshapeError::UnknownMesh(mesh_id));
            }
            Ok(())
        };

        for key in &self.vertices {
            mesh_of(key.mesh_id)?;
            per_mesh
                .entry(key.mesh_id)
                .or_default()
                .insert(key.vertex_id, DragRule::Free);
        }
        for key in &self.edges {
            mesh_of(key.mesh_id)?;
            let (a, b) = key.endpoints();
            let rules = per_mesh.entry(key.mesh_id).or_default();
            rules.insert(a, DragRule::Free);
            rules.insert(b, DragRule::Free);
        }

        // Faces last, ordered, so their normal rule wins over Free and
        // the lowest face id wins among faces
        let mut faces: Vec<FaceKey> = self.faces.iter().copied().collect();
        faces.sort();
        faces.reverse();
        for key in faces {
            mesh_of(key.mesh_id)?;
            let Some(mesh) = model.mesh(key.mesh_id) else {
                continue;
            };
            let Some(face) = mesh.face(key.face_id) else {
                continue;
            };
            let Some(normal) = face.normal else {
                continue;
            };
            let model_normal = mesh.direction_to_model(normal);
            let rules = per_mesh.entry(key.mesh_id).or_default();
            for &v in &face.vertex_ids {
                rules.insert(v, DragRule::FaceNormal(model_normal));
            }
        }

        if self.is_single_vertex() {
            if let Some(key) = self.single_vertex() {
                if let Some(rules) = per_mesh.get_mut(&key.mesh_id) {
                    rules.insert(key.vertex_id, DragRule::Isolated);
                }
            }
        }

        Ok(per_mesh)
    }
}
