//! The boundary-representation mesh.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::face::Face;
use crate::ids::{FaceId, GroupId, MeshId, VertexId};
use crate::operation::GeometryOperation;
use crate::polygon::polygon_normal;
use crate::vertex::Vertex;

/// A solid bounded by polygonal faces.
///
/// Vertices and faces live in id-keyed tables; faces reference vertices by
/// id. A reverse index (vertex id → set of face ids) is maintained
/// incrementally and, outside an in-progress [`GeometryOperation`], exactly
/// mirrors the face table's references.
///
/// The mesh's placement in model space is an offset plus rotation; vertex
/// positions are mesh-local. Cloning is a deep copy, which is how edit
/// operations obtain a scratch mesh without disturbing the canonical state.
///
/// # Example
///
/// ```
/// use carve_types::{Mesh, MeshId, FaceProperties, Point3};
///
/// let mut mesh = Mesh::new(MeshId(0));
/// let mut op = mesh.start_operation();
/// let a = op.add_vertex_in_mesh_space(Point3::new(0.0, 0.0, 0.0));
/// let b = op.add_vertex_in_mesh_space(Point3::new(1.0, 0.0, 0.0));
/// let c = op.add_vertex_in_mesh_space(Point3::new(0.0, 1.0, 0.0));
/// let face = op.add_face(&[a.id, b.id, c.id], FaceProperties::default()).unwrap();
/// op.commit();
///
/// assert!(mesh.face(face.id).is_some());
/// assert_eq!(mesh.faces_for_vertex(a.id).count(), 1);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    id: MeshId,
    /// Placement translation, mesh-local to model space.
    pub offset: Vector3<f64>,
    /// Placement rotation, mesh-local to model space.
    pub rotation: UnitQuaternion<f64>,
    /// Group membership; [`GroupId::NONE`] when ungrouped.
    pub group_id: GroupId,
    vertices: HashMap<VertexId, Vertex>,
    faces: HashMap<FaceId, Face>,
    reverse_index: HashMap<VertexId, HashSet<FaceId>>,
    next_vertex_id: u32,
    next_face_id: u32,
    bounds: Aabb,
}

impl Mesh {
    /// Create an empty mesh with identity placement.
    #[must_use]
    pub fn new(id: MeshId) -> Self {
        Self {
            id,
            offset: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            group_id: GroupId::NONE,
            vertices: HashMap::new(),
            faces: HashMap::new(),
            reverse_index: HashMap::new(),
            next_vertex_id: 0,
            next_face_id: 0,
            bounds: Aabb::empty(),
        }
    }

    /// This mesh's scene-wide id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> MeshId {
        self.id
    }

    /// A deep copy carrying a different id.
    ///
    /// Used when an edit clones a mesh into a new scene element rather
    /// than a scratch copy.
    #[must_use]
    pub fn clone_with_id(&self, id: MeshId) -> Self {
        let mut clone = self.clone();
        clone.id = id;
        clone
    }

    /// Look up a vertex.
    #[inline]
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    /// Look up a vertex's mesh-local position.
    #[inline]
    #[must_use]
    pub fn vertex_position(&self, id: VertexId) -> Option<Point3<f64>> {
        self.vertices.get(&id).map(|v| v.position)
    }

    /// Look up a face.
    #[inline]
    #[must_use]
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(&id)
    }

    /// Iterate all vertices (unordered).
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Iterate all faces (unordered).
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.faces.values()
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no faces.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Iterate the ids of faces referencing a vertex.
    pub fn faces_for_vertex(&self, vertex: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.reverse_index
            .get(&vertex)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Ids of the faces whose winding contains the edge `(a, b)` in either
    /// direction.
    #[must_use]
    pub fn faces_for_edge(&self, a: VertexId, b: VertexId) -> Vec<FaceId> {
        let Some(a_faces) = self.reverse_index.get(&a) else {
            return Vec::new();
        };
        let Some(b_faces) = self.reverse_index.get(&b) else {
            return Vec::new();
        };
        let mut ids: Vec<FaceId> = a_faces
            .intersection(b_faces)
            .copied()
            .filter(|id| self.faces.get(id).is_some_and(|f| f.has_edge(a, b)))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Mesh-local positions of a face's winding, in order.
    ///
    /// Returns `None` for an unknown face id. Faces committed through a
    /// transaction only reference existing vertices, so the inner lookups
    /// cannot miss.
    #[must_use]
    pub fn face_positions(&self, face_id: FaceId) -> Option<Vec<Point3<f64>>> {
        let face = self.faces.get(&face_id)?;
        Some(self.winding_positions(&face.vertex_ids))
    }

    /// Mesh-local positions for a list of vertex ids; unknown ids are
    /// skipped.
    #[must_use]
    pub fn winding_positions(&self, ids: &[VertexId]) -> Vec<Point3<f64>> {
        ids.iter()
            .filter_map(|id| self.vertex_position(*id))
            .collect()
    }

    /// The mesh-local bounding box, as of the last commit.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Replace the cached bounds.
    ///
    /// Only sound when the caller derived the new box analytically, e.g.
    /// [`Aabb::scaled_about`] after a uniform-scale commit that skipped
    /// recalculation.
    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
    }

    /// The bounding box of the placed mesh in model space.
    ///
    /// Encloses the eight rotated corners of the local box, so it is
    /// conservative under rotation.
    #[must_use]
    pub fn model_bounds(&self) -> Aabb {
        if self.bounds.is_empty() {
            return Aabb::empty();
        }
        let (min, max) = (self.bounds.min, self.bounds.max);
        let corners = [
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(min.x, max.y, max.z),
            Point3::new(max.x, max.y, max.z),
        ];
        let transformed: Vec<Point3<f64>> =
            corners.iter().map(|c| self.mesh_to_model(*c)).collect();
        Aabb::from_points(transformed.iter())
    }

    /// Convert a mesh-local point to model space.
    #[inline]
    #[must_use]
    pub fn mesh_to_model(&self, point: Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.offset
    }

    /// Convert a model-space point to mesh-local space.
    #[inline]
    #[must_use]
    pub fn model_to_mesh(&self, point: Point3<f64>) -> Point3<f64> {
        self.rotation.inverse() * (point - self.offset)
    }

    /// Convert a mesh-local direction to model space (rotation only).
    #[inline]
    #[must_use]
    pub fn direction_to_model(&self, direction: Vector3<f64>) -> Vector3<f64> {
        self.rotation * direction
    }

    /// Open a mutation transaction.
    ///
    /// The transaction borrows the mesh mutably, so the borrow checker
    /// enforces that at most one is open at a time and that no other
    /// component observes the mesh mid-mutation.
    pub fn start_operation(&mut self) -> GeometryOperation<'_> {
        GeometryOperation::new(self)
    }

    // ---- internals used by GeometryOperation ----

    pub(crate) fn allocate_vertex_id(&mut self) -> VertexId {
        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id += 1;
        id
    }

    pub(crate) fn allocate_face_id(&mut self) -> FaceId {
        let id = FaceId(self.next_face_id);
        self.next_face_id += 1;
        id
    }

    pub(crate) fn insert_vertex(&mut self, vertex: Vertex) {
        self.reverse_index.entry(vertex.id).or_default();
        self.vertices.insert(vertex.id, vertex);
    }

    pub(crate) fn set_vertex_position(&mut self, id: VertexId, position: Point3<f64>) {
        if let Some(vertex) = self.vertices.get_mut(&id) {
            vertex.position = position;
        }
    }

    pub(crate) fn remove_vertex(&mut self, id: VertexId) {
        self.vertices.remove(&id);
        self.reverse_index.remove(&id);
    }

    pub(crate) fn insert_face(&mut self, face: Face) {
        for &v in &face.vertex_ids {
            self.reverse_index.entry(v).or_default().insert(face.id);
        }
        self.faces.insert(face.id, face);
    }

    pub(crate) fn remove_face(&mut self, id: FaceId) {
        if let Some(face) = self.faces.remove(&id) {
            for v in face.vertex_ids {
                if let Some(set) = self.reverse_index.get_mut(&v) {
                    set.remove(&id);
                }
            }
        }
    }

    pub(crate) fn replace_face(&mut self, face: Face) {
        self.remove_face(face.id);
        self.insert_face(face);
    }

    pub(crate) fn recompute_face_normal(&mut self, face_id: FaceId) {
        let normal = self
            .face_positions(face_id)
            .and_then(|positions| polygon_normal(&positions));
        if let Some(face) = self.faces.get_mut(&face_id) {
            face.normal = normal;
        }
    }

    pub(crate) fn recompute_bounds(&mut self) {
        self.bounds = Aabb::from_points(self.vertices.values().map(|v| &v.position));
    }
}

/// Helper constructing a unit cube from (0,0,0) to (1,1,1).
///
/// Six quad faces, all windings counter-clockwise viewed from outside.
///
/// # Example
///
/// ```
/// use carve_types::{unit_cube, MeshId};
///
/// let cube = unit_cube(MeshId(0));
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 6);
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // fixed winding over fresh vertices cannot fail
pub fn unit_cube(id: MeshId) -> Mesh {
    use crate::face::FaceProperties;

    let mut mesh = Mesh::new(id);
    let mut op = mesh.start_operation();
    let corners = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let v: Vec<VertexId> = corners
        .into_iter()
        .map(|p| op.add_vertex_in_mesh_space(p).id)
        .collect();

    let windings: [[usize; 4]; 6] = [
        [0, 3, 2, 1], // bottom, -Z
        [4, 5, 6, 7], // top, +Z
        [0, 1, 5, 4], // front, -Y
        [2, 3, 7, 6], // back, +Y
        [0, 4, 7, 3], // left, -X
        [1, 2, 6, 5], // right, +X
    ];
    for winding in windings {
        let ids: Vec<VertexId> = winding.into_iter().map(|i| v[i]).collect();
        #[allow(clippy::unwrap_used)]
        op.add_face(&ids, FaceProperties::default()).unwrap();
    }
    op.commit();
    mesh
}

/// The scene's overall placement in world space.
///
/// Model to world is `rotate, scale, translate`; the inverse undoes them
/// in reverse order. Pure value type, no side effects.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldTransform {
    /// Scene translation.
    pub translation: Vector3<f64>,
    /// Scene rotation.
    pub rotation: UnitQuaternion<f64>,
    /// Uniform scene scale.
    pub scale: f64,
}

impl WorldTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
        }
    }

    /// Convert a model-space point to world space.
    #[must_use]
    pub fn model_to_world(&self, point: Point3<f64>) -> Point3<f64> {
        self.rotation * (point * self.scale) + self.translation
    }

    /// Convert a world-space point to model space.
    #[must_use]
    pub fn world_to_model(&self, point: Point3<f64>) -> Point3<f64> {
        (self.rotation.inverse() * (point - self.translation)) / self.scale
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::identity()
    }
}
