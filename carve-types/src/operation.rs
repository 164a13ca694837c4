//! Mutation transactions.
//!
//! Every change to a mesh goes through a [`GeometryOperation`]: primitive
//! edits are queued against a pending overlay, validated as they are
//! queued, and applied in one step on commit. Dropping the operation
//! without committing leaves the mesh untouched.

use hashbrown::HashSet;
use nalgebra::Point3;
use tracing::debug;

use crate::error::{OperationError, OperationResult};
use crate::face::{Face, FaceProperties, Winding};
use crate::ids::{FaceId, VertexId};
use crate::mesh::Mesh;
use crate::vertex::Vertex;

#[derive(Debug, Clone)]
enum PendingVertex {
    Added(Point3<f64>),
    Moved(Point3<f64>),
    Deleted,
}

#[derive(Debug, Clone)]
enum PendingFace {
    Added(Face),
    Replaced(Face),
    Deleted,
}

/// A scoped transaction on a single [`Mesh`].
///
/// Holding the transaction borrows the mesh mutably, so only one can be
/// open per mesh at a time and no other component can observe the mesh
/// until the transaction is committed or dropped.
///
/// Edits are atomic from the caller's perspective: [`commit`] applies the
/// whole batch, updates the reverse index, and recomputes face normals
/// and the mesh bounds. [`commit_without_recalculation`] skips the
/// recomputation and is only valid for uniform-scale edits, which cannot
/// change normals (the caller patches bounds analytically).
///
/// [`commit`]: GeometryOperation::commit
/// [`commit_without_recalculation`]: GeometryOperation::commit_without_recalculation
#[derive(Debug)]
pub struct GeometryOperation<'m> {
    mesh: &'m mut Mesh,
    vertices: hashbrown::HashMap<VertexId, PendingVertex>,
    faces: hashbrown::HashMap<FaceId, PendingFace>,
}

impl<'m> GeometryOperation<'m> {
    pub(crate) fn new(mesh: &'m mut Mesh) -> Self {
        Self {
            mesh,
            vertices: hashbrown::HashMap::new(),
            faces: hashbrown::HashMap::new(),
        }
    }

    /// Whether no edits have been queued yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// Allocate a fresh vertex at the given mesh-local position.
    ///
    /// The id is reserved immediately; ids are never reused even when the
    /// transaction is dropped uncommitted.
    pub fn add_vertex_in_mesh_space(&mut self, position: Point3<f64>) -> Vertex {
        let id = self.mesh.allocate_vertex_id();
        self.vertices.insert(id, PendingVertex::Added(position));
        Vertex::new(id, position)
    }

    /// Queue a position update for an existing vertex.
    ///
    /// # Errors
    ///
    /// [`OperationError::UnknownVertex`] if the vertex does not exist,
    /// [`OperationError::VertexDeleted`] if it was deleted earlier in this
    /// transaction.
    pub fn modify_vertex(&mut self, id: VertexId, position: Point3<f64>) -> OperationResult<()> {
        match self.vertices.get_mut(&id) {
            Some(PendingVertex::Deleted) => Err(OperationError::VertexDeleted(id)),
            Some(PendingVertex::Added(pos) | PendingVertex::Moved(pos)) => {
                *pos = position;
                Ok(())
            }
            None => {
                if self.mesh.vertex(id).is_some() {
                    self.vertices.insert(id, PendingVertex::Moved(position));
                    Ok(())
                } else {
                    Err(OperationError::UnknownVertex(id))
                }
            }
        }
    }

    /// Queue position updates for many vertices at once.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown or deleted vertex; earlier updates in
    /// the iteration stay queued, but nothing is applied until commit.
    pub fn modify_vertices(
        &mut self,
        updates: impl IntoIterator<Item = (VertexId, Point3<f64>)>,
    ) -> OperationResult<()> {
        for (id, position) in updates {
            self.modify_vertex(id, position)?;
        }
        Ok(())
    }

    /// Queue deletion of a vertex.
    ///
    /// # Errors
    ///
    /// [`OperationError::VertexInUse`] if any face (existing or queued)
    /// still references the vertex; unknown and already-deleted vertices
    /// fail as for [`modify_vertex`](Self::modify_vertex).
    pub fn delete_vertex(&mut self, id: VertexId) -> OperationResult<()> {
        if !self.vertex_exists(id) {
            return match self.vertices.get(&id) {
                Some(PendingVertex::Deleted) => Err(OperationError::VertexDeleted(id)),
                _ => Err(OperationError::UnknownVertex(id)),
            };
        }
        let face_count = self.faces_referencing(id);
        if face_count > 0 {
            return Err(OperationError::VertexInUse {
                vertex: id,
                face_count,
            });
        }
        self.vertices.insert(id, PendingVertex::Deleted);
        Ok(())
    }

    /// Queue a new face over existing (or queued) vertices.
    ///
    /// Returns the face as it will exist after commit.
    ///
    /// # Errors
    ///
    /// Fails when the winding references an unknown or deleted vertex,
    /// has cyclically consecutive repeats, or has fewer than three
    /// distinct ids.
    pub fn add_face(
        &mut self,
        vertex_ids: &[VertexId],
        properties: FaceProperties,
    ) -> OperationResult<Face> {
        let winding = self.validate_winding(vertex_ids)?;
        let id = self.mesh.allocate_face_id();
        let face = Face::new(id, winding, properties);
        self.faces.insert(id, PendingFace::Added(face.clone()));
        Ok(face)
    }

    /// Queue replacement of a face's winding and properties.
    ///
    /// # Errors
    ///
    /// As for [`add_face`](Self::add_face), plus
    /// [`OperationError::UnknownFace`] / [`OperationError::FaceDeleted`]
    /// for a missing target.
    pub fn modify_face(
        &mut self,
        id: FaceId,
        vertex_ids: &[VertexId],
        properties: FaceProperties,
    ) -> OperationResult<()> {
        let winding = self.validate_winding(vertex_ids)?;
        let face = Face::new(id, winding, properties);
        match self.faces.get_mut(&id) {
            Some(PendingFace::Deleted) => Err(OperationError::FaceDeleted(id)),
            Some(pending @ PendingFace::Added(_)) => {
                *pending = PendingFace::Added(face);
                Ok(())
            }
            Some(pending @ PendingFace::Replaced(_)) => {
                *pending = PendingFace::Replaced(face);
                Ok(())
            }
            None => {
                if self.mesh.face(id).is_some() {
                    self.faces.insert(id, PendingFace::Replaced(face));
                    Ok(())
                } else {
                    Err(OperationError::UnknownFace(id))
                }
            }
        }
    }

    /// Queue deletion of a face.
    ///
    /// # Errors
    ///
    /// [`OperationError::UnknownFace`] / [`OperationError::FaceDeleted`]
    /// for a missing target.
    pub fn delete_face(&mut self, id: FaceId) -> OperationResult<()> {
        if !self.face_exists(id) {
            return match self.faces.get(&id) {
                Some(PendingFace::Deleted) => Err(OperationError::FaceDeleted(id)),
                _ => Err(OperationError::UnknownFace(id)),
            };
        }
        self.faces.insert(id, PendingFace::Deleted);
        Ok(())
    }

    /// The position a vertex will have after commit, if it will exist.
    #[must_use]
    pub fn vertex_position(&self, id: VertexId) -> Option<Point3<f64>> {
        match self.vertices.get(&id) {
            Some(PendingVertex::Added(pos) | PendingVertex::Moved(pos)) => Some(*pos),
            Some(PendingVertex::Deleted) => None,
            None => self.mesh.vertex_position(id),
        }
    }

    /// Apply all queued edits and recompute normals and bounds.
    pub fn commit(self) {
        self.apply(true);
    }

    /// Apply all queued edits without recomputing normals or bounds.
    ///
    /// Valid only when the queued edits are a uniform scale, which cannot
    /// change normal directions; the caller is responsible for patching
    /// the cached bounds (see [`Mesh::set_bounds`]).
    pub fn commit_without_recalculation(self) {
        self.apply(false);
    }

    // ---- internals ----

    fn vertex_exists(&self, id: VertexId) -> bool {
        match self.vertices.get(&id) {
            Some(PendingVertex::Added(_) | PendingVertex::Moved(_)) => true,
            Some(PendingVertex::Deleted) => false,
            None => self.mesh.vertex(id).is_some(),
        }
    }

    fn face_exists(&self, id: FaceId) -> bool {
        match self.faces.get(&id) {
            Some(PendingFace::Added(_) | PendingFace::Replaced(_)) => true,
            Some(PendingFace::Deleted) => false,
            None => self.mesh.face(id).is_some(),
        }
    }

    /// How many faces will reference `vertex` after commit.
    fn faces_referencing(&self, vertex: VertexId) -> usize {
        let mut count = 0;
        for pending in self.faces.values() {
            if let PendingFace::Added(face) | PendingFace::Replaced(face) = pending {
                if face.contains_vertex(vertex) {
                    count += 1;
                }
            }
        }
        count += self
            .mesh
            .faces_for_vertex(vertex)
            .filter(|id| !self.faces.contains_key(id))
            .count();
        count
    }

    fn validate_winding(&self, vertex_ids: &[VertexId]) -> OperationResult<Winding> {
        for &id in vertex_ids {
            if !self.vertex_exists(id) {
                return match self.vertices.get(&id) {
                    Some(PendingVertex::Deleted) => Err(OperationError::VertexDeleted(id)),
                    _ => Err(OperationError::UnknownVertex(id)),
                };
            }
        }
        let n = vertex_ids.len();
        let distinct = vertex_ids.iter().collect::<HashSet<_>>().len();
        if n < 3 || distinct < 3 {
            return Err(OperationError::FaceTooSmall {
                distinct,
                supplied: n,
            });
        }
        for i in 0..n {
            if vertex_ids[i] == vertex_ids[(i + 1) % n] {
                return Err(OperationError::RepeatedVertex(vertex_ids[i]));
            }
        }
        Ok(Winding::from_slice(vertex_ids))
    }

    fn apply(mut self, recalculate: bool) {
        debug!(
            vertex_edits = self.vertices.len(),
            face_edits = self.faces.len(),
            recalculate,
            "committing geometry operation"
        );

        let mut moved: Vec<VertexId> = Vec::new();
        let mut deleted_vertices: Vec<VertexId> = Vec::new();
        for (&id, pending) in &self.vertices {
            match pending {
                PendingVertex::Added(pos) => self.mesh.insert_vertex(Vertex::new(id, *pos)),
                PendingVertex::Moved(pos) => {
                    self.mesh.set_vertex_position(id, *pos);
                    moved.push(id);
                }
                PendingVertex::Deleted => deleted_vertices.push(id),
            }
        }

        let mut touched_faces: HashSet<FaceId> = HashSet::new();
        for (id, pending) in self.faces.drain() {
            match pending {
                PendingFace::Added(face) => {
                    self.mesh.insert_face(face);
                    touched_faces.insert(id);
                }
                PendingFace::Replaced(face) => {
                    self.mesh.replace_face(face);
                    touched_faces.insert(id);
                }
                PendingFace::Deleted => self.mesh.remove_face(id),
            }
        }

        // Vertex deletions last: face deletions above may have released
        // the final references.
        for id in deleted_vertices {
            self.mesh.remove_vertex(id);
        }

        if recalculate {
            for id in moved {
                touched_faces.extend(self.mesh.faces_for_vertex(id));
            }
            for id in touched_faces {
                self.mesh.recompute_face_normal(id);
            }
            self.mesh.recompute_bounds();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MeshId;
    use nalgebra::Vector3;

    fn square_mesh() -> (Mesh, Vec<VertexId>, FaceId) {
        let mut mesh = Mesh::new(MeshId(0));
        let mut op = mesh.start_operation();
        let ids: Vec<VertexId> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
        .into_iter()
        .map(|p| op.add_vertex_in_mesh_space(p).id)
        .collect();
        let face = op.add_face(&ids, FaceProperties::default()).unwrap();
        op.commit();
        (mesh, ids, face.id)
    }

    #[test]
    fn empty_commit_is_identity() {
        let (mut mesh, _, _) = square_mesh();
        let before = mesh.clone();

        let op = mesh.start_operation();
        assert!(op.is_empty());
        op.commit();

        assert_eq!(mesh.vertex_count(), before.vertex_count());
        assert_eq!(mesh.face_count(), before.face_count());
        assert_eq!(mesh.bounds(), before.bounds());
        for v in before.vertices() {
            assert_eq!(mesh.vertex_position(v.id), Some(v.position));
        }
        for f in before.faces() {
            assert_eq!(mesh.face(f.id).unwrap().vertex_ids, f.vertex_ids);
        }
    }

    #[test]
    fn dropped_operation_changes_nothing() {
        let (mut mesh, ids, _) = square_mesh();
        let before_vertex_count = mesh.vertex_count();
        {
            let mut op = mesh.start_operation();
            op.add_vertex_in_mesh_space(Point3::new(5.0, 5.0, 5.0));
            op.modify_vertex(ids[0], Point3::new(-3.0, 0.0, 0.0)).unwrap();
            // dropped without commit
        }
        assert_eq!(mesh.vertex_count(), before_vertex_count);
        assert_eq!(
            mesh.vertex_position(ids[0]).unwrap(),
            Point3::new(0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn add_face_rejects_unknown_vertex() {
        let (mut mesh, ids, _) = square_mesh();
        let mut op = mesh.start_operation();
        let err = op
            .add_face(
                &[ids[0], ids[1], VertexId(999)],
                FaceProperties::default(),
            )
            .unwrap_err();
        assert!(matches!(err, OperationError::UnknownVertex(VertexId(999))));
    }

    #[test]
    fn add_face_rejects_degenerate_windings() {
        let (mut mesh, ids, _) = square_mesh();
        let mut op = mesh.start_operation();

        let err = op
            .add_face(&[ids[0], ids[1]], FaceProperties::default())
            .unwrap_err();
        assert!(matches!(err, OperationError::FaceTooSmall { .. }));

        let err = op
            .add_face(&[ids[0], ids[0], ids[1], ids[2]], FaceProperties::default())
            .unwrap_err();
        assert!(matches!(err, OperationError::RepeatedVertex(_)));
    }

    #[test]
    fn delete_referenced_vertex_fails() {
        let (mut mesh, ids, _) = square_mesh();
        let mut op = mesh.start_operation();
        let err = op.delete_vertex(ids[0]).unwrap_err();
        assert!(matches!(err, OperationError::VertexInUse { .. }));
    }

    #[test]
    fn delete_vertex_after_face_delete_in_same_transaction() {
        let (mut mesh, ids, face_id) = square_mesh();
        let mut op = mesh.start_operation();
        op.delete_face(face_id).unwrap();
        for id in &ids {
            op.delete_vertex(*id).unwrap();
        }
        op.commit();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert!(mesh.bounds().is_empty());
    }

    #[test]
    fn commit_recomputes_normals_and_bounds() {
        let (mut mesh, ids, face_id) = square_mesh();
        assert!(
            (mesh.face(face_id).unwrap().normal.unwrap() - Vector3::z()).norm() < 1e-12
        );

        let mut op = mesh.start_operation();
        op.modify_vertex(ids[2], Point3::new(1.0, 1.0, 2.0)).unwrap();
        op.commit();

        // Normal tilted away from +Z, bounds grew
        let normal = mesh.face(face_id).unwrap().normal.unwrap();
        assert!((normal - Vector3::z()).norm() > 1e-3);
        assert!((mesh.bounds().max.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn commit_without_recalculation_keeps_cached_state() {
        let (mut mesh, ids, face_id) = square_mesh();
        let bounds_before = mesh.bounds();
        let normal_before = mesh.face(face_id).unwrap().normal;

        let mut op = mesh.start_operation();
        for id in &ids {
            let pos = op.vertex_position(*id).unwrap();
            op.modify_vertex(*id, Point3::from(pos.coords * 2.0)).unwrap();
        }
        op.commit_without_recalculation();

        assert_eq!(mesh.bounds(), bounds_before);
        assert_eq!(mesh.face(face_id).unwrap().normal, normal_before);
        assert_eq!(
            mesh.vertex_position(ids[2]).unwrap(),
            Point3::new(2.0, 2.0, 0.0)
        );
    }

    #[test]
    fn face_added_and_deleted_in_one_transaction_never_lands() {
        let (mut mesh, ids, _) = square_mesh();
        let faces_before = mesh.face_count();
        let mut op = mesh.start_operation();
        let face = op
            .add_face(&[ids[0], ids[2], ids[1]], FaceProperties::default())
            .unwrap();
        op.delete_face(face.id).unwrap();
        op.commit();
        assert_eq!(mesh.face_count(), faces_before);
        assert!(mesh.face(face.id).is_none());
    }

    #[test]
    fn modify_face_rewrites_winding() {
        let (mut mesh, ids, face_id) = square_mesh();
        let mut op = mesh.start_operation();
        op.modify_face(face_id, &[ids[0], ids[1], ids[2]], FaceProperties::new(3))
            .unwrap();
        op.commit();

        let face = mesh.face(face_id).unwrap();
        assert_eq!(face.vertex_count(), 3);
        assert_eq!(face.properties.material_id, 3);
        // Reverse index released the dropped vertex
        assert_eq!(mesh.faces_for_vertex(ids[3]).count(), 0);
    }
}
