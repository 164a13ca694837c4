//! The canonical mesh store.

use hashbrown::HashMap;
use tracing::debug;

use carve_types::{
    Aabb, Mesh, MeshId, Point3, UnitQuaternion, Vector3, VertexKey,
};

use crate::command::Command;
use crate::error::{ModelError, ModelResult};
use crate::spatial::MeshIndex;

/// Half-extent of the editable scene volume, in model units.
pub const SCENE_EXTENT: f64 = 10.0;

/// Upper bound on vertices per mesh accepted by [`Model::can_add_mesh`].
pub const MAX_VERTICES_PER_MESH: usize = 10_000;

/// The axis-aligned scene volume every mesh must stay inside.
#[must_use]
pub fn scene_bounds() -> Aabb {
    Aabb::new(
        Point3::new(-SCENE_EXTENT, -SCENE_EXTENT, -SCENE_EXTENT),
        Point3::new(SCENE_EXTENT, SCENE_EXTENT, SCENE_EXTENT),
    )
}

/// Owning store of the scene's committed meshes.
///
/// Edit operations work on clones and feed results back as [`Command`]s;
/// the spatial index is kept in sync as a side effect of applying them.
#[derive(Debug, Default)]
pub struct Model {
    meshes: HashMap<MeshId, Mesh>,
    index: MeshIndex,
    next_mesh_id: u32,
}

impl Model {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh mesh id.
    pub fn allocate_mesh_id(&mut self) -> MeshId {
        let id = MeshId(self.next_mesh_id);
        self.next_mesh_id += 1;
        id
    }

    /// Look up a committed mesh.
    #[must_use]
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    /// Iterate all committed meshes (unordered).
    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.values()
    }

    /// Number of committed meshes.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// The spatial index over committed meshes.
    #[must_use]
    pub const fn index(&self) -> &MeshIndex {
        &self.index
    }

    /// Whether a mesh would be accepted by add or replace.
    ///
    /// A mesh qualifies when it has faces, stays under the vertex limit,
    /// and its placed bounds lie inside the scene volume. Id uniqueness
    /// is checked by the individual commands, not here, because a
    /// replacement legitimately reuses its id.
    #[must_use]
    pub fn can_add_mesh(&self, mesh: &Mesh) -> bool {
        !mesh.is_empty()
            && mesh.vertex_count() <= MAX_VERTICES_PER_MESH
            && scene_bounds().contains_aabb(&mesh.model_bounds())
    }

    /// Whether a committed mesh could move by the given placement delta
    /// and stay inside the scene volume.
    #[must_use]
    pub fn can_move_mesh(
        &self,
        id: MeshId,
        position_delta: Vector3<f64>,
        rotation_delta: UnitQuaternion<f64>,
    ) -> bool {
        let Some(mesh) = self.meshes.get(&id) else {
            return false;
        };
        let mut moved = mesh.clone();
        moved.offset += position_delta;
        moved.rotation = rotation_delta * moved.rotation;
        scene_bounds().contains_aabb(&moved.model_bounds())
    }

    /// Validate and apply a command.
    ///
    /// # Errors
    ///
    /// Fails without mutating anything when any part of the command
    /// (composites included) fails validation.
    pub fn apply_command(&mut self, command: Command) -> ModelResult<()> {
        self.precheck(&command)?;
        debug!(kind = command.kind(), "applying model command");
        self.apply_unchecked(command);
        Ok(())
    }

    /// The committed mesh nearest to a model-space point, within `radius`.
    #[must_use]
    pub fn find_nearest_mesh_to(&self, point: &Point3<f64>, radius: f64) -> Option<MeshId> {
        self.index.nearest_to(point, radius)
    }

    /// Vertices of committed meshes within `radius` of a model-space
    /// point, nearest first.
    #[must_use]
    pub fn find_vertices_closest_to(
        &self,
        point: &Point3<f64>,
        radius: f64,
    ) -> Vec<(VertexKey, Point3<f64>)> {
        let probe = Aabb::from_center_extents(*point, Vector3::new(radius, radius, radius));
        let radius_squared = radius * radius;

        let mut hits: Vec<(VertexKey, Point3<f64>, f64)> = Vec::new();
        for id in self.index.intersected_by(&probe) {
            let Some(mesh) = self.meshes.get(&id) else {
                continue;
            };
            for vertex in mesh.vertices() {
                let model_pos = mesh.mesh_to_model(vertex.position);
                let d = (model_pos - point).norm_squared();
                if d <= radius_squared {
                    hits.push((VertexKey::new(id, vertex.id), model_pos, d));
                }
            }
        }
        hits.sort_by(|a, b| a.2.total_cmp(&b.2));
        hits.into_iter().map(|(key, pos, _)| (key, pos)).collect()
    }

    // ---- internals ----

    fn precheck(&self, command: &Command) -> ModelResult<()> {
        match command {
            Command::AddMesh(mesh) => {
                if self.meshes.contains_key(&mesh.id()) {
                    return Err(ModelError::MeshAlreadyExists(mesh.id()));
                }
                if !self.can_add_mesh(mesh) {
                    return Err(ModelError::MeshRejected(mesh.id()));
                }
                Ok(())
            }
            Command::ReplaceMesh(mesh) => {
                if !self.meshes.contains_key(&mesh.id()) {
                    return Err(ModelError::UnknownMesh(mesh.id()));
                }
                if !self.can_add_mesh(mesh) {
                    return Err(ModelError::MeshRejected(mesh.id()));
                }
                Ok(())
            }
            Command::DeleteMesh(id) => {
                if self.meshes.contains_key(id) {
                    Ok(())
                } else {
                    Err(ModelError::UnknownMesh(*id))
                }
            }
            Command::ChangeFaceProperties { mesh_id, changes } => {
                let mesh = self
                    .meshes
                    .get(mesh_id)
                    .ok_or(ModelError::UnknownMesh(*mesh_id))?;
                for &face_id in changes.keys() {
                    if mesh.face(face_id).is_none() {
                        return Err(ModelError::UnknownFace {
                            mesh_id: *mesh_id,
                            face_id,
                        });
                    }
                }
                Ok(())
            }
            Command::Composite(children) => {
                for child in children {
                    self.precheck(child)?;
                }
                Ok(())
            }
        }
    }

    fn apply_unchecked(&mut self, command: Command) {
        match command {
            Command::AddMesh(mesh) | Command::ReplaceMesh(mesh) => {
                let id = mesh.id();
                self.next_mesh_id = self.next_mesh_id.max(id.0 + 1);
                self.index.update_item(id, mesh.model_bounds());
                self.meshes.insert(id, mesh);
            }
            Command::DeleteMesh(id) => {
                self.meshes.remove(&id);
                self.index.remove_item(id);
            }
            Command::ChangeFaceProperties { mesh_id, changes } => {
                if let Some(mesh) = self.meshes.get_mut(&mesh_id) {
                    // Windings stay as they are; capture them before the
                    // operation borrows the mesh.
                    let updates: Vec<_> = changes
                        .into_iter()
                        .filter_map(|(face_id, properties)| {
                            mesh.face(face_id)
                                .map(|f| (face_id, f.vertex_ids.to_vec(), properties))
                        })
                        .collect();
                    let mut op = mesh.start_operation();
                    for (face_id, winding, properties) in updates {
                        // Prechecked ids over unchanged windings cannot fail
                        let _ = op.modify_face(face_id, &winding, properties);
                    }
                    op.commit();
                }
            }
            Command::Composite(children) => {
                for child in children {
                    self.apply_unchecked(child);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_types::unit_cube;

    #[test]
    fn add_and_replace_mesh() {
        let mut model = Model::new();
        let id = model.allocate_mesh_id();
        let cube = unit_cube(id);
        model.apply_command(Command::AddMesh(cube.clone())).unwrap();
        assert_eq!(model.mesh_count(), 1);
        assert!(model.index().has_item(id));

        // Adding again fails, replacing succeeds
        assert!(matches!(
            model.apply_command(Command::AddMesh(cube.clone())),
            Err(ModelError::MeshAlreadyExists(_))
        ));
        model.apply_command(Command::ReplaceMesh(cube)).unwrap();
    }

    #[test]
    fn delete_mesh_updates_index() {
        let mut model = Model::new();
        let id = model.allocate_mesh_id();
        model.apply_command(Command::AddMesh(unit_cube(id))).unwrap();
        model.apply_command(Command::DeleteMesh(id)).unwrap();
        assert_eq!(model.mesh_count(), 0);
        assert!(!model.index().has_item(id));
    }

    #[test]
    fn composite_is_atomic() {
        let mut model = Model::new();
        let id = model.allocate_mesh_id();
        model.apply_command(Command::AddMesh(unit_cube(id))).unwrap();

        // Second child fails validation, so the first must not apply
        let mut replacement = unit_cube(id);
        replacement.offset = Vector3::new(1.0, 0.0, 0.0);
        let bogus = MeshId(999);
        let result = model.apply_command(Command::Composite(vec![
            Command::ReplaceMesh(replacement),
            Command::DeleteMesh(bogus),
        ]));

        assert!(matches!(result, Err(ModelError::UnknownMesh(_))));
        let stored = model.mesh(id).unwrap();
        assert_eq!(stored.offset, Vector3::zeros());
    }

    #[test]
    fn can_add_mesh_enforces_scene_volume() {
        let model = Model::new();
        let mut cube = unit_cube(MeshId(0));
        assert!(model.can_add_mesh(&cube));

        cube.offset = Vector3::new(SCENE_EXTENT * 2.0, 0.0, 0.0);
        assert!(!model.can_add_mesh(&cube));

        let empty = Mesh::new(MeshId(1));
        assert!(!model.can_add_mesh(&empty));
    }

    #[test]
    fn can_move_mesh_checks_target_placement() {
        let mut model = Model::new();
        let id = model.allocate_mesh_id();
        model.apply_command(Command::AddMesh(unit_cube(id))).unwrap();

        assert!(model.can_move_mesh(id, Vector3::new(1.0, 0.0, 0.0), UnitQuaternion::identity()));
        assert!(!model.can_move_mesh(
            id,
            Vector3::new(SCENE_EXTENT * 3.0, 0.0, 0.0),
            UnitQuaternion::identity()
        ));
        assert!(!model.can_move_mesh(MeshId(42), Vector3::zeros(), UnitQuaternion::identity()));
    }

    #[test]
    fn change_face_properties_retags_without_touching_geometry() {
        let mut model = Model::new();
        let id = model.allocate_mesh_id();
        model.apply_command(Command::AddMesh(unit_cube(id))).unwrap();
        let face_id = model.mesh(id).unwrap().faces().next().unwrap().id;
        let winding_before = model.mesh(id).unwrap().face(face_id).unwrap().vertex_ids.clone();

        let mut changes = HashMap::new();
        changes.insert(face_id, carve_types::FaceProperties::new(7));
        model
            .apply_command(Command::ChangeFaceProperties { mesh_id: id, changes })
            .unwrap();

        let face = model.mesh(id).unwrap().face(face_id).unwrap();
        assert_eq!(face.properties.material_id, 7);
        assert_eq!(face.vertex_ids, winding_before);
    }

    #[test]
    fn nearest_vertex_query_returns_model_space() {
        let mut model = Model::new();
        let id = model.allocate_mesh_id();
        let mut cube = unit_cube(id);
        cube.offset = Vector3::new(2.0, 0.0, 0.0);
        model.apply_command(Command::AddMesh(cube)).unwrap();

        let hits = model.find_vertices_closest_to(&Point3::new(2.05, 0.0, 0.0), 0.2);
        assert!(!hits.is_empty());
        let (key, pos) = &hits[0];
        assert_eq!(key.mesh_id, id);
        assert!((pos - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-9);
    }
}
