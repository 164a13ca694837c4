//! The reshape control loop.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use carve_background::{BackgroundValidator, MeshSnapshot, Validity};
use carve_model::{Command, Model, PreviewMesh, VertexColor};
use carve_repair::FixParams;
use carve_types::{
    snap_point, Mesh, MeshId, Point3, UnitQuaternion, Vector3, VertexId, GRID_UNIT,
};

use crate::error::{ReshapeError, ReshapeResult};
use crate::grab::{DragRule, GrabSelection};
use crate::outline::error_outline;

/// One frame of controller pose.
#[derive(Debug, Clone, Copy)]
pub struct ControllerFrame {
    /// Controller position in model space.
    pub position: Point3<f64>,
    /// Controller orientation.
    pub rotation: UnitQuaternion<f64>,
}

/// Whether the gesture is locked to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapMode {
    /// Free 6-DOF dragging.
    Off,
    /// Grid and neighbor snapping; rotation is ignored.
    Grid,
}

/// What to show for the current frame.
#[derive(Debug, Default)]
pub struct FramePreview {
    /// One snapshot per affected mesh: the last known-valid state when
    /// the validator has one, the naive state otherwise.
    pub meshes: Vec<PreviewMesh>,
    /// Error overlays, present while the current drag is invalid.
    pub error_outlines: Vec<PreviewMesh>,
    /// Play the invalid cue this frame (true at most once per gesture).
    pub play_invalid_cue: bool,
}

/// A reshape gesture in progress.
///
/// Owns clones of every affected mesh: the originals (last committed)
/// and the naive working copies the drag mutates each frame. The
/// canonical model is only touched by [`release`](Self::release).
#[derive(Debug)]
pub struct Reshaper {
    originals: HashMap<MeshId, Mesh>,
    naive: HashMap<MeshId, Mesh>,
    rules: HashMap<MeshId, HashMap<VertexId, DragRule>>,
    grabbed: Option<(MeshId, VertexId)>,
    grab_start: ControllerFrame,
    snap: SnapMode,
    validator: BackgroundValidator,
    invalid_cue_played: bool,
}

impl Reshaper {
    /// Begin a gesture: clone the affected meshes and start the
    /// background validator.
    ///
    /// # Errors
    ///
    /// [`ReshapeError::EmptySelection`] and
    /// [`ReshapeError::UnknownMesh`] from resolving the selection.
    pub fn begin(
        model: &Model,
        selection: &GrabSelection,
        grab_start: ControllerFrame,
        snap: SnapMode,
    ) -> ReshapeResult<Self> {
        let rules = selection.resolve(model)?;

        let mut originals: HashMap<MeshId, Mesh> = HashMap::new();
        for &mesh_id in rules.keys() {
            let mesh = model
                .mesh(mesh_id)
                .ok_or(ReshapeError::UnknownMesh(mesh_id))?;
            originals.insert(mesh_id, mesh.clone());
        }
        let naive = originals.clone();
        let validator = BackgroundValidator::start(originals.clone(), FixParams::default());

        debug!(meshes = originals.len(), "reshape gesture started");
        Ok(Self {
            originals,
            naive,
            rules,
            grabbed: selection
                .single_vertex()
                .map(|key| (key.mesh_id, key.vertex_id)),
            grab_start,
            snap,
            validator,
            invalid_cue_played: false,
        })
    }

    /// The ids of the meshes this gesture touches.
    pub fn affected_meshes(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.rules.keys().copied()
    }

    /// Advance one frame: write candidate positions into the naive
    /// clones, offer them to the validator, and assemble the preview.
    ///
    /// # Errors
    ///
    /// Transaction errors only; the grabbed ids come from the resolved
    /// selection, so these indicate a caller bug.
    pub fn update(&mut self, model: &Model, frame: &ControllerFrame) -> ReshapeResult<FramePreview> {
        let delta = frame.position - self.grab_start.position;
        let rotation_delta = if self.snap == SnapMode::Grid {
            UnitQuaternion::identity()
        } else {
            frame.rotation * self.grab_start.rotation.inverse()
        };
        let pivot = self.grab_start.position;

        let mut mesh_ids: Vec<MeshId> = self.rules.keys().copied().collect();
        mesh_ids.sort_unstable();

        for mesh_id in &mesh_ids {
            let (Some(original), Some(rules)) =
                (self.originals.get(mesh_id), self.rules.get(mesh_id))
            else {
                continue;
            };

            let mut updates: Vec<(VertexId, Point3<f64>)> = Vec::with_capacity(rules.len());
            for (&vertex_id, &rule) in rules {
                let Some(local) = original.vertex_position(vertex_id) else {
                    continue;
                };
                let start = original.mesh_to_model(local);
                let target = self.drag_target(model, *mesh_id, vertex_id, rule, start, delta,
                    rotation_delta, pivot);
                updates.push((vertex_id, original.model_to_mesh(target)));
            }

            if let Some(naive) = self.naive.get_mut(mesh_id) {
                let mut op = naive.start_operation();
                op.modify_vertices(updates)?;
                op.commit();
            }
        }

        // Best-effort: while the worker is busy this frame's snapshot is
        // dropped and the next frame re-offers
        let batch: Vec<MeshSnapshot> = mesh_ids
            .iter()
            .filter_map(|mesh_id| {
                let naive = self.naive.get(mesh_id)?;
                let moved = self.moved_set(*mesh_id)?;
                Some(MeshSnapshot::new(naive.clone(), moved))
            })
            .collect();
        let _ = self.validator.offer(batch);

        Ok(self.assemble_preview(&mesh_ids))
    }

    /// End the gesture: commit every affected mesh, or discard all.
    ///
    /// Stops the validator first; its last-good state is what commits,
    /// so the very last frames of the drag may be dropped (the preview
    /// showed the same state, so the hand sees what it gets).
    ///
    /// # Errors
    ///
    /// [`ReshapeError::InvalidRelease`] when any affected mesh lacks a
    /// known-valid state or fails the model's add validation; the model
    /// is untouched and the caller plays error feedback.
    pub fn release(mut self, model: &mut Model) -> ReshapeResult<()> {
        self.validator.stop();
        let good = self.validator.last_known_good();

        let mut replacements: Vec<Mesh> = Vec::with_capacity(self.rules.len());
        for mesh_id in self.rules.keys() {
            let Some(mesh) = good.get(mesh_id) else {
                return Err(ReshapeError::InvalidRelease);
            };
            if !model.can_add_mesh(mesh) {
                return Err(ReshapeError::InvalidRelease);
            }
            replacements.push(mesh.clone());
        }
        replacements.sort_by_key(Mesh::id);

        debug!(meshes = replacements.len(), "committing reshape gesture");
        model.apply_command(Command::replace_all(replacements))?;
        Ok(())
    }

    /// Abandon the gesture, touching nothing.
    pub fn cancel(mut self) {
        self.validator.stop();
    }

    // ---- internals ----

    #[allow(clippy::too_many_arguments)]
    fn drag_target(
        &self,
        model: &Model,
        mesh_id: MeshId,
        vertex_id: VertexId,
        rule: DragRule,
        start: Point3<f64>,
        delta: Vector3<f64>,
        rotation_delta: UnitQuaternion<f64>,
        pivot: Point3<f64>,
    ) -> Point3<f64> {
        if self.snap == SnapMode::Grid {
            match rule {
                DragRule::FaceNormal(normal) => {
                    // Moving along the normal trivially preserves the
                    // grabbed face's planarity
                    return start + normal * delta.dot(&normal);
                }
                DragRule::Isolated => {
                    let dragged = start + delta;
                    let nearest = model
                        .find_vertices_closest_to(&dragged, GRID_UNIT)
                        .into_iter()
                        .find(|(key, _)| {
                            self.grabbed != Some((key.mesh_id, key.vertex_id))
                                && (key.mesh_id, key.vertex_id) != (mesh_id, vertex_id)
                        });
                    return match nearest {
                        Some((_, position)) => position,
                        None => snap_point(dragged),
                    };
                }
                DragRule::Free => {
                    return snap_point(start + delta);
                }
            }
        }
        pivot + rotation_delta * (start - pivot) + delta
    }

    fn moved_set(&self, mesh_id: MeshId) -> Option<HashSet<VertexId>> {
        self.rules
            .get(&mesh_id)
            .map(|rules| rules.keys().copied().collect())
    }

    fn assemble_preview(&mut self, mesh_ids: &[MeshId]) -> FramePreview {
        let validity = self.validator.validity();
        let good = self.validator.last_known_good();

        let mut preview = FramePreview::default();
        for mesh_id in mesh_ids {
            let shown = good
                .get(mesh_id)
                .or_else(|| self.naive.get(mesh_id));
            if let Some(mesh) = shown {
                preview
                    .meshes
                    .push(PreviewMesh::from_mesh(mesh, VertexColor::WHITE));
            }
        }

        if validity == Validity::Invalid {
            for mesh_id in mesh_ids {
                let (Some(naive), Some(moved)) =
                    (self.naive.get(mesh_id), self.moved_set(*mesh_id))
                else {
                    continue;
                };
                if let Some(outline) = error_outline(naive, &moved) {
                    preview.error_outlines.push(outline);
                }
            }
            if !self.invalid_cue_played {
                preview.play_invalid_cue = true;
                self.invalid_cue_played = true;
            }
        }
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_types::{unit_cube, FaceKey, VertexKey};
    use std::time::{Duration, Instant};

    fn frame(position: Point3<f64>) -> ControllerFrame {
        ControllerFrame {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    fn model_with_cube() -> (Model, MeshId) {
        let mut model = Model::new();
        let cube = unit_cube(MeshId(0));
        let id = cube.id();
        model.apply_command(Command::AddMesh(cube)).unwrap();
        (model, id)
    }

    /// Drive updates until the validator produces a verdict.
    fn update_until_verdict(
        reshaper: &mut Reshaper,
        model: &Model,
        frame: &ControllerFrame,
    ) -> FramePreview {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut cue_seen = false;
        loop {
            let preview = reshaper.update(model, frame).unwrap();
            cue_seen |= preview.play_invalid_cue;
            if reshaper.validator.validity() != Validity::Unknown {
                let mut last = reshaper.update(model, frame).unwrap();
                last.play_invalid_cue |= cue_seen;
                return last;
            }
            assert!(Instant::now() < deadline, "validator produced no verdict");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn face_drag_along_normal_commits() {
        let (mut model, mesh_id) = model_with_cube();
        let top = model
            .mesh(mesh_id)
            .unwrap()
            .faces()
            .find(|f| f.normal.is_some_and(|n| (n - Vector3::z()).norm() < 1e-9))
            .unwrap()
            .id;
        let mut selection = GrabSelection::new();
        selection.grab_face(FaceKey::new(mesh_id, top));

        let mut reshaper = Reshaper::begin(
            &model,
            &selection,
            frame(Point3::new(0.5, 0.5, 1.0)),
            SnapMode::Grid,
        )
        .unwrap();

        // Drag up and sideways; the sideways part projects away
        let preview = update_until_verdict(
            &mut reshaper,
            &model,
            &frame(Point3::new(0.9, 0.5, 1.3)),
        );
        assert!(!preview.meshes.is_empty());
        assert!(preview.error_outlines.is_empty());

        reshaper.release(&mut model).unwrap();

        let committed = model.mesh(mesh_id).unwrap();
        let top_z = committed
            .vertices()
            .map(|v| v.position.z)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((top_z - 1.3).abs() < 1e-9);
        // Still a box: faces stayed planar, nothing split
        assert_eq!(committed.face_count(), 6);
    }

    #[test]
    fn all_or_nothing_across_meshes() {
        let (mut model, id_a) = model_with_cube();
        let mut cube_b = unit_cube(MeshId(0)).clone_with_id(MeshId(1));
        cube_b.offset = Vector3::new(3.0, 0.0, 0.0);
        let id_b = cube_b.id();
        model.apply_command(Command::AddMesh(cube_b)).unwrap();

        // Grab one corner of A (a fixable bend) and all of B's top
        // vertices (dragging them down collapses B, unfixable)
        let mut selection = GrabSelection::new();
        let corner_a = model
            .mesh(id_a)
            .unwrap()
            .vertices()
            .find(|v| v.position.z > 0.5)
            .unwrap()
            .id;
        selection.grab_vertex(VertexKey::new(id_a, corner_a));
        let top_b: Vec<VertexId> = model
            .mesh(id_b)
            .unwrap()
            .vertices()
            .filter(|v| v.position.z > 0.5)
            .map(|v| v.id)
            .collect();
        for v in top_b {
            selection.grab_vertex(VertexKey::new(id_b, v));
        }

        let mut reshaper = Reshaper::begin(
            &model,
            &selection,
            frame(Point3::new(0.0, 0.0, 1.0)),
            SnapMode::Off,
        )
        .unwrap();

        let preview = update_until_verdict(
            &mut reshaper,
            &model,
            &frame(Point3::new(0.0, 0.0, 0.0)),
        );
        // B collapsed: the frame is invalid, the overlay shows, the cue
        // fired exactly once
        assert!(!preview.error_outlines.is_empty());
        assert!(preview.play_invalid_cue);

        let result = reshaper.release(&mut model);
        assert!(matches!(result, Err(ReshapeError::InvalidRelease)));

        // Both meshes exactly as committed before the gesture
        for id in [id_a, id_b] {
            let mesh = model.mesh(id).unwrap();
            assert_eq!(mesh.face_count(), 6);
            assert_eq!(mesh.vertex_count(), 8);
            let unit = unit_cube(MeshId(0));
            for v in mesh.vertices() {
                assert_eq!(v.position, unit.vertex_position(v.id).unwrap());
            }
        }
    }

    #[test]
    fn isolated_vertex_snaps_to_a_nearby_vertex() {
        let (mut model, id_a) = model_with_cube();
        let mut cube_b = unit_cube(MeshId(0)).clone_with_id(MeshId(1));
        cube_b.offset = Vector3::new(1.2, 0.0, 0.0);
        model.apply_command(Command::AddMesh(cube_b)).unwrap();

        // Grab A's corner at (1, 0, 1); B has a corner at (1.2, 0, 1)
        let corner = model
            .mesh(id_a)
            .unwrap()
            .vertices()
            .find(|v| (v.position - Point3::new(1.0, 0.0, 1.0)).norm() < 1e-9)
            .unwrap()
            .id;
        let mut selection = GrabSelection::new();
        selection.grab_vertex(VertexKey::new(id_a, corner));

        let mut reshaper = Reshaper::begin(
            &model,
            &selection,
            frame(Point3::new(1.0, 0.0, 1.0)),
            SnapMode::Grid,
        )
        .unwrap();

        // Drag to within half a grid unit of B's corner
        reshaper
            .update(&model, &frame(Point3::new(1.195, 0.0, 1.0)))
            .unwrap();
        let naive = reshaper.naive.get(&id_a).unwrap();
        assert!(
            (naive.vertex_position(corner).unwrap() - Point3::new(1.2, 0.0, 1.0)).norm() < 1e-9
        );
        reshaper.cancel();
    }

    #[test]
    fn isolated_vertex_falls_back_to_the_grid() {
        let (model, mesh_id) = model_with_cube();
        let corner = model
            .mesh(mesh_id)
            .unwrap()
            .vertices()
            .find(|v| (v.position - Point3::new(1.0, 0.0, 1.0)).norm() < 1e-9)
            .unwrap()
            .id;
        let mut selection = GrabSelection::new();
        selection.grab_vertex(VertexKey::new(mesh_id, corner));

        let mut reshaper = Reshaper::begin(
            &model,
            &selection,
            frame(Point3::new(1.0, 0.0, 1.0)),
            SnapMode::Grid,
        )
        .unwrap();

        // No vertex nearby: rounds to the grid
        reshaper
            .update(&model, &frame(Point3::new(1.047, 0.0, 1.0)))
            .unwrap();
        let naive = reshaper.naive.get(&mesh_id).unwrap();
        assert!(
            (naive.vertex_position(corner).unwrap() - Point3::new(1.05, 0.0, 1.0)).norm() < 1e-9
        );
        reshaper.cancel();
    }

    #[test]
    fn cancel_touches_nothing() {
        let (model, mesh_id) = model_with_cube();
        let mut selection = GrabSelection::new();
        let v = model.mesh(mesh_id).unwrap().vertices().next().unwrap().id;
        selection.grab_vertex(VertexKey::new(mesh_id, v));

        let mut reshaper = Reshaper::begin(
            &model,
            &selection,
            frame(Point3::origin()),
            SnapMode::Off,
        )
        .unwrap();
        reshaper
            .update(&model, &frame(Point3::new(0.5, 0.5, 0.5)))
            .unwrap();
        reshaper.cancel();

        let mesh = model.mesh(mesh_id).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        let unit = unit_cube(MeshId(0));
        for vertex in mesh.vertices() {
            assert_eq!(vertex.position, unit.vertex_position(vertex.id).unwrap());
        }
    }
}
