//! Batch cut planning.
//!
//! A subdivision gesture can cut many faces of one mesh at once. The
//! plan stage runs purely against the committed mesh: it resolves cut
//! points to vertices (reusing any vertex within tolerance, existing or
//! created earlier in the batch), splits windings, and schedules the
//! insertion of each new vertex into every other face sharing the cut
//! edge. Apply then writes the whole plan through one transaction, so a
//! failed plan never leaves a partial cut behind.

use hashbrown::HashMap;
use tracing::debug;

use carve_types::{FaceId, FaceProperties, Mesh, Point3, VertexId};

use crate::error::{SubdivideError, SubdivideResult};
use crate::slicer::FaceCut;

/// Squared distance under which a cut point reuses a vertex instead of
/// creating one.
pub const CUT_REUSE_DISTANCE_SQUARED: f64 = 5e-7;

/// Distance from a segment under which a point counts as lying on it.
const ON_SEGMENT_DISTANCE: f64 = 1e-9;

/// A vertex reference inside a plan: either a committed vertex or the
/// n-th vertex the plan will create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Old(VertexId),
    New(usize),
}

/// A computed batch of cuts, ready to apply.
#[derive(Debug)]
pub struct CutPlan {
    new_points: Vec<Point3<f64>>,
    changed: HashMap<FaceId, (Vec<Slot>, FaceProperties)>,
    added: Vec<(Vec<Slot>, FaceProperties)>,
}

impl CutPlan {
    /// Plan a batch of face cuts against a mesh.
    ///
    /// # Errors
    ///
    /// [`SubdivideError::UnknownFace`] for a missing face,
    /// [`SubdivideError::ZeroWidthCut`] when a cut collapses onto an
    /// existing edge, [`SubdivideError::DegenerateSlice`] when a cut
    /// point cannot be placed on the face boundary.
    pub fn build(mesh: &Mesh, cuts: &[FaceCut]) -> SubdivideResult<Self> {
        let mut plan = Self {
            new_points: Vec::new(),
            changed: HashMap::new(),
            added: Vec::new(),
        };
        for cut in cuts {
            plan.cut_face(mesh, cut)?;
        }
        debug!(
            cuts = cuts.len(),
            new_vertices = plan.new_points.len(),
            faces_touched = plan.changed.len(),
            "planned cut batch"
        );
        Ok(plan)
    }

    /// Number of vertices the plan will create.
    #[must_use]
    pub fn new_vertex_count(&self) -> usize {
        self.new_points.len()
    }

    /// Whether the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty()
    }

    /// Write the plan into the mesh through one transaction.
    ///
    /// Returns the ids of the vertices created.
    ///
    /// # Errors
    ///
    /// Propagates transaction errors; the mesh is untouched on failure.
    pub fn apply(&self, mesh: &mut Mesh) -> SubdivideResult<Vec<VertexId>> {
        let mut op = mesh.start_operation();
        let new_ids: Vec<VertexId> = self
            .new_points
            .iter()
            .map(|p| op.add_vertex_in_mesh_space(*p).id)
            .collect();

        let to_ids = |slots: &[Slot]| -> Vec<VertexId> {
            slots
                .iter()
                .map(|slot| match slot {
                    Slot::Old(id) => *id,
                    Slot::New(i) => new_ids[*i],
                })
                .collect()
        };

        for (face_id, (winding, properties)) in &self.changed {
            op.modify_face(*face_id, &to_ids(winding), *properties)?;
        }
        for (winding, properties) in &self.added {
            op.add_face(&to_ids(winding), *properties)?;
        }
        op.commit();
        Ok(new_ids)
    }

    // ---- planning internals ----

    fn position_of(&self, mesh: &Mesh, slot: Slot) -> Point3<f64> {
        match slot {
            Slot::Old(id) => mesh.vertex_position(id).unwrap_or_else(Point3::origin),
            Slot::New(i) => self.new_points[i],
        }
    }

    /// The current winding of a face: planned if touched, committed
    /// otherwise.
    fn winding_of(&self, mesh: &Mesh, face_id: FaceId) -> Option<(Vec<Slot>, FaceProperties)> {
        if let Some((winding, properties)) = self.changed.get(&face_id) {
            return Some((winding.clone(), *properties));
        }
        mesh.face(face_id).map(|face| {
            (
                face.vertex_ids.iter().map(|&id| Slot::Old(id)).collect(),
                face.properties,
            )
        })
    }

    /// Resolve a cut point to a vertex: the face's own vertices first,
    /// then cuts made earlier in the batch, then a fresh vertex.
    fn resolve(&mut self, mesh: &Mesh, winding: &[Slot], point: Point3<f64>) -> Slot {
        for &slot in winding {
            if (self.position_of(mesh, slot) - point).norm_squared() < CUT_REUSE_DISTANCE_SQUARED
            {
                return slot;
            }
        }
        for (i, p) in self.new_points.iter().enumerate() {
            if (p - point).norm_squared() < CUT_REUSE_DISTANCE_SQUARED {
                return Slot::New(i);
            }
        }
        self.new_points.push(point);
        Slot::New(self.new_points.len() - 1)
    }

    /// Insert a slot into a winding on the boundary segment containing
    /// its point. Returns `false` if no segment holds the point.
    fn insert_on_boundary(
        &self,
        mesh: &Mesh,
        winding: &mut Vec<Slot>,
        slot: Slot,
        point: Point3<f64>,
    ) -> bool {
        if winding.contains(&slot) {
            return true;
        }
        let n = winding.len();
        for i in 0..n {
            let u = self.position_of(mesh, winding[i]);
            let v = self.position_of(mesh, winding[(i + 1) % n]);
            let uv = v - u;
            let len_squared = uv.norm_squared();
            if len_squared < f64::EPSILON {
                continue;
            }
            let t = (point - u).dot(&uv) / len_squared;
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let closest = u + uv * t;
            if (closest - point).norm() < ON_SEGMENT_DISTANCE {
                winding.insert(i + 1, slot);
                return true;
            }
        }
        false
    }

    fn cut_face(&mut self, mesh: &Mesh, cut: &FaceCut) -> SubdivideResult<()> {
        let (winding, properties) = self
            .winding_of(mesh, cut.face_id)
            .ok_or(SubdivideError::UnknownFace(cut.face_id))?;

        let entry = self.resolve(mesh, &winding, cut.entry.point);
        let exit = self.resolve(mesh, &winding, cut.exit.point);
        if entry == exit {
            return Err(SubdivideError::ZeroWidthCut);
        }

        let mut ring = winding;
        if !self.insert_on_boundary(mesh, &mut ring, entry, cut.entry.point)
            || !self.insert_on_boundary(mesh, &mut ring, exit, cut.exit.point)
        {
            return Err(SubdivideError::DegenerateSlice);
        }

        // Split the ring at the two cut vertices; both halves keep them.
        let pi = ring.iter().position(|s| *s == entry).ok_or(SubdivideError::DegenerateSlice)?;
        let qi = ring.iter().position(|s| *s == exit).ok_or(SubdivideError::DegenerateSlice)?;
        let n = ring.len();
        let mut first: Vec<Slot> = Vec::new();
        let mut k = pi;
        loop {
            first.push(ring[k]);
            if k == qi {
                break;
            }
            k = (k + 1) % n;
        }
        let mut second: Vec<Slot> = Vec::new();
        let mut k = qi;
        loop {
            second.push(ring[k]);
            if k == pi {
                break;
            }
            k = (k + 1) % n;
        }

        if first.len() < 3 || second.len() < 3 {
            return Err(SubdivideError::ZeroWidthCut);
        }

        self.changed.insert(cut.face_id, (first, properties));
        self.added.push((second, properties));

        // New cut vertices also join every other face sharing the
        // original edge, so neighbors keep matching windings.
        for edge_cut in [&cut.entry, &cut.exit] {
            // Only freshly created cut vertices propagate; a reused
            // vertex is already part of the surrounding topology.
            let Some(slot) = self.resolve_existing(edge_cut.point) else {
                continue;
            };
            for other_id in mesh.faces_for_edge(edge_cut.edge_start, edge_cut.edge_end) {
                if other_id == cut.face_id {
                    continue;
                }
                if let Some((mut other_winding, other_properties)) =
                    self.winding_of(mesh, other_id)
                {
                    if self.insert_on_boundary(mesh, &mut other_winding, slot, edge_cut.point) {
                        self.changed.insert(other_id, (other_winding, other_properties));
                    }
                }
            }
            // The split's own second half was planned before the
            // insertion ran; patch any added winding that carries the
            // segment too.
            let mut added = std::mem::take(&mut self.added);
            for (winding, _) in &mut added {
                let _ = self.insert_on_boundary(mesh, winding, slot, edge_cut.point);
            }
            self.added = added;
        }
        Ok(())
    }

    /// Look up an already-resolved slot for a point, without creating one.
    fn resolve_existing(&self, point: Point3<f64>) -> Option<Slot> {
        self.new_points
            .iter()
            .position(|p| (p - point).norm_squared() < CUT_REUSE_DISTANCE_SQUARED)
            .map(Slot::New)
    }
}
