//! Repair of naively mutated meshes.
//!
//! A drag edit moves vertices without regard for face planarity. The
//! fixer walks every face touching a moved vertex and restores planar
//! geometry: bent polygons are retriangulated into planar pieces, and
//! pieces of an earlier split whose fold has been flattened back out are
//! recombined, dropping the redundant shared edge.

use hashbrown::HashSet;
use tracing::debug;

use carve_types::{
    ear_clip_triangulation, fan_triangulation, points_are_coplanar, FaceId, FaceProperties,
    Mesh, VertexId, COPLANAR_TOLERANCE,
};

/// Knobs for [`fix_mutated_mesh`].
#[derive(Debug, Clone, Copy)]
pub struct FixParams {
    /// Retriangulate faces whose vertices no longer share a plane.
    pub split_non_coplanar: bool,
    /// Recombine previously split faces that have become coplanar again.
    pub merge_coplanar: bool,
}

impl Default for FixParams {
    fn default() -> Self {
        Self {
            split_non_coplanar: true,
            merge_coplanar: true,
        }
    }
}

impl FixParams {
    /// Create parameters with both passes enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether bent faces are split.
    #[must_use]
    pub const fn with_split_non_coplanar(mut self, split: bool) -> Self {
        self.split_non_coplanar = split;
        self
    }

    /// Set whether flattened splits are merged back.
    #[must_use]
    pub const fn with_merge_coplanar(mut self, merge: bool) -> Self {
        self.merge_coplanar = merge;
        self
    }
}

/// Counts of what a fix pass changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixSummary {
    /// Bent faces retriangulated into planar pieces.
    pub faces_split: usize,
    /// Face pairs recombined across a redundant edge.
    pub faces_merged: usize,
}

impl FixSummary {
    /// Whether the fixer changed the mesh at all.
    #[must_use]
    pub const fn was_changed(&self) -> bool {
        self.faces_split > 0 || self.faces_merged > 0
    }
}

impl std::fmt::Display for FixSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fix: {} face(s) split, {} pair(s) merged",
            self.faces_split, self.faces_merged
        )
    }
}

/// Restore a geometrically sound mesh after a naive mutation.
///
/// `original` is the last known-good state the mutation started from;
/// `moved` is the set of vertex ids whose positions were changed. The
/// mesh is mutated in place through its own transactions.
///
/// Faces that exist in `original` and were coplanar neighbors there are
/// never merged: only pieces created by an earlier split qualify, so
/// intentional subdivisions survive the fixer.
pub fn fix_mutated_mesh(
    original: &Mesh,
    mutated: &mut Mesh,
    moved: &HashSet<VertexId>,
    params: &FixParams,
) -> FixSummary {
    let mut summary = FixSummary::default();

    if params.split_non_coplanar {
        summary.faces_split = split_bent_faces(mutated, moved);
    }
    if params.merge_coplanar {
        summary.faces_merged = merge_flattened_faces(original, mutated, moved);
    }

    debug!(%summary, mesh = %mutated.id(), "fixed mutated mesh");
    summary
}

/// Ids of faces referencing any moved vertex.
fn touched_faces(mesh: &Mesh, moved: &HashSet<VertexId>) -> Vec<FaceId> {
    let mut ids: HashSet<FaceId> = HashSet::new();
    for &v in moved {
        ids.extend(mesh.faces_for_vertex(v));
    }
    let mut ids: Vec<FaceId> = ids.into_iter().collect();
    ids.sort_unstable();
    ids
}

struct SplitPlan {
    face_id: FaceId,
    winding: Vec<VertexId>,
    triangles: Vec<[usize; 3]>,
    properties: FaceProperties,
}

fn split_bent_faces(mutated: &mut Mesh, moved: &HashSet<VertexId>) -> usize {
    let mut plans: Vec<SplitPlan> = Vec::new();
    for face_id in touched_faces(mutated, moved) {
        let Some(face) = mutated.face(face_id) else {
            continue;
        };
        if face.vertex_count() <= 3 {
            continue;
        }
        let positions = mutated.winding_positions(&face.vertex_ids);
        if points_are_coplanar(&positions, COPLANAR_TOLERANCE) {
            continue;
        }
        let triangles = ear_clip_triangulation(&positions)
            .unwrap_or_else(|| fan_triangulation(positions.len()));
        if triangles.is_empty() {
            continue;
        }
        plans.push(SplitPlan {
            face_id,
            winding: face.vertex_ids.to_vec(),
            triangles,
            properties: face.properties,
        });
    }

    if plans.is_empty() {
        return 0;
    }

    let mut split = 0;
    let mut op = mutated.start_operation();
    for plan in &plans {
        let windings: Vec<Vec<VertexId>> = plan
            .triangles
            .iter()
            .map(|tri| tri.iter().map(|&i| plan.winding[i]).collect())
            .collect();

        // The first piece keeps the original face id, the rest are fresh
        // faces. A bent winding that revisits a vertex can yield an
        // unbuildable piece; those are skipped and left to the validator.
        let mut applied = false;
        for (i, winding) in windings.iter().enumerate() {
            let result = if i == 0 {
                op.modify_face(plan.face_id, winding, plan.properties)
            } else {
                op.add_face(winding, plan.properties).map(|_| ())
            };
            match result {
                Ok(()) => applied = true,
                Err(err) => debug!(face = %plan.face_id, %err, "skipping split piece"),
            }
        }
        if applied {
            split += 1;
        }
    }
    op.commit();
    split
}

fn merge_flattened_faces(original: &Mesh, mutated: &mut Mesh, moved: &HashSet<VertexId>) -> usize {
    let mut merged = 0;
    loop {
        let Some((keep, drop, winding)) = find_mergeable_pair(original, mutated, moved) else {
            break;
        };
        let properties = match mutated.face(keep) {
            Some(face) => face.properties,
            None => break,
        };
        let mut op = mutated.start_operation();
        let applied = op.modify_face(keep, &winding, properties).is_ok()
            && op.delete_face(drop).is_ok();
        if applied {
            op.commit();
            merged += 1;
        } else {
            break;
        }
    }
    merged
}

/// Find one pair of faces that can be recombined, returning the id to
/// keep, the id to drop, and the merged winding.
fn find_mergeable_pair(
    original: &Mesh,
    mutated: &Mesh,
    moved: &HashSet<VertexId>,
) -> Option<(FaceId, FaceId, Vec<VertexId>)> {
    // Merge candidates: faces touching a moved vertex plus every face
    // the fixer itself created (absent from the original).
    let mut candidates: HashSet<FaceId> = touched_faces(mutated, moved).into_iter().collect();
    candidates.extend(
        mutated
            .faces()
            .filter(|f| original.face(f.id).is_none())
            .map(|f| f.id),
    );
    let mut candidates: Vec<FaceId> = candidates.into_iter().collect();
    candidates.sort_unstable();

    for &face_id in &candidates {
        let Some(face) = mutated.face(face_id) else {
            continue;
        };
        for (a, b) in face.edges() {
            let incident = mutated.faces_for_edge(a, b);
            let [f1, f2] = incident.as_slice() else {
                continue;
            };
            let other_id = if *f1 == face_id { *f2 } else { *f1 };
            let other = match mutated.face(other_id) {
                Some(other) => other,
                None => continue,
            };
            if other.properties != face.properties {
                continue;
            }
            // Two faces that both existed before the mutation are an
            // intentional subdivision, not a leftover split.
            if original.face(face_id).is_some() && original.face(other_id).is_some() {
                continue;
            }
            let Some(winding) = merge_windings(&face.vertex_ids, &other.vertex_ids) else {
                continue;
            };
            let positions = mutated.winding_positions(&winding);
            if positions.len() != winding.len()
                || !points_are_coplanar(&positions, COPLANAR_TOLERANCE)
            {
                continue;
            }
            return Some((face_id, other_id, winding));
        }
    }
    None
}

/// Splice two windings across their shared edge, dropping the edge.
///
/// Looks for a directed edge `(a, b)` in `first` whose reverse `(b, a)`
/// appears in `second`; the merged winding walks `first` from `b` around
/// to `a`, then `second`'s vertices strictly between `a` and `b`.
/// Returns `None` when no such edge exists or the merged winding would
/// repeat a vertex (the pair shares more than a single edge run).
fn merge_windings(first: &[VertexId], second: &[VertexId]) -> Option<Vec<VertexId>> {
    let n1 = first.len();
    let n2 = second.len();
    for i in 0..n1 {
        let a = first[i];
        let b = first[(i + 1) % n1];
        let Some(j) = (0..n2).find(|&j| second[j] == b && second[(j + 1) % n2] == a) else {
            continue;
        };

        let mut winding = Vec::with_capacity(n1 + n2 - 2);
        // All of `first`, starting at b
        for k in 0..n1 {
            winding.push(first[(i + 1 + k) % n1]);
        }
        // `second` strictly between a and b
        for k in 0..n2 - 2 {
            winding.push(second[(j + 2 + k) % n2]);
        }

        let distinct: HashSet<&VertexId> = winding.iter().collect();
        if distinct.len() != winding.len() {
            return None;
        }
        return Some(winding);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_types::{unit_cube, MeshId, Point3, Vector3};
    use crate::validate::is_valid_mesh;

    /// Pull one cube corner out of plane and return (original, mutated, moved).
    fn bent_cube() -> (Mesh, Mesh, HashSet<VertexId>, Point3<f64>) {
        let original = unit_cube(MeshId(0));
        let mut mutated = original.clone();
        let corner = mutated.vertices().next().unwrap().id;
        let before = mutated.vertex_position(corner).unwrap();
        let mut op = mutated.start_operation();
        op.modify_vertex(corner, before + Vector3::new(0.07, 0.0, 0.11))
            .unwrap();
        op.commit();
        let moved: HashSet<_> = [corner].into_iter().collect();
        (original, mutated, moved, before)
    }

    #[test]
    fn splits_bent_faces_into_planar_pieces() {
        let (original, mut mutated, moved, _) = bent_cube();
        assert!(!is_valid_mesh(&mutated, Some(&moved)));

        let summary = fix_mutated_mesh(&original, &mut mutated, &moved, &FixParams::default());

        assert_eq!(summary.faces_split, 3); // three quads meet at a cube corner
        assert!(is_valid_mesh(&mutated, Some(&moved)));
        // Each bent quad became two triangles
        assert_eq!(mutated.face_count(), 9);
    }

    #[test]
    fn split_disabled_leaves_mesh_alone() {
        let (original, mut mutated, moved, _) = bent_cube();
        let faces_before = mutated.face_count();

        let params = FixParams::new()
            .with_split_non_coplanar(false)
            .with_merge_coplanar(false);
        let summary = fix_mutated_mesh(&original, &mut mutated, &moved, &params);

        assert!(!summary.was_changed());
        assert_eq!(mutated.face_count(), faces_before);
        assert!(!is_valid_mesh(&mutated, Some(&moved)));
    }

    #[test]
    fn flattening_back_out_merges_the_splits() {
        let (original, mut mutated, moved, before) = bent_cube();
        fix_mutated_mesh(&original, &mut mutated, &moved, &FixParams::default());
        assert_eq!(mutated.face_count(), 9);

        // User drags the corner back to where it started
        let corner = *moved.iter().next().unwrap();
        let mut op = mutated.start_operation();
        op.modify_vertex(corner, before).unwrap();
        op.commit();

        let summary = fix_mutated_mesh(&original, &mut mutated, &moved, &FixParams::default());

        assert_eq!(summary.faces_split, 0);
        assert_eq!(summary.faces_merged, 3);
        assert_eq!(mutated.face_count(), 6);
        assert!(is_valid_mesh(&mutated, None));
    }

    #[test]
    fn intentional_coplanar_neighbors_are_not_merged() {
        // Two coplanar quads sharing an edge, both present in the
        // original: the fixer must leave them split.
        let mut mesh = Mesh::new(MeshId(0));
        let mut op = mesh.start_operation();
        let p: Vec<VertexId> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.5, 0.0),
            Point3::new(0.0, 0.5, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
        .into_iter()
        .map(|pos| op.add_vertex_in_mesh_space(pos).id)
        .collect();
        op.add_face(&[p[0], p[1], p[2], p[3]], FaceProperties::default())
            .unwrap();
        op.add_face(&[p[3], p[2], p[4], p[5]], FaceProperties::default())
            .unwrap();
        op.commit();

        let original = mesh.clone();
        let moved: HashSet<_> = [p[2], p[3]].into_iter().collect();
        let summary = fix_mutated_mesh(&original, &mut mesh, &moved, &FixParams::default());

        assert_eq!(summary.faces_merged, 0);
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn merge_windings_splices_across_shared_edge() {
        // Quad [0,1,2,3] and quad [3,2,4,5] share edge (2,3)
        let first: Vec<VertexId> = [0, 1, 2, 3].into_iter().map(VertexId).collect();
        let second: Vec<VertexId> = [3, 2, 4, 5].into_iter().map(VertexId).collect();

        let merged = merge_windings(&first, &second).unwrap();
        assert_eq!(merged.len(), 6);
        // Result is the hexagon around both quads; check the shared edge
        // (2,3) no longer appears consecutively
        let n = merged.len();
        for i in 0..n {
            let (a, b) = (merged[i], merged[(i + 1) % n]);
            assert!(
                !(a == VertexId(2) && b == VertexId(3))
                    && !(a == VertexId(3) && b == VertexId(2)),
                "shared edge survived: {merged:?}"
            );
        }
    }

    #[test]
    fn merge_windings_rejects_double_shared_edges() {
        // Triangles sharing two edges would pinch into a degenerate winding
        let first: Vec<VertexId> = [0, 1, 2].into_iter().map(VertexId).collect();
        let second: Vec<VertexId> = [2, 1, 0].into_iter().map(VertexId).collect();
        assert!(merge_windings(&first, &second).is_none());
    }
}
