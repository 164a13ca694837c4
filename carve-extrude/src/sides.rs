//! Extrusion side construction and collapse merging.

use nalgebra::center;

use carve_types::{polygon_centroid, polygon_normal, FaceId, Mesh, Point3, VertexId};

use crate::error::{ExtrudeError, ExtrudeResult};
use crate::params::{ExtrusionParams, ExtrusionSize};

/// Two extrusion vertices closer than this collapse their side into a
/// triangle, in model units.
pub const MERGE_DISTANCE: f64 = 0.01;

/// One side of an extrusion in progress.
///
/// `base_left`/`base_right` are the original face's edge; the extrusion
/// points are where that edge's counterpart lands on the extruded face.
/// A collapsed side carries the same point on both extrusion slots.
#[derive(Debug, Clone, Copy)]
pub struct ExtrusionSide {
    /// First vertex of the original edge, in winding order.
    pub base_left: VertexId,
    /// Second vertex of the original edge.
    pub base_right: VertexId,
    /// Extruded counterpart of `base_left`.
    pub extrusion_left: Point3<f64>,
    /// Extruded counterpart of `base_right`.
    pub extrusion_right: Point3<f64>,
    /// Whether the side collapsed into a triangle.
    pub is_triangle: bool,
}

impl ExtrusionSide {
    /// Whether this side is a quad whose extrusion vertices have drawn
    /// close enough to collapse.
    #[must_use]
    pub fn requires_merge(&self) -> bool {
        !self.is_triangle
            && (self.extrusion_left - self.extrusion_right).norm() < MERGE_DISTANCE
    }

    /// The collapsed side's single extrusion point.
    #[must_use]
    pub const fn extrusion_point(&self) -> Point3<f64> {
        self.extrusion_left
    }
}

/// Build one extrusion side per edge of the grabbed face.
///
/// The extruded face is the original translated by the guidance (locked
/// to the normal when requested), rotated about its centroid, and scaled
/// toward the translated centroid by `size`. When the size was ever
/// decreased and two extrusion vertices of a quad fall within
/// [`MERGE_DISTANCE`], that side collapses to a triangle at their
/// midpoint and the collapse propagates circularly until a genuine quad
/// absorbs it on each flank; this repeats until no side requires a
/// merge. Returns the sides and whether any merge occurred.
///
/// # Errors
///
/// [`ExtrudeError::UnknownFace`] for a missing face and
/// [`ExtrudeError::DegenerateFace`] when the face has no usable normal.
pub fn build_extrusion_sides(
    mesh: &Mesh,
    face_id: FaceId,
    params: &ExtrusionParams,
    size: &ExtrusionSize,
) -> ExtrudeResult<(Vec<ExtrusionSide>, bool)> {
    let face = mesh
        .face(face_id)
        .ok_or(ExtrudeError::UnknownFace(face_id))?;
    let winding = face.vertex_ids.clone();
    let positions = mesh.winding_positions(&winding);
    if positions.len() != winding.len() {
        return Err(ExtrudeError::DegenerateFace(face_id));
    }
    let normal = polygon_normal(&positions).ok_or(ExtrudeError::DegenerateFace(face_id))?;

    let centroid = polygon_centroid(&positions);
    let translation = params.effective_translation(&normal);
    let rotation = params.effective_rotation();
    let target = centroid + translation;

    let extruded: Vec<Point3<f64>> = positions
        .iter()
        .map(|p| target + rotation * (p - centroid) * size.value())
        .collect();

    let n = winding.len();
    let mut sides: Vec<ExtrusionSide> = (0..n)
        .map(|i| ExtrusionSide {
            base_left: winding[i],
            base_right: winding[(i + 1) % n],
            extrusion_left: extruded[i],
            extrusion_right: extruded[(i + 1) % n],
            is_triangle: false,
        })
        .collect();

    let mut merged_any = false;
    if size.was_shrunk() {
        merged_any = merge_collapsed_sides(&mut sides);
    }
    Ok((sides, merged_any))
}

/// Collapse quad sides whose extrusion edge has shrunk away, until none
/// require a merge.
///
/// Each pass converts one quad into a triangle, so the loop runs at most
/// once per side.
fn merge_collapsed_sides(sides: &mut [ExtrusionSide]) -> bool {
    let n = sides.len();
    let mut merged_any = false;

    while let Some(i) = sides.iter().position(ExtrusionSide::requires_merge) {
        let mid = center(&sides[i].extrusion_left, &sides[i].extrusion_right);
        sides[i].extrusion_left = mid;
        sides[i].extrusion_right = mid;
        sides[i].is_triangle = true;
        merged_any = true;

        // Rightward: run through collapsed neighbors, stop at the first
        // genuine quad and move its shared vertex.
        let mut j = (i + 1) % n;
        while j != i {
            if sides[j].is_triangle {
                sides[j].extrusion_left = mid;
                sides[j].extrusion_right = mid;
                j = (j + 1) % n;
            } else {
                sides[j].extrusion_left = mid;
                break;
            }
        }

        // Leftward, same deal
        let mut j = (i + n - 1) % n;
        while j != i {
            if sides[j].is_triangle {
                sides[j].extrusion_left = mid;
                sides[j].extrusion_right = mid;
                j = (j + n - 1) % n;
            } else {
                sides[j].extrusion_right = mid;
                break;
            }
        }
    }
    merged_any
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_types::{FaceProperties, MeshId, Vector3};

    /// A regular polygon face with `n` sides and the given circumradius,
    /// in the z = 0 plane.
    fn polygon_mesh(n: usize, radius: f64) -> (Mesh, FaceId) {
        let mut mesh = Mesh::new(MeshId(0));
        let mut op = mesh.start_operation();
        let ids: Vec<VertexId> = (0..n)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                op.add_vertex_in_mesh_space(Point3::new(
                    radius * angle.cos(),
                    radius * angle.sin(),
                    0.0,
                ))
                .id
            })
            .collect();
        let face = op.add_face(&ids, FaceProperties::default()).unwrap();
        op.commit();
        (mesh, face.id)
    }

    fn shrunk_to(value: f64) -> ExtrusionSize {
        let mut size = ExtrusionSize::new();
        let mut guard = 0;
        while size.value() > value {
            size.shrink();
            guard += 1;
            assert!(guard < 100);
        }
        size
    }

    #[test]
    fn full_size_sides_are_quads() {
        let (mesh, face_id) = polygon_mesh(4, 1.0);
        let params = ExtrusionParams::new()
            .with_translation(Vector3::new(0.0, 0.0, 1.0))
            .with_lock_to_normal(true);

        let (sides, merged) = build_extrusion_sides(
            &mesh,
            face_id,
            &params,
            &ExtrusionSize::new(),
        )
        .unwrap();

        assert_eq!(sides.len(), 4);
        assert!(!merged);
        assert!(sides.iter().all(|s| !s.is_triangle));
        // Extrusion ring floats one unit above the base
        for side in &sides {
            assert!((side.extrusion_left.z - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn size_zero_collapses_to_cone() {
        let (mesh, face_id) = polygon_mesh(6, 1.0);
        let params =
            ExtrusionParams::new().with_translation(Vector3::new(0.0, 0.0, 1.0));
        let size = shrunk_to(0.0);

        let (sides, merged) = build_extrusion_sides(&mesh, face_id, &params, &size).unwrap();

        assert!(merged);
        assert!(sides.iter().all(|s| s.is_triangle));
        // Every side shares the single apex
        let apex = sides[0].extrusion_point();
        for side in &sides {
            assert!((side.extrusion_point() - apex).norm() < 1e-12);
        }
    }

    #[test]
    fn merge_converges_for_all_regular_polygons() {
        // Sweep the shrink ramp for 3..=12-gons; the merge loop must
        // terminate and leave no side still requiring a merge.
        for n in 3..=12 {
            let (mesh, face_id) = polygon_mesh(n, 0.5);
            let params =
                ExtrusionParams::new().with_translation(Vector3::new(0.0, 0.0, 0.4));

            let mut size = ExtrusionSize::new();
            loop {
                let (sides, _) =
                    build_extrusion_sides(&mesh, face_id, &params, &size).unwrap();
                assert!(
                    sides.iter().all(|s| !s.requires_merge()),
                    "{n}-gon at size {} left unmerged sides",
                    size.value()
                );
                if size.value() == 0.0 {
                    assert!(sides.iter().all(|s| s.is_triangle));
                    break;
                }
                size.shrink();
            }
        }
    }

    #[test]
    fn merge_inactive_without_shrinking() {
        // A tiny face yields short extrusion edges even at full size,
        // but merging must stay off until the user shrinks.
        let (mesh, face_id) = polygon_mesh(4, 0.002);
        let params =
            ExtrusionParams::new().with_translation(Vector3::new(0.0, 0.0, 0.1));

        let (sides, merged) =
            build_extrusion_sides(&mesh, face_id, &params, &ExtrusionSize::new()).unwrap();

        assert!(!merged);
        assert!(sides.iter().all(|s| !s.is_triangle));
    }

    #[test]
    fn unknown_face_is_rejected() {
        let (mesh, _) = polygon_mesh(4, 1.0);
        let result = build_extrusion_sides(
            &mesh,
            FaceId(99),
            &ExtrusionParams::new(),
            &ExtrusionSize::new(),
        );
        assert!(matches!(result, Err(ExtrudeError::UnknownFace(_))));
    }
}
