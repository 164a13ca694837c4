//! Uniform scaling of mesh batches.

use tracing::debug;

use carve_types::{Mesh, Point3, Vector3, GRID_UNIT};

use crate::error::{TransformError, TransformResult};

/// Smallest largest-dimension a mesh may be scaled down to.
///
/// Anything smaller than two grid cells becomes effectively ungrabbable.
pub const MIN_SCALED_EXTENT: f64 = 2.0 * GRID_UNIT;

/// Uniformly scale a batch of meshes about their shared centroid.
///
/// Every vertex position is multiplied by `factor` in mesh-local space
/// and each mesh's offset is moved along the centroid-to-offset vector
/// by the same factor, so the batch scales as one rigid arrangement.
/// Returns transformed copies; the inputs are untouched.
///
/// Normals cannot change under a uniform scale, so the commit skips
/// recalculation and the bounds are patched analytically.
///
/// # Errors
///
/// [`TransformError::InvalidScaleFactor`] for a non-positive or
/// non-finite factor, and [`TransformError::BelowMinimumSize`] when
/// scaling down would take any mesh's largest bounding-box dimension
/// below [`MIN_SCALED_EXTENT`]. On error nothing is scaled.
pub fn scale_meshes(meshes: &[Mesh], factor: f64) -> TransformResult<Vec<Mesh>> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(TransformError::InvalidScaleFactor(factor));
    }

    // Refusal check first so the whole batch is all-or-nothing
    if factor < 1.0 {
        for mesh in meshes {
            let extent = mesh.bounds().max_extent() * factor;
            if extent < MIN_SCALED_EXTENT {
                return Err(TransformError::BelowMinimumSize {
                    mesh_id: mesh.id(),
                    extent,
                });
            }
        }
    }

    let centroid = shared_centroid(meshes);
    debug!(count = meshes.len(), factor, "scaling mesh batch");

    let mut scaled = Vec::with_capacity(meshes.len());
    for mesh in meshes {
        let mut copy = mesh.clone();

        let updates: Vec<_> = copy
            .vertices()
            .map(|v| (v.id, Point3::from(v.position.coords * factor)))
            .collect();
        let mut op = copy.start_operation();
        // Ids come straight from the live vertex table
        let _ = op.modify_vertices(updates);
        op.commit_without_recalculation();

        copy.set_bounds(mesh.bounds().scaled_about(Point3::origin(), factor));
        copy.offset = centroid + (mesh.offset - centroid) * factor;
        scaled.push(copy);
    }
    Ok(scaled)
}

/// Average of the batch's placement offsets.
fn shared_centroid(meshes: &[Mesh]) -> Vector3<f64> {
    if meshes.is_empty() {
        return Vector3::zeros();
    }
    meshes
        .iter()
        .fold(Vector3::zeros(), |acc, m| acc + m.offset)
        / meshes.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_types::{unit_cube, MeshId};

    #[test]
    fn scale_doubles_positions_and_bounds() {
        let cube = unit_cube(MeshId(0));
        let scaled = scale_meshes(&[cube.clone()], 2.0).unwrap();

        assert_eq!(scaled.len(), 1);
        let scaled = &scaled[0];
        assert!((scaled.bounds().max_extent() - 2.0).abs() < 1e-12);
        for vertex in scaled.vertices() {
            let original = cube.vertex_position(vertex.id).unwrap();
            assert!((vertex.position.coords - original.coords * 2.0).norm() < 1e-12);
        }
        // Input untouched
        assert!((cube.bounds().max_extent() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scale_preserves_normals() {
        let cube = unit_cube(MeshId(0));
        let scaled = scale_meshes(&[cube.clone()], 3.0).unwrap();
        for face in cube.faces() {
            let scaled_normal = scaled[0].face(face.id).unwrap().normal;
            assert_eq!(scaled_normal, face.normal);
        }
    }

    #[test]
    fn batch_scales_about_shared_centroid() {
        let mut a = unit_cube(MeshId(0));
        a.offset = Vector3::new(-1.0, 0.0, 0.0);
        let mut b = unit_cube(MeshId(1));
        b.offset = Vector3::new(1.0, 0.0, 0.0);

        let scaled = scale_meshes(&[a, b], 2.0).unwrap();
        // Centroid is the origin, offsets double away from it
        assert!((scaled[0].offset - Vector3::new(-2.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((scaled[1].offset - Vector3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn refuses_to_shrink_below_minimum() {
        let cube = unit_cube(MeshId(0));
        // 1.0 * 0.01 = one grid unit, below the 2-unit floor
        let result = scale_meshes(&[cube.clone()], 0.01);
        assert!(matches!(
            result,
            Err(TransformError::BelowMinimumSize { .. })
        ));
        // No mutation on refusal: the input is a borrow, nothing to check,
        // but the factor just above the floor must pass.
        assert!(scale_meshes(&[cube], 0.021).is_ok());
    }

    #[test]
    fn rejects_bad_factors() {
        let cube = unit_cube(MeshId(0));
        assert!(matches!(
            scale_meshes(&[cube.clone()], 0.0),
            Err(TransformError::InvalidScaleFactor(_))
        ));
        assert!(matches!(
            scale_meshes(&[cube], f64::NAN),
            Err(TransformError::InvalidScaleFactor(_))
        ));
    }
}
