//! Grid snapping.
//!
//! Interactive edits can be locked to a regular lattice; these helpers
//! round positions, offsets, and lengths to it.

use nalgebra::{Point3, Vector3};

/// Edge length of one grid cell, in model units.
pub const GRID_UNIT: f64 = 0.01;

/// Round a length to the nearest multiple of [`GRID_UNIT`].
#[inline]
#[must_use]
pub fn snap_length(length: f64) -> f64 {
    (length / GRID_UNIT).round() * GRID_UNIT
}

/// Snap a point to the nearest grid intersection.
#[must_use]
pub fn snap_point(point: Point3<f64>) -> Point3<f64> {
    Point3::new(
        snap_length(point.x),
        snap_length(point.y),
        snap_length(point.z),
    )
}

/// Snap a translation to whole grid steps per axis.
#[must_use]
pub fn snap_vector(v: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(snap_length(v.x), snap_length(v.y), snap_length(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_nearest_cell() {
        assert!((snap_length(0.014) - 0.01).abs() < 1e-12);
        assert!((snap_length(0.016) - 0.02).abs() < 1e-12);
        assert!((snap_length(-0.004)).abs() < 1e-12);
    }

    #[test]
    fn snap_point_is_per_axis() {
        let snapped = snap_point(Point3::new(0.012, 0.018, -0.006));
        assert!((snapped.x - 0.01).abs() < 1e-12);
        assert!((snapped.y - 0.02).abs() < 1e-12);
        assert!((snapped.z - -0.01).abs() < 1e-12);
    }

    #[test]
    fn snapped_point_is_fixed_point() {
        let p = snap_point(Point3::new(0.33, -0.27, 0.08));
        assert_eq!(snap_point(p), p);
    }
}
