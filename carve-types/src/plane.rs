//! Planes and coplanarity tests.

use nalgebra::{Point3, Vector3};

use crate::polygon::polygon_newell_normal;

/// Maximum point-to-plane distance at which geometry still counts as
/// coplanar, in model units.
pub const COPLANAR_TOLERANCE: f64 = 1e-4;

/// An infinite plane in Hessian normal form: `normal · p + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Signed offset from the origin along the normal.
    pub d: f64,
}

impl Plane {
    /// Create a plane from a unit normal and a point on the plane.
    #[must_use]
    pub fn from_normal_and_point(normal: Vector3<f64>, point: Point3<f64>) -> Self {
        Self {
            normal,
            d: -normal.dot(&point.coords),
        }
    }

    /// Best-fit plane through a polygon's vertices, via the Newell normal.
    ///
    /// Returns `None` when the points are too close to collinear (or too
    /// few) to define a plane.
    #[must_use]
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let newell = polygon_newell_normal(points);
        let norm = newell.norm();
        if norm < f64::EPSILON {
            return None;
        }
        let normal = newell / norm;

        let inv = 1.0 / points.len() as f64;
        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            * inv;
        Some(Self {
            normal,
            d: -normal.dot(&centroid),
        })
    }

    /// Signed distance from a point to the plane.
    ///
    /// Positive on the side the normal points into.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.d
    }

    /// Orthogonal projection of a point onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }

    /// Whether every point lies within `tolerance` of the plane.
    #[must_use]
    pub fn contains_points(&self, points: &[Point3<f64>], tolerance: f64) -> bool {
        points
            .iter()
            .all(|p| self.signed_distance(p).abs() <= tolerance)
    }

    /// Parameter `t` in `(0, 1)` where the open segment `a..b` strictly
    /// crosses the plane, or `None` if it does not.
    #[must_use]
    pub fn segment_crossing(&self, a: &Point3<f64>, b: &Point3<f64>) -> Option<f64> {
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        if da * db >= 0.0 {
            return None;
        }
        Some(da / (da - db))
    }
}

/// Whether a polygon's vertices all lie on one plane within `tolerance`.
///
/// Degenerate point sets that define no plane at all are reported as
/// non-coplanar.
#[must_use]
pub fn points_are_coplanar(points: &[Point3<f64>], tolerance: f64) -> bool {
    match Plane::from_points(points) {
        Some(plane) => plane.contains_points(points, tolerance),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bent_quad() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.5),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn plane_through_unit_square() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let plane = Plane::from_points(&points).unwrap();
        assert!((plane.normal - Vector3::z()).norm() < 1e-12);
        assert!(plane.contains_points(&points, COPLANAR_TOLERANCE));
    }

    #[test]
    fn bent_quad_is_not_coplanar() {
        assert!(!points_are_coplanar(&bent_quad(), COPLANAR_TOLERANCE));
    }

    #[test]
    fn collinear_points_define_no_plane() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(Plane::from_points(&points).is_none());
        assert!(!points_are_coplanar(&points, COPLANAR_TOLERANCE));
    }

    #[test]
    fn projection_lands_on_plane() {
        let plane = Plane::from_normal_and_point(Vector3::z(), Point3::new(0.0, 0.0, 2.0));
        let projected = plane.project(&Point3::new(3.0, 4.0, 7.0));
        assert!((projected - Point3::new(3.0, 4.0, 2.0)).norm() < 1e-12);
        assert!(plane.signed_distance(&projected).abs() < 1e-12);
    }

    #[test]
    fn segment_crossing_param() {
        let plane = Plane::from_normal_and_point(Vector3::z(), Point3::origin());
        let t = plane
            .segment_crossing(&Point3::new(0.0, 0.0, -1.0), &Point3::new(0.0, 0.0, 3.0))
            .unwrap();
        assert!((t - 0.25).abs() < 1e-12);

        // Touching without crossing
        assert!(plane
            .segment_crossing(&Point3::new(0.0, 0.0, 0.0), &Point3::new(0.0, 0.0, 1.0))
            .is_none());
    }
}
