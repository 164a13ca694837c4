//! Polygon geometry helpers.
//!
//! Faces are arbitrary planar polygons, so the edit algorithms need a
//! small toolbox: Newell normals, centroids, triangulation (fan for the
//! easy cases, ear clipping for reflex polygons), and a simplicity test
//! used to verify windings.

use nalgebra::{Point3, Vector3};

use crate::plane::Plane;

/// Newell normal of a polygon (unnormalized).
///
/// Robust for non-convex and slightly non-planar windings; the result's
/// direction follows the right-hand rule over the winding order.
#[must_use]
pub fn polygon_newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    let n = points.len();
    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// Outward unit normal of a polygon, or `None` for degenerate windings.
#[must_use]
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let newell = polygon_newell_normal(points);
    let norm = newell.norm();
    if norm < f64::EPSILON {
        None
    } else {
        Some(newell / norm)
    }
}

/// Vertex centroid of a polygon (average of its vertices).
#[must_use]
pub fn polygon_centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let inv = 1.0 / points.len() as f64;
    Point3::from(
        points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            * inv,
    )
}

/// Fan triangulation indices for a convex polygon of `n` vertices.
///
/// Triangles share vertex 0 and keep the polygon's winding.
#[must_use]
pub fn fan_triangulation(n: usize) -> Vec<[usize; 3]> {
    if n < 3 {
        return Vec::new();
    }
    (1..n - 1).map(|i| [0, i, i + 1]).collect()
}

/// An orthonormal basis spanning the plane orthogonal to `normal`.
#[must_use]
pub fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = normal.cross(&helper).normalize();
    let v = normal.cross(&u);
    (u, v)
}

/// Project polygon vertices into 2D coordinates on their best-fit plane.
fn project_to_plane_2d(points: &[Point3<f64>], plane: &Plane) -> Vec<[f64; 2]> {
    let (u, v) = plane_basis(&plane.normal);
    let origin = plane.project(&points[0]).coords;
    points
        .iter()
        .map(|p| {
            let rel = p.coords - origin;
            [rel.dot(&u), rel.dot(&v)]
        })
        .collect()
}

/// Twice the signed area of a 2D triangle.
fn signed_area_2d(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Ear-clip triangulation of a (possibly reflex) polygon.
///
/// Vertices are projected onto their best-fit plane and triangulated in
/// 2D. Output triangles keep the input winding. Returns `None` when the
/// polygon is degenerate or the triangulation fails.
#[must_use]
pub fn ear_clip_triangulation(points: &[Point3<f64>]) -> Option<Vec<[usize; 3]>> {
    if points.len() < 3 {
        return None;
    }
    let plane = Plane::from_points(points)?;
    let projected = project_to_plane_2d(points, &plane);

    let flat: Vec<f64> = projected.iter().flat_map(|p| [p[0], p[1]]).collect();
    let indices = earcutr::earcut(&flat, &[], 2).ok()?;
    if indices.len() < 3 {
        return None;
    }

    // Twice the signed area of the whole projected polygon; its sign is
    // the winding orientation earcut's output must agree with.
    let mut polygon_area = 0.0;
    let n = projected.len();
    for i in 0..n {
        let a = projected[i];
        let b = projected[(i + 1) % n];
        polygon_area += a[0].mul_add(b[1], -(b[0] * a[1]));
    }

    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let area = signed_area_2d(projected[a], projected[b], projected[c]);
        if area * polygon_area >= 0.0 {
            triangles.push([a, b, c]);
        } else {
            triangles.push([a, c, b]);
        }
    }
    Some(triangles)
}

/// Whether two open 2D segments properly intersect.
fn segments_properly_intersect(
    p0: [f64; 2],
    p1: [f64; 2],
    q0: [f64; 2],
    q1: [f64; 2],
) -> bool {
    let d1 = signed_area_2d(q0, q1, p0);
    let d2 = signed_area_2d(q0, q1, p1);
    let d3 = signed_area_2d(p0, p1, q0);
    let d4 = signed_area_2d(p0, p1, q1);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Whether a winding is a simple (non-self-intersecting) polygon when
/// projected onto its own best-fit plane.
///
/// Degenerate windings that define no plane are not simple.
#[must_use]
pub fn is_simple_projection(points: &[Point3<f64>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let Some(plane) = Plane::from_points(points) else {
        return false;
    };
    let projected = project_to_plane_2d(points, &plane);

    for i in 0..n {
        let (a0, a1) = (projected[i], projected[(i + 1) % n]);
        for j in (i + 1)..n {
            // Skip edges sharing an endpoint
            if j == i || (j + 1) % n == i || j == (i + 1) % n {
                continue;
            }
            let (b0, b1) = (projected[j], projected[(j + 1) % n]);
            if segments_properly_intersect(a0, a1, b0, b1) {
                return false;
            }
        }
    }
    true
}
