//! The shared slice primitive.
//!
//! A slice is an infinite line in a face's plane. Each vertex gets a
//! signed distance to the line; an edge is crossed where consecutive
//! vertices straddle zero, and the first two crossings found walking the
//! winding are the cut.

use carve_types::{polygon_centroid, polygon_normal, FaceId, Mesh, Point3, Vector3, VertexId};

/// An infinite slice line in a face's plane, in mesh-local space.
#[derive(Debug, Clone, Copy)]
pub struct SliceLine {
    /// A point the line passes through.
    pub start: Point3<f64>,
    /// The line's direction; need not be normalized.
    pub direction: Vector3<f64>,
}

impl SliceLine {
    /// Create a slice line.
    #[must_use]
    pub const fn new(start: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { start, direction }
    }
}

/// Where a slice crosses one edge of a face.
#[derive(Debug, Clone, Copy)]
pub struct EdgeCut {
    /// First endpoint of the crossed edge, in winding order.
    pub edge_start: VertexId,
    /// Second endpoint of the crossed edge.
    pub edge_end: VertexId,
    /// The crossing point, in mesh-local space.
    pub point: Point3<f64>,
}

/// A slice through one face: entry and exit edge crossings.
#[derive(Debug, Clone, Copy)]
pub struct FaceCut {
    /// The face being cut.
    pub face_id: FaceId,
    /// First crossing found walking the winding.
    pub entry: EdgeCut,
    /// Second crossing.
    pub exit: EdgeCut,
}

/// Slice a face along an in-plane line.
///
/// Evaluates the signed distance to the line at each vertex and reports
/// the first two straddling edges. Returns `None` when the face is
/// missing or degenerate, or when fewer than two edges are strictly
/// crossed (grazing a vertex ties the test to zero and produces no
/// crossing, which makes the whole operation a silent no-op).
#[must_use]
pub fn slice_face(mesh: &Mesh, face_id: FaceId, line: &SliceLine) -> Option<FaceCut> {
    let face = mesh.face(face_id)?;
    let winding = &face.vertex_ids;
    let positions = mesh.winding_positions(winding);
    if positions.len() != winding.len() {
        return None;
    }
    let normal = polygon_normal(&positions)?;

    // In-plane direction perpendicular to the slice line
    let across = normal.cross(&line.direction);
    if across.norm() < f64::EPSILON {
        return None;
    }

    let values: Vec<f64> = positions
        .iter()
        .map(|p| (p - line.start).dot(&across))
        .collect();

    let n = winding.len();
    let mut cuts: Vec<EdgeCut> = Vec::with_capacity(2);
    for i in 0..n {
        let (va, vb) = (values[i], values[(i + 1) % n]);
        if va * vb >= 0.0 {
            continue;
        }
        let t = va / (va - vb);
        let point = positions[i] + (positions[(i + 1) % n] - positions[i]) * t;
        cuts.push(EdgeCut {
            edge_start: winding[i],
            edge_end: winding[(i + 1) % n],
            point,
        });
        if cuts.len() == 2 {
            break;
        }
    }

    match cuts.as_slice() {
        [entry, exit] => Some(FaceCut {
            face_id,
            entry: *entry,
            exit: *exit,
        }),
        _ => None,
    }
}

/// Snap a slice start point to the face's nearest interesting point: a
/// vertex, an edge bisector, or the face center.
///
/// Returns the input unchanged for a missing or empty face.
#[must_use]
pub fn snap_slice_start(mesh: &Mesh, face_id: FaceId, start: Point3<f64>) -> Point3<f64> {
    let Some(face) = mesh.face(face_id) else {
        return start;
    };
    let positions = mesh.winding_positions(&face.vertex_ids);
    if positions.len() < 3 {
        return start;
    }

    let n = positions.len();
    let mut candidates: Vec<Point3<f64>> = Vec::with_capacity(2 * n + 1);
    for i in 0..n {
        candidates.push(positions[i]);
        candidates.push(nalgebra::center(&positions[i], &positions[(i + 1) % n]));
    }
    candidates.push(polygon_centroid(&positions));

    candidates
        .into_iter()
        .min_by(|a, b| {
            (a - start)
                .norm_squared()
                .total_cmp(&(b - start).norm_squared())
        })
        .unwrap_or(start)
}
