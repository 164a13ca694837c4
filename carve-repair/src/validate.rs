//! Mesh validity checks.
//!
//! Invalid geometry is a normal state during live editing, so the checks
//! here report violations as values and never mutate or fail.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use carve_types::{
    points_are_coplanar, polygon_newell_normal, Face, FaceId, Mesh, VertexId,
    COPLANAR_TOLERANCE,
};

use crate::adjacency::EdgeAdjacency;

/// Faces with less than this area are considered degenerate.
pub const DEGENERATE_AREA_TOLERANCE: f64 = 1e-12;

/// A reason a mesh failed validation.
///
/// Not an error type: validity is queried, not enforced, and callers
/// decide whether to commit or to keep showing the last-good state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshViolation {
    /// A face's vertices do not lie on a common plane.
    NonPlanarFace(FaceId),
    /// A face has near-zero area.
    DegenerateFace(FaceId),
    /// A face has too few distinct vertices, consecutive repeats, or a
    /// dangling vertex reference.
    MalformedFace(FaceId),
    /// Two faces span the identical vertex set.
    DuplicateFace(FaceId, FaceId),
    /// An edge is bordered by more than two faces.
    NonManifoldEdge(VertexId, VertexId),
}

impl std::fmt::Display for MeshViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPlanarFace(id) => write!(f, "face {id} is not planar"),
            Self::DegenerateFace(id) => write!(f, "face {id} has near-zero area"),
            Self::MalformedFace(id) => write!(f, "face {id} is malformed"),
            Self::DuplicateFace(a, b) => {
                write!(f, "faces {a} and {b} span the same vertex set")
            }
            Self::NonManifoldEdge(a, b) => {
                write!(f, "edge ({a}, {b}) is bordered by more than two faces")
            }
        }
    }
}

/// Find the first violation in a mesh, scoped to touched geometry.
///
/// With `touched` set, only faces referencing a touched vertex are
/// inspected; manifold and duplicate checks still count untouched
/// neighbors so the answer matches a whole-mesh check for any defect a
/// touched vertex can introduce. With `touched = None` the whole mesh is
/// checked.
#[must_use]
pub fn find_violation(mesh: &Mesh, touched: Option<&HashSet<VertexId>>) -> Option<MeshViolation> {
    let candidates: Vec<FaceId> = match touched {
        Some(vertices) => {
            let mut ids: HashSet<FaceId> = HashSet::new();
            for &v in vertices {
                ids.extend(mesh.faces_for_vertex(v));
            }
            ids.into_iter().collect()
        }
        None => mesh.faces().map(|f| f.id).collect(),
    };

    for &face_id in &candidates {
        let Some(face) = mesh.face(face_id) else {
            continue;
        };
        if let Some(violation) = check_face(mesh, face) {
            debug!(%violation, "mesh validation failed");
            return Some(violation);
        }
    }

    if let Some(violation) = find_duplicate_face(mesh, &candidates) {
        debug!(%violation, "mesh validation failed");
        return Some(violation);
    }

    let manifold = match touched {
        Some(_) => find_non_manifold_edge(mesh, &candidates),
        // Whole-mesh check: one adjacency build beats a reverse-index
        // intersection per edge
        None => EdgeAdjacency::build(mesh)
            .non_manifold_edges()
            .next()
            .map(|(a, b)| MeshViolation::NonManifoldEdge(a, b)),
    };
    if let Some(violation) = manifold {
        debug!(%violation, "mesh validation failed");
        return Some(violation);
    }

    None
}

/// Whether a mesh passes validation, scoped to touched geometry.
///
/// See [`find_violation`] for the scoping rules and the list of checks.
#[must_use]
pub fn is_valid_mesh(mesh: &Mesh, touched: Option<&HashSet<VertexId>>) -> bool {
    find_violation(mesh, touched).is_none()
}

/// Per-face structural and geometric checks.
fn check_face(mesh: &Mesh, face: &Face) -> Option<MeshViolation> {
    let ids = &face.vertex_ids;
    let n = ids.len();
    if n < 3 {
        return Some(MeshViolation::MalformedFace(face.id));
    }
    for i in 0..n {
        if ids[i] == ids[(i + 1) % n] {
            return Some(MeshViolation::MalformedFace(face.id));
        }
    }
    if ids.iter().collect::<HashSet<_>>().len() < 3 {
        return Some(MeshViolation::MalformedFace(face.id));
    }

    let positions = mesh.winding_positions(ids);
    if positions.len() != n {
        // Dangling vertex reference
        return Some(MeshViolation::MalformedFace(face.id));
    }

    // Half the Newell normal's length is the polygon area.
    let area = polygon_newell_normal(&positions).norm() * 0.5;
    if area < DEGENERATE_AREA_TOLERANCE {
        return Some(MeshViolation::DegenerateFace(face.id));
    }

    if n > 3 && !points_are_coplanar(&positions, COPLANAR_TOLERANCE) {
        return Some(MeshViolation::NonPlanarFace(face.id));
    }

    None
}

/// Look for a second face spanning the same vertex set as a candidate.
fn find_duplicate_face(mesh: &Mesh, candidates: &[FaceId]) -> Option<MeshViolation> {
    for &face_id in candidates {
        let Some(face) = mesh.face(face_id) else {
            continue;
        };
        let Some(&first_vertex) = face.vertex_ids.first() else {
            continue;
        };
        let signature = face.sorted_vertex_ids();
        // Any duplicate must share every vertex, so scanning one
        // vertex's incident faces is exhaustive.
        for other_id in mesh.faces_for_vertex(first_vertex) {
            if other_id == face_id {
                continue;
            }
            let Some(other) = mesh.face(other_id) else {
                continue;
            };
            if other.sorted_vertex_ids() == signature {
                return Some(MeshViolation::DuplicateFace(face_id, other_id));
            }
        }
    }
    None
}

/// Count incident faces per candidate edge across the whole mesh.
fn find_non_manifold_edge(mesh: &Mesh, candidates: &[FaceId]) -> Option<MeshViolation> {
    let mut checked: HashMap<(VertexId, VertexId), usize> = HashMap::new();
    for &face_id in candidates {
        let Some(face) = mesh.face(face_id) else {
            continue;
        };
        for (a, b) in face.edges() {
            let key = if a < b { (a, b) } else { (b, a) };
            let count = checked
                .entry(key)
                .or_insert_with(|| mesh.faces_for_edge(a, b).len());
            if *count > 2 {
                return Some(MeshViolation::NonManifoldEdge(key.0, key.1));
            }
        }
    }
    None
}
