//! The three deletion surgeries.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use carve_repair::is_valid_mesh;
use carve_types::{polygon_centroid, FaceId, Mesh, VertexId};

use crate::error::{DeleteError, DeleteResult};

/// Delete a face by merging its vertices into one.
///
/// The face's vertices collapse into a single new vertex at their
/// average position. Every neighboring face that shared at least one
/// vertex is rebuilt: its first shared vertex becomes the merged vertex
/// and any further shared vertices are dropped. Neighbors left with
/// fewer than three distinct vertices are removed entirely.
///
/// Returns the replacement mesh; the input is untouched.
///
/// # Errors
///
/// [`DeleteError::UnknownFace`] for a missing face and
/// [`DeleteError::InvalidResult`] when the rebuilt region fails
/// validation. Either way nothing is mutated.
pub fn delete_face(mesh: &Mesh, face_id: FaceId) -> DeleteResult<Mesh> {
    let face = mesh
        .face(face_id)
        .ok_or(DeleteError::UnknownFace(face_id))?;
    let doomed: HashSet<VertexId> = face.vertex_ids.iter().copied().collect();
    let positions = mesh.winding_positions(&face.vertex_ids);
    let merged_position = polygon_centroid(&positions);

    // Neighbors: every other face referencing any of the doomed vertices
    let mut neighbor_ids: HashSet<FaceId> = HashSet::new();
    for &v in &doomed {
        neighbor_ids.extend(mesh.faces_for_vertex(v));
    }
    neighbor_ids.remove(&face_id);
    let mut neighbor_ids: Vec<FaceId> = neighbor_ids.into_iter().collect();
    neighbor_ids.sort_unstable();

    debug!(%face_id, neighbors = neighbor_ids.len(), "deleting face");

    let mut result = mesh.clone();
    let mut op = result.start_operation();
    let merged = op.add_vertex_in_mesh_space(merged_position);
    op.delete_face(face_id)?;

    let mut touched: HashSet<VertexId> = HashSet::new();
    touched.insert(merged.id);
    for neighbor_id in neighbor_ids {
        let Some(neighbor) = mesh.face(neighbor_id) else {
            continue;
        };
        // Substitute the first shared vertex, drop the rest
        let mut winding: Vec<VertexId> = Vec::with_capacity(neighbor.vertex_count());
        let mut substituted = false;
        for &v in &neighbor.vertex_ids {
            if doomed.contains(&v) {
                if !substituted {
                    winding.push(merged.id);
                    substituted = true;
                }
            } else {
                winding.push(v);
            }
        }

        let distinct: HashSet<&VertexId> = winding.iter().collect();
        if distinct.len() < 3 {
            op.delete_face(neighbor_id)?;
        } else {
            touched.extend(winding.iter().copied());
            op.modify_face(neighbor_id, &winding, neighbor.properties)?;
        }
    }

    for &v in &doomed {
        op.delete_vertex(v)?;
    }
    op.commit();

    if is_valid_mesh(&result, Some(&touched)) {
        Ok(result)
    } else {
        Err(DeleteError::InvalidResult)
    }
}

/// Delete an edge by splicing its two incident faces into one.
///
/// The merged face walks the first face from just past the shared edge
/// around to its other endpoint, then the second face the same way. As
/// a special case, an edge appearing twice inside a single face (an
/// internal chord left by a faulty split) is excised directly.
///
/// Returns the replacement mesh; the input is untouched.
///
/// # Errors
///
/// [`DeleteError::EdgeNotDeletable`] when the edge is not bordered by
/// exactly two faces (and is no internal chord), plus
/// [`DeleteError::InvalidResult`] when the merged face fails validation.
pub fn delete_edge(mesh: &Mesh, a: VertexId, b: VertexId) -> DeleteResult<Mesh> {
    let incident = mesh.faces_for_edge(a, b);

    // Internal chord: both directions of the edge inside one face
    if incident.len() == 1 {
        let face_id = incident[0];
        if let Some(winding) = excise_internal_chord(mesh, face_id, a, b) {
            return finish_single_face(mesh, face_id, winding);
        }
        return Err(DeleteError::EdgeNotDeletable(a, b));
    }

    let [first_id, second_id] = incident.as_slice() else {
        return Err(DeleteError::EdgeNotDeletable(a, b));
    };
    let (first, second) = match (mesh.face(*first_id), mesh.face(*second_id)) {
        (Some(f), Some(s)) => (f, s),
        _ => return Err(DeleteError::EdgeNotDeletable(a, b)),
    };

    let winding = splice_across_edge(&first.vertex_ids, &second.vertex_ids)
        .ok_or(DeleteError::EdgeNotDeletable(a, b))?;

    debug!(edge = ?(a, b), keep = %first_id, drop = %second_id, "deleting edge");

    let mut result = mesh.clone();
    let mut op = result.start_operation();
    op.modify_face(first.id, &winding, first.properties)?;
    op.delete_face(second.id)?;
    op.commit();

    let touched: HashSet<VertexId> = winding.into_iter().collect();
    if is_valid_mesh(&result, Some(&touched)) {
        Ok(result)
    } else {
        Err(DeleteError::InvalidResult)
    }
}

/// Delete a vertex by stitching all faces around it into one.
///
/// Each incident face contributes the run of its vertices between the
/// deleted vertex's two neighbors; the runs are chained in adjacency
/// order, each starting where the previous one ended, until every
/// incident face is consumed.
///
/// Returns the replacement mesh; the input is untouched.
///
/// # Errors
///
/// [`DeleteError::VertexNotDeletable`] when the incident faces do not
/// chain into a single ring, plus [`DeleteError::InvalidResult`] when
/// the stitched face fails validation.
pub fn delete_vertex(mesh: &Mesh, vertex: VertexId) -> DeleteResult<Mesh> {
    if mesh.vertex(vertex).is_none() {
        return Err(DeleteError::UnknownVertex(vertex));
    }
    let mut incident: Vec<FaceId> = mesh.faces_for_vertex(vertex).collect();
    incident.sort_unstable();
    if incident.len() < 2 {
        return Err(DeleteError::VertexNotDeletable(vertex));
    }

    // Per face, the run of vertices from just after `vertex` around to
    // just before it, keyed by the run's start for the adjacency chain.
    let mut run_by_start: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
    for &face_id in &incident {
        let Some(face) = mesh.face(face_id) else {
            return Err(DeleteError::VertexNotDeletable(vertex));
        };
        let w = &face.vertex_ids;
        let occurrences = w.iter().filter(|&&v| v == vertex).count();
        if occurrences != 1 {
            return Err(DeleteError::VertexNotDeletable(vertex));
        }
        let Some(at) = w.iter().position(|&v| v == vertex) else {
            return Err(DeleteError::VertexNotDeletable(vertex));
        };
        let n = w.len();
        let run: Vec<VertexId> = (1..n).map(|k| w[(at + k) % n]).collect();
        let Some(&start) = run.first() else {
            return Err(DeleteError::VertexNotDeletable(vertex));
        };
        if run_by_start.insert(start, run).is_some() {
            return Err(DeleteError::VertexNotDeletable(vertex));
        }
    }

    // Chain the runs: the first face's run, then whichever face's run
    // starts at the current end.
    let Some(first_face) = incident.first().and_then(|id| mesh.face(*id)) else {
        return Err(DeleteError::VertexNotDeletable(vertex));
    };
    let first_start = {
        let w = &first_face.vertex_ids;
        let Some(at) = w.iter().position(|&v| v == vertex) else {
            return Err(DeleteError::VertexNotDeletable(vertex));
        };
        w[(at + 1) % w.len()]
    };

    let Some(mut stitched) = run_by_start.remove(&first_start) else {
        return Err(DeleteError::VertexNotDeletable(vertex));
    };
    while !run_by_start.is_empty() {
        let Some(&last) = stitched.last() else {
            return Err(DeleteError::VertexNotDeletable(vertex));
        };
        let Some(run) = run_by_start.remove(&last) else {
            return Err(DeleteError::VertexNotDeletable(vertex));
        };
        stitched.extend(run.into_iter().skip(1));
    }
    if stitched.first() == stitched.last() {
        stitched.pop();
    }
    let distinct: HashSet<&VertexId> = stitched.iter().collect();
    if distinct.len() != stitched.len() || stitched.len() < 3 {
        return Err(DeleteError::VertexNotDeletable(vertex));
    }

    debug!(%vertex, faces = incident.len(), "deleting vertex");

    let properties = first_face.properties;
    let mut result = mesh.clone();
    let mut op = result.start_operation();
    for &face_id in &incident {
        op.delete_face(face_id)?;
    }
    op.add_face(&stitched, properties)?;
    op.delete_vertex(vertex)?;
    op.commit();

    let touched: HashSet<VertexId> = stitched.into_iter().collect();
    if is_valid_mesh(&result, Some(&touched)) {
        Ok(result)
    } else {
        Err(DeleteError::InvalidResult)
    }
}

/// Remove the second traversal of an edge that a single face walks in
/// both directions.
fn excise_internal_chord(
    mesh: &Mesh,
    face_id: FaceId,
    a: VertexId,
    b: VertexId,
) -> Option<Vec<VertexId>> {
    let face = mesh.face(face_id)?;
    let w = &face.vertex_ids;
    let n = w.len();
    // A chord is walked in both directions by the same winding
    if !(0..n).any(|i| w[i] == a && w[(i + 1) % n] == b) {
        return None;
    }
    let backward = (0..n).find(|&i| w[i] == b && w[(i + 1) % n] == a)?;

    let drop_first = backward;
    let drop_second = (backward + 1) % n;
    let mut winding: Vec<VertexId> = (0..n)
        .filter(|&i| i != drop_first && i != drop_second)
        .map(|i| w[i])
        .collect();
    // The excision can leave the same vertex twice in a row
    winding.dedup();
    if winding.len() > 1 && winding.first() == winding.last() {
        winding.pop();
    }

    if winding.len() < 3 {
        return None;
    }
    Some(winding)
}

/// Apply a rewritten winding to one face and validate around it.
fn finish_single_face(
    mesh: &Mesh,
    face_id: FaceId,
    winding: Vec<VertexId>,
) -> DeleteResult<Mesh> {
    let properties = mesh
        .face(face_id)
        .map(|f| f.properties)
        .ok_or(DeleteError::UnknownFace(face_id))?;
    let mut result = mesh.clone();
    let mut op = result.start_operation();
    op.modify_face(face_id, &winding, properties)?;
    op.commit();

    let touched: HashSet<VertexId> = winding.into_iter().collect();
    if is_valid_mesh(&result, Some(&touched)) {
        Ok(result)
    } else {
        Err(DeleteError::InvalidResult)
    }
}

/// Splice two windings that share exactly the edge `(a, b)`.
///
/// Walks the first face starting just after the shared edge until its
/// other endpoint, then the second face the same way.
fn splice_across_edge(first: &[VertexId], second: &[VertexId]) -> Option<Vec<VertexId>> {
    let n1 = first.len();
    let n2 = second.len();
    for i in 0..n1 {
        let a = first[i];
        let b = first[(i + 1) % n1];
        let Some(j) = (0..n2).find(|&j| second[j] == b && second[(j + 1) % n2] == a) else {
            continue;
        };

        let mut winding = Vec::with_capacity(n1 + n2 - 2);
        for k in 0..n1 {
            winding.push(first[(i + 1 + k) % n1]);
        }
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
