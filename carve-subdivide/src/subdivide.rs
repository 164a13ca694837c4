//! The three subdivision variants.

use hashbrown::HashSet;
use tracing::debug;

use carve_model::Model;
use carve_types::{FaceId, Mesh, MeshId, Plane, Point3, VertexId};

use crate::error::{SubdivideError, SubdivideResult};
use crate::plan::CutPlan;
use crate::slicer::{slice_face, snap_slice_start, EdgeCut, FaceCut, SliceLine};

/// Subdivide one face along a slice line.
///
/// The line is given in the mesh's local space. With `snap` set, the
/// line's start point is first rounded to the face's nearest interesting
/// point (vertex, edge bisector, or face center).
///
/// Returns the subdivided replacement mesh; the model is untouched and
/// the caller commits the replacement.
///
/// # Errors
///
/// [`SubdivideError::DegenerateSlice`] when the line does not cut the
/// face twice, [`SubdivideError::ZeroWidthCut`] when the cut collapses
/// onto an existing edge, [`SubdivideError::MeshRejected`] when the
/// result fails the model's add validation.
pub fn subdivide_face(
    model: &Model,
    mesh_id: MeshId,
    face_id: FaceId,
    line: &SliceLine,
    snap: bool,
) -> SubdivideResult<Mesh> {
    let mesh = model
        .mesh(mesh_id)
        .ok_or(SubdivideError::UnknownMesh(mesh_id))?;
    if mesh.face(face_id).is_none() {
        return Err(SubdivideError::UnknownFace(face_id));
    }

    let line = if snap {
        SliceLine::new(snap_slice_start(mesh, face_id, line.start), line.direction)
    } else {
        *line
    };
    let cut = slice_face(mesh, face_id, &line).ok_or(SubdivideError::DegenerateSlice)?;

    finish_mesh(model, mesh, &[cut])
}

/// Subdivide every face of every mesh the plane passes through.
///
/// The plane is given in model space; a face qualifies when the plane
/// strictly crosses at least two of its edges. Returns one replacement
/// mesh per mesh that was cut; meshes the plane misses are left out.
///
/// # Errors
///
/// As for [`subdivide_face`]; any failure aborts the whole batch with
/// nothing to commit.
pub fn subdivide_by_plane(model: &Model, plane: &Plane) -> SubdivideResult<Vec<Mesh>> {
    let mut meshes: Vec<&Mesh> = model.meshes().collect();
    meshes.sort_by_key(|m| m.id());

    let mut results = Vec::new();
    for mesh in meshes {
        // Carry the plane into this mesh's local frame
        let local_normal = mesh.rotation.inverse() * plane.normal;
        let local_point = mesh.model_to_mesh(Point3::from(plane.normal * -plane.d));
        let local_plane = Plane::from_normal_and_point(local_normal, local_point);

        let mut faces: Vec<&carve_types::Face> = mesh.faces().collect();
        faces.sort_by_key(|f| f.id);

        let mut cuts: Vec<FaceCut> = Vec::new();
        for face in faces {
            let winding = &face.vertex_ids;
            let positions = mesh.winding_positions(winding);
            if positions.len() != winding.len() {
                continue;
            }
            let n = winding.len();
            let mut crossings: Vec<EdgeCut> = Vec::with_capacity(2);
            for i in 0..n {
                let (a, b) = (&positions[i], &positions[(i + 1) % n]);
                if let Some(t) = local_plane.segment_crossing(a, b) {
                    crossings.push(EdgeCut {
                        edge_start: winding[i],
                        edge_end: winding[(i + 1) % n],
                        point: a + (b - a) * t,
                    });
                    if crossings.len() == 2 {
                        break;
                    }
                }
            }
            if let [entry, exit] = crossings.as_slice() {
                cuts.push(FaceCut {
                    face_id: face.id,
                    entry: *entry,
                    exit: *exit,
                });
            }
        }

        if cuts.is_empty() {
            continue;
        }
        results.push(finish_mesh(model, mesh, &cuts)?);
    }
    Ok(results)
}

/// Subdivide a ring of quads starting from one quad and an entry edge.
///
/// Each quad is cut from its entry edge to the opposite edge at a
/// consistent percentage, then the walk crosses to the face sharing the
/// exit edge. The walk stops when it revisits a face (loop closure) or
/// reaches a non-quad face; cuts gathered so far are still applied.
///
/// # Errors
///
/// [`SubdivideError::NotAQuad`] when the start face is not a quad,
/// [`SubdivideError::DegenerateSlice`] when `entry_edge` is not an edge
/// of the start face, plus the shared cut and validation errors.
pub fn subdivide_loop(
    model: &Model,
    mesh_id: MeshId,
    start_face: FaceId,
    entry_edge: (VertexId, VertexId),
    percent: f64,
) -> SubdivideResult<Mesh> {
    let mesh = model
        .mesh(mesh_id)
        .ok_or(SubdivideError::UnknownMesh(mesh_id))?;
    let face = mesh
        .face(start_face)
        .ok_or(SubdivideError::UnknownFace(start_face))?;
    if face.vertex_count() != 4 {
        return Err(SubdivideError::NotAQuad(start_face));
    }

    let mut cuts: Vec<FaceCut> = Vec::new();
    let mut visited: HashSet<FaceId> = HashSet::new();
    let mut current = start_face;
    let (mut edge_a, mut edge_b) = entry_edge;
    let mut percent = percent.clamp(0.0, 1.0);

    loop {
        let Some(face) = mesh.face(current) else {
            break;
        };
        // Triangulated caps end the loop
        if face.vertex_count() != 4 {
            break;
        }
        if !visited.insert(current) {
            break;
        }

        let w = &face.vertex_ids;
        let Some(i) = (0..4).find(|&i| {
            let (u, v) = (w[i], w[(i + 1) % 4]);
            (u, v) == (edge_a, edge_b) || (u, v) == (edge_b, edge_a)
        }) else {
            if cuts.is_empty() {
                return Err(SubdivideError::DegenerateSlice);
            }
            break;
        };

        // Percentage measured along the winding's own edge direction
        let t = if w[i] == edge_a { percent } else { 1.0 - percent };
        let positions = mesh.winding_positions(w);
        if positions.len() != 4 {
            break;
        }
        let entry_point = positions[i] + (positions[(i + 1) % 4] - positions[i]) * t;
        // The opposite edge runs the other way around the quad
        let exit_point =
            positions[(i + 2) % 4] + (positions[(i + 3) % 4] - positions[(i + 2) % 4]) * (1.0 - t);

        let (exit_a, exit_b) = (w[(i + 2) % 4], w[(i + 3) % 4]);
        cuts.push(FaceCut {
            face_id: current,
            entry: EdgeCut {
                edge_start: w[i],
                edge_end: w[(i + 1) % 4],
                point: entry_point,
            },
            exit: EdgeCut {
                edge_start: exit_a,
                edge_end: exit_b,
                point: exit_point,
            },
        });

        // Cross to the neighbor sharing the exit edge
        let incident = mesh.faces_for_edge(exit_a, exit_b);
        let Some(&next) = incident.iter().find(|&&id| id != current) else {
            break;
        };
        current = next;
        (edge_a, edge_b) = (exit_a, exit_b);
        percent = 1.0 - t;
    }

    debug!(cuts = cuts.len(), "loop subdivision walk finished");
    finish_mesh(model, mesh, &cuts)
}

/// Plan, apply to a clone, and gate on the model's add validation.
fn finish_mesh(model: &Model, mesh: &Mesh, cuts: &[FaceCut]) -> SubdivideResult<Mesh> {
    let plan = CutPlan::build(mesh, cuts)?;
    let mut replacement = mesh.clone();
    plan.apply(&mut replacement)?;
    if !model.can_add_mesh(&replacement) {
        return Err(SubdivideError::MeshRejected(mesh.id()));
    }
    Ok(replacement)
}
