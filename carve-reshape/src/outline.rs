//! The error outline overlay.
//!
//! While the background validator reports the drag invalid, the faces
//! participating in the drag are shown in the error tint; faces the
//! gesture does not touch are stripped so the overlay hugs the problem
//! area.

use hashbrown::{HashMap, HashSet};

use carve_model::{PreviewMesh, VertexColor};
use carve_types::{FaceId, Mesh, Point3, VertexId};

/// Build the overlay for one naive mesh: only faces touching a moved
/// vertex, colored as an error.
///
/// Returns `None` when no face touches the moved set.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
// Truncation: overlay vertex counts stay far below u32::MAX
pub fn error_outline(mesh: &Mesh, moved: &HashSet<VertexId>) -> Option<PreviewMesh> {
    let mut face_ids: HashSet<FaceId> = HashSet::new();
    for &v in moved {
        face_ids.extend(mesh.faces_for_vertex(v));
    }
    if face_ids.is_empty() {
        return None;
    }
    let mut face_ids: Vec<FaceId> = face_ids.into_iter().collect();
    face_ids.sort_unstable();

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut index_of: HashMap<VertexId, u32> = HashMap::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();

    for face_id in face_ids {
        let Some(face) = mesh.face(face_id) else {
            continue;
        };
        let indices: Vec<u32> = face
            .vertex_ids
            .iter()
            .filter_map(|&id| {
                let position = mesh.vertex_position(id)?;
                Some(*index_of.entry(id).or_insert_with(|| {
                    positions.push(mesh.mesh_to_model(position));
                    positions.len() as u32 - 1
                }))
            })
            .collect();
        if indices.len() != face.vertex_count() {
            continue;
        }
        for i in 1..indices.len() - 1 {
            triangles.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    if triangles.is_empty() {
        return None;
    }
    let colors = vec![VertexColor::ERROR; positions.len()];
    Some(PreviewMesh {
        positions,
        triangles,
        colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_types::{unit_cube, MeshId};

    #[test]
    fn outline_covers_only_touching_faces() {
        let cube = unit_cube(MeshId(0));
        let corner = cube.vertices().next().unwrap().id;
        let moved: HashSet<_> = [corner].into_iter().collect();

        let outline = error_outline(&cube, &moved).unwrap();

        // Three quads meet at a cube corner: 6 triangles over 7 vertices
        assert_eq!(outline.triangles.len(), 6);
        assert_eq!(outline.positions.len(), 7);
        assert!(outline.colors.iter().all(|c| *c == VertexColor::ERROR));
    }

    #[test]
    fn no_touching_faces_is_none() {
        let cube = unit_cube(MeshId(0));
        let moved: HashSet<VertexId> = [VertexId(99)].into_iter().collect();
        assert!(error_outline(&cube, &moved).is_none());
    }
}
