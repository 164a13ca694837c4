//! Edge adjacency over polygonal faces.
//!
//! Lookups from an edge to the faces whose windings contain it, plus the
//! boundary and manifold queries built on top.

use hashbrown::HashMap;
use smallvec::SmallVec;

use carve_types::{FaceId, Mesh, VertexId};

/// Adjacency information for a mesh's edges.
///
/// A closed solid has every edge shared by exactly two faces; an edge
/// with one face borders a hole, and an edge with more than two faces is
/// non-manifold.
#[derive(Debug, Clone)]
pub struct EdgeAdjacency {
    edge_to_faces: HashMap<(VertexId, VertexId), SmallVec<[FaceId; 2]>>,
}

impl EdgeAdjacency {
    /// Build adjacency for every face of a mesh.
    #[must_use]
    pub fn build(mesh: &Mesh) -> Self {
        let mut edge_to_faces: HashMap<(VertexId, VertexId), SmallVec<[FaceId; 2]>> =
            HashMap::new();
        for face in mesh.faces() {
            for (a, b) in face.edges() {
                edge_to_faces
                    .entry(normalize_edge(a, b))
                    .or_default()
                    .push(face.id);
            }
        }
        Self { edge_to_faces }
    }

    /// Faces whose windings contain the edge `(a, b)`, in either direction.
    #[must_use]
    pub fn faces_for_edge(&self, a: VertexId, b: VertexId) -> &[FaceId] {
        self.edge_to_faces
            .get(&normalize_edge(a, b))
            .map_or(&[], SmallVec::as_slice)
    }

    /// Iterate edges bordered by exactly one face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Iterate edges bordered by more than two faces.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(&edge, _)| edge)
    }

    /// Whether every edge is bordered by at most two faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }

    /// Whether every edge is bordered by at least two faces.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() >= 2)
    }

    /// Total number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }
}

/// Normalize edge direction so the smaller vertex id comes first.
#[inline]
fn normalize_edge(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_types::{unit_cube, FaceProperties, MeshId, Point3};

    #[test]
    fn cube_is_closed_and_manifold() {
        let cube = unit_cube(MeshId(0));
        let adjacency = EdgeAdjacency::build(&cube);

        assert_eq!(adjacency.edge_count(), 12);
        assert!(adjacency.is_manifold());
        assert!(adjacency.is_closed());
        assert_eq!(adjacency.boundary_edges().count(), 0);
    }

    #[test]
    fn every_cube_edge_has_two_faces() {
        let cube = unit_cube(MeshId(0));
        let adjacency = EdgeAdjacency::build(&cube);
        for face in cube.faces() {
            for (a, b) in face.edges() {
                assert_eq!(adjacency.faces_for_edge(a, b).len(), 2);
            }
        }
    }

    #[test]
    fn lone_face_has_boundary_edges() {
        let mut mesh = carve_types::Mesh::new(MeshId(0));
        let mut op = mesh.start_operation();
        let a = op.add_vertex_in_mesh_space(Point3::new(0.0, 0.0, 0.0));
        let b = op.add_vertex_in_mesh_space(Point3::new(1.0, 0.0, 0.0));
        let c = op.add_vertex_in_mesh_space(Point3::new(0.0, 1.0, 0.0));
        op.add_face(&[a.id, b.id, c.id], FaceProperties::default())
            .unwrap();
        op.commit();

        let adjacency = EdgeAdjacency::build(&mesh);
        assert_eq!(adjacency.boundary_edges().count(), 3);
        assert!(!adjacency.is_closed());
        assert!(adjacency.is_manifold());
    }

    #[test]
    fn edge_lookup_is_direction_agnostic() {
        let cube = unit_cube(MeshId(0));
        let adjacency = EdgeAdjacency::build(&cube);
        let face = cube.faces().next().unwrap();
        let (a, b) = face.edges().next().unwrap();
        assert_eq!(
            adjacency.faces_for_edge(a, b),
            adjacency.faces_for_edge(b, a)
        );
    }
}
