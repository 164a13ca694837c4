//! Snapshots handed from the interactive thread to the worker.

use hashbrown::HashSet;

use carve_types::{Mesh, VertexId};

/// One mesh's state mid-gesture: the naive clone and which vertices the
/// user has moved.
///
/// The clone is owned by the snapshot; the worker never touches the
/// interactive thread's live meshes.
#[derive(Debug, Clone)]
pub struct MeshSnapshot {
    /// Naively mutated clone of the mesh.
    pub mesh: Mesh,
    /// Ids of the vertices the gesture has moved.
    pub moved: HashSet<VertexId>,
}

impl MeshSnapshot {
    /// Bundle a naive clone with its moved-vertex set.
    #[must_use]
    pub fn new(mesh: Mesh, moved: HashSet<VertexId>) -> Self {
        Self { mesh, moved }
    }
}

/// Everything one frame wants validated: one snapshot per affected mesh.
pub type SnapshotBatch = Vec<MeshSnapshot>;
