//! Model mutation commands.

use hashbrown::HashMap;

use carve_types::{FaceId, FaceProperties, Mesh, MeshId};

/// A mutation of the canonical model.
///
/// Commands are the only way the store changes; each is validated before
/// it applies and a [`Composite`](Command::Composite) applies all of its
/// children or none of them.
#[derive(Debug, Clone)]
pub enum Command {
    /// Insert a new mesh.
    AddMesh(Mesh),
    /// Replace the stored mesh carrying the same id.
    ReplaceMesh(Mesh),
    /// Remove a mesh.
    DeleteMesh(MeshId),
    /// Rewrite properties of individual faces.
    ChangeFaceProperties {
        /// The mesh to retag.
        mesh_id: MeshId,
        /// New properties per face id.
        changes: HashMap<FaceId, FaceProperties>,
    },
    /// Apply several commands as one atomic unit.
    Composite(Vec<Command>),
}

impl Command {
    /// Wrap per-mesh replacements into one atomic composite.
    #[must_use]
    pub fn replace_all(meshes: impl IntoIterator<Item = Mesh>) -> Self {
        Self::Composite(meshes.into_iter().map(Self::ReplaceMesh).collect())
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddMesh(_) => "add-mesh",
            Self::ReplaceMesh(_) => "replace-mesh",
            Self::DeleteMesh(_) => "delete-mesh",
            Self::ChangeFaceProperties { .. } => "change-face-properties",
            Self::Composite(_) => "composite",
        }
    }
}
