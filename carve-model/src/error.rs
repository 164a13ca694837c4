//! Error types for model commands.

use thiserror::Error;

use carve_types::{FaceId, MeshId};

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating or applying a [`Command`].
///
/// [`Command`]: crate::Command
#[derive(Debug, Error)]
pub enum ModelError {
    /// AddMesh with an id the model already holds.
    #[error("{0} already exists in the model")]
    MeshAlreadyExists(MeshId),

    /// Command referenced a mesh the model does not hold.
    #[error("{0} does not exist in the model")]
    UnknownMesh(MeshId),

    /// Command referenced a face the mesh does not have.
    #[error("{mesh_id} has no face {face_id}")]
    UnknownFace {
        /// The mesh the face was looked up in.
        mesh_id: MeshId,
        /// The missing face.
        face_id: FaceId,
    },

    /// Mesh failed the add validation (empty, oversized, or out of the
    /// scene volume).
    #[error("{0} was rejected by add validation")]
    MeshRejected(MeshId),
}
