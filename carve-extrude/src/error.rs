//! Error types for extrusion.

use thiserror::Error;

use carve_types::{FaceId, OperationError};

/// Result type for extrusion operations.
pub type ExtrudeResult<T> = Result<T, ExtrudeError>;

/// Errors raised while guiding or committing an extrusion.
#[derive(Debug, Error)]
pub enum ExtrudeError {
    /// The grabbed face does not exist in the mesh.
    #[error("unknown face {0}")]
    UnknownFace(FaceId),

    /// The grabbed face has no usable normal or area.
    #[error("face {0} is degenerate")]
    DegenerateFace(FaceId),

    /// An input arrived in a state that cannot accept it.
    #[error("extruder cannot {action} while {state}")]
    InvalidState {
        /// What was attempted.
        action: &'static str,
        /// The state the extruder was in.
        state: &'static str,
    },

    /// The underlying transaction rejected an edit.
    #[error(transparent)]
    Operation(#[from] OperationError),
}
