//! Error types for reshaping.

use thiserror::Error;

use carve_model::ModelError;
use carve_types::{MeshId, OperationError};

/// Result type for reshape operations.
pub type ReshapeResult<T> = Result<T, ReshapeError>;

/// Errors raised by the reshape control loop.
#[derive(Debug, Error)]
pub enum ReshapeError {
    /// A gesture needs at least one grabbed element.
    #[error("nothing is grabbed")]
    EmptySelection,

    /// A grabbed element references a mesh the model does not hold.
    #[error("unknown {0}")]
    UnknownMesh(MeshId),

    /// Release without a known-valid state for every affected mesh; the
    /// whole gesture is discarded.
    #[error("release discarded: no valid state for every affected mesh")]
    InvalidRelease,

    /// The model rejected the replacement commit.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The underlying transaction rejected an edit.
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(format!("{}", ReshapeError::EmptySelection), "nothing is grabbed");
    }
}
