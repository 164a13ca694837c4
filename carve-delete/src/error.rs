//! Error types for deletion surgery.

use thiserror::Error;

use carve_types::{FaceId, OperationError, VertexId};

/// Result type for deletion operations.
pub type DeleteResult<T> = Result<T, DeleteError>;

/// Errors raised by deletion surgery.
///
/// All of these leave the source mesh untouched.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// The target face does not exist.
    #[error("unknown face {0}")]
    UnknownFace(FaceId),

    /// The target vertex does not exist.
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// The edge is not bordered by exactly two faces and is not an
    /// internal chord.
    #[error("edge ({0}, {1}) cannot be deleted")]
    EdgeNotDeletable(VertexId, VertexId),

    /// The faces around the vertex cannot be stitched into one ring.
    #[error("faces around {0} do not form a stitchable ring")]
    VertexNotDeletable(VertexId),

    /// The surgery produced geometry that fails validation.
    #[error("deletion would leave invalid geometry")]
    InvalidResult,

    /// The underlying transaction rejected an edit.
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DeleteError::EdgeNotDeletable(VertexId(1), VertexId(2));
        assert_eq!(format!("{err}"), "edge (v1, v2) cannot be deleted");
    }
}
