//! Error types for mesh mutation.

use thiserror::Error;

use crate::ids::{FaceId, VertexId};

/// Result type for transaction edits.
pub type OperationResult<T> = Result<T, OperationError>;

/// Errors raised while queueing edits on a [`GeometryOperation`].
///
/// These indicate a caller bug (referencing elements that do not exist,
/// building malformed faces), not geometric infeasibility. Geometric
/// infeasibility is reported by the individual edit operations.
///
/// [`GeometryOperation`]: crate::GeometryOperation
#[derive(Debug, Error)]
pub enum OperationError {
    /// Referenced vertex does not exist in the mesh or transaction.
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// Referenced face does not exist in the mesh or transaction.
    #[error("unknown face {0}")]
    UnknownFace(FaceId),

    /// Referenced vertex was deleted earlier in this transaction.
    #[error("vertex {0} was deleted in this transaction")]
    VertexDeleted(VertexId),

    /// Referenced face was deleted earlier in this transaction.
    #[error("face {0} was deleted in this transaction")]
    FaceDeleted(FaceId),

    /// A face needs at least three distinct vertices.
    #[error("face needs at least 3 distinct vertices, got {distinct} (of {supplied} supplied)")]
    FaceTooSmall {
        /// Number of distinct vertex ids supplied.
        distinct: usize,
        /// Total number of vertex ids supplied.
        supplied: usize,
    },

    /// Two cyclically consecutive vertex ids in a face winding are equal.
    #[error("face winding repeats vertex {0} in consecutive positions")]
    RepeatedVertex(VertexId),

    /// A vertex cannot be deleted while faces still reference it.
    #[error("vertex {vertex} is still referenced by {face_count} face(s)")]
    VertexInUse {
        /// The vertex that was asked to be deleted.
        vertex: VertexId,
        /// How many faces still reference it.
        face_count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OperationError::UnknownVertex(VertexId(4));
        assert_eq!(format!("{err}"), "unknown vertex v4");

        let err = OperationError::VertexInUse {
            vertex: VertexId(2),
            face_count: 3,
        };
        let display = format!("{err}");
        assert!(display.contains("v2"));
        assert!(display.contains("3 face(s)"));
    }
}
