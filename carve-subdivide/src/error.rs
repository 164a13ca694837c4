//! Error types for subdivision.

use thiserror::Error;

use carve_types::{FaceId, MeshId, OperationError};

/// Result type for subdivision operations.
pub type SubdivideResult<T> = Result<T, SubdivideError>;

/// Errors raised by the subdivision variants.
///
/// All of these abort with no mutation; the caller surfaces them as
/// user-facing error feedback.
#[derive(Debug, Error)]
pub enum SubdivideError {
    /// The target mesh is not in the model.
    #[error("unknown {0}")]
    UnknownMesh(MeshId),

    /// The target face does not exist.
    #[error("unknown face {0}")]
    UnknownFace(FaceId),

    /// The slice line misses the face or cuts it fewer than twice.
    #[error("slice line does not cut the face")]
    DegenerateSlice,

    /// Both cut points landed on an existing edge of the face.
    #[error("cut coincides with an existing edge")]
    ZeroWidthCut,

    /// Loop subdivision must start on a quad.
    #[error("face {0} is not a quad")]
    NotAQuad(FaceId),

    /// A subdivided mesh failed the model's add validation.
    #[error("subdivided {0} was rejected by the model")]
    MeshRejected(MeshId),

    /// The underlying transaction rejected an edit.
    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            format!("{}", SubdivideError::DegenerateSlice),
            "slice line does not cut the face"
        );
        assert_eq!(
            format!("{}", SubdivideError::NotAQuad(FaceId(2))),
            "face f2 is not a quad"
        );
    }
}
