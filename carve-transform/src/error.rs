//! Error types for whole-mesh transforms.

use thiserror::Error;

use carve_types::MeshId;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors raised by scaling and mirroring.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Scale factor must be positive and finite.
    #[error("invalid scale factor {0}")]
    InvalidScaleFactor(f64),

    /// Scaling down would make a mesh too small to grab.
    #[error("scaling would shrink {mesh_id} below the minimum extent ({extent:.4} model units)")]
    BelowMinimumSize {
        /// The mesh that would become too small.
        mesh_id: MeshId,
        /// Its largest dimension after the refused scale.
        extent: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TransformError::BelowMinimumSize {
            mesh_id: MeshId(2),
            extent: 0.003,
        };
        let display = format!("{err}");
        assert!(display.contains("mesh#2"));
        assert!(display.contains("0.0030"));
    }
}
