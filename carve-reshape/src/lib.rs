//! Free-form reshaping.
//!
//! The user grabs vertices (directly, or implied by grabbed edges and
//! faces) and drags them. Every frame the [`Reshaper`] writes candidate
//! positions into naive clones, hands them to the background validation
//! pipeline, and assembles a preview: the last known-valid state when
//! one exists, the naive state otherwise, plus an error outline overlay
//! while the current drag is invalid.
//!
//! Releasing commits a composite replace command covering every mesh
//! the gesture touched, but only when all of them have a known-valid
//! state that the model accepts; otherwise everything is discarded.
//! One invalid mesh discards the whole gesture.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod grab;
mod outline;
mod reshape;

pub use error::{ReshapeError, ReshapeResult};
pub use grab::GrabSelection;
pub use outline::error_outline;
pub use reshape::{ControllerFrame, FramePreview, Reshaper, SnapMode};
