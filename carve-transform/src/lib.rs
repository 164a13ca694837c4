//! Whole-mesh transforms: uniform scaling and axis mirroring.
//!
//! Both operations take a batch of meshes and return transformed copies;
//! nothing is mutated in place and nothing touches the canonical store.
//! The caller turns the copies into replace commands.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod flip;
mod scale;

pub use error::{TransformError, TransformResult};
pub use flip::{flip_meshes, Axis};
pub use scale::{scale_meshes, MIN_SCALED_EXTENT};
