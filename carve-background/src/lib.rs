//! Background validation pipeline.
//!
//! Live reshaping mutates meshes every frame without regard for
//! validity. Blocking the interactive thread on repair would stutter
//! the hand, so validation runs on a worker thread instead:
//!
//! - The interactive thread [`offer`]s snapshot batches, best-effort:
//!   while the worker is busy the offer is dropped and the producer
//!   simply re-offers next frame (latest wins, stale drags are never
//!   validated)
//! - The worker fixes and validates each batch on its own clones and
//!   publishes two outputs: a lock-free [`Validity`] word and the last
//!   known-good mesh set, swapped wholesale as an immutable map
//! - [`stop`] wakes the worker, waits for it to exit, and freezes the
//!   last-good state at whatever was computed most recently
//!
//! [`offer`]: BackgroundValidator::offer
//! [`stop`]: BackgroundValidator::stop

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod pipeline;
mod snapshot;

pub use pipeline::{BackgroundValidator, PipelineState, Validity};
pub use snapshot::{MeshSnapshot, SnapshotBatch};
