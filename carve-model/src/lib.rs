//! Canonical mesh store and scene services.
//!
//! The editing kernel mutates clones; this crate owns the real thing:
//!
//! - [`Model`] - the store of committed meshes, mutated only through
//!   [`Command`]s that validate before they apply
//! - [`MeshIndex`] - per-mesh bounding boxes with overlap, containment,
//!   and nearest queries
//! - [`PreviewMesh`] - the plain-geometry snapshot handed to the render
//!   layer (positions, triangle fans, per-vertex color)
//!
//! Commands are atomic on apply: a composite either passes validation as
//! a whole or changes nothing.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod command;
mod error;
mod model;
mod preview;
mod spatial;

pub use command::Command;
pub use error::{ModelError, ModelResult};
pub use model::{scene_bounds, Model, MAX_VERTICES_PER_MESH, SCENE_EXTENT};
pub use preview::{PreviewMesh, VertexColor};
pub use spatial::MeshIndex;
