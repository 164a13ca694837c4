//! Face extrusion.
//!
//! Grabbing a face and pulling it out (or pushing it in) grows a new
//! volume: one side face per original edge plus a cap where the grabbed
//! face ends up. The extruded face can also be scaled toward its
//! centroid while guiding; when it shrinks far enough that side quads
//! would self-intersect, they collapse into triangles and the collapse
//! propagates around the ring, ending in a clean cone at size zero.
//!
//! [`FaceExtruder`] is the per-grab state machine
//! (idle, guiding, committing) driven by discrete inputs;
//! [`build_extrusion_sides`] and [`extrude_face`] are the geometry
//! underneath it.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod extrude;
mod params;
mod sides;

pub use error::{ExtrudeError, ExtrudeResult};
pub use extrude::{extrude_face, ExtruderState, FaceExtruder};
pub use params::{ExtrusionParams, ExtrusionSize};
pub use sides::{build_extrusion_sides, ExtrusionSide, MERGE_DISTANCE};
