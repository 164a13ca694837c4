//! Mesh subdivision.
//!
//! Three variants share one primitive: slice a face along an in-plane
//! line, producing two cut points on its edges.
//!
//! - **Single face** ([`subdivide_face`]): cut the hovered face once,
//!   optionally snapping the slice to a vertex, edge bisector, or the
//!   face center
//! - **Plane** ([`subdivide_by_plane`]): cut every face of every mesh a
//!   user-positioned plane passes through
//! - **Loop** ([`subdivide_loop`]): starting from a quad, keep cutting
//!   across the exit edge at a consistent percentage until the loop
//!   closes or a non-quad cap stops the walk
//!
//! Cut vertices are deduplicated positionally, both against the face's
//! own vertices and against cuts made earlier in the same batch, and new
//! vertices are inserted into every other face sharing the cut edge so
//! the surrounding topology stays consistent. A degenerate slice is a
//! silent no-op; a zero-width cut aborts with no mutation.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod plan;
mod slicer;
mod subdivide;

pub use error::{SubdivideError, SubdivideResult};
pub use plan::{CutPlan, CUT_REUSE_DISTANCE_SQUARED};
pub use slicer::{slice_face, snap_slice_start, EdgeCut, FaceCut, SliceLine};
pub use subdivide::{subdivide_by_plane, subdivide_face, subdivide_loop};
