//! Validity checks and repair for naively mutated meshes.
//!
//! Interactive edits move vertices without regard for the resulting
//! geometry. This crate reconciles the result back into a sound solid:
//!
//! - [`EdgeAdjacency`] - edge-to-face lookups over polygonal faces
//! - [`find_violation`] / [`is_valid_mesh`] - planarity, degeneracy,
//!   duplicate-face, and manifold checks, scoped to touched geometry
//! - [`fix_mutated_mesh`] - splits bent faces into planar pieces and
//!   recombines split faces that have flattened back out
//!
//! Invalidity is a normal, expected outcome during live editing: the
//! checks return it as a value and never mutate; only the fixer mutates,
//! through its own transaction on the mesh it is given.
//!
//! # Example
//!
//! ```
//! use carve_types::{unit_cube, MeshId, Point3};
//! use carve_repair::{fix_mutated_mesh, is_valid_mesh, FixParams};
//! use hashbrown::HashSet;
//!
//! let original = unit_cube(MeshId(0));
//! let mut mutated = original.clone();
//!
//! // Pull one corner of the cube out of its faces' planes
//! let corner = mutated.vertices().next().unwrap().id;
//! let mut op = mutated.start_operation();
//! let p = op.vertex_position(corner).unwrap();
//! op.modify_vertex(corner, p + carve_types::Vector3::new(0.0, 0.0, 0.4)).unwrap();
//! op.commit();
//!
//! let moved: HashSet<_> = [corner].into_iter().collect();
//! assert!(!is_valid_mesh(&mutated, Some(&moved)));
//!
//! fix_mutated_mesh(&original, &mut mutated, &moved, &FixParams::default());
//! assert!(is_valid_mesh(&mutated, Some(&moved)));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod adjacency;
mod fix;
mod validate;

pub use adjacency::EdgeAdjacency;
pub use fix::{fix_mutated_mesh, FixParams, FixSummary};
pub use validate::{find_violation, is_valid_mesh, MeshViolation, DEGENERATE_AREA_TOLERANCE};
