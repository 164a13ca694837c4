//! Core types for the solidcarve editing kernel.
//!
//! This crate provides the boundary representation that every edit
//! operation works against:
//!
//! - [`Mesh`] - A solid bounded by polygonal faces, with id-keyed vertex
//!   and face tables and an incrementally maintained reverse index
//! - [`Vertex`] / [`Face`] - The elements of the boundary representation
//! - [`GeometryOperation`] - A transaction that batches primitive edits
//!   and applies them atomically on commit
//! - [`EdgeKey`] / [`VertexKey`] / [`FaceKey`] - Scene-wide element keys
//! - [`Aabb`], [`Plane`], polygon helpers, grid snapping - The geometric
//!   primitives the edit algorithms are built from
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system** with three nested frames:
//!
//! - *Mesh-local*: relative to a mesh's own offset + rotation
//! - *Model*: the shared scene frame (`Mesh::mesh_to_model`)
//! - *World*: model plus the scene's overall [`WorldTransform`]
//!
//! Face winding is **counter-clockwise (CCW) when viewed from outside**.
//! Normals point outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use carve_types::{Mesh, MeshId, FaceProperties, Point3};
//!
//! let mut mesh = Mesh::new(MeshId(1));
//! let mut op = mesh.start_operation();
//! let a = op.add_vertex_in_mesh_space(Point3::new(0.0, 0.0, 0.0));
//! let b = op.add_vertex_in_mesh_space(Point3::new(1.0, 0.0, 0.0));
//! let c = op.add_vertex_in_mesh_space(Point3::new(0.0, 1.0, 0.0));
//! op.add_face(&[a.id, b.id, c.id], FaceProperties::default()).unwrap();
//! op.commit();
//!
//! assert_eq!(mesh.vertex_count(), 3);
//! assert_eq!(mesh.face_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod error;
mod face;
mod grid;
mod ids;
mod keys;
mod mesh;
mod operation;
mod plane;
mod polygon;
mod vertex;

pub use bounds::Aabb;
pub use error::{OperationError, OperationResult};
pub use face::{Face, FaceProperties};
pub use grid::{snap_length, snap_point, snap_vector, GRID_UNIT};
pub use ids::{FaceId, GroupId, MeshId, VertexId};
pub use keys::{EdgeKey, FaceKey, VertexKey};
pub use mesh::{unit_cube, Mesh, WorldTransform};
pub use operation::GeometryOperation;
pub use plane::{points_are_coplanar, Plane, COPLANAR_TOLERANCE};
pub use polygon::{
    ear_clip_triangulation, fan_triangulation, is_simple_projection, plane_basis,
    polygon_centroid, polygon_newell_normal, polygon_normal,
};
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};
