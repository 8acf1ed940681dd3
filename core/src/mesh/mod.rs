//! CPU-side mesh types and generators.
//!
//! - [`Mesh`] - per-attribute vertex streams plus an index stream
//! - [`Submesh`] - a drawable range of a mesh with its local bounds
//! - Generators for common shapes (box, sphere, quad)

mod data;
pub mod generators;

pub use data::{Mesh, Submesh};
