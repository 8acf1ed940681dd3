//! Built-in component types.
//!
//! These are the only components a [`World`](crate::World) can store; see
//! [`ComponentKind`](crate::ComponentKind) for the closed list.

mod hierarchy;
mod mesh_renderer;
mod name;
mod transform;

pub use hierarchy::{Children, Parent};
pub use mesh_renderer::MeshRenderer;
pub use name::Name;
pub use transform::{GlobalTransform, Transform};
