//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! used throughout the graphics system.

mod binding;
mod buffer;
mod common;
mod sampler;
mod texture;

pub use binding::ShaderStageFlags;
pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::Extent3d;
pub use sampler::{AddressMode, CompareFunction, FilterMode, SamplerDescriptor, SamplerKey};
pub use texture::{
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsage, TextureViewType,
};
