//! # Vellum Graphics
//!
//! Rendering hardware interface and GPU scene synchronization for the Vellum
//! engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Explicit device context owning the backend, the
//!   descriptor heaps and the bind layout cache
//! - [`GpuBackend`] - Trait for native graphics backends, with a recording
//!   [`DummyBackend`] and an optional wgpu backend
//! - [`resources`] - Buffers, textures and samplers holding a native handle
//!   and a descriptor handle
//! - [`layout`] - Structurally deduplicated binding and pipeline layouts
//! - [`scene`] - GPU mirror of drawables, cameras and final display
//! - [`shader`] - Shader environment defines
//!
//! ## Example
//!
//! ```ignore
//! use vellum_graphics::{GraphicsConfig, GraphicsDevice};
//! use vellum_graphics::scene::{Drawable, GpuScene};
//!
//! let device = GraphicsDevice::from_config(GraphicsConfig::default())?;
//! let mut scene = GpuScene::new(&device)?;
//! let id = scene.register(Drawable::new(mesh, 0, transform)?)?;
//! scene.set_world_transform(id, moved)?;
//! scene.update()?;
//! ```

pub mod backend;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod layout;
pub mod resources;
pub mod scene;
pub mod shader;
pub mod types;

// Re-export main types for convenience
pub use backend::{DummyBackend, GpuBackend};
pub use config::{BackendPreference, DescriptorHeapCapacities, GraphicsConfig, SceneCapacities};
pub use descriptor::{DescriptorAllocator, DescriptorHandle, DescriptorHeapKind};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use layout::{BindGroupLayout, BindLayoutCache, PipelineLayout, PipelineLayoutDesc};
pub use resources::{Buffer, Sampler, Texture};
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, SamplerDescriptor, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsage, TextureViewType,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This only announces the library in the log; devices are created
/// explicitly through [`GraphicsDevice`].
pub fn init() {
    log::info!("Vellum Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_device() {
        let (device, _) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        assert_eq!(device.name(), "Dummy Device");
    }
}
