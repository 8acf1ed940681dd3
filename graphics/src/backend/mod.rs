//! GPU backend abstraction layer.
//!
//! Every backend implements [`GpuBackend`], the contract the rest of the
//! crate relies on: deterministic creation of native buffers, textures,
//! samplers and pipeline layouts, descriptor writes, and buffer/texture
//! transfers.
//!
//! # Available Backends
//!
//! - `dummy` (always built): records every operation and keeps buffer
//!   contents in memory; used by tests and headless tools
//! - `wgpu-backend`: cross-platform backend using wgpu

pub mod dummy;

#[cfg(feature = "wgpu-backend")]
mod conversion;
#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

use std::sync::Arc;

use crate::config::BackendPreference;
use crate::descriptor::DescriptorHandle;
use crate::error::GraphicsError;
use crate::layout::PipelineLayoutDesc;
use crate::types::{
    BufferDescriptor, Extent3d, SamplerDescriptor, TextureDescriptor, TextureViewType,
};

pub use dummy::{DummyBackend, DummyOp};

/// Handle to a native GPU buffer.
#[derive(Debug, Clone)]
pub enum GpuBuffer {
    /// Dummy backend buffer, identified by its creation id.
    Dummy(u64),
    /// wgpu backend buffer
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Buffer>),
}

/// Handle to a native GPU texture.
#[derive(Debug, Clone)]
pub enum GpuTexture {
    /// Dummy backend texture, identified by its creation id.
    Dummy(u64),
    /// wgpu backend texture and its default view
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        texture: Arc<wgpu::Texture>,
        view: Arc<wgpu::TextureView>,
    },
}

/// Handle to a native GPU sampler.
#[derive(Debug, Clone)]
pub enum GpuSampler {
    /// Dummy backend sampler, identified by its creation id.
    Dummy(u64),
    /// wgpu backend sampler
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Sampler>),
}

/// Handle to a native pipeline layout.
#[derive(Debug, Clone)]
pub enum GpuPipelineLayout {
    /// Dummy backend layout, identified by its creation id.
    Dummy(u64),
    /// wgpu backend pipeline layout
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::PipelineLayout>),
}

/// What a descriptor slot should point at.
#[derive(Debug, Clone, Copy)]
pub enum DescriptorWrite<'a> {
    /// A buffer range.
    Buffer {
        buffer: &'a GpuBuffer,
        offset: u64,
        size: u64,
    },
    /// A texture viewed with the given view type.
    Texture {
        texture: &'a GpuTexture,
        view_type: TextureViewType,
    },
    /// A sampler.
    Sampler(&'a GpuSampler),
}

/// GPU backend trait for abstracting different GPU APIs.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError>;

    /// Create a texture resource.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError>;

    /// Create a sampler resource.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError>;

    /// Create a pipeline layout from canonical bind layouts.
    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDesc,
    ) -> Result<GpuPipelineLayout, GraphicsError>;

    /// Point the descriptor slot `handle` at a resource.
    fn write_descriptor(&self, handle: DescriptorHandle, write: DescriptorWrite<'_>);

    /// Write data to a buffer.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8])
    -> Result<(), GraphicsError>;

    /// Read data from a buffer.
    ///
    /// This is a blocking operation that waits for the GPU to finish.
    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64)
    -> Result<Vec<u8>, GraphicsError>;

    /// Copy `size` bytes between two buffers.
    fn copy_buffer(
        &self,
        src: &GpuBuffer,
        src_offset: u64,
        dst: &GpuBuffer,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), GraphicsError>;

    /// Copy the first mip level of `src` into `dst`.
    fn copy_texture(
        &self,
        src: &GpuTexture,
        dst: &GpuTexture,
        extent: Extent3d,
    ) -> Result<(), GraphicsError>;
}

/// Create the backend selected by `preference`.
///
/// [`BackendPreference::Auto`] tries wgpu first when the feature is enabled
/// and falls back to the dummy backend.
///
/// # Errors
///
/// Returns [`GraphicsError::FeatureNotSupported`] if wgpu is requested
/// without the `wgpu-backend` feature, or the wgpu initialization error.
pub fn create_backend(preference: BackendPreference) -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    match preference {
        BackendPreference::Dummy => {
            log::info!("Using dummy backend");
            Ok(Arc::new(DummyBackend::new()))
        }
        #[cfg(feature = "wgpu-backend")]
        BackendPreference::Wgpu => {
            let backend = wgpu_backend::WgpuBackend::new()?;
            log::info!("Using wgpu backend");
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "wgpu-backend"))]
        BackendPreference::Wgpu => Err(GraphicsError::FeatureNotSupported(
            "wgpu backend requires the `wgpu-backend` feature".to_string(),
        )),
        BackendPreference::Auto => {
            #[cfg(feature = "wgpu-backend")]
            {
                match wgpu_backend::WgpuBackend::new() {
                    Ok(backend) => {
                        log::info!("Using wgpu backend");
                        return Ok(Arc::new(backend));
                    }
                    Err(e) => {
                        log::warn!("Failed to create wgpu backend: {}", e);
                    }
                }
            }

            log::info!("Using dummy backend");
            Ok(Arc::new(DummyBackend::new()))
        }
    }
}

/// Check if a real GPU backend is compiled in.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}
