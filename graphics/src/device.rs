//! Graphics device.
//!
//! The [`GraphicsDevice`] is the explicit context every GPU-facing object is
//! created from. It owns the backend, the descriptor heaps and the layout
//! cache; there is no global engine instance.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::backend::{DummyBackend, GpuBackend, create_backend};
use crate::config::GraphicsConfig;
use crate::descriptor::{DescriptorAllocator, DescriptorHandle, DescriptorHeapKind};
use crate::error::GraphicsError;
use crate::layout::{BindLayoutCache, PipelineLayout, PipelineLayoutDesc};
use crate::resources::{Buffer, Sampler, Texture};
use crate::types::{BufferDescriptor, Extent3d, SamplerDescriptor, TextureDescriptor};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture dimension.
    pub max_texture_dimension: u32,
    /// Maximum array layers of a 1D/2D texture.
    pub max_texture_array_layers: u32,
    /// Maximum buffer size.
    pub max_buffer_size: u64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_texture_array_layers: 2048,
            max_buffer_size: 1 << 30, // 1 GB
        }
    }
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
/// The descriptor allocator sits behind a mutex and the layout cache behind
/// read/write locks.
///
/// # Example
///
/// ```ignore
/// let device = GraphicsDevice::from_config(GraphicsConfig::default())?;
///
/// let buffer = device.create_buffer(&BufferDescriptor::new(1024, BufferUsage::STORAGE))?;
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     1920, 1080,
///     TextureFormat::Rgba8Unorm,
///     TextureUsage::RENDER_ATTACHMENT,
/// ))?;
/// ```
pub struct GraphicsDevice {
    name: String,
    backend: Arc<dyn GpuBackend>,
    config: GraphicsConfig,
    capabilities: DeviceCapabilities,
    descriptors: Mutex<DescriptorAllocator>,
    layouts: BindLayoutCache,
    // Track allocated resources (weak references for cleanup/debugging)
    buffers: RwLock<Vec<Weak<Buffer>>>,
    textures: RwLock<Vec<Weak<Texture>>>,
    samplers: RwLock<Vec<Weak<Sampler>>>,
}

impl GraphicsDevice {
    /// Create a device on top of an existing backend.
    pub fn new(backend: Arc<dyn GpuBackend>, config: GraphicsConfig) -> Arc<Self> {
        log::info!(
            "Creating graphics device on {} (resource heap: {}, sampler heap: {})",
            backend.name(),
            config.descriptor_heaps.resource,
            config.descriptor_heaps.sampler
        );
        Arc::new(Self {
            name: format!("{} Device", backend.name()),
            descriptors: Mutex::new(DescriptorAllocator::new(&config.descriptor_heaps)),
            backend,
            config,
            capabilities: DeviceCapabilities::default(),
            layouts: BindLayoutCache::new(),
            buffers: RwLock::new(Vec::new()),
            textures: RwLock::new(Vec::new()),
            samplers: RwLock::new(Vec::new()),
        })
    }

    /// Create a device with the backend selected by `config.backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested backend cannot be created.
    pub fn from_config(config: GraphicsConfig) -> Result<Arc<Self>, GraphicsError> {
        let backend = create_backend(config.backend)?;
        Ok(Self::new(backend, config))
    }

    /// Create a device on a fresh [`DummyBackend`], returning both.
    pub fn with_dummy_backend(config: GraphicsConfig) -> (Arc<Self>, Arc<DummyBackend>) {
        let backend = Arc::new(DummyBackend::new());
        (Self::new(backend.clone(), config), backend)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Configuration the device was created with.
    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    /// The backend all native objects are created on.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Allocate a descriptor from the heap for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DescriptorHeapExhausted`] if the heap is full.
    pub fn allocate_descriptor(
        &self,
        kind: DescriptorHeapKind,
    ) -> Result<DescriptorHandle, GraphicsError> {
        self.descriptors.lock().allocate(kind)
    }

    /// Return a descriptor to its heap. NULL and already free handles are ignored.
    pub fn free_descriptor(&self, handle: DescriptorHandle) {
        self.descriptors.lock().free(handle);
    }

    /// Whether `handle` is currently allocated.
    pub fn is_descriptor_live(&self, handle: DescriptorHandle) -> bool {
        self.descriptors.lock().is_live(handle)
    }

    /// Number of live descriptors in the heap for `kind`.
    pub fn descriptor_live_count(&self, kind: DescriptorHeapKind) -> u32 {
        self.descriptors.lock().live_count(kind)
    }

    /// Fixed capacity of the heap for `kind`.
    pub fn descriptor_capacity(&self, kind: DescriptorHeapKind) -> u32 {
        self.descriptors.lock().capacity(kind)
    }

    /// Create a GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size is zero or exceeds device limits,
    /// or if native creation or descriptor allocation fails.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if descriptor.size > self.capabilities.max_buffer_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} exceeds maximum {}",
                descriptor.size, self.capabilities.max_buffer_size
            )));
        }

        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        let buffer = Arc::new(Buffer::new(Arc::downgrade(self), descriptor.clone()));
        buffer.initialize()?;
        self.buffers.write().push(Arc::downgrade(&buffer));

        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );

        Ok(buffer)
    }

    /// Create a GPU texture.
    ///
    /// # Errors
    ///
    /// Returns an error if any extent is zero or exceeds device limits, or
    /// if native creation or descriptor allocation fails.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphicsError> {
        let size = descriptor.size;
        if size.width == 0 || size.height == 0 || size.depth_or_layers == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture extent {}x{}x{} has a zero component",
                size.width, size.height, size.depth_or_layers
            )));
        }

        let max_dim = self.capabilities.max_texture_dimension;
        if size.width > max_dim || size.height > max_dim {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }

        let max_layers = if descriptor.view_type() == crate::types::TextureViewType::D3 {
            max_dim
        } else {
            self.capabilities.max_texture_array_layers
        };
        if size.depth_or_layers > max_layers {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture depth/layers {} exceeds maximum {max_layers}",
                size.depth_or_layers
            )));
        }

        if descriptor.mip_level_count == 0 || descriptor.sample_count == 0 {
            return Err(GraphicsError::InvalidParameter(
                "mip level and sample counts must be at least 1".to_string(),
            ));
        }

        let texture = Arc::new(Texture::new(Arc::downgrade(self), descriptor.clone()));
        texture.initialize()?;
        self.textures.write().push(Arc::downgrade(&texture));

        log::trace!(
            "GraphicsDevice: created texture {:?}, size={}x{}x{}",
            descriptor.label,
            size.width,
            size.height,
            size.depth_or_layers
        );

        Ok(texture)
    }

    /// Create a texture sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if native creation or descriptor allocation fails.
    pub fn create_sampler(
        self: &Arc<Self>,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<Sampler>, GraphicsError> {
        let sampler = Arc::new(Sampler::new(Arc::downgrade(self), descriptor.clone()));
        sampler.initialize()?;
        self.samplers.write().push(Arc::downgrade(&sampler));

        log::trace!("GraphicsDevice: created sampler {:?}", descriptor.label);

        Ok(sampler)
    }

    /// Write bytes into a buffer at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer was reset or the range is out of bounds.
    pub fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let native = buffer.require_native()?;
        self.backend.write_buffer(&native, offset, data)
    }

    /// Read `size` bytes from a buffer. Blocks until the GPU is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer was reset or the range is out of bounds.
    pub fn read_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, GraphicsError> {
        let native = buffer.require_native()?;
        self.backend.read_buffer(&native, offset, size)
    }

    /// Copy `size` bytes from `src` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns an error if either buffer was reset or a range is out of bounds.
    pub fn copy_buffer(
        &self,
        src: &Buffer,
        src_offset: u64,
        dst: &Buffer,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), GraphicsError> {
        let (src, dst) = (src.require_native()?, dst.require_native()?);
        self.backend
            .copy_buffer(&src, src_offset, &dst, dst_offset, size)
    }

    /// Copy the overlapping region of two textures' first mip level.
    ///
    /// # Errors
    ///
    /// Returns an error if either texture was reset.
    pub fn copy_texture(&self, src: &Texture, dst: &Texture) -> Result<Extent3d, GraphicsError> {
        let extent = src.size().min(dst.size());
        let (src, dst) = (src.require_native()?, dst.require_native()?);
        self.backend.copy_texture(&src, &dst, extent)?;
        Ok(extent)
    }

    /// The device's bind layout cache.
    pub fn layouts(&self) -> &BindLayoutCache {
        &self.layouts
    }

    /// Canonical pipeline layout for `desc`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the backend error if the native layout cannot be created.
    pub fn pipeline_layout(
        &self,
        desc: PipelineLayoutDesc,
    ) -> Result<Arc<PipelineLayout>, GraphicsError> {
        self.layouts.pipeline_layout(self.backend.as_ref(), desc)
    }

    /// Get the number of live buffers created by this device.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Get the number of live textures created by this device.
    pub fn texture_count(&self) -> usize {
        self.textures
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Get the number of live samplers created by this device.
    pub fn sampler_count(&self) -> usize {
        self.samplers
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Clean up dead weak references to released resources.
    pub fn cleanup_dead_resources(&self) {
        self.buffers.write().retain(|w| w.strong_count() > 0);
        self.textures.write().retain(|w| w.strong_count() > 0);
        self.samplers.write().retain(|w| w.strong_count() > 0);
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("descriptors", &*self.descriptors.lock())
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
