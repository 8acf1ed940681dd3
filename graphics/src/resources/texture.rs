//! GPU texture resource.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{DescriptorWrite, GpuTexture};
use crate::descriptor::{DescriptorHandle, DescriptorHeapKind};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::types::{Extent3d, TextureDescriptor, TextureFormat, TextureUsage, TextureViewType};

use super::{ResourceState, not_initialized, upgrade};

/// A GPU texture resource.
///
/// Textures are created by [`GraphicsDevice::create_texture`] and are reference-counted.
/// Every texture gets a shader-visible descriptor written with its
/// [`view_type`](Self::view_type). Render attachments also get a render
/// target or depth-stencil descriptor.
///
/// # Example
///
/// ```ignore
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     1920, 1080,
///     TextureFormat::Rgba8Unorm,
///     TextureUsage::RENDER_ATTACHMENT,
/// ))?;
/// println!("Texture size: {}x{}", texture.width(), texture.height());
/// ```
pub struct Texture {
    device: Weak<GraphicsDevice>,
    descriptor: TextureDescriptor,
    state: Mutex<ResourceState<GpuTexture>>,
}

impl Texture {
    /// Create an uninitialized texture (called by GraphicsDevice).
    pub(crate) fn new(device: Weak<GraphicsDevice>, descriptor: TextureDescriptor) -> Self {
        Self {
            device,
            descriptor,
            state: Mutex::new(ResourceState::default()),
        }
    }

    /// Create the native texture and its descriptors.
    ///
    /// Does nothing if the texture is already initialized. On failure no
    /// descriptor stays allocated.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeviceLost`] if the device is gone, or the
    /// backend / descriptor heap error.
    pub fn initialize(&self) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        if state.is_initialized() {
            return Ok(());
        }

        let device = upgrade(&self.device)?;
        let native = device.backend().create_texture(&self.descriptor)?;

        let handle = device.allocate_descriptor(DescriptorHeapKind::Resource)?;
        device.backend().write_descriptor(
            handle,
            DescriptorWrite::Texture {
                texture: &native,
                view_type: self.view_type(),
            },
        );

        let attachment = match self.attachment_heap() {
            Some(kind) => match device.allocate_descriptor(kind) {
                Ok(attachment) => attachment,
                Err(e) => {
                    device.free_descriptor(handle);
                    return Err(e);
                }
            },
            None => DescriptorHandle::NULL,
        };

        state.native = Some(native);
        state.handle = handle;
        state.attachment = attachment;
        Ok(())
    }

    fn attachment_heap(&self) -> Option<DescriptorHeapKind> {
        if !self.descriptor.usage.contains(TextureUsage::RENDER_ATTACHMENT) {
            None
        } else if self.descriptor.format.is_depth_stencil() {
            Some(DescriptorHeapKind::DepthStencil)
        } else {
            Some(DescriptorHeapKind::RenderTarget)
        }
    }

    /// Release the native texture and free its descriptors.
    ///
    /// Safe to call on an uninitialized texture and more than once.
    pub fn reset(&self) {
        self.state.lock().release(&self.device, "Texture");
    }

    /// Whether the texture currently owns a native object.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().is_initialized()
    }

    /// Shader-visible descriptor, or NULL.
    pub fn descriptor_handle(&self) -> DescriptorHandle {
        self.state.lock().handle
    }

    /// Render target / depth-stencil descriptor, or NULL.
    pub fn attachment_handle(&self) -> DescriptorHandle {
        self.state.lock().attachment
    }

    /// Native backend handle, if initialized.
    pub fn native(&self) -> Option<GpuTexture> {
        self.state.lock().native.clone()
    }

    pub(crate) fn require_native(&self) -> Result<GpuTexture, GraphicsError> {
        self.native().ok_or_else(|| not_initialized("texture"))
    }

    /// View type the shader-visible descriptor is written with.
    ///
    /// Derived from the dimension and depth/layer count on every call.
    pub fn view_type(&self) -> TextureViewType {
        TextureViewType::of(self.descriptor.dimension, self.descriptor.size.depth_or_layers)
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the texture size.
    pub fn size(&self) -> Extent3d {
        self.descriptor.size
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.descriptor.size.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.descriptor.size.height
    }

    /// Get the depth of a 3D texture or the layer count of a 1D/2D texture.
    pub fn depth_or_layers(&self) -> u32 {
        self.descriptor.size.depth_or_layers
    }

    /// Get the texture format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    /// Get the mip level count.
    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.reset();
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("size", &self.descriptor.size)
            .field("format", &self.descriptor.format)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Texture is Send + Sync
static_assertions::assert_impl_all!(Texture: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DescriptorHeapCapacities, GraphicsConfig};
    use crate::types::TextureDimension;

    fn create_test_device() -> Arc<GraphicsDevice> {
        GraphicsDevice::with_dummy_backend(GraphicsConfig::default()).0
    }

    #[test]
    fn test_texture_debug() {
        let desc = TextureDescriptor::new_2d(
            1920,
            1080,
            TextureFormat::Rgba8Unorm,
            TextureUsage::RENDER_ATTACHMENT,
        );
        let texture = Texture::new(Weak::new(), desc);
        let debug = format!("{:?}", texture);
        assert!(debug.contains("Texture"));
        assert!(debug.contains("1920"));
    }

    #[test]
    fn view_type_follows_dimension_and_layers() {
        let cases = [
            (TextureDimension::D1, 1, TextureViewType::D1),
            (TextureDimension::D1, 4, TextureViewType::D1Array),
            (TextureDimension::D2, 1, TextureViewType::D2),
            (TextureDimension::D2, 6, TextureViewType::D2Array),
            (TextureDimension::D3, 1, TextureViewType::D3),
            (TextureDimension::D3, 8, TextureViewType::D3),
        ];
        for (dimension, layers, expected) in cases {
            let desc = TextureDescriptor {
                dimension,
                size: Extent3d::new_3d(16, 16, layers),
                ..Default::default()
            };
            let texture = Texture::new(Weak::new(), desc);
            assert_eq!(texture.view_type(), expected, "{dimension:?} x{layers}");
        }
    }

    #[test]
    fn render_targets_take_an_attachment_descriptor() {
        let device = create_test_device();
        let color = device
            .create_texture(&TextureDescriptor::new_2d(
                8,
                8,
                TextureFormat::Rgba8Unorm,
                TextureUsage::RENDER_ATTACHMENT,
            ))
            .unwrap();
        let depth = device
            .create_texture(&TextureDescriptor::new_2d(
                8,
                8,
                TextureFormat::Depth32Float,
                TextureUsage::RENDER_ATTACHMENT,
            ))
            .unwrap();
        assert!(!color.attachment_handle().is_null());
        assert_eq!(color.attachment_handle().gpu, 0);
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::RenderTarget), 1);
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::DepthStencil), 1);

        drop(depth);
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::DepthStencil), 0);
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::Resource), 1);
    }

    #[test]
    fn failed_attachment_allocation_frees_the_resource_descriptor() {
        let config = GraphicsConfig::default().with_descriptor_heaps(DescriptorHeapCapacities {
            render_target: 0,
            ..Default::default()
        });
        let (device, _) = GraphicsDevice::with_dummy_backend(config);
        let result = device.create_texture(&TextureDescriptor::new_2d(
            8,
            8,
            TextureFormat::Rgba8Unorm,
            TextureUsage::RENDER_ATTACHMENT,
        ));
        assert!(result.is_err());
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::Resource), 0);
    }

    #[test]
    fn reset_after_device_drop_clears_without_freeing() {
        let device = create_test_device();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                4,
                4,
                TextureFormat::R8Unorm,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap();
        drop(device);
        texture.reset();
        assert!(texture.descriptor_handle().is_null());
        assert!(!texture.is_initialized());
    }
}
