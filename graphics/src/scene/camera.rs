//! Cameras and their render targets.

use std::sync::Arc;

use vellum_core::math::Mat4;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};

/// Stable handle to a camera in a [`CameraRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle {
    index: u32,
    generation: u32,
}

impl CameraHandle {
    /// Sentinel meaning "no camera". Never issued by a registry.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Returns `true` unless this is [`INVALID`](Self::INVALID).
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl Default for CameraHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Parameters for creating a camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Format of the color target.
    pub format: TextureFormat,
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraDescriptor {
    /// A camera rendering into a `width`×`height` RGBA8 target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            label: None,
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    fn target_descriptor(&self, width: u32, height: u32) -> TextureDescriptor {
        let mut descriptor = TextureDescriptor::new_2d(
            width,
            height,
            self.format,
            TextureUsage::RENDER_ATTACHMENT
                | TextureUsage::TEXTURE_BINDING
                | TextureUsage::COPY_SRC,
        );
        descriptor.label = self.label.as_ref().map(|l| format!("{l}.target"));
        descriptor
    }
}

/// A camera and the texture it renders into.
#[derive(Debug)]
pub struct Camera {
    descriptor: CameraDescriptor,
    target: Arc<Texture>,
}

impl Camera {
    pub fn descriptor(&self) -> &CameraDescriptor {
        &self.descriptor
    }

    /// The render target.
    pub fn target(&self) -> &Arc<Texture> {
        &self.target
    }

    pub fn view(&self) -> &Mat4 {
        &self.descriptor.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.descriptor.projection
    }

    /// Replace the view matrix.
    pub fn set_view(&mut self, view: Mat4) {
        self.descriptor.view = view;
    }

    /// Replace the projection matrix.
    pub fn set_projection(&mut self, projection: Mat4) {
        self.descriptor.projection = projection;
    }
}

#[derive(Debug, Default)]
struct CameraSlot {
    generation: u32,
    camera: Option<Camera>,
}

/// Generational storage of cameras.
///
/// Removed handles and [`CameraHandle::INVALID`] resolve to `None`.
#[derive(Debug, Default)]
pub struct CameraRegistry {
    slots: Vec<CameraSlot>,
    free: Vec<u32>,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera along with its render target.
    ///
    /// # Errors
    ///
    /// Returns an error if the target texture cannot be created.
    pub fn create(
        &mut self,
        device: &Arc<GraphicsDevice>,
        descriptor: CameraDescriptor,
    ) -> Result<CameraHandle, GraphicsError> {
        let target =
            device.create_texture(&descriptor.target_descriptor(descriptor.width, descriptor.height))?;

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(CameraSlot::default());
                self.slots.len() as u32 - 1
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.camera = Some(Camera { descriptor, target });
        let handle = CameraHandle {
            index,
            generation: slot.generation,
        };
        log::debug!("Created camera {}v{}", handle.index, handle.generation);
        Ok(handle)
    }

    fn slot(&self, handle: CameraHandle) -> Option<&CameraSlot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
    }

    /// Resolve a handle.
    pub fn get(&self, handle: CameraHandle) -> Option<&Camera> {
        self.slot(handle)?.camera.as_ref()
    }

    /// Resolve a handle mutably.
    pub fn get_mut(&mut self, handle: CameraHandle) -> Option<&mut Camera> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?
            .camera
            .as_mut()
    }

    /// Remove a camera, returning it. The handle becomes stale.
    pub fn remove(&mut self, handle: CameraHandle) -> Option<Camera> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let camera = slot.camera.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(camera)
    }

    /// Recreate a camera's target at a new size.
    ///
    /// Returns `Ok(false)` if the size is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] for an unknown handle, or
    /// the texture creation error. The old target is kept on failure.
    pub fn resize(
        &mut self,
        device: &Arc<GraphicsDevice>,
        handle: CameraHandle,
        width: u32,
        height: u32,
    ) -> Result<bool, GraphicsError> {
        let camera = self.get_mut(handle).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("unknown camera {handle:?}"))
        })?;
        if camera.descriptor.width == width && camera.descriptor.height == height {
            return Ok(false);
        }
        camera.target = device.create_texture(&camera.descriptor.target_descriptor(width, height))?;
        camera.descriptor.width = width;
        camera.descriptor.height = height;
        Ok(true)
    }

    /// Number of live cameras.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.camera.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphicsConfig;

    #[test]
    fn invalid_handle_resolves_to_none() {
        let registry = CameraRegistry::new();
        assert!(registry.get(CameraHandle::INVALID).is_none());
        assert!(!CameraHandle::default().is_valid());
    }

    #[test]
    fn removed_handle_goes_stale() {
        let (device, _) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        let mut registry = CameraRegistry::new();
        let handle = registry
            .create(&device, CameraDescriptor::new(64, 32).with_label("main"))
            .unwrap();
        assert!(handle.is_valid());
        assert_eq!(registry.get(handle).unwrap().target().width(), 64);
        assert_eq!(
            registry.get(handle).unwrap().target().label(),
            Some("main.target")
        );

        assert!(registry.remove(handle).is_some());
        assert!(registry.get(handle).is_none());
        let reused = registry.create(&device, CameraDescriptor::new(8, 8)).unwrap();
        assert_ne!(reused, handle);
        assert!(registry.get(handle).is_none());
    }

    #[test]
    fn resize_recreates_target() {
        let (device, _) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        let mut registry = CameraRegistry::new();
        let handle = registry.create(&device, CameraDescriptor::new(64, 32)).unwrap();
        assert!(!registry.resize(&device, handle, 64, 32).unwrap());
        assert!(registry.resize(&device, handle, 128, 64).unwrap());
        assert_eq!(registry.get(handle).unwrap().target().height(), 64);
        assert!(registry.resize(&device, CameraHandle::INVALID, 1, 1).is_err());
    }
}
