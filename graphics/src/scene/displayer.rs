//! Final compositing of a camera's target into the output texture.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;

use super::camera::{CameraHandle, CameraRegistry};

/// What [`Displayer::display`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOutcome {
    /// No camera to show; no GPU work was issued.
    Skipped,
    /// The camera target was copied into the output.
    Presented,
}

/// Copies the selected camera's render target into the output texture.
#[derive(Debug)]
pub struct Displayer {
    device: Arc<GraphicsDevice>,
    output: Arc<Texture>,
    camera: CameraHandle,
}

impl Displayer {
    /// Create a displayer with no camera selected.
    pub fn new(device: Arc<GraphicsDevice>, output: Arc<Texture>) -> Self {
        Self {
            device,
            output,
            camera: CameraHandle::INVALID,
        }
    }

    /// Select the camera to display. The handle is checked at display time.
    pub fn set_camera(&mut self, camera: CameraHandle) {
        self.camera = camera;
    }

    /// The selected camera.
    pub fn camera(&self) -> CameraHandle {
        self.camera
    }

    /// Whether a camera other than [`CameraHandle::INVALID`] is selected.
    pub fn is_valid(&self) -> bool {
        self.camera.is_valid()
    }

    /// The output texture.
    pub fn output(&self) -> &Arc<Texture> {
        &self.output
    }

    /// Replace the output texture, e.g. after a surface resize.
    pub fn set_output(&mut self, output: Arc<Texture>) {
        self.output = output;
    }

    /// Copy the selected camera's target into the output.
    ///
    /// With no camera selected, or a camera that no longer exists, this
    /// does nothing and returns [`DisplayOutcome::Skipped`].
    ///
    /// # Errors
    ///
    /// Returns the backend error if the copy fails.
    pub fn display(&self, cameras: &CameraRegistry) -> Result<DisplayOutcome, GraphicsError> {
        if !self.camera.is_valid() {
            return Ok(DisplayOutcome::Skipped);
        }
        let Some(camera) = cameras.get(self.camera) else {
            log::warn!("Displayer: camera {:?} no longer exists", self.camera);
            return Ok(DisplayOutcome::Skipped);
        };
        let extent = self.device.copy_texture(camera.target(), &self.output)?;
        log::trace!(
            "Displayer: presented {}x{}",
            extent.width,
            extent.height
        );
        Ok(DisplayOutcome::Presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::config::GraphicsConfig;
    use crate::scene::CameraDescriptor;
    use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};

    fn setup() -> (Arc<GraphicsDevice>, Arc<DummyBackend>, Displayer) {
        let (device, backend) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        let output = device
            .create_texture(&TextureDescriptor::new_2d(
                64,
                64,
                TextureFormat::Bgra8Unorm,
                TextureUsage::COPY_DST,
            ))
            .unwrap();
        let displayer = Displayer::new(Arc::clone(&device), output);
        (device, backend, displayer)
    }

    #[test]
    fn nothing_selected_is_a_no_op() {
        let (_device, backend, displayer) = setup();
        assert!(!displayer.is_valid());
        assert_eq!(
            displayer.display(&CameraRegistry::new()).unwrap(),
            DisplayOutcome::Skipped
        );
        assert_eq!(backend.texture_copy_count(), 0);
    }

    #[test]
    fn selected_camera_is_copied_once() {
        let (device, backend, mut displayer) = setup();
        let mut cameras = CameraRegistry::new();
        let camera = cameras.create(&device, CameraDescriptor::new(64, 64)).unwrap();
        displayer.set_camera(camera);
        assert!(displayer.is_valid());
        assert_eq!(displayer.display(&cameras).unwrap(), DisplayOutcome::Presented);
        assert_eq!(backend.texture_copy_count(), 1);
    }

    #[test]
    fn removed_camera_is_skipped() {
        let (device, backend, mut displayer) = setup();
        let mut cameras = CameraRegistry::new();
        let camera = cameras.create(&device, CameraDescriptor::new(64, 64)).unwrap();
        displayer.set_camera(camera);
        cameras.remove(camera);
        assert_eq!(displayer.display(&cameras).unwrap(), DisplayOutcome::Skipped);
        assert_eq!(backend.texture_copy_count(), 0);
    }
}
