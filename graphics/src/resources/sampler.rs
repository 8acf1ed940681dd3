//! GPU sampler resource.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{DescriptorWrite, GpuSampler};
use crate::descriptor::{DescriptorHandle, DescriptorHeapKind};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::types::SamplerDescriptor;

use super::{ResourceState, upgrade};

/// A GPU texture sampler.
///
/// Samplers are created by [`GraphicsDevice::create_sampler`] and are reference-counted.
/// Each live sampler owns one descriptor in the sampler heap.
///
/// # Example
///
/// ```ignore
/// let sampler = device.create_sampler(&SamplerDescriptor::linear())?;
/// ```
pub struct Sampler {
    device: Weak<GraphicsDevice>,
    descriptor: SamplerDescriptor,
    state: Mutex<ResourceState<GpuSampler>>,
}

impl Sampler {
    /// Create an uninitialized sampler (called by GraphicsDevice).
    pub(crate) fn new(device: Weak<GraphicsDevice>, descriptor: SamplerDescriptor) -> Self {
        Self {
            device,
            descriptor,
            state: Mutex::new(ResourceState::default()),
        }
    }

    /// Create the native sampler and write its descriptor.
    ///
    /// Does nothing if the sampler is already initialized.
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
        let native = device.backend().create_sampler(&self.descriptor)?;
        let handle = device.allocate_descriptor(DescriptorHeapKind::Sampler)?;
        device
            .backend()
            .write_descriptor(handle, DescriptorWrite::Sampler(&native));

        state.native = Some(native);
        state.handle = handle;
        Ok(())
    }

    /// Release the native sampler and free its descriptor.
    ///
    /// Safe to call on an uninitialized sampler and more than once.
    pub fn reset(&self) {
        self.state.lock().release(&self.device, "Sampler");
    }

    /// Whether the sampler currently owns a native object.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().is_initialized()
    }

    /// Sampler-heap descriptor, or NULL.
    pub fn descriptor_handle(&self) -> DescriptorHandle {
        self.state.lock().handle
    }

    /// Native backend handle, if initialized.
    pub fn native(&self) -> Option<GpuSampler> {
        self.state.lock().native.clone()
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the sampler descriptor.
    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }

    /// Get the sampler label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.reset();
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("mag_filter", &self.descriptor.mag_filter)
            .field("min_filter", &self.descriptor.min_filter)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Sampler is Send + Sync
static_assertions::assert_impl_all!(Sampler: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphicsConfig;

    #[test]
    fn test_sampler_debug() {
        let desc = SamplerDescriptor::linear();
        let sampler = Sampler::new(Weak::new(), desc);
        let debug = format!("{:?}", sampler);
        assert!(debug.contains("Sampler"));
        assert!(debug.contains("Linear"));
    }

    #[test]
    fn reset_on_uninitialized_sampler_is_noop() {
        let sampler = Sampler::new(Weak::new(), SamplerDescriptor::linear());
        sampler.reset();
        assert!(sampler.descriptor_handle().is_null());
    }

    #[test]
    fn double_initialize_keeps_one_descriptor() {
        let (device, backend) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        let sampler = device.create_sampler(&SamplerDescriptor::linear()).unwrap();
        let handle = sampler.descriptor_handle();
        sampler.initialize().unwrap();
        assert_eq!(sampler.descriptor_handle(), handle);
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::Sampler), 1);
        assert_eq!(backend.operations().len(), 2);

        drop(sampler);
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::Sampler), 0);
    }
}
