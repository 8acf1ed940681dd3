//! GPU buffer resource.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{DescriptorWrite, GpuBuffer};
use crate::descriptor::{DescriptorHandle, DescriptorHeapKind};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

use super::{ResourceState, not_initialized, upgrade};

/// A GPU buffer resource.
///
/// Buffers are created by [`GraphicsDevice::create_buffer`] and are reference-counted.
/// `UNIFORM` and `STORAGE` buffers get a descriptor in the resource heap;
/// other usages have none.
///
/// # Example
///
/// ```ignore
/// let buffer = device.create_buffer(&BufferDescriptor::new(1024, BufferUsage::STORAGE))?;
/// println!("Buffer size: {}", buffer.size());
/// ```
pub struct Buffer {
    device: Weak<GraphicsDevice>,
    descriptor: BufferDescriptor,
    state: Mutex<ResourceState<GpuBuffer>>,
}

impl Buffer {
    /// Create an uninitialized buffer (called by GraphicsDevice).
    pub(crate) fn new(device: Weak<GraphicsDevice>, descriptor: BufferDescriptor) -> Self {
        Self {
            device,
            descriptor,
            state: Mutex::new(ResourceState::default()),
        }
    }

    /// Create the native buffer and its descriptor.
    ///
    /// Does nothing if the buffer is already initialized.
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
        let native = device.backend().create_buffer(&self.descriptor)?;
        let handle = if self.descriptor.usage.needs_descriptor() {
            let handle = device.allocate_descriptor(DescriptorHeapKind::Resource)?;
            device.backend().write_descriptor(
                handle,
                DescriptorWrite::Buffer {
                    buffer: &native,
                    offset: 0,
                    size: self.descriptor.size,
                },
            );
            handle
        } else {
            DescriptorHandle::NULL
        };

        state.native = Some(native);
        state.handle = handle;
        Ok(())
    }

    /// Release the native buffer and free its descriptor.
    ///
    /// Safe to call on an uninitialized buffer and more than once.
    pub fn reset(&self) {
        self.state.lock().release(&self.device, "Buffer");
    }

    /// Whether the buffer currently owns a native object.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().is_initialized()
    }

    /// Shader-visible descriptor, or NULL.
    pub fn descriptor_handle(&self) -> DescriptorHandle {
        self.state.lock().handle
    }

    /// Native backend handle, if initialized.
    pub fn native(&self) -> Option<GpuBuffer> {
        self.state.lock().native.clone()
    }

    pub(crate) fn require_native(&self) -> Result<GpuBuffer, GraphicsError> {
        self.native().ok_or_else(|| not_initialized("buffer"))
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.reset();
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .field("handle", &self.descriptor_handle())
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphicsConfig;
    use crate::types::BufferUsage;

    #[test]
    fn test_buffer_debug() {
        let desc = BufferDescriptor::new(1024, BufferUsage::VERTEX);
        let buffer = Buffer::new(Weak::new(), desc);
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("Buffer"));
        assert!(debug.contains("1024"));
    }

    #[test]
    fn vertex_buffers_have_no_descriptor() {
        let (device, _) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        let vertex = device
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::VERTEX))
            .unwrap();
        let storage = device
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::STORAGE))
            .unwrap();
        assert!(vertex.descriptor_handle().is_null());
        assert!(!storage.descriptor_handle().is_null());
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::Resource), 1);
    }

    #[test]
    fn initialize_without_device_fails() {
        let buffer = Buffer::new(Weak::new(), BufferDescriptor::new(16, BufferUsage::STORAGE));
        assert_eq!(buffer.initialize(), Err(GraphicsError::DeviceLost));
        buffer.reset();
        assert!(!buffer.is_initialized());
    }

    #[test]
    fn reset_then_initialize_takes_a_new_descriptor() {
        let (device, _) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        let buffer = device
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::UNIFORM))
            .unwrap();
        let first = buffer.descriptor_handle();
        buffer.reset();
        buffer.reset();
        assert!(buffer.descriptor_handle().is_null());
        assert!(!device.is_descriptor_live(first));

        buffer.initialize().unwrap();
        buffer.initialize().unwrap();
        assert!(!buffer.descriptor_handle().is_null());
        assert_eq!(device.descriptor_live_count(DescriptorHeapKind::Resource), 1);
    }
}
