//! GPU resources.
//!
//! This module contains the GPU resource types that are created by [`GraphicsDevice`]:
//! - [`Buffer`] - GPU memory buffer
//! - [`Texture`] - GPU texture/image
//! - [`Sampler`] - Texture sampler
//! - [`GrowableBuffer`] - buffer that reallocates on demand, keeping its contents
//! - [`RangeAllocator`] - first-fit sub-allocation of element ranges
//!
//! Each resource owns at most one native object and at most one descriptor
//! per role. Both are released together by `reset()`, which `Drop` calls.
//! Resources hold a weak reference back to their parent device; if the device
//! is gone at reset time the descriptor is cleared without being freed.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice

mod buffer;
mod growable;
mod range_allocator;
mod sampler;
mod texture;

use std::sync::{Arc, Weak};

pub use buffer::Buffer;
pub use growable::GrowableBuffer;
pub use range_allocator::RangeAllocator;
pub use sampler::Sampler;
pub use texture::Texture;

use crate::descriptor::DescriptorHandle;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

/// Native object and descriptors of one resource.
struct ResourceState<T> {
    native: Option<T>,
    /// Shader-visible descriptor (resource or sampler heap).
    handle: DescriptorHandle,
    /// Render target or depth-stencil descriptor, textures only.
    attachment: DescriptorHandle,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            native: None,
            handle: DescriptorHandle::NULL,
            attachment: DescriptorHandle::NULL,
        }
    }
}

impl<T> ResourceState<T> {
    fn is_initialized(&self) -> bool {
        self.native.is_some()
    }

    /// Drop the native object and free both descriptors.
    fn release(&mut self, device: &Weak<GraphicsDevice>, what: &str) {
        if !self.is_initialized() {
            return;
        }
        match device.upgrade() {
            Some(device) => {
                device.free_descriptor(self.handle);
                device.free_descriptor(self.attachment);
            }
            None => log::trace!("{what}: device already dropped, descriptors cleared"),
        }
        self.native = None;
        self.handle = DescriptorHandle::NULL;
        self.attachment = DescriptorHandle::NULL;
        log::trace!("{what}: released");
    }
}

fn upgrade(device: &Weak<GraphicsDevice>) -> Result<Arc<GraphicsDevice>, GraphicsError> {
    device.upgrade().ok_or(GraphicsError::DeviceLost)
}

fn not_initialized(what: &str) -> GraphicsError {
    GraphicsError::InvalidParameter(format!("{what} is not initialized"))
}
