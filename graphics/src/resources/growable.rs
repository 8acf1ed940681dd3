//! Buffer that reallocates on demand while keeping element offsets stable.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Buffer;
use crate::types::{BufferDescriptor, BufferUsage};

/// Array of fixed-stride elements backed by one GPU buffer.
///
/// Growing allocates a larger buffer, copies the old contents into it on
/// the GPU, and swaps it in. Element `i` lives at byte `i * stride` before
/// and after a grow, so offsets handed out earlier stay valid.
pub struct GrowableBuffer {
    device: Arc<GraphicsDevice>,
    label: String,
    stride: u64,
    usage: BufferUsage,
    capacity: u32,
    buffer: Arc<Buffer>,
}

impl GrowableBuffer {
    /// Create a buffer holding `capacity` elements of `stride` bytes.
    ///
    /// `COPY_SRC | COPY_DST` are added to `usage` so the buffer can be grown.
    ///
    /// # Errors
    ///
    /// Returns an error if `stride` is zero or buffer creation fails.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        label: impl Into<String>,
        stride: u64,
        capacity: u32,
        usage: BufferUsage,
    ) -> Result<Self, GraphicsError> {
        if stride == 0 {
            return Err(GraphicsError::InvalidParameter(
                "element stride cannot be zero".to_string(),
            ));
        }
        let label = label.into();
        let usage = usage | BufferUsage::COPY_SRC | BufferUsage::COPY_DST;
        let capacity = capacity.max(1);
        let buffer = Self::allocate(device, &label, stride, capacity, usage)?;
        Ok(Self {
            device: Arc::clone(device),
            label,
            stride,
            usage,
            capacity,
            buffer,
        })
    }

    fn allocate(
        device: &Arc<GraphicsDevice>,
        label: &str,
        stride: u64,
        capacity: u32,
        usage: BufferUsage,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        device.create_buffer(
            &BufferDescriptor::new(stride * u64::from(capacity), usage).with_label(label),
        )
    }

    /// The current backing buffer. Replaced by a grow.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    /// Capacity in elements.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Element size in bytes.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Debug label shared by every backing buffer.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Make room for at least `required` elements.
    ///
    /// Capacity at least doubles on each grow. Returns `true` if the
    /// backing buffer was replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the new buffer cannot be created or the copy fails;
    /// the old buffer stays in place in that case.
    pub fn ensure_capacity(&mut self, required: u32) -> Result<bool, GraphicsError> {
        if required <= self.capacity {
            return Ok(false);
        }

        let new_capacity = required.max(self.capacity.saturating_mul(2));
        let new_buffer =
            Self::allocate(&self.device, &self.label, self.stride, new_capacity, self.usage)?;
        self.device.copy_buffer(
            &self.buffer,
            0,
            &new_buffer,
            0,
            self.stride * u64::from(self.capacity),
        )?;

        log::debug!(
            "Grew {} from {} to {} elements",
            self.label,
            self.capacity,
            new_capacity
        );
        self.buffer = new_buffer;
        self.capacity = new_capacity;
        Ok(true)
    }

    /// Write raw bytes starting at element `first`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write runs past the end of the buffer.
    pub fn write(&self, first: u32, data: &[u8]) -> Result<(), GraphicsError> {
        if data.is_empty() {
            return Ok(());
        }
        let offset = self.stride * u64::from(first);
        if offset + data.len() as u64 > self.buffer.size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at element {first} overruns {}",
                data.len(),
                self.label
            )));
        }
        self.device.write_buffer(&self.buffer, offset, data)
    }

    /// Read `count` elements starting at `first`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range runs past the end of the buffer.
    pub fn read(&self, first: u32, count: u32) -> Result<Vec<u8>, GraphicsError> {
        self.device.read_buffer(
            &self.buffer,
            self.stride * u64::from(first),
            self.stride * u64::from(count),
        )
    }
}

impl std::fmt::Debug for GrowableBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("label", &self.label)
            .field("stride", &self.stride)
            .field("capacity", &self.capacity)
            .finish()
    }
}
