//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't talk to a GPU. It hands out sequential ids for
//! native objects, keeps buffer contents in memory, and records every
//! operation as a [`DummyOp`] so tests can assert exactly which uploads
//! and copies a piece of code issued.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::descriptor::DescriptorHandle;
use crate::error::GraphicsError;
use crate::layout::PipelineLayoutDesc;
use crate::types::{BufferDescriptor, Extent3d, SamplerDescriptor, TextureDescriptor};

use super::{
    DescriptorWrite, GpuBackend, GpuBuffer, GpuPipelineLayout, GpuSampler, GpuTexture,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum DummyOp {
    /// A buffer was created.
    CreateBuffer { id: u64, size: u64 },
    /// A texture was created.
    CreateTexture { id: u64, extent: Extent3d },
    /// A sampler was created.
    CreateSampler { id: u64 },
    /// A pipeline layout was created.
    CreatePipelineLayout { id: u64, bind_group_layouts: usize },
    /// A descriptor slot was written.
    WriteDescriptor { cpu: u64 },
    /// Bytes were written into a buffer.
    WriteBuffer { buffer: u64, offset: u64, data: Vec<u8> },
    /// A buffer range was copied.
    CopyBuffer {
        src: u64,
        src_offset: u64,
        dst: u64,
        dst_offset: u64,
        size: u64,
    },
    /// A texture was copied.
    CopyTexture { src: u64, dst: u64, extent: Extent3d },
}

#[derive(Default)]
struct DummyState {
    next_id: u64,
    buffers: HashMap<u64, Vec<u8>>,
    labels: HashMap<u64, String>,
    ops: Vec<DummyOp>,
}

impl DummyState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn range(&self, id: u64, offset: u64, size: u64) -> Result<std::ops::Range<usize>, GraphicsError> {
        let len = self
            .buffers
            .get(&id)
            .map(Vec::len)
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("unknown buffer {id}")))?;
        let end = offset
            .checked_add(size)
            .filter(|end| *end <= len as u64)
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "range {offset}+{size} out of bounds for buffer {id} of {len} bytes"
                ))
            })?;
        Ok(offset as usize..end as usize)
    }
}

/// Dummy GPU backend.
#[derive(Default)]
pub struct DummyBackend {
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded operation, oldest first.
    pub fn operations(&self) -> Vec<DummyOp> {
        self.state.lock().ops.clone()
    }

    /// Forget recorded operations. Buffer contents are kept.
    pub fn clear_operations(&self) {
        self.state.lock().ops.clear();
    }

    /// `(offset, bytes)` of every write into buffers created with `label`.
    pub fn buffer_writes(&self, label: &str) -> Vec<(u64, Vec<u8>)> {
        let state = self.state.lock();
        state
            .ops
            .iter()
            .filter_map(|op| match op {
                DummyOp::WriteBuffer {
                    buffer,
                    offset,
                    data,
                } if state.labels.get(buffer).map(String::as_str) == Some(label) => {
                    Some((*offset, data.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Number of recorded texture copies.
    pub fn texture_copy_count(&self) -> usize {
        self.state
            .lock()
            .ops
            .iter()
            .filter(|op| matches!(op, DummyOp::CopyTexture { .. }))
            .count()
    }

    /// Number of recorded buffer copies.
    pub fn buffer_copy_count(&self) -> usize {
        self.state
            .lock()
            .ops
            .iter()
            .filter(|op| matches!(op, DummyOp::CopyBuffer { .. }))
            .count()
    }
}

impl std::fmt::Debug for DummyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DummyBackend")
            .field("buffers", &state.buffers.len())
            .field("ops", &state.ops.len())
            .finish()
    }
}

fn buffer_id(buffer: &GpuBuffer) -> Result<u64, GraphicsError> {
    match buffer {
        GpuBuffer::Dummy(id) => Ok(*id),
        #[cfg(feature = "wgpu-backend")]
        _ => Err(GraphicsError::InvalidParameter(
            "buffer does not belong to the dummy backend".to_string(),
        )),
    }
}

fn texture_id(texture: &GpuTexture) -> Result<u64, GraphicsError> {
    match texture {
        GpuTexture::Dummy(id) => Ok(*id),
        #[cfg(feature = "wgpu-backend")]
        _ => Err(GraphicsError::InvalidParameter(
            "texture does not belong to the dummy backend".to_string(),
        )),
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        let mut state = self.state.lock();
        let id = state.next_id();
        log::trace!(
            "DummyBackend: creating buffer {:?} #{id} (size: {})",
            descriptor.label,
            descriptor.size
        );
        state.buffers.insert(id, vec![0; descriptor.size as usize]);
        if let Some(label) = &descriptor.label {
            state.labels.insert(id, label.clone());
        }
        state.ops.push(DummyOp::CreateBuffer {
            id,
            size: descriptor.size,
        });
        Ok(GpuBuffer::Dummy(id))
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        let mut state = self.state.lock();
        let id = state.next_id();
        log::trace!(
            "DummyBackend: creating texture {:?} #{id} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth_or_layers
        );
        state.ops.push(DummyOp::CreateTexture {
            id,
            extent: descriptor.size,
        });
        Ok(GpuTexture::Dummy(id))
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError> {
        let mut state = self.state.lock();
        let id = state.next_id();
        log::trace!("DummyBackend: creating sampler {:?} #{id}", descriptor.label);
        state.ops.push(DummyOp::CreateSampler { id });
        Ok(GpuSampler::Dummy(id))
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDesc,
    ) -> Result<GpuPipelineLayout, GraphicsError> {
        let mut state = self.state.lock();
        let id = state.next_id();
        log::trace!(
            "DummyBackend: creating pipeline layout #{id} ({} bind groups)",
            descriptor.bind_group_layouts.len()
        );
        state.ops.push(DummyOp::CreatePipelineLayout {
            id,
            bind_group_layouts: descriptor.bind_group_layouts.len(),
        });
        Ok(GpuPipelineLayout::Dummy(id))
    }

    fn write_descriptor(&self, handle: DescriptorHandle, write: DescriptorWrite<'_>) {
        log::trace!("DummyBackend: write_descriptor {:#x} <- {write:?}", handle.cpu);
        self.state
            .lock()
            .ops
            .push(DummyOp::WriteDescriptor { cpu: handle.cpu });
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let id = buffer_id(buffer)?;
        let mut state = self.state.lock();
        let range = state.range(id, offset, data.len() as u64)?;
        if let Some(contents) = state.buffers.get_mut(&id) {
            contents[range].copy_from_slice(data);
        }
        state.ops.push(DummyOp::WriteBuffer {
            buffer: id,
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn read_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, GraphicsError> {
        let id = buffer_id(buffer)?;
        let state = self.state.lock();
        let range = state.range(id, offset, size)?;
        Ok(state.buffers.get(&id).map(|c| c[range].to_vec()).unwrap_or_default())
    }

    fn copy_buffer(
        &self,
        src: &GpuBuffer,
        src_offset: u64,
        dst: &GpuBuffer,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), GraphicsError> {
        let (src, dst) = (buffer_id(src)?, buffer_id(dst)?);
        let mut state = self.state.lock();
        let src_range = state.range(src, src_offset, size)?;
        let dst_range = state.range(dst, dst_offset, size)?;
        let bytes = state.buffers.get(&src).map(|c| c[src_range].to_vec()).unwrap_or_default();
        if let Some(contents) = state.buffers.get_mut(&dst) {
            contents[dst_range].copy_from_slice(&bytes);
        }
        state.ops.push(DummyOp::CopyBuffer {
            src,
            src_offset,
            dst,
            dst_offset,
            size,
        });
        Ok(())
    }

    fn copy_texture(
        &self,
        src: &GpuTexture,
        dst: &GpuTexture,
        extent: Extent3d,
    ) -> Result<(), GraphicsError> {
        let (src, dst) = (texture_id(src)?, texture_id(dst)?);
        log::trace!("DummyBackend: copy_texture #{src} -> #{dst} {extent:?}");
        self.state
            .lock()
            .ops
            .push(DummyOp::CopyTexture { src, dst, extent });
        Ok(())
    }
}

static_assertions::assert_impl_all!(DummyBackend: Send, Sync);
