//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU. wgpu binds resources through bind
//! groups rather than descriptor heaps, so descriptor writes are accepted
//! and ignored here.

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::descriptor::DescriptorHandle;
use crate::error::GraphicsError;
use crate::layout::PipelineLayoutDesc;
use crate::types::{BufferDescriptor, Extent3d, SamplerDescriptor, TextureDescriptor};

use super::conversion::{
    convert_address_mode, convert_binding_type, convert_buffer_usage, convert_compare_function,
    convert_filter_mode, convert_mipmap_filter_mode, convert_shader_stages,
    convert_texture_dimension, convert_texture_format, convert_texture_usage,
    convert_view_dimension,
};
use super::{DescriptorWrite, GpuBackend, GpuBuffer, GpuPipelineLayout, GpuSampler, GpuTexture};

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}

impl WgpuBackend {
    /// Create a new wgpu backend on the first high-performance adapter.
    pub fn new() -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| GraphicsError::InitializationFailed(format!("No compatible GPU adapter: {e}")))?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Vellum Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| GraphicsError::InitializationFailed(format!("Device creation failed: {e}")))?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        let idx = self.queue.submit(std::iter::once(encoder.finish()));
        let _ = self.device.poll(wgpu::PollType::Wait {
            submission_index: Some(idx),
            timeout: Some(std::time::Duration::from_secs(10)),
        });
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}

fn wgpu_buffer(buffer: &GpuBuffer) -> Result<&wgpu::Buffer, GraphicsError> {
    match buffer {
        GpuBuffer::Wgpu(buffer) => Ok(buffer),
        GpuBuffer::Dummy(_) => Err(GraphicsError::InvalidParameter(
            "buffer does not belong to the wgpu backend".to_string(),
        )),
    }
}

fn wgpu_texture(texture: &GpuTexture) -> Result<&wgpu::Texture, GraphicsError> {
    match texture {
        GpuTexture::Wgpu { texture, .. } => Ok(texture),
        GpuTexture::Dummy(_) => Err(GraphicsError::InvalidParameter(
            "texture does not belong to the wgpu backend".to_string(),
        )),
    }
}

fn whole_texture(texture: &wgpu::Texture) -> wgpu::TexelCopyTextureInfo<'_> {
    wgpu::TexelCopyTextureInfo {
        texture,
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: convert_buffer_usage(descriptor.usage),
            mapped_at_creation: false,
        });

        Ok(GpuBuffer::Wgpu(Arc::new(buffer)))
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: descriptor.size.depth_or_layers,
            },
            mip_level_count: descriptor.mip_level_count,
            sample_count: descriptor.sample_count,
            dimension: convert_texture_dimension(descriptor.dimension),
            format: convert_texture_format(descriptor.format),
            usage: convert_texture_usage(descriptor.usage),
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            dimension: Some(convert_view_dimension(descriptor.view_type())),
            ..Default::default()
        });

        Ok(GpuTexture::Wgpu {
            texture: Arc::new(texture),
            view: Arc::new(view),
        })
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError> {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: convert_address_mode(descriptor.address_mode_u),
            address_mode_v: convert_address_mode(descriptor.address_mode_v),
            address_mode_w: convert_address_mode(descriptor.address_mode_w),
            mag_filter: convert_filter_mode(descriptor.mag_filter),
            min_filter: convert_filter_mode(descriptor.min_filter),
            mipmap_filter: convert_mipmap_filter_mode(descriptor.mipmap_filter),
            lod_min_clamp: descriptor.lod_min_clamp,
            lod_max_clamp: descriptor.lod_max_clamp,
            compare: descriptor.compare.map(convert_compare_function),
            anisotropy_clamp: descriptor.anisotropy_clamp,
            border_color: None,
        });

        Ok(GpuSampler::Wgpu(Arc::new(sampler)))
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDesc,
    ) -> Result<GpuPipelineLayout, GraphicsError> {
        if descriptor.push_constants.is_some() {
            return Err(GraphicsError::FeatureNotSupported(
                "push constants are not enabled on the wgpu device".to_string(),
            ));
        }
        if !descriptor.static_samplers.is_empty() {
            log::debug!(
                "wgpu has no static samplers; {} ignored",
                descriptor.static_samplers.len()
            );
        }

        let group_layouts: Vec<wgpu::BindGroupLayout> = descriptor
            .bind_group_layouts
            .iter()
            .map(|layout| {
                let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
                    .entries
                    .iter()
                    .map(|entry| wgpu::BindGroupLayoutEntry {
                        binding: entry.binding,
                        visibility: convert_shader_stages(entry.visibility),
                        ty: convert_binding_type(entry.binding_type),
                        count: NonZeroU32::new(entry.count).filter(|n| n.get() > 1),
                    })
                    .collect();
                self.device
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: None,
                        entries: &entries,
                    })
            })
            .collect();
        let group_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &group_refs,
                immediate_size: 0,
            });

        Ok(GpuPipelineLayout::Wgpu(Arc::new(layout)))
    }

    fn write_descriptor(&self, handle: DescriptorHandle, _write: DescriptorWrite<'_>) {
        log::trace!("wgpu: descriptor {:#x} is bound through bind groups", handle.cpu);
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        self.queue.write_buffer(wgpu_buffer(buffer)?, offset, data);
        Ok(())
    }

    fn read_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, GraphicsError> {
        let source = wgpu_buffer(buffer)?;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Read Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.encoder("Read Buffer Encoder");
        encoder.copy_buffer_to_buffer(source, offset, &staging, 0, size);
        self.submit(encoder);

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(GraphicsError::ResourceCreationFailed(e.to_string())),
            Err(_) => return Err(GraphicsError::DeviceLost),
        }

        let data = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(data)
    }

    fn copy_buffer(
        &self,
        src: &GpuBuffer,
        src_offset: u64,
        dst: &GpuBuffer,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), GraphicsError> {
        let mut encoder = self.encoder("Copy Buffer Encoder");
        encoder.copy_buffer_to_buffer(wgpu_buffer(src)?, src_offset, wgpu_buffer(dst)?, dst_offset, size);
        self.submit(encoder);
        Ok(())
    }

    fn copy_texture(
        &self,
        src: &GpuTexture,
        dst: &GpuTexture,
        extent: Extent3d,
    ) -> Result<(), GraphicsError> {
        let mut encoder = self.encoder("Copy Texture Encoder");
        encoder.copy_texture_to_texture(
            whole_texture(wgpu_texture(src)?),
            whole_texture(wgpu_texture(dst)?),
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: extent.depth_or_layers,
            },
        );
        self.submit(encoder);
        Ok(())
    }
}
