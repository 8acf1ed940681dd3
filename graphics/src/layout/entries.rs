//! Binding layout descriptions.
//!
//! All types here are plain values compared by structure. Labels are not
//! part of the structure, so two layouts that differ only in naming share
//! one cache entry.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use vellum_core::hash::{hash_sequence, structural_hash};

use crate::backend::GpuPipelineLayout;
use crate::types::{SamplerDescriptor, ShaderStageFlags, TextureFormat, TextureViewType};

/// Type of resource that can be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// Uniform buffer (read-only, small, frequently updated).
    UniformBuffer,
    /// Storage buffer.
    StorageBuffer {
        /// Whether shaders may only read the buffer.
        read_only: bool,
    },
    /// Sampled texture viewed with the given view type.
    Texture { view_type: TextureViewType },
    /// Storage texture.
    StorageTexture {
        view_type: TextureViewType,
        format: TextureFormat,
    },
    /// Texture sampler.
    Sampler,
    /// Depth-comparison sampler.
    ComparisonSampler,
}

/// Describes a single binding slot in a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupLayoutEntry {
    /// Register space.
    pub space: u32,
    /// Binding index within the space.
    pub binding: u32,
    /// Number of array elements (1 for a single binding).
    pub count: u32,
    /// Type of resource expected at this binding.
    pub binding_type: BindingType,
    /// Shader stages that can access this binding.
    pub visibility: ShaderStageFlags,
}

impl BindGroupLayoutEntry {
    /// Create a single (non-array) binding in space 0 visible to graphics stages.
    pub fn new(binding: u32, binding_type: BindingType) -> Self {
        Self {
            space: 0,
            binding,
            count: 1,
            binding_type,
            visibility: ShaderStageFlags::GRAPHICS,
        }
    }

    /// Set the register space.
    pub fn with_space(mut self, space: u32) -> Self {
        self.space = space;
        self
    }

    /// Turn the binding into an array of `count` elements.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set the shader stage visibility.
    pub fn with_visibility(mut self, visibility: ShaderStageFlags) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Ordered list of bindings forming one bind group.
///
/// Entry order is significant: the same entries in a different order are a
/// different layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindGroupLayout {
    /// The binding entries in this layout.
    pub entries: Vec<BindGroupLayoutEntry>,
}

impl BindGroupLayout {
    /// Create a new empty binding layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding entry to the layout.
    pub fn with_entry(mut self, entry: BindGroupLayoutEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Add a uniform buffer binding.
    pub fn with_uniform_buffer(self, binding: u32) -> Self {
        self.with_entry(BindGroupLayoutEntry::new(binding, BindingType::UniformBuffer))
    }

    /// Add a read-only storage buffer binding.
    pub fn with_storage_buffer(self, binding: u32) -> Self {
        self.with_entry(BindGroupLayoutEntry::new(
            binding,
            BindingType::StorageBuffer { read_only: true },
        ))
    }

    /// Add a 2D texture binding.
    pub fn with_texture(self, binding: u32) -> Self {
        self.with_entry(BindGroupLayoutEntry::new(
            binding,
            BindingType::Texture {
                view_type: TextureViewType::D2,
            },
        ))
    }

    /// Add a sampler binding.
    pub fn with_sampler(self, binding: u32) -> Self {
        self.with_entry(BindGroupLayoutEntry::new(binding, BindingType::Sampler))
    }
}

impl Hash for BindGroupLayout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(hash_sequence(self.entries.iter().map(structural_hash)));
    }
}

/// Sampler baked into a pipeline layout.
#[derive(Debug, Clone)]
pub struct StaticSampler {
    /// Sampling state. Compared byte-wise through [`SamplerDescriptor::key`].
    pub sampler: SamplerDescriptor,
    /// Register space.
    pub space: u32,
    /// Binding index within the space.
    pub binding: u32,
    /// Shader stages that can access the sampler.
    pub visibility: ShaderStageFlags,
}

impl StaticSampler {
    /// Create a static sampler at `binding` in space 0.
    pub fn new(sampler: SamplerDescriptor, binding: u32) -> Self {
        Self {
            sampler,
            space: 0,
            binding,
            visibility: ShaderStageFlags::GRAPHICS,
        }
    }
}

impl PartialEq for StaticSampler {
    fn eq(&self, other: &Self) -> bool {
        self.space == other.space
            && self.binding == other.binding
            && self.visibility == other.visibility
            && self.sampler.key() == other.sampler.key()
    }
}

impl Eq for StaticSampler {}

impl Hash for StaticSampler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.sampler.key().as_bytes());
        self.space.hash(state);
        self.binding.hash(state);
        self.visibility.hash(state);
    }
}

/// Root/push constant block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushConstantsDesc {
    /// Register space.
    pub space: u32,
    /// Register index.
    pub register: u32,
    /// Shader stages that read the constants.
    pub visibility: ShaderStageFlags,
    /// Size in bytes.
    pub size: u32,
}

/// Everything a pipeline layout is built from.
///
/// Components are expected to be canonical handles obtained from
/// [`BindLayoutCache`](super::BindLayoutCache), but equality compares the
/// pointed-to values so non-canonical handles still deduplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PipelineLayoutDesc {
    /// Bind group layouts in group order.
    pub bind_group_layouts: Vec<Arc<BindGroupLayout>>,
    /// Static samplers.
    pub static_samplers: Vec<Arc<StaticSampler>>,
    /// Optional push constant block.
    pub push_constants: Option<Arc<PushConstantsDesc>>,
}

impl PipelineLayoutDesc {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bind group layout.
    pub fn with_bind_group_layout(mut self, layout: Arc<BindGroupLayout>) -> Self {
        self.bind_group_layouts.push(layout);
        self
    }

    /// Append a static sampler.
    pub fn with_static_sampler(mut self, sampler: Arc<StaticSampler>) -> Self {
        self.static_samplers.push(sampler);
        self
    }

    /// Set the push constant block.
    pub fn with_push_constants(mut self, push_constants: Arc<PushConstantsDesc>) -> Self {
        self.push_constants = Some(push_constants);
        self
    }
}

/// A pipeline layout created on the backend.
#[derive(Debug)]
pub struct PipelineLayout {
    desc: PipelineLayoutDesc,
    native: GpuPipelineLayout,
}

impl PipelineLayout {
    pub(crate) fn new(desc: PipelineLayoutDesc, native: GpuPipelineLayout) -> Self {
        Self { desc, native }
    }

    /// The description this layout was created from.
    pub fn desc(&self) -> &PipelineLayoutDesc {
        &self.desc
    }

    /// Native backend handle.
    pub fn native(&self) -> &GpuPipelineLayout {
        &self.native
    }
}
