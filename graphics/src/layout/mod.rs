//! Bind group, static sampler, push constant and pipeline layouts.
//!
//! Layout descriptions are value types. [`BindLayoutCache`] turns them into
//! shared `Arc` handles so the renderer can compare layouts by pointer and
//! create each native pipeline layout only once.

mod cache;
mod entries;

pub use cache::{BindLayoutCache, LayoutCacheStats};
pub use entries::{
    BindGroupLayout, BindGroupLayoutEntry, BindingType, PipelineLayout, PipelineLayoutDesc,
    PushConstantsDesc, StaticSampler,
};
