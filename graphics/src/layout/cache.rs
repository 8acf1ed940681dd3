//! Deduplicating cache for binding layouts and pipeline layouts.

use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use vellum_core::hash::{StructuralCache, structural_hash};

use crate::backend::GpuBackend;
use crate::error::GraphicsError;

use super::{BindGroupLayout, PipelineLayout, PipelineLayoutDesc, PushConstantsDesc, StaticSampler};

/// Counts reported by [`BindLayoutCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutCacheStats {
    /// Distinct bind group layouts.
    pub bind_group_layouts: usize,
    /// Distinct static samplers.
    pub static_samplers: usize,
    /// Distinct push constant blocks.
    pub push_constants: usize,
    /// Distinct pipeline layouts.
    pub pipeline_layouts: usize,
    /// Native pipeline layouts created through the backend.
    pub native_pipeline_layouts: u64,
    /// Pipeline layout requests answered from the cache.
    pub pipeline_layout_hits: u64,
}

/// Hands out one canonical `Arc` per structurally distinct layout.
///
/// Lookups take a read lock; only a miss takes the write lock, and the
/// entry is re-checked under it so racing inserters agree on one value.
#[derive(Debug, Default)]
pub struct BindLayoutCache {
    bind_group_layouts: RwLock<StructuralCache<BindGroupLayout, Arc<BindGroupLayout>>>,
    static_samplers: RwLock<StructuralCache<StaticSampler, Arc<StaticSampler>>>,
    push_constants: RwLock<StructuralCache<PushConstantsDesc, Arc<PushConstantsDesc>>>,
    pipeline_layouts: RwLock<StructuralCache<PipelineLayoutDesc, Arc<PipelineLayout>>>,
    native_created: AtomicU64,
}

fn canonical<K: Hash + Eq>(cache: &RwLock<StructuralCache<K, Arc<K>>>, key: K) -> Arc<K> {
    let hash = structural_hash(&key);
    if let Some(hit) = cache.read().get_hashed(hash, &key) {
        return hit;
    }
    cache
        .write()
        .get_or_try_insert_with::<_, std::convert::Infallible>(hash, key, |k| Ok(Arc::clone(k)))
        .unwrap_or_else(|never| match never {})
}

impl BindLayoutCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical handle for a bind group layout.
    pub fn bind_group_layout(&self, layout: BindGroupLayout) -> Arc<BindGroupLayout> {
        canonical(&self.bind_group_layouts, layout)
    }

    /// Canonical handle for a static sampler.
    pub fn static_sampler(&self, sampler: StaticSampler) -> Arc<StaticSampler> {
        canonical(&self.static_samplers, sampler)
    }

    /// Canonical handle for a push constant block.
    pub fn push_constants(&self, desc: PushConstantsDesc) -> Arc<PushConstantsDesc> {
        canonical(&self.push_constants, desc)
    }

    /// Canonical pipeline layout for `desc`.
    ///
    /// The native layout is created through `backend` the first time a
    /// structurally new description is seen. Components of `desc` are
    /// replaced by their canonical handles before storage.
    ///
    /// # Errors
    ///
    /// Propagates the backend error; nothing is cached in that case.
    pub fn pipeline_layout(
        &self,
        backend: &dyn GpuBackend,
        desc: PipelineLayoutDesc,
    ) -> Result<Arc<PipelineLayout>, GraphicsError> {
        let desc = self.canonicalize(desc);
        let hash = structural_hash(&desc);
        if let Some(hit) = self.pipeline_layouts.read().get_hashed(hash, &desc) {
            return Ok(hit);
        }

        self.pipeline_layouts
            .write()
            .get_or_try_insert_with(hash, desc, |desc| {
                let native = backend.create_pipeline_layout(desc)?;
                let created = self.native_created.fetch_add(1, Ordering::Relaxed) + 1;
                log::debug!(
                    "Created pipeline layout #{created} ({} bind groups, {} static samplers)",
                    desc.bind_group_layouts.len(),
                    desc.static_samplers.len()
                );
                Ok(Arc::new(PipelineLayout::new((**desc).clone(), native)))
            })
    }

    fn canonicalize(&self, desc: PipelineLayoutDesc) -> PipelineLayoutDesc {
        PipelineLayoutDesc {
            bind_group_layouts: desc
                .bind_group_layouts
                .into_iter()
                .map(|l| self.bind_group_layout(Arc::unwrap_or_clone(l)))
                .collect(),
            static_samplers: desc
                .static_samplers
                .into_iter()
                .map(|s| self.static_sampler(Arc::unwrap_or_clone(s)))
                .collect(),
            push_constants: desc
                .push_constants
                .map(|p| self.push_constants(Arc::unwrap_or_clone(p))),
        }
    }

    /// Current cache sizes.
    pub fn stats(&self) -> LayoutCacheStats {
        LayoutCacheStats {
            bind_group_layouts: self.bind_group_layouts.read().len(),
            static_samplers: self.static_samplers.read().len(),
            push_constants: self.push_constants.read().len(),
            pipeline_layouts: self.pipeline_layouts.read().len(),
            native_pipeline_layouts: self.native_created.load(Ordering::Relaxed),
            pipeline_layout_hits: self.pipeline_layouts.read().hits(),
        }
    }
}

static_assertions::assert_impl_all!(BindLayoutCache: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, DummyOp};
    use crate::types::{SamplerDescriptor, ShaderStageFlags};

    #[test]
    fn equal_layouts_share_one_arc() {
        let cache = BindLayoutCache::new();
        let a = cache.bind_group_layout(BindGroupLayout::new().with_uniform_buffer(0));
        let b = cache.bind_group_layout(BindGroupLayout::new().with_uniform_buffer(0));
        let c = cache.bind_group_layout(BindGroupLayout::new().with_texture(0));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.stats().bind_group_layouts, 2);
    }

    #[test]
    fn samplers_and_push_constants_deduplicate() {
        let cache = BindLayoutCache::new();
        let s1 = cache.static_sampler(StaticSampler::new(SamplerDescriptor::linear(), 0));
        let s2 = cache.static_sampler(StaticSampler::new(SamplerDescriptor::linear(), 0));
        assert!(Arc::ptr_eq(&s1, &s2));

        let desc = PushConstantsDesc {
            space: 0,
            register: 0,
            visibility: ShaderStageFlags::VERTEX,
            size: 64,
        };
        assert!(Arc::ptr_eq(
            &cache.push_constants(desc),
            &cache.push_constants(desc)
        ));
    }

    #[test]
    fn native_layout_is_created_once_per_description() {
        let backend = DummyBackend::new();
        let cache = BindLayoutCache::new();
        let make = || {
            PipelineLayoutDesc::new()
                .with_bind_group_layout(Arc::new(BindGroupLayout::new().with_uniform_buffer(0)))
        };

        let a = cache.pipeline_layout(&backend, make()).unwrap();
        let b = cache.pipeline_layout(&backend, make()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let created = backend
            .operations()
            .iter()
            .filter(|op| matches!(op, DummyOp::CreatePipelineLayout { .. }))
            .count();
        assert_eq!(created, 1);
        assert_eq!(cache.stats().native_pipeline_layouts, 1);
        assert_eq!(cache.stats().pipeline_layout_hits, 1);
    }

    #[test]
    fn stored_description_uses_canonical_components() {
        let backend = DummyBackend::new();
        let cache = BindLayoutCache::new();
        let canonical = cache.bind_group_layout(BindGroupLayout::new().with_sampler(0));
        let layout = cache
            .pipeline_layout(
                &backend,
                PipelineLayoutDesc::new()
                    .with_bind_group_layout(Arc::new(BindGroupLayout::new().with_sampler(0))),
            )
            .unwrap();
        assert!(Arc::ptr_eq(&layout.desc().bind_group_layouts[0], &canonical));
    }
}
