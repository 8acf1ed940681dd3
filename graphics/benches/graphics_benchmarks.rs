use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use vellum_core::math::Mat4;
use vellum_core::mesh::generators::generate_box;
use vellum_graphics::layout::{BindGroupLayout, BindLayoutCache, PipelineLayoutDesc};
use vellum_graphics::scene::{Drawable, GpuScene};
use vellum_graphics::{
    DescriptorAllocator, DescriptorHeapCapacities, DescriptorHeapKind, DummyBackend,
    GraphicsConfig, GraphicsDevice,
};

// ---------------------------------------------------------------------------
// Bind layout cache
// ---------------------------------------------------------------------------

fn material_layout() -> BindGroupLayout {
    BindGroupLayout::new()
        .with_uniform_buffer(0)
        .with_texture(1)
        .with_texture(2)
        .with_sampler(3)
}

fn bench_layout_cache_hit(c: &mut Criterion) {
    let cache = BindLayoutCache::new();
    cache.bind_group_layout(material_layout());
    c.bench_function("layout_cache_bind_group_hit", |b| {
        b.iter(|| black_box(cache.bind_group_layout(material_layout())));
    });
}

fn bench_pipeline_layout_hit(c: &mut Criterion) {
    let backend = DummyBackend::new();
    let cache = BindLayoutCache::new();
    let desc = || {
        PipelineLayoutDesc::new()
            .with_bind_group_layout(Arc::new(BindGroupLayout::new().with_uniform_buffer(0)))
            .with_bind_group_layout(Arc::new(material_layout()))
    };
    cache.pipeline_layout(&backend, desc()).unwrap();
    c.bench_function("layout_cache_pipeline_hit", |b| {
        b.iter(|| black_box(cache.pipeline_layout(&backend, desc()).unwrap()));
    });
}

// ---------------------------------------------------------------------------
// Descriptor allocator
// ---------------------------------------------------------------------------

fn bench_descriptor_churn(c: &mut Criterion) {
    let mut allocator = DescriptorAllocator::new(&DescriptorHeapCapacities::default());
    c.bench_function("descriptor_allocate_free_1000", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..1000)
                .map(|_| allocator.allocate(DescriptorHeapKind::Resource).unwrap())
                .collect();
            for handle in handles {
                allocator.free(black_box(handle));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Scene update
// ---------------------------------------------------------------------------

fn bench_scene_update(c: &mut Criterion) {
    let (device, backend) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
    let mut scene = GpuScene::new(&device).unwrap();
    let mesh = Arc::new(generate_box([0.5; 3]));
    let ids: Vec<_> = (0..256)
        .map(|_| {
            scene
                .register(Drawable::new(Arc::clone(&mesh), 0, Mat4::identity()).unwrap())
                .unwrap()
        })
        .collect();
    c.bench_function("scene_update_256_dirty", |b| {
        b.iter(|| {
            for &id in &ids {
                scene.mark_dirty(id).unwrap();
            }
            black_box(scene.update().unwrap());
            backend.clear_operations();
        });
    });
}

criterion_group!(
    benches,
    bench_layout_cache_hit,
    bench_pipeline_layout_hit,
    bench_descriptor_churn,
    bench_scene_update,
);
criterion_main!(benches);
