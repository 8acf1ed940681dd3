//! Integration tests for the GPU scene mirror, transform notifier and display.

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{Backend, TestContext, box_at, matrix_bytes, tiny_scene};
use vellum_core::math::{Mat4, Vec3, mat4_from_translation};
use vellum_ecs::components::Transform;
use vellum_ecs::{World, hierarchy};
use vellum_graphics::scene::{
    CameraDescriptor, CameraHandle, CameraRegistry, DisplayOutcome, Displayer, GpuScene,
    HISTORY_TRANSFORMS_LABEL, MATERIAL_SLOT_CAPACITY, SceneMaterial, TRANSFORMS_LABEL,
    TransformChangeNotifier,
};
use vellum_graphics::{GraphicsError, TextureDescriptor, TextureFormat, TextureUsage};

fn translation(x: f32) -> Mat4 {
    mat4_from_translation(Vec3::new(x, 0.0, 0.0))
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::webgpu(Backend::WebGpu)]
fn test_update_moves_previous_transform_into_history(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {backend:?} not available, skipping");
        return;
    };
    let mut scene = GpuScene::new(&ctx.device).unwrap();
    let id = scene.register(box_at(1.0)).unwrap();
    let slot = scene.offsets(id).unwrap().transform;

    scene.set_world_transform(id, translation(2.0)).unwrap();
    assert_eq!(scene.update().unwrap(), 1);
    let history = |scene: &GpuScene| scene.data().history_transforms().read(slot, 1).unwrap();
    assert_eq!(history(&scene), matrix_bytes(&translation(1.0)));
    assert_eq!(
        scene.data().transforms().read(slot, 1).unwrap(),
        matrix_bytes(&translation(2.0))
    );

    // A clean frame leaves both arrays alone.
    assert_eq!(scene.update().unwrap(), 0);
    assert_eq!(history(&scene), matrix_bytes(&translation(1.0)));
}

#[test]
fn test_one_history_and_one_current_write_per_dirty_drawable() {
    let ctx = TestContext::new(Backend::Dummy).unwrap();
    let dummy = ctx.dummy.as_ref().unwrap();
    let mut scene = GpuScene::new(&ctx.device).unwrap();
    let a = scene.register(box_at(0.0)).unwrap();
    let b = scene.register(box_at(5.0)).unwrap();
    dummy.clear_operations();

    for x in 1..=4 {
        scene.set_world_transform(a, translation(x as f32)).unwrap();
    }
    scene.mark_dirty(b).unwrap();
    assert_eq!(scene.dirty_count(), 2);
    assert_eq!(scene.update().unwrap(), 2);

    let history = dummy.buffer_writes(HISTORY_TRANSFORMS_LABEL);
    let current = dummy.buffer_writes(TRANSFORMS_LABEL);
    assert_eq!(history.len(), 2);
    assert_eq!(current.len(), 2);
    assert!(history.contains(&(0, matrix_bytes(&translation(0.0)))));
    assert!(current.contains(&(0, matrix_bytes(&translation(4.0)))));
    assert!(history.contains(&(64, matrix_bytes(&translation(5.0)))));
    assert!(current.contains(&(64, matrix_bytes(&translation(5.0)))));
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::webgpu(Backend::WebGpu)]
fn test_growth_preserves_offsets_and_data(#[case] backend: Backend) {
    let Some(ctx) = TestContext::with_config(backend, tiny_scene()) else {
        eprintln!("Backend {backend:?} not available, skipping");
        return;
    };
    let mut scene = GpuScene::new(&ctx.device).unwrap();
    let first = scene.register(box_at(1.0)).unwrap();
    let offsets = scene.offsets(first).unwrap().clone();
    let positions = scene
        .data()
        .positions()
        .read(offsets.vertices.start, offsets.vertices.len() as u32)
        .unwrap();
    let capacity = scene.data().positions().capacity();

    let others: Vec<_> = (0..3).map(|i| scene.register(box_at(i as f32)).unwrap()).collect();
    assert!(scene.data().positions().capacity() > capacity);
    assert_eq!(scene.offsets(first), Some(&offsets));
    assert_eq!(
        scene
            .data()
            .positions()
            .read(offsets.vertices.start, offsets.vertices.len() as u32)
            .unwrap(),
        positions
    );
    assert_eq!(
        scene.data().transforms().read(offsets.transform, 1).unwrap(),
        matrix_bytes(&translation(1.0))
    );

    let mut ranges: Vec<_> = std::iter::once(first)
        .chain(others)
        .map(|id| scene.offsets(id).unwrap().vertices.clone())
        .collect();
    ranges.sort_by_key(|r| r.start);
    assert!(ranges.windows(2).all(|w| w[0].end <= w[1].start));
}

#[test]
fn test_scene_bounds_cover_every_drawable() {
    let ctx = TestContext::new(Backend::Dummy).unwrap();
    let mut scene = GpuScene::new(&ctx.device).unwrap();
    scene.register(box_at(-3.0)).unwrap();
    let id = scene.register(box_at(3.0)).unwrap();
    let bounds = scene.bounds();
    assert_eq!(bounds.p_min.x, -3.5);
    assert_eq!(bounds.p_max.x, 3.5);
    assert_eq!(scene.bounding_box(id).unwrap().p_min.x, 2.5);
}

#[test]
fn test_material_slot_exhaustion_leaves_no_partial_claim() {
    let ctx = TestContext::new(Backend::Dummy).unwrap();
    let mut scene = GpuScene::new(&ctx.device).unwrap();
    let a = scene.register(box_at(0.0)).unwrap();
    let b = scene.register(box_at(1.0)).unwrap();

    let texture = || {
        ctx.device
            .create_texture(&TextureDescriptor::new_2d(
                4,
                4,
                TextureFormat::Rgba8Unorm,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap()
    };
    let textures: Vec<_> = (0..MATERIAL_SLOT_CAPACITY).map(|_| texture()).collect();
    let full = SceneMaterial {
        textures: textures.clone(),
        ..Default::default()
    };
    scene.assign_material(a, &full).unwrap();
    assert_eq!(scene.texture_slot_count(), MATERIAL_SLOT_CAPACITY);

    let overflow = SceneMaterial::default()
        .with_texture(Arc::clone(&textures[0]))
        .with_texture(texture());
    assert!(matches!(
        scene.assign_material(b, &overflow),
        Err(GraphicsError::SlotArrayFull { array: "texture", .. })
    ));
    assert_eq!(scene.texture_slot_count(), MATERIAL_SLOT_CAPACITY);
    assert!(scene.offsets(b).unwrap().texture_slots.is_empty());

    // Shared textures reuse the existing slot.
    let shared = SceneMaterial::default().with_texture(Arc::clone(&textures[0]));
    scene.assign_material(b, &shared).unwrap();
    assert_eq!(scene.offsets(b).unwrap().texture_slots, vec![0]);

    scene.unregister(a).unwrap();
    assert_eq!(scene.texture_slot_count(), 1);
}

#[test]
fn test_notifier_drives_scene_update() {
    let ctx = TestContext::new(Backend::Dummy).unwrap();
    let dummy = ctx.dummy.as_ref().unwrap();
    let mut scene = GpuScene::new(&ctx.device).unwrap();
    let mut world = World::new();
    let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());

    let root = world.spawn();
    let leaf = world.spawn();
    world.insert(root, Transform::from_xyz(1.0, 0.0, 0.0)).unwrap();
    world.insert(leaf, Transform::from_xyz(0.0, 2.0, 0.0)).unwrap();
    hierarchy::set_parent(&mut world, leaf, root).unwrap();

    let root_id = scene.register(box_at(0.0).with_entity(root)).unwrap();
    let leaf_id = scene.register(box_at(0.0).with_entity(leaf)).unwrap();
    notifier.bind(root, root_id);
    notifier.bind(leaf, leaf_id);
    notifier.sync_world_transforms(&mut world, &mut scene).unwrap();
    scene.update().unwrap();
    dummy.clear_operations();

    for _ in 0..3 {
        world
            .patch::<Transform, _>(root, |t| t.translation.x += 1.0)
            .unwrap();
    }
    assert_eq!(scene.dirty_count(), 2);
    notifier.sync_world_transforms(&mut world, &mut scene).unwrap();
    assert_eq!(scene.update().unwrap(), 2);
    assert_eq!(dummy.buffer_writes(TRANSFORMS_LABEL).len(), 2);
    assert_eq!(dummy.buffer_writes(HISTORY_TRANSFORMS_LABEL).len(), 2);

    let leaf_world = scene.drawable(leaf_id).unwrap().world_transform();
    assert_eq!(leaf_world[(0, 3)], 4.0);
    assert_eq!(leaf_world[(1, 3)], 2.0);

    notifier.detach(&mut world);
    world
        .patch::<Transform, _>(root, |t| t.translation.x = 0.0)
        .unwrap();
    assert_eq!(scene.dirty_count(), 0);
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::webgpu(Backend::WebGpu)]
fn test_display(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {backend:?} not available, skipping");
        return;
    };
    let output = ctx
        .device
        .create_texture(
            &TextureDescriptor::new_2d(32, 32, TextureFormat::Rgba8Unorm, TextureUsage::COPY_DST)
                .with_label("output"),
        )
        .unwrap();
    let mut cameras = CameraRegistry::new();
    let camera = cameras
        .create(&ctx.device, CameraDescriptor::new(32, 32).with_label("main"))
        .unwrap();
    let mut displayer = Displayer::new(Arc::clone(&ctx.device), output);

    assert_eq!(displayer.display(&cameras).unwrap(), DisplayOutcome::Skipped);
    displayer.set_camera(camera);
    assert_eq!(displayer.display(&cameras).unwrap(), DisplayOutcome::Presented);
    displayer.set_camera(CameraHandle::INVALID);
    assert!(!displayer.is_valid());
    assert_eq!(displayer.display(&cameras).unwrap(), DisplayOutcome::Skipped);

    if let Some(dummy) = &ctx.dummy {
        assert_eq!(dummy.texture_copy_count(), 1);
    }
}
