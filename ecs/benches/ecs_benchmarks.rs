use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use vellum_ecs::components::Transform;
use vellum_ecs::{ComponentKind, ObserverEvent, World, hierarchy};

// ---------------------------------------------------------------------------
// Entity spawning
// ---------------------------------------------------------------------------

fn bench_spawn_with_transform_1k(c: &mut Criterion) {
    c.bench_function("spawn_1k_with_transform", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                for i in 0..1_000 {
                    let e = world.spawn();
                    world
                        .insert(e, Transform::from_xyz(i as f32, 0.0, 0.0))
                        .unwrap();
                    black_box(e);
                }
            },
            BatchSize::SmallInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Observed mutation
// ---------------------------------------------------------------------------

fn bench_patch_with_observer(c: &mut Criterion) {
    let mut world = World::new();
    world.subscribe(ComponentKind::Transform, ObserverEvent::Update, |_, e| {
        black_box(e);
    });
    let entities: Vec<_> = (0..1_000)
        .map(|_| {
            let e = world.spawn();
            world.insert(e, Transform::identity()).unwrap();
            e
        })
        .collect();

    c.bench_function("patch_1k_observed", |b| {
        b.iter(|| {
            for &e in &entities {
                world
                    .patch(e, |t: &mut Transform| t.translation.x += 1.0)
                    .unwrap();
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

fn bench_propagate_chain(c: &mut Criterion) {
    let mut world = World::new();
    let root = world.spawn();
    world.insert(root, Transform::from_xyz(1.0, 0.0, 0.0)).unwrap();
    let mut parent = root;
    for _ in 0..256 {
        let e = world.spawn();
        world.insert(e, Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
        hierarchy::set_parent(&mut world, e, parent).unwrap();
        parent = e;
    }

    c.bench_function("propagate_chain_256", |b| {
        b.iter(|| black_box(hierarchy::propagate(&mut world, root).len()));
    });
}

criterion_group!(
    benches,
    bench_spawn_with_transform_1k,
    bench_patch_with_observer,
    bench_propagate_chain,
);

criterion_main!(benches);
