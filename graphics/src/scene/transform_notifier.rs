//! Bridges entity transform changes to GPU scene dirty flags.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use vellum_ecs::components::GlobalTransform;
use vellum_ecs::{ComponentKind, Entity, ObserverEvent, SubscriptionId, World, hierarchy};

use crate::error::GraphicsError;

use super::gpu_scene::{DirtyTracker, DrawableId, GpuScene};

#[derive(Default)]
struct NotifierState {
    bindings: HashMap<Entity, Vec<DrawableId>>,
    world_transform_dirty: BTreeSet<Entity>,
}

impl NotifierState {
    fn on_change(&mut self, world: &World, entity: Entity, tracker: &DirtyTracker) {
        for e in hierarchy::subtree(world, entity) {
            if let Some(drawables) = self.bindings.get(&e) {
                for &id in drawables {
                    tracker.mark(id);
                }
            }
        }
        self.world_transform_dirty.insert(entity);
    }

    fn on_removed(&mut self, entity: Entity) {
        self.world_transform_dirty.remove(&entity);
        if let Some(drawables) = self.bindings.remove(&entity) {
            log::trace!("Dropped {} bindings of {entity}", drawables.len());
        }
    }

    /// Forget entities that no longer exist in `world`.
    fn prune(&mut self, world: &World) {
        self.bindings.retain(|&entity, _| world.is_alive(entity));
        self.world_transform_dirty
            .retain(|&entity| world.is_alive(entity));
    }

    fn drop_binding(&mut self, entity: Entity, drawable: DrawableId) {
        if let Some(drawables) = self.bindings.get_mut(&entity) {
            drawables.retain(|&d| d != drawable);
            if drawables.is_empty() {
                self.bindings.remove(&entity);
            }
        }
    }
}

/// Marks drawables dirty when the transform of their entity, or of one of
/// its ancestors, changes.
///
/// Listens to `Transform` inserts and patches, and to `Parent` inserts and
/// removals. Removing `Transform` from an entity, or despawning it, drops
/// its bindings. Drawables of the changed entity's whole subtree are marked in
/// the [`DirtyTracker`]; the changed entity is remembered until
/// [`sync_world_transforms`](Self::sync_world_transforms) recomputes world
/// matrices for it.
pub struct TransformChangeNotifier {
    state: Arc<Mutex<NotifierState>>,
    subscriptions: Vec<SubscriptionId>,
}

impl TransformChangeNotifier {
    /// Subscribe to `world` and start marking drawables in `tracker`.
    pub fn attach(world: &mut World, tracker: DirtyTracker) -> Self {
        let state = Arc::new(Mutex::new(NotifierState::default()));
        let mut subscriptions: Vec<SubscriptionId> = [
            (ComponentKind::Transform, ObserverEvent::Insert),
            (ComponentKind::Transform, ObserverEvent::Update),
            (ComponentKind::Parent, ObserverEvent::Insert),
            (ComponentKind::Parent, ObserverEvent::Remove),
        ]
        .into_iter()
        .map(|(kind, event)| {
            let state = Arc::clone(&state);
            let tracker = tracker.clone();
            world.subscribe(kind, event, move |world, entity| {
                state.lock().on_change(world, entity, &tracker);
            })
        })
        .collect();
        let removed = Arc::clone(&state);
        subscriptions.push(world.subscribe(
            ComponentKind::Transform,
            ObserverEvent::Remove,
            move |_world, entity| removed.lock().on_removed(entity),
        ));

        log::debug!("TransformChangeNotifier attached");
        Self {
            state,
            subscriptions,
        }
    }

    /// Associate `drawable` with `entity`.
    pub fn bind(&self, entity: Entity, drawable: DrawableId) {
        let mut state = self.state.lock();
        let drawables = state.bindings.entry(entity).or_default();
        if !drawables.contains(&drawable) {
            drawables.push(drawable);
        }
    }

    /// Remove one association. Returns `false` if it did not exist.
    pub fn unbind(&self, entity: Entity, drawable: DrawableId) -> bool {
        let mut state = self.state.lock();
        let Some(drawables) = state.bindings.get_mut(&entity) else {
            return false;
        };
        let before = drawables.len();
        drawables.retain(|&d| d != drawable);
        let removed = drawables.len() != before;
        if drawables.is_empty() {
            state.bindings.remove(&entity);
        }
        removed
    }

    /// Remove every association of `entity`, returning its drawables.
    pub fn unbind_entity(&self, entity: Entity) -> Vec<DrawableId> {
        let mut state = self.state.lock();
        state.world_transform_dirty.remove(&entity);
        state.bindings.remove(&entity).unwrap_or_default()
    }

    /// Drawables bound to `entity`.
    pub fn drawables_of(&self, entity: Entity) -> Vec<DrawableId> {
        self.state
            .lock()
            .bindings
            .get(&entity)
            .cloned()
            .unwrap_or_default()
    }

    /// Entities whose world transforms are waiting to be recomputed.
    pub fn world_transform_dirty(&self) -> Vec<Entity> {
        self.state.lock().world_transform_dirty.iter().copied().collect()
    }

    /// Recompute world transforms of every changed entity and its
    /// descendants, and store them in the bound drawables.
    ///
    /// Bindings of despawned entities are pruned first. A binding whose
    /// drawable has been unregistered from `scene` is skipped with a warning
    /// and dropped. Returns the number of entities whose world transform was
    /// recomputed.
    ///
    /// # Errors
    ///
    /// Propagates scene errors other than [`GraphicsError::UnknownDrawable`].
    /// Changed entities not yet synced stay pending for the next call.
    pub fn sync_world_transforms(
        &self,
        world: &mut World,
        scene: &mut GpuScene,
    ) -> Result<usize, GraphicsError> {
        let dirty: Vec<Entity> = {
            let mut state = self.state.lock();
            state.prune(world);
            std::mem::take(&mut state.world_transform_dirty)
                .into_iter()
                .collect()
        };
        let mut visited = HashSet::new();
        for (n, &root) in dirty.iter().enumerate() {
            if visited.contains(&root) {
                continue;
            }
            if let Err(e) = self.sync_subtree(world, scene, root, &mut visited) {
                self.state
                    .lock()
                    .world_transform_dirty
                    .extend(dirty[n..].iter().copied());
                return Err(e);
            }
        }
        if !visited.is_empty() {
            log::trace!("Synced {} world transforms", visited.len());
        }
        Ok(visited.len())
    }

    fn sync_subtree(
        &self,
        world: &mut World,
        scene: &mut GpuScene,
        root: Entity,
        visited: &mut HashSet<Entity>,
    ) -> Result<(), GraphicsError> {
        for entity in hierarchy::propagate(world, root) {
            visited.insert(entity);
            let Some(&GlobalTransform(matrix)) = world.get::<GlobalTransform>(entity) else {
                continue;
            };
            for id in self.drawables_of(entity) {
                match scene.set_world_transform(id, matrix) {
                    Ok(()) => {}
                    Err(GraphicsError::UnknownDrawable(stale)) => {
                        log::warn!("{entity} is bound to unregistered drawable {stale}, unbinding");
                        self.state.lock().drop_binding(entity, stale);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// Unsubscribe from `world`.
    pub fn detach(self, world: &mut World) {
        for id in self.subscriptions {
            world.unsubscribe(id);
        }
        log::debug!("TransformChangeNotifier detached");
    }
}

impl std::fmt::Debug for TransformChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TransformChangeNotifier")
            .field("bound_entities", &state.bindings.len())
            .field("world_transform_dirty", &state.world_transform_dirty.len())
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphicsConfig;
    use crate::device::GraphicsDevice;
    use crate::scene::Drawable;
    use vellum_core::math::Mat4;
    use vellum_core::mesh::generators::generate_box;
    use vellum_ecs::components::Transform;

    fn setup() -> (World, GpuScene) {
        let (device, _) = GraphicsDevice::with_dummy_backend(GraphicsConfig::default());
        (World::new(), GpuScene::new(&device).unwrap())
    }

    fn register(scene: &mut GpuScene, entity: Entity) -> DrawableId {
        let drawable = Drawable::new(Arc::new(generate_box([0.5; 3])), 0, Mat4::identity())
            .unwrap()
            .with_entity(entity);
        scene.register(drawable).unwrap()
    }

    #[test]
    fn repeated_patches_coalesce() {
        let (mut world, mut scene) = setup();
        let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());
        let entity = world.spawn();
        world.insert(entity, Transform::default()).unwrap();
        let id = register(&mut scene, entity);
        notifier.bind(entity, id);

        for x in 0..3 {
            world
                .patch::<Transform, _>(entity, |t| t.translation.x = x as f32)
                .unwrap();
        }
        assert_eq!(scene.dirty_count(), 1);
        assert_eq!(notifier.world_transform_dirty(), vec![entity]);
    }

    #[test]
    fn parent_change_marks_descendants() {
        let (mut world, mut scene) = setup();
        let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());
        let parent = world.spawn();
        let child = world.spawn();
        world.insert(parent, Transform::default()).unwrap();
        world.insert(child, Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
        hierarchy::set_parent(&mut world, child, parent).unwrap();
        let id = register(&mut scene, child);
        notifier.bind(child, id);
        scene.update().unwrap();

        world
            .patch::<Transform, _>(parent, |t| t.translation.x = 5.0)
            .unwrap();
        assert_eq!(scene.dirty_count(), 1);

        assert_eq!(notifier.sync_world_transforms(&mut world, &mut scene).unwrap(), 2);
        let transform = scene.drawable(id).unwrap().world_transform();
        assert_eq!(transform[(0, 3)], 5.0);
        assert_eq!(transform[(1, 3)], 1.0);
        assert!(notifier.world_transform_dirty().is_empty());
    }

    #[test]
    fn detach_unsubscribes() {
        let (mut world, scene) = setup();
        let before = world.subscription_count();
        let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());
        assert_eq!(world.subscription_count(), before + 5);
        notifier.detach(&mut world);
        assert_eq!(world.subscription_count(), before);

        let entity = world.spawn();
        world.insert(entity, Transform::default()).unwrap();
        assert_eq!(scene.dirty_count(), 0);
    }

    #[test]
    fn unbind_stops_marking() {
        let (mut world, mut scene) = setup();
        let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());
        let entity = world.spawn();
        world.insert(entity, Transform::default()).unwrap();
        let id = register(&mut scene, entity);
        notifier.bind(entity, id);
        assert!(notifier.unbind(entity, id));
        assert!(!notifier.unbind(entity, id));

        world
            .patch::<Transform, _>(entity, |t| t.scale.x = 2.0)
            .unwrap();
        assert_eq!(scene.dirty_count(), 0);
    }

    #[test]
    fn stale_binding_does_not_block_other_entities() {
        let (mut world, mut scene) = setup();
        let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());
        let a = world.spawn();
        let b = world.spawn();
        world.insert(a, Transform::default()).unwrap();
        world.insert(b, Transform::default()).unwrap();
        let id_a = register(&mut scene, a);
        let id_b = register(&mut scene, b);
        notifier.bind(a, id_a);
        notifier.bind(b, id_b);
        notifier.sync_world_transforms(&mut world, &mut scene).unwrap();
        scene.update().unwrap();

        scene.unregister(id_a).unwrap();
        world
            .patch::<Transform, _>(a, |t| t.translation.x = 1.0)
            .unwrap();
        world
            .patch::<Transform, _>(b, |t| t.translation.x = 7.0)
            .unwrap();

        assert_eq!(notifier.sync_world_transforms(&mut world, &mut scene).unwrap(), 2);
        assert_eq!(scene.drawable(id_b).unwrap().world_transform()[(0, 3)], 7.0);
        assert!(notifier.drawables_of(a).is_empty());
        assert!(notifier.world_transform_dirty().is_empty());
        assert_eq!(scene.update().unwrap(), 1);
    }

    #[test]
    fn removing_transform_drops_bindings() {
        let (mut world, mut scene) = setup();
        let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());
        let entity = world.spawn();
        world.insert(entity, Transform::default()).unwrap();
        let id = register(&mut scene, entity);
        notifier.bind(entity, id);

        world.remove::<Transform>(entity);
        assert!(notifier.drawables_of(entity).is_empty());
        assert!(notifier.world_transform_dirty().is_empty());
    }

    #[test]
    fn despawn_drops_bindings() {
        let (mut world, mut scene) = setup();
        let notifier = TransformChangeNotifier::attach(&mut world, scene.dirty_tracker());
        let with_transform = world.spawn();
        world.insert(with_transform, Transform::default()).unwrap();
        let bare = world.spawn();
        let id = register(&mut scene, with_transform);
        let other = register(&mut scene, bare);
        notifier.bind(with_transform, id);
        notifier.bind(bare, other);

        assert!(world.despawn(with_transform));
        assert!(notifier.drawables_of(with_transform).is_empty());

        // Entities without a transform are pruned on the next sync.
        assert!(world.despawn(bare));
        notifier.sync_world_transforms(&mut world, &mut scene).unwrap();
        assert!(notifier.drawables_of(bare).is_empty());
    }
}
