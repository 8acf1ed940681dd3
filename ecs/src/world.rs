use crate::component::{Component, ComponentKind, Storages};
use crate::entity::{Entity, EntityAllocator};
use crate::error::EcsError;
use crate::observer::{ObserverEvent, Observers, SubscriptionId};

/// An entity registry with typed component storage and mutation observers.
///
/// Each World is fully self-contained. Component types come from the closed
/// [`ComponentKind`] set.
///
/// # Observation
///
/// [`insert`](World::insert), [`patch`](World::patch),
/// [`remove`](World::remove) and [`despawn`](World::despawn) notify
/// subscribers synchronously. [`get_mut`](World::get_mut) does not; use it
/// for bookkeeping writes that observers should not see.
///
/// # Example
///
/// ```
/// use vellum_ecs::{ComponentKind, ObserverEvent, World};
/// use vellum_ecs::components::Transform;
///
/// let mut world = World::new();
/// let id = world.subscribe(ComponentKind::Transform, ObserverEvent::Update, |_world, entity| {
///     println!("{entity} moved");
/// });
///
/// let entity = world.spawn();
/// world.insert(entity, Transform::from_xyz(0.0, 1.0, 0.0)).unwrap();
/// world.patch(entity, |t: &mut Transform| t.translation.x += 1.0).unwrap();
/// world.unsubscribe(id);
/// ```
pub struct World {
    entities: EntityAllocator,
    storages: Storages,
    pub(crate) observers: Observers,
}

impl World {
    /// Creates a new empty world.
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            storages: Storages::default(),
            observers: Observers::default(),
        }
    }

    // ---- Entity management ----

    /// Spawns a new entity and returns its ID.
    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Despawns an entity, removing all its components.
    ///
    /// `Remove` observers fire for each component while it is still
    /// readable. Returns `false` if the entity was already dead.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }

        let index = entity.index();
        for kind in ComponentKind::ALL {
            if self.storages.contains_untyped(kind, index) {
                self.notify(kind, ObserverEvent::Remove, entity);
                self.storages.remove_untyped(kind, index);
            }
        }
        self.entities.deallocate(entity)
    }

    /// Returns whether the entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the number of alive entities.
    pub fn entity_count(&self) -> u32 {
        self.entities.count()
    }

    /// Iterates over all alive entities.
    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    // ---- Component access ----

    /// Inserts or replaces a component, then fires `Insert` observers.
    ///
    /// Returns the previous value, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DeadEntity`] if the entity is not alive.
    pub fn insert<C: Component>(
        &mut self,
        entity: Entity,
        component: C,
    ) -> Result<Option<C>, EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        let previous = C::storage_mut(&mut self.storages).insert(entity.index(), component);
        self.notify(C::KIND, ObserverEvent::Insert, entity);
        Ok(previous)
    }

    /// Modifies a component in place, then fires `Update` observers.
    ///
    /// Every call notifies once; coalescing repeated updates is the
    /// subscriber's concern.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DeadEntity`] or [`EcsError::MissingComponent`].
    pub fn patch<C: Component, R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut C) -> R,
    ) -> Result<R, EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        let component = C::storage_mut(&mut self.storages)
            .get_mut(entity.index())
            .ok_or(EcsError::MissingComponent {
                entity,
                kind: C::KIND,
            })?;
        let result = f(component);
        self.notify(C::KIND, ObserverEvent::Update, entity);
        Ok(result)
    }

    /// Removes a component from an entity.
    ///
    /// `Remove` observers fire before the value is taken out.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        if !self.has::<C>(entity) {
            return None;
        }
        self.notify(C::KIND, ObserverEvent::Remove, entity);
        C::storage_mut(&mut self.storages).remove(entity.index())
    }

    /// Returns a reference to a component on an entity.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        C::storage(&self.storages).get(entity.index())
    }

    /// Returns a mutable reference to a component. Does not notify observers.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        C::storage_mut(&mut self.storages).get_mut(entity.index())
    }

    /// Returns whether the entity has a component of type `C`.
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.has_kind(entity, C::KIND)
    }

    /// Returns whether the entity has a component of the given kind.
    pub fn has_kind(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.entities.is_alive(entity) && self.storages.contains_untyped(kind, entity.index())
    }

    /// Component kinds present on an entity, in [`ComponentKind::ALL`] order.
    pub fn kinds_of(&self, entity: Entity) -> Vec<ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(|kind| self.has_kind(entity, *kind))
            .collect()
    }

    /// Removes a component by name.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] if `name` is not a known kind;
    /// nothing is removed in that case.
    pub fn remove_by_name(&mut self, entity: Entity, name: &str) -> Result<bool, EcsError> {
        let kind = ComponentKind::from_name(name)?;
        if !self.has_kind(entity, kind) {
            return Ok(false);
        }
        self.notify(kind, ObserverEvent::Remove, entity);
        Ok(self.storages.remove_untyped(kind, entity.index()))
    }

    /// Iterates over every `(entity, component)` pair of type `C`.
    pub fn query<C: Component>(&self) -> impl Iterator<Item = (Entity, &C)> + '_ {
        C::storage(&self.storages)
            .iter()
            .filter_map(|(index, c)| self.entities.entity_at(index).map(|e| (e, c)))
    }

    // ---- Observers ----

    /// Registers `callback` for mutations of `kind` matching `event`.
    ///
    /// Callbacks run synchronously inside the mutating call, in registration
    /// order, and receive the world read-only.
    pub fn subscribe(
        &mut self,
        kind: ComponentKind,
        event: ObserverEvent,
        callback: impl FnMut(&World, Entity) + Send + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(kind, event, Box::new(callback))
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.observers.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(World: Send);
