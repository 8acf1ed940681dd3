//! Explicit observer registration for component mutations.
//!
//! Subscribers register a callback for one `(ComponentKind, ObserverEvent)`
//! pair and receive a [`SubscriptionId`] they later hand back to
//! [`World::unsubscribe`](crate::World::unsubscribe). Callbacks run
//! synchronously at the point of mutation, in registration order.

use crate::component::ComponentKind;
use crate::entity::Entity;
use crate::world::World;

/// Which mutation an observer is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverEvent {
    /// Component inserted, either newly added or replacing a previous value.
    Insert,
    /// Component modified in place through [`World::patch`](crate::World::patch).
    Update,
    /// Component about to be removed, explicitly or by despawn.
    Remove,
}

/// Handle returned by [`World::subscribe`](crate::World::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Observer callback. Receives the world (read-only) and the affected entity.
pub type ObserverFn = Box<dyn FnMut(&World, Entity) + Send>;

struct Subscription {
    id: SubscriptionId,
    kind: ComponentKind,
    event: ObserverEvent,
    callback: ObserverFn,
}

/// Ordered list of subscriptions owned by a [`World`].
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl Observers {
    pub fn subscribe(
        &mut self,
        kind: ComponentKind,
        event: ObserverEvent,
        callback: ObserverFn,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            event,
            callback,
        });
        log::trace!("Subscribed {id:?} to {kind} {event:?}");
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn has_any(&self, kind: ComponentKind, event: ObserverEvent) -> bool {
        self.subscriptions
            .iter()
            .any(|s| s.kind == kind && s.event == event)
    }

    /// Takes the subscription list out so callbacks can borrow the world.
    fn take(&mut self) -> Vec<Subscription> {
        std::mem::take(&mut self.subscriptions)
    }

    fn restore(&mut self, subscriptions: Vec<Subscription>) {
        debug_assert!(self.subscriptions.is_empty());
        self.subscriptions = subscriptions;
    }
}

impl World {
    /// Invokes every observer registered for `(kind, event)` with `entity`.
    pub(crate) fn notify(&mut self, kind: ComponentKind, event: ObserverEvent, entity: Entity) {
        if !self.observers.has_any(kind, event) {
            return;
        }

        let mut subscriptions = self.observers.take();
        for sub in subscriptions
            .iter_mut()
            .filter(|s| s.kind == kind && s.event == event)
        {
            (sub.callback)(self, entity);
        }
        self.observers.restore(subscriptions);
    }
}
