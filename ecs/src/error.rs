use thiserror::Error;

use crate::component::ComponentKind;
use crate::entity::Entity;

/// Errors produced by [`World`](crate::World) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A component name did not match any registered [`ComponentKind`].
    #[error("unknown component type `{0}`")]
    UnknownComponent(String),

    /// The entity has been despawned or never existed.
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),

    /// The entity does not carry the requested component.
    #[error("entity {entity} has no {kind} component")]
    MissingComponent {
        /// Entity that was queried.
        entity: Entity,
        /// Component that was expected.
        kind: ComponentKind,
    },

    /// Parenting would create a cycle.
    #[error("cannot parent {entity} under {parent}: would create a cycle")]
    HierarchyCycle {
        /// Child being re-parented.
        entity: Entity,
        /// Requested parent.
        parent: Entity,
    },
}
