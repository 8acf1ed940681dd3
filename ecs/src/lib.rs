//! # Vellum ECS
//!
//! Entity registry consumed by the Vellum GPU scene.
//!
//! ## Core Types
//!
//! - [`Entity`] - Lightweight generational entity identifier
//! - [`World`] - Container owning entities and their components
//! - [`ComponentKind`] - Closed set of supported component types
//! - [`ObserverEvent`] / [`SubscriptionId`] - Explicit mutation observers
//! - [`hierarchy`] - Parent/child relationships and transform propagation

pub mod component;
pub mod components;
mod entity;
mod error;
pub mod hierarchy;
mod observer;
mod sparse_set;
mod world;

pub use component::{Component, ComponentKind};
pub use entity::Entity;
pub use error::EcsError;
pub use observer::{ObserverEvent, ObserverFn, SubscriptionId};
pub use sparse_set::SparseSet;
pub use world::World;
