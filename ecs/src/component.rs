//! The closed set of component kinds a [`World`](crate::World) can store.
//!
//! Every component type is listed in [`ComponentKind`] and has a dedicated
//! storage in [`Storages`]. Name lookups go through
//! [`ComponentKind::from_name`], which rejects anything not in the list.

use crate::components::{Children, GlobalTransform, MeshRenderer, Name, Parent, Transform};
use crate::error::EcsError;
use crate::sparse_set::SparseSet;

/// Tag identifying one of the supported component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// [`Transform`]
    Transform,
    /// [`GlobalTransform`]
    GlobalTransform,
    /// [`Parent`]
    Parent,
    /// [`Children`]
    Children,
    /// [`Name`]
    Name,
    /// [`MeshRenderer`]
    MeshRenderer,
}

impl ComponentKind {
    /// Every kind, in declaration order.
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Transform,
        ComponentKind::GlobalTransform,
        ComponentKind::Parent,
        ComponentKind::Children,
        ComponentKind::Name,
        ComponentKind::MeshRenderer,
    ];

    /// Stable string name, used by serialized scenes and editor tooling.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::GlobalTransform => "GlobalTransform",
            ComponentKind::Parent => "Parent",
            ComponentKind::Children => "Children",
            ComponentKind::Name => "Name",
            ComponentKind::MeshRenderer => "MeshRenderer",
        }
    }

    /// Resolve a component name.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] (and logs an error) when `name`
    /// is not one of [`ComponentKind::ALL`].
    pub fn from_name(name: &str) -> Result<Self, EcsError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| {
                log::error!("Unknown component type `{name}`");
                EcsError::UnknownComponent(name.to_owned())
            })
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One sparse set per [`ComponentKind`].
#[derive(Default)]
pub struct Storages {
    transforms: SparseSet<Transform>,
    global_transforms: SparseSet<GlobalTransform>,
    parents: SparseSet<Parent>,
    children: SparseSet<Children>,
    names: SparseSet<Name>,
    mesh_renderers: SparseSet<MeshRenderer>,
}

impl Storages {
    /// Removes whatever component of `kind` the slot holds.
    pub(crate) fn remove_untyped(&mut self, kind: ComponentKind, index: u32) -> bool {
        match kind {
            ComponentKind::Transform => self.transforms.remove(index).is_some(),
            ComponentKind::GlobalTransform => self.global_transforms.remove(index).is_some(),
            ComponentKind::Parent => self.parents.remove(index).is_some(),
            ComponentKind::Children => self.children.remove(index).is_some(),
            ComponentKind::Name => self.names.remove(index).is_some(),
            ComponentKind::MeshRenderer => self.mesh_renderers.remove(index).is_some(),
        }
    }

    pub(crate) fn contains_untyped(&self, kind: ComponentKind, index: u32) -> bool {
        match kind {
            ComponentKind::Transform => self.transforms.contains(index),
            ComponentKind::GlobalTransform => self.global_transforms.contains(index),
            ComponentKind::Parent => self.parents.contains(index),
            ComponentKind::Children => self.children.contains(index),
            ComponentKind::Name => self.names.contains(index),
            ComponentKind::MeshRenderer => self.mesh_renderers.contains(index),
        }
    }
}

/// A type that can be stored in a [`World`](crate::World).
///
/// Implemented only for the types in [`crate::components`]; the storage
/// accessors make the set closed to downstream crates.
pub trait Component: Send + Sync + Sized + 'static {
    /// Tag of this component type.
    const KIND: ComponentKind;

    #[doc(hidden)]
    fn storage(storages: &Storages) -> &SparseSet<Self>;

    #[doc(hidden)]
    fn storage_mut(storages: &mut Storages) -> &mut SparseSet<Self>;
}

macro_rules! impl_component {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;

            fn storage(storages: &Storages) -> &SparseSet<Self> {
                &storages.$field
            }

            fn storage_mut(storages: &mut Storages) -> &mut SparseSet<Self> {
                &mut storages.$field
            }
        }
    };
}

impl_component!(Transform, Transform, transforms);
impl_component!(GlobalTransform, GlobalTransform, global_transforms);
impl_component!(Parent, Parent, parents);
impl_component!(Children, Children, children);
impl_component!(Name, Name, names);
impl_component!(MeshRenderer, MeshRenderer, mesh_renderers);
