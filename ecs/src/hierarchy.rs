//! Parent-child hierarchy operations and world-transform propagation.
//!
//! All operations maintain consistency between [`Parent`] and [`Children`]
//! components.
//!
//! ```ignore
//! set_parent(&mut world, child, parent)?;
//! let touched = propagate(&mut world, parent);
//! remove_parent(&mut world, child);
//! despawn_recursive(&mut world, parent);
//! ```

use vellum_core::math::Mat4;

use crate::components::{Children, GlobalTransform, Parent, Transform};
use crate::error::EcsError;
use crate::{Entity, World};

/// Sets `entity` as a child of `parent`.
///
/// Updates both the [`Parent`] component on `entity` and the [`Children`]
/// component on `parent`. If `entity` already has a different parent it is
/// removed from the old parent's children first.
///
/// # Errors
///
/// - [`EcsError::DeadEntity`] if either entity is not alive.
/// - [`EcsError::HierarchyCycle`] if `parent` is `entity` or one of its
///   descendants.
pub fn set_parent(world: &mut World, entity: Entity, parent: Entity) -> Result<(), EcsError> {
    for e in [entity, parent] {
        if !world.is_alive(e) {
            return Err(EcsError::DeadEntity(e));
        }
    }
    if entity == parent || is_ancestor_of(world, entity, parent) {
        return Err(EcsError::HierarchyCycle { entity, parent });
    }

    if let Some(old_parent) = world.get::<Parent>(entity).map(|p| p.0) {
        if old_parent == parent {
            return Ok(());
        }
        if let Some(children) = world.get_mut::<Children>(old_parent) {
            children.0.retain(|&e| e != entity);
        }
    }

    world.insert(entity, Parent(parent))?;

    if let Some(children) = world.get_mut::<Children>(parent) {
        if !children.0.contains(&entity) {
            children.0.push(entity);
        }
    } else {
        world.insert(parent, Children(vec![entity]))?;
    }
    Ok(())
}

/// Removes the parent relationship from `entity`.
///
/// Does nothing if `entity` has no parent.
pub fn remove_parent(world: &mut World, entity: Entity) {
    let Some(parent) = world.remove::<Parent>(entity) else {
        return;
    };
    if let Some(children) = world.get_mut::<Children>(parent.0) {
        children.0.retain(|&e| e != entity);
    }
}

/// Direct children of `entity`, in insertion order.
pub fn children(world: &World, entity: Entity) -> &[Entity] {
    world
        .get::<Children>(entity)
        .map(|c| c.0.as_slice())
        .unwrap_or(&[])
}

/// `entity` followed by all of its descendants, depth-first.
pub fn subtree(world: &World, entity: Entity) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut stack = vec![entity];
    while let Some(e) = stack.pop() {
        if !world.is_alive(e) {
            continue;
        }
        out.push(e);
        stack.extend(children(world, e).iter().rev().copied());
    }
    out
}

/// Returns `true` if `ancestor` appears on the parent chain of `entity`.
pub fn is_ancestor_of(world: &World, ancestor: Entity, entity: Entity) -> bool {
    let mut current = entity;
    for _ in 0..world.entity_count() {
        match world.get::<Parent>(current) {
            Some(Parent(p)) if *p == ancestor => return true,
            Some(Parent(p)) => current = *p,
            None => return false,
        }
    }
    false
}

/// World matrix of `entity`, computed from local transforms up the parent
/// chain. Entities without a [`Transform`] contribute identity.
pub fn world_matrix(world: &World, entity: Entity) -> Mat4 {
    let mut matrix = local_matrix(world, entity);
    let mut current = entity;
    for _ in 0..world.entity_count() {
        let Some(&Parent(parent)) = world.get::<Parent>(current) else {
            break;
        };
        matrix = local_matrix(world, parent) * matrix;
        current = parent;
    }
    matrix
}

fn local_matrix(world: &World, entity: Entity) -> Mat4 {
    world
        .get::<Transform>(entity)
        .map(Transform::compute_matrix)
        .unwrap_or_else(Mat4::identity)
}

/// Recomputes [`GlobalTransform`] for `entity` and all of its descendants.
///
/// Writes are silent (no observer notifications). Returns every entity
/// whose global transform was written, parents before children.
pub fn propagate(world: &mut World, entity: Entity) -> Vec<Entity> {
    if !world.is_alive(entity) {
        return Vec::new();
    }
    let parent_world = match world.get::<Parent>(entity) {
        Some(&Parent(parent)) => world_matrix(world, parent),
        None => Mat4::identity(),
    };

    let mut touched = Vec::new();
    let mut stack = vec![(entity, parent_world)];
    while let Some((e, parent_world)) = stack.pop() {
        if !world.is_alive(e) {
            continue;
        }
        let global = parent_world * local_matrix(world, e);
        write_global(world, e, global);
        touched.push(e);
        for &child in children(world, e).iter().rev() {
            stack.push((child, global));
        }
    }
    touched
}

/// Recomputes [`GlobalTransform`] for every root entity with a [`Transform`].
pub fn propagate_all(world: &mut World) -> usize {
    let roots: Vec<Entity> = world
        .query::<Transform>()
        .map(|(e, _)| e)
        .filter(|e| !world.has::<Parent>(*e))
        .collect();
    roots.into_iter().map(|root| propagate(world, root).len()).sum()
}

fn write_global(world: &mut World, entity: Entity, matrix: Mat4) {
    if let Some(global) = world.get_mut::<GlobalTransform>(entity) {
        global.0 = matrix;
    } else {
        let _ = world.insert(entity, GlobalTransform(matrix));
    }
}

/// Despawns an entity and all its descendants.
pub fn despawn_recursive(world: &mut World, entity: Entity) {
    remove_parent(world, entity);
    for e in subtree(world, entity).into_iter().rev() {
        world.despawn(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::math::Vec3;

    fn translation(world: &World, e: Entity) -> Vec3 {
        world.get::<GlobalTransform>(e).unwrap().translation()
    }

    #[test]
    fn set_parent_creates_relationship() {
        let mut world = World::new();
        let parent = world.spawn();
        let child = world.spawn();

        set_parent(&mut world, child, parent).unwrap();

        assert_eq!(world.get::<Parent>(child), Some(&Parent(parent)));
        assert_eq!(children(&world, parent), &[child]);
    }

    #[test]
    fn set_parent_idempotent() {
        let mut world = World::new();
        let parent = world.spawn();
        let child = world.spawn();

        set_parent(&mut world, child, parent).unwrap();
        set_parent(&mut world, child, parent).unwrap();
        assert_eq!(children(&world, parent).len(), 1);
    }

    #[test]
    fn reparent_moves_child() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let child = world.spawn();

        set_parent(&mut world, child, a).unwrap();
        set_parent(&mut world, child, b).unwrap();
        assert!(children(&world, a).is_empty());
        assert_eq!(children(&world, b), &[child]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        set_parent(&mut world, b, a).unwrap();
        set_parent(&mut world, c, b).unwrap();

        assert_eq!(
            set_parent(&mut world, a, c),
            Err(EcsError::HierarchyCycle { entity: a, parent: c })
        );
        assert!(matches!(
            set_parent(&mut world, a, a),
            Err(EcsError::HierarchyCycle { .. })
        ));
        assert!(!world.has::<Parent>(a));
    }

    #[test]
    fn remove_parent_detaches() {
        let mut world = World::new();
        let parent = world.spawn();
        let child = world.spawn();
        set_parent(&mut world, child, parent).unwrap();

        remove_parent(&mut world, child);
        assert!(world.get::<Parent>(child).is_none());
        assert!(children(&world, parent).is_empty());
    }

    #[test]
    fn propagate_composes_parent_chain() {
        let mut world = World::new();
        let root = world.spawn();
        let mid = world.spawn();
        let leaf = world.spawn();
        world.insert(root, Transform::from_xyz(1.0, 0.0, 0.0)).unwrap();
        world.insert(mid, Transform::from_xyz(0.0, 2.0, 0.0)).unwrap();
        world.insert(leaf, Transform::from_xyz(0.0, 0.0, 3.0)).unwrap();
        set_parent(&mut world, mid, root).unwrap();
        set_parent(&mut world, leaf, mid).unwrap();

        let touched = propagate(&mut world, root);
        assert_eq!(touched, vec![root, mid, leaf]);
        assert_eq!(translation(&world, leaf), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn propagate_from_middle_uses_ancestor_chain() {
        let mut world = World::new();
        let root = world.spawn();
        let child = world.spawn();
        world.insert(root, Transform::from_xyz(5.0, 0.0, 0.0)).unwrap();
        world.insert(child, Transform::from_xyz(1.0, 0.0, 0.0)).unwrap();
        set_parent(&mut world, child, root).unwrap();

        let touched = propagate(&mut world, child);
        assert_eq!(touched, vec![child]);
        assert_eq!(translation(&world, child), Vec3::new(6.0, 0.0, 0.0));
        assert!(world.get::<GlobalTransform>(root).is_none());
    }

    #[test]
    fn propagate_all_covers_every_root() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.insert(a, Transform::identity()).unwrap();
        world.insert(b, Transform::identity()).unwrap();
        world.insert(c, Transform::identity()).unwrap();
        set_parent(&mut world, c, a).unwrap();

        assert_eq!(propagate_all(&mut world), 3);
    }

    #[test]
    fn despawn_recursive_removes_subtree() {
        let mut world = World::new();
        let root = world.spawn();
        let child = world.spawn();
        let grandchild = world.spawn();
        let other = world.spawn();
        set_parent(&mut world, child, root).unwrap();
        set_parent(&mut world, grandchild, child).unwrap();

        assert_eq!(subtree(&world, root), vec![root, child, grandchild]);
        despawn_recursive(&mut world, root);
        assert!(!world.is_alive(root));
        assert!(!world.is_alive(child));
        assert!(!world.is_alive(grandchild));
        assert!(world.is_alive(other));
    }
}
