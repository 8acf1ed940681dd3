//! One submesh of a mesh asset, placed in the world.

use std::sync::Arc;

use vellum_core::bounds::BoundingBox;
use vellum_core::math::Mat4;
use vellum_core::mesh::{Mesh, Submesh};
use vellum_ecs::Entity;

use crate::error::GraphicsError;

/// Geometry, world transform and owning entity of one draw.
///
/// The mesh is an engine-owned asset shared through `Arc`; a drawable never
/// modifies it.
#[derive(Debug, Clone)]
pub struct Drawable {
    mesh: Arc<Mesh>,
    submesh: usize,
    world_transform: Mat4,
    entity: Option<Entity>,
}

impl Drawable {
    /// Create a drawable for submesh `submesh` of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if the mesh has no such submesh.
    pub fn new(mesh: Arc<Mesh>, submesh: usize, world_transform: Mat4) -> Result<Self, GraphicsError> {
        if mesh.submesh(submesh).is_none() {
            return Err(GraphicsError::InvalidParameter(format!(
                "mesh {:?} has no submesh {submesh}",
                mesh.label()
            )));
        }
        Ok(Self {
            mesh,
            submesh,
            world_transform,
            entity: None,
        })
    }

    /// Attach the entity this drawable renders.
    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    /// The shared mesh asset.
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Index of the submesh within the mesh.
    pub fn submesh_index(&self) -> usize {
        self.submesh
    }

    /// The submesh description: vertex and index ranges plus local bounds.
    pub fn submesh(&self) -> &Submesh {
        // Validated in `new`; meshes are immutable behind the Arc.
        &self.mesh.submeshes()[self.submesh]
    }

    /// Current world transform.
    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    pub(crate) fn set_world_transform(&mut self, world_transform: Mat4) {
        self.world_transform = world_transform;
    }

    /// Owning entity, if any.
    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// World-space bounds: the submesh bounds with all eight corners
    /// transformed, so the box stays axis-aligned under rotation.
    pub fn bounding_box(&self) -> BoundingBox {
        self.submesh().bounding_box.transformed(&self.world_transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;
    use vellum_core::math::{Vec3, mat4_from_rotation, mat4_from_translation, quat_from_rotation_z};
    use vellum_core::mesh::generators::generate_box;

    fn unit_box() -> Arc<Mesh> {
        Arc::new(generate_box([0.5, 0.5, 0.5]))
    }

    #[test]
    fn rejects_missing_submesh() {
        assert!(Drawable::new(unit_box(), 3, Mat4::identity()).is_err());
    }

    #[test]
    fn bounding_box_follows_translation() {
        let drawable =
            Drawable::new(unit_box(), 0, mat4_from_translation(Vec3::new(10.0, 0.0, 0.0))).unwrap();
        let bb = drawable.bounding_box();
        assert!((bb.p_min.x - 9.5).abs() < 1e-5);
        assert!((bb.p_max.x - 10.5).abs() < 1e-5);
    }

    #[test]
    fn rotated_box_grows_to_contain_corners() {
        let drawable = Drawable::new(
            unit_box(),
            0,
            mat4_from_rotation(quat_from_rotation_z(FRAC_PI_4)),
        )
        .unwrap();
        let bb = drawable.bounding_box();
        let half_diagonal = 0.5 * std::f32::consts::SQRT_2;
        assert!((bb.p_max.x - half_diagonal).abs() < 1e-5);
        assert!((bb.p_min.y + half_diagonal).abs() < 1e-5);
        assert!((bb.p_max.z - 0.5).abs() < 1e-5);
    }
}
