//! Transform components for positioning entities in 3D space.
//!
//! [`Transform`] is the local transform relative to a parent entity and
//! [`GlobalTransform`] the world-space matrix computed by
//! [`hierarchy::propagate`](crate::hierarchy::propagate).

use vellum_core::math::{
    Mat4, Quat, Vec3, mat4_from_scale_rotation_translation, quat_rotate_vec3, transform_point,
};

/// Local transform component: position, rotation, and scale relative to a parent.
///
/// If the entity has no [`Parent`](super::Parent), this transform is relative
/// to the world origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position relative to parent (or world origin if no parent).
    pub translation: Vec3,
    /// Rotation relative to parent.
    pub rotation: Quat,
    /// Scale relative to parent.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform with no translation, no rotation, and uniform scale of 1.
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }

    /// Creates a transform at the given position with default rotation and scale.
    #[inline]
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    /// Creates a transform with the given translation.
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Creates a transform with the given rotation.
    #[inline]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    /// Returns this transform with a different translation.
    #[inline]
    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Returns this transform with a different rotation.
    #[inline]
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns this transform with a different scale.
    #[inline]
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Computes the transformation matrix for this transform.
    #[inline]
    pub fn compute_matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Transforms a point from local space to the space of this transform.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        quat_rotate_vec3(self.rotation, self.scale.component_mul(&point)) + self.translation
    }
}

/// World-space transform computed from the entity hierarchy.
///
/// For root entities it equals the local [`Transform`]; for children it is
/// the product of every ancestor's local matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform(pub Mat4);

impl Default for GlobalTransform {
    fn default() -> Self {
        Self(Mat4::identity())
    }
}

impl GlobalTransform {
    /// Returns the transformation as a 4x4 matrix.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        self.0
    }

    /// Returns the world-space translation.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.0[(0, 3)], self.0[(1, 3)], self.0[(2, 3)])
    }

    /// Transforms a point from local space to world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        transform_point(&self.0, &point)
    }

    /// Multiplies this global transform by a local transform.
    #[inline]
    pub fn mul_transform(&self, transform: &Transform) -> GlobalTransform {
        GlobalTransform(self.0 * transform.compute_matrix())
    }
}

impl From<Transform> for GlobalTransform {
    fn from(transform: Transform) -> Self {
        GlobalTransform(transform.compute_matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;
    use vellum_core::math::quat_from_rotation_y;

    #[test]
    fn transform_identity() {
        let t = Transform::identity();
        assert_eq!(t.translation, Vec3::zeros());
        assert_eq!(t.scale, Vec3::repeat(1.0));
        assert_eq!(t.compute_matrix(), Mat4::identity());
    }

    #[test]
    fn transform_point_matches_matrix() {
        let t = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_rotation(quat_from_rotation_y(FRAC_PI_2))
            .with_scale(Vec3::repeat(2.0));
        let p = Vec3::new(1.0, 0.0, 0.0);
        let direct = t.transform_point(p);
        let via_matrix = GlobalTransform::from(t).transform_point(p);
        assert!((direct - via_matrix).norm() < 1e-5);
    }

    #[test]
    fn global_mul_local() {
        let parent = GlobalTransform::from(Transform::from_xyz(10.0, 0.0, 0.0));
        let child = Transform::from_xyz(0.0, 5.0, 0.0);
        let combined = parent.mul_transform(&child);
        assert!((combined.translation() - Vec3::new(10.0, 5.0, 0.0)).norm() < 1e-5);
    }
}
