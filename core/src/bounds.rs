//! Axis-aligned bounding boxes.

use crate::math::{Mat4, Vec3, transform_point};

/// An axis-aligned bounding box in 3D.
///
/// The canonical empty box has `p_min = +inf` and `p_max = -inf` on every
/// axis, so it is the identity for [`union`](Self::union) and absorbs under
/// [`intersect`](Self::intersect).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub p_min: Vec3,
    /// Maximum corner.
    pub p_max: Vec3,
}

impl BoundingBox {
    /// Create a box from two corners. No reordering is performed.
    pub fn new(p_min: Vec3, p_max: Vec3) -> Self {
        Self { p_min, p_max }
    }

    /// The empty box.
    pub const EMPTY: Self = Self {
        p_min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        p_max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Same as [`BoundingBox::EMPTY`].
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Smallest box containing all `points`. Empty if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |bb, p| bb.expanded_to(&p))
    }

    /// Returns `true` if any axis has `p_min > p_max`.
    pub fn is_empty(&self) -> bool {
        self.p_min.x > self.p_max.x || self.p_min.y > self.p_max.y || self.p_min.z > self.p_max.z
    }

    /// Component-wise union.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            p_min: self.p_min.inf(&other.p_min),
            p_max: self.p_max.sup(&other.p_max),
        }
    }

    /// Component-wise intersection. May be degenerate.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            p_min: self.p_min.sup(&other.p_min),
            p_max: self.p_max.inf(&other.p_max),
        }
    }

    /// Grow the box to contain `point`.
    #[must_use]
    pub fn expanded_to(&self, point: &Vec3) -> Self {
        Self {
            p_min: self.p_min.inf(point),
            p_max: self.p_max.sup(point),
        }
    }

    /// Per-axis extent. Negative on degenerate axes.
    pub fn extent(&self) -> Vec3 {
        self.p_max - self.p_min
    }

    /// Box center.
    pub fn center(&self) -> Vec3 {
        (self.p_min + self.p_max) * 0.5
    }

    /// Surface area; negative extents are clamped to zero per axis.
    pub fn surface_area(&self) -> f32 {
        let d = self.extent().sup(&Vec3::zeros());
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns `true` if `point` lies inside or on the boundary.
    pub fn contains(&self, point: &Vec3) -> bool {
        point.x >= self.p_min.x
            && point.y >= self.p_min.y
            && point.z >= self.p_min.z
            && point.x <= self.p_max.x
            && point.y <= self.p_max.y
            && point.z <= self.p_max.z
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.p_min, self.p_max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Transform the box by an affine matrix.
    ///
    /// All eight corners are transformed and re-bounded, so the result stays
    /// axis-aligned and tight under rotation. The empty box maps to itself.
    #[must_use]
    pub fn transformed(&self, m: &Mat4) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        self.corners()
            .iter()
            .fold(Self::empty(), |bb, c| bb.expanded_to(&transform_point(m, c)))
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{mat4_from_rotation, mat4_from_translation, quat_from_rotation_z};
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: &Vec3, b: &Vec3) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn empty_is_union_identity() {
        let b = BoundingBox::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(BoundingBox::empty().union(&b), b);
        assert_eq!(b.union(&BoundingBox::empty()), b);
    }

    #[test]
    fn empty_intersection_is_degenerate() {
        let b = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let i = BoundingBox::empty().intersect(&b);
        assert!(i.is_empty());
        assert!(i.p_min.x > i.p_max.x);
    }

    #[test]
    fn surface_area_of_2x3x4_box() {
        let b = BoundingBox::new(Vec3::zeros(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(b.surface_area(), 52.0);
    }

    #[test]
    fn surface_area_of_degenerate_box_is_clamped() {
        assert_eq!(BoundingBox::empty().surface_area(), 0.0);

        // Negative extent on x only: x contributes zero.
        let b = BoundingBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 3.0));
        assert_eq!(b.surface_area(), 2.0 * (2.0 * 3.0));
    }

    #[test]
    fn rotation_about_z_swaps_x_and_y_spans() {
        let b = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 2.0, 1.0));
        let m = mat4_from_rotation(quat_from_rotation_z(FRAC_PI_2));
        let r = b.transformed(&m);

        assert!(approx(&r.p_min, &Vec3::new(-2.0, 0.0, 0.0)));
        assert!(approx(&r.p_max, &Vec3::new(0.0, 1.0, 1.0)));
        assert!(approx(&r.extent(), &Vec3::new(2.0, 1.0, 1.0)));
    }

    #[test]
    fn translation_moves_box() {
        let b = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let r = b.transformed(&mat4_from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert!(approx(&r.p_min, &Vec3::new(10.0, 0.0, 0.0)));
        assert!(approx(&r.p_max, &Vec3::new(11.0, 1.0, 1.0)));
    }

    #[test]
    fn transforming_empty_stays_empty() {
        let r = BoundingBox::empty().transformed(&mat4_from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert!(r.is_empty());
        assert_eq!(r, BoundingBox::empty());
    }

    #[test]
    fn from_points_and_contains() {
        let pts = [Vec3::new(1.0, -1.0, 0.0), Vec3::new(-2.0, 3.0, 4.0)];
        let b = BoundingBox::from_points(pts);
        assert_eq!(b.p_min, Vec3::new(-2.0, -1.0, 0.0));
        assert_eq!(b.p_max, Vec3::new(1.0, 3.0, 4.0));
        assert!(b.contains(&b.center()));
        assert!(!b.contains(&Vec3::new(5.0, 0.0, 0.0)));
    }
}
