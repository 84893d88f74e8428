//! Transform components
//!
//! [`Transform`] is the local placement of a node relative to its parent.
//! [`GlobalTransform`] is the world-space placement written by the resolver.

use bevy_ecs::component::Component;
use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, EulerRot, Mat3, Mat4, Quat, Vec3};

/// Local transform of a node: translation, rotation and scale relative to its parent.
///
/// Composition order is fixed: scale first, then rotation, then translation.
///
/// ```
/// use scene_engine::scene::Transform;
/// use glam::{Quat, Vec3};
///
/// let transform = Transform::from_xyz(1.0, 2.0, 3.0)
///     .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
///     .with_scale(Vec3::splat(2.0));
/// assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position relative to parent (or world origin for roots).
    pub translation: Vec3,
    /// Rotation relative to parent.
    pub rotation: Quat,
    /// Scale relative to parent.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform at the given position with default rotation and scale.
    #[inline]
    pub const fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    /// Creates a transform with the given translation.
    #[inline]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Creates a transform with the given rotation.
    #[inline]
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Creates a transform with the given scale.
    #[inline]
    pub const fn from_scale(scale: Vec3) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale,
        }
    }

    /// Returns this transform with a different translation.
    #[inline]
    #[must_use]
    pub const fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Returns this transform with a different rotation.
    #[inline]
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns this transform with a different scale.
    #[inline]
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Returns this transform with rotation built from XYZ Euler angles (radians).
    #[inline]
    #[must_use]
    pub fn with_euler(mut self, euler: Vec3) -> Self {
        self.set_euler(euler);
        self
    }

    /// Replaces the rotation with one built from XYZ Euler angles (radians).
    ///
    /// This is the `rotation.x = ...; rotation.y = ...` style used by the demos:
    /// the whole rotation is rebuilt from the triple every time.
    #[inline]
    pub fn set_euler(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
    }

    /// Returns the rotation as XYZ Euler angles (radians).
    #[inline]
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Computes the transformation matrix for this transform.
    #[inline]
    pub fn compute_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Computes the affine transformation for this transform.
    #[inline]
    pub fn compute_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Local forward direction (-Z axis), the direction a camera looks.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Returns the local right direction (+X axis).
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Returns the local up direction (+Y axis).
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Rotates so the -Z axis points at `target` (camera convention).
    ///
    /// Leaves the rotation untouched when `target` coincides with the
    /// translation or the view direction is parallel to `up`.
    #[inline]
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        if let Some(rotation) = basis_towards(self.translation - target, up) {
            self.rotation = rotation;
        }
    }

    /// Returns this transform rotated to look at `target`.
    #[inline]
    #[must_use]
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        self.look_at(target, up);
        self
    }

    /// Rotates so the +Z axis points at `target` (object convention).
    #[inline]
    pub fn face_towards(&mut self, target: Vec3, up: Vec3) {
        if let Some(rotation) = basis_towards(target - self.translation, up) {
            self.rotation = rotation;
        }
    }

    /// Composes `self` (as parent) with `other` (as child).
    #[inline]
    pub fn mul_transform(&self, other: &Transform) -> Transform {
        Transform {
            translation: self.transform_point(other.translation),
            rotation: self.rotation * other.rotation,
            scale: self.scale * other.scale,
        }
    }

    /// Transforms a point from local space to the space of this transform.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (self.scale * point) + self.translation
    }

    /// Model and normal matrices for this transform used as a world transform.
    pub fn uniform_data(&self) -> TransformUniformData {
        GlobalTransform::from(*self).uniform_data()
    }
}

/// Builds a rotation whose +Z axis is `z_axis`, keeping +Y as close to `up` as possible.
fn basis_towards(z_axis: Vec3, up: Vec3) -> Option<Quat> {
    let z = z_axis.normalize_or_zero();
    if z.length_squared() < 1e-6 {
        return None;
    }
    let x = up.cross(z).normalize_or_zero();
    if x.length_squared() < 1e-6 {
        return None;
    }
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)))
}

/// World-space transform computed from the node hierarchy.
///
/// Written by the resolver only; modify [`Transform`] instead.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform(pub(crate) Affine3A);

impl Default for GlobalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl GlobalTransform {
    pub const IDENTITY: Self = Self(Affine3A::IDENTITY);

    /// Creates a global transform from translation.
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self(Affine3A::from_translation(translation))
    }

    /// Returns the underlying affine transformation.
    #[inline]
    pub fn affine(&self) -> Affine3A {
        self.0
    }

    /// Returns the transformation as a 4x4 matrix.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from(self.0)
    }

    /// Note: lossy for sheared transforms (non-uniform scale under rotation).
    #[inline]
    pub fn to_scale_rotation_translation(&self) -> (Vec3, Quat, Vec3) {
        self.0.to_scale_rotation_translation()
    }

    /// Decomposes back into a local-style [`Transform`].
    #[inline]
    pub fn compute_transform(&self) -> Transform {
        let (scale, rotation, translation) = self.to_scale_rotation_translation();
        Transform {
            translation,
            rotation,
            scale,
        }
    }

    /// Returns the world-space translation.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.0.translation.into()
    }

    /// World-space forward direction (-Z axis).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        (self.0.matrix3 * Vec3::NEG_Z).normalize()
    }

    /// Transforms a local-space point into world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.0.transform_point3(point)
    }

    /// Returns the inverse transform (world space back into local space).
    #[inline]
    pub fn inverse(&self) -> GlobalTransform {
        GlobalTransform(self.0.inverse())
    }

    /// Composes this (parent) world transform with a child's local transform.
    #[inline]
    pub fn mul_transform(&self, transform: &Transform) -> GlobalTransform {
        GlobalTransform(self.0 * transform.compute_affine())
    }

    /// Approximate equality, used when comparing resolved transforms.
    pub fn abs_diff_eq(&self, other: &GlobalTransform, max_abs_diff: f32) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }

    /// Model and normal matrices for the renderer.
    pub fn uniform_data(&self) -> TransformUniformData {
        let model = self.to_matrix();
        TransformUniformData {
            model,
            normal_matrix: model.inverse().transpose(),
        }
    }
}

impl From<Transform> for GlobalTransform {
    fn from(transform: Transform) -> Self {
        GlobalTransform(transform.compute_affine())
    }
}

impl From<Affine3A> for GlobalTransform {
    fn from(affine: Affine3A) -> Self {
        GlobalTransform(affine)
    }
}

/// Per-draw transform data handed across the renderer boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformUniformData {
    pub model: Mat4,
    pub normal_matrix: Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn transform_identity() {
        let t = Transform::IDENTITY;
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn transform_directions() {
        let t = Transform::from_rotation(Quat::from_rotation_y(FRAC_PI_2));
        // Forward (-Z) turned a quarter turn about +Y ends up on -X
        assert!((t.forward() - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn scale_applies_before_rotation_and_translation() {
        let t = Transform::from_xyz(1.0, 0.0, 0.0)
            .with_rotation(Quat::from_rotation_z(FRAC_PI_2))
            .with_scale(Vec3::new(2.0, 1.0, 1.0));
        // (1,0,0) scaled -> (2,0,0), rotated -> (0,2,0), translated -> (1,2,0)
        let p = GlobalTransform::from(t).transform_point(Vec3::X);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
        assert!((t.transform_point(Vec3::X) - p).length() < 1e-5);
    }

    #[test]
    fn composition_order_is_not_commutative() {
        let parent = Transform::from_rotation(Quat::from_rotation_y(FRAC_PI_2));
        let child = Transform::from_xyz(10.0, 0.0, 0.0);

        let a = GlobalTransform::from(parent).mul_transform(&child);
        let b = GlobalTransform::from(child).mul_transform(&parent);

        assert!((a.translation() - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-5);
        assert!((b.translation() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn local_and_global_composition_agree() {
        let parent = Transform::from_xyz(1.0, 2.0, 3.0).with_euler(Vec3::new(0.3, 0.2, 0.1));
        let child = Transform::from_xyz(0.5, 0.0, -1.0).with_scale(Vec3::splat(2.0));

        let local = GlobalTransform::from(parent.mul_transform(&child));
        let global = GlobalTransform::from(parent).mul_transform(&child);
        assert!(local.abs_diff_eq(&global, 1e-5));
    }

    #[test]
    fn look_at_points_negative_z() {
        let t = Transform::from_xyz(0.0, 0.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y);
        assert!((t.forward() - Vec3::NEG_Z).length() < 1e-5);

        let t = Transform::from_xyz(0.0, 50.0, 0.0).looking_at(Vec3::ZERO, Vec3::Z);
        assert!((t.forward() - Vec3::NEG_Y).length() < 1e-5);
        assert!((t.up() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn face_towards_points_positive_z() {
        let mut t = Transform::from_xyz(1.0, 0.0, 1.0);
        t.face_towards(Vec3::new(5.0, 0.0, 1.0), Vec3::Y);
        assert!((t.rotation * Vec3::Z - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn look_at_degenerate_keeps_rotation() {
        let rotation = Quat::from_rotation_x(0.4);
        let mut t = Transform::from_rotation(rotation);
        t.look_at(Vec3::ZERO, Vec3::Y);
        assert_eq!(t.rotation, rotation);
    }

    #[test]
    fn euler_round_trip_single_axis() {
        let t = Transform::IDENTITY.with_euler(Vec3::new(0.0, 0.7, 0.0));
        assert!(t.rotation.abs_diff_eq(Quat::from_rotation_y(0.7), 1e-6));
        assert!((t.euler() - Vec3::new(0.0, 0.7, 0.0)).length() < 1e-5);
    }
}
