//! Local rigid + scale transform
//!
//! The primitive the rest of the crate composes: a translation, a unit
//! rotation, and a per-axis scale. Composition is non-commutative and
//! right-to-left (parent ∘ child), matching matrix multiplication order.

use glam::{Mat4, Quat, Vec3};

/// A local transform: translation, rotation, and scale
///
/// The rotation is kept unit-length; every operation that interpolates
/// rotations renormalizes its result.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// Translation relative to the parent space
    pub translation: Vec3,
    /// Rotation relative to the parent space (unit quaternion)
    pub rotation: Quat,
    /// Per-axis scale relative to the parent space
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (no translation, no rotation, unit scale)
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform from its components
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Create a pure translation
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a pure rotation
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Compose `self` (parent) with `child`
    ///
    /// Order matters: the child's translation is scaled and rotated into the
    /// parent's space before the parent's translation is added.
    pub fn combine(&self, child: &Self) -> Self {
        Self {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Inverse transform, such that `t.combine(&t.inverse())` is identity
    ///
    /// Zero scale components invert to zero rather than dividing by zero.
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Vec3::new(
            if self.scale.x.abs() > f32::EPSILON {
                1.0 / self.scale.x
            } else {
                0.0
            },
            if self.scale.y.abs() > f32::EPSILON {
                1.0 / self.scale.y
            } else {
                0.0
            },
            if self.scale.z.abs() > f32::EPSILON {
                1.0 / self.scale.z
            } else {
                0.0
            },
        );
        Self {
            translation: inv_rotation * (inv_scale * -self.translation),
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Interpolate between two transforms
    ///
    /// Translation and scale interpolate linearly; rotation takes the
    /// shortest arc (the far rotation is sign-flipped when the dot product
    /// is negative) and the result is renormalized.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut to = other.rotation;
        if self.rotation.dot(to) < 0.0 {
            to = -to;
        }
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: (self.rotation + (to - self.rotation) * t).normalize(),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Transform a point (applies scale, rotation, and translation)
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * point)
    }

    /// Transform a direction (applies scale and rotation, ignores translation)
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (self.scale * vector)
    }

    /// Convert to a column-major 4x4 matrix
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose a matrix back into a transform
    ///
    /// Lossy for matrices containing shear or projection.
    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
