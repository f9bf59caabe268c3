//! Object placement, baked into world space once at scene construction.

use lumen_math::{Mat3, Mat4, Quat, Vec3};

/// Scale, then rotate, then translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::splat(scale))
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn point(&self, p: Vec3) -> Vec3 {
        self.to_matrix().transform_point3(p)
    }

    /// Transforms a surface normal with the inverse transpose and renormalizes.
    pub fn normal(&self, n: Vec3) -> Vec3 {
        let m = Mat3::from_mat4(self.to_matrix());
        (m.inverse().transpose() * n).normalize()
    }

    /// Whether every axis scales by the same magnitude.
    pub fn is_uniform_scale(&self) -> bool {
        let s = self.scale.abs();
        s.max_element() - s.min_element() <= 1e-6 * s.max_element()
    }

    /// Largest absolute scale factor; spheres scale their radius by this.
    pub fn max_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }

    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}
