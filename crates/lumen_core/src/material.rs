//! Surface reflectance parameters.

use lumen_math::{Color, Vec3};

/// Reflectance data attached to a surface or a mesh vertex.
///
/// Plain data: the behaviour that consumes it lives in the renderer's
/// physical materials. `refraction_index` is stored per channel although only
/// the first component drives refraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneMaterial {
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
    pub transparent: Color,
    pub reflective: Color,
    pub refraction_index: Vec3,
    pub roughness: f32,
    pub emission: Color,
}

impl Default for SceneMaterial {
    fn default() -> Self {
        Self {
            diffuse: Color::splat(0.5), // Grey default
            specular: Color::ZERO,
            shininess: 1.0,
            transparent: Color::ZERO,
            reflective: Color::ZERO,
            refraction_index: Vec3::ONE,
            roughness: 0.5,
            emission: Color::ZERO,
        }
    }
}

impl SceneMaterial {
    /// Diffuse-only material.
    pub fn matte(diffuse: Color) -> Self {
        Self {
            diffuse,
            ..Default::default()
        }
    }

    pub fn with_specular(mut self, specular: Color, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    pub fn with_reflective(mut self, reflective: Color) -> Self {
        self.reflective = reflective;
        self
    }

    pub fn with_transparency(mut self, transparent: Color, ior: f32) -> Self {
        self.transparent = transparent;
        self.refraction_index = Vec3::splat(ior);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }

    pub fn is_emissive(&self) -> bool {
        self.emission.max_element() > 0.0
    }

    /// Scalar index of refraction used for Snell/Fresnel.
    pub fn ior(&self) -> f32 {
        self.refraction_index.x
    }

    /// Barycentric blend of three vertex materials. `weights` should sum to one.
    pub fn blend(materials: [&SceneMaterial; 3], weights: Vec3) -> SceneMaterial {
        let [a, b, c] = materials;
        let mix3 = |x: Vec3, y: Vec3, z: Vec3| x * weights.x + y * weights.y + z * weights.z;
        let mix1 = |x: f32, y: f32, z: f32| x * weights.x + y * weights.y + z * weights.z;
        SceneMaterial {
            diffuse: mix3(a.diffuse, b.diffuse, c.diffuse),
            specular: mix3(a.specular, b.specular, c.specular),
            shininess: mix1(a.shininess, b.shininess, c.shininess),
            transparent: mix3(a.transparent, b.transparent, c.transparent),
            reflective: mix3(a.reflective, b.reflective, c.reflective),
            refraction_index: mix3(a.refraction_index, b.refraction_index, c.refraction_index),
            roughness: mix1(a.roughness, b.roughness, c.roughness),
            emission: mix3(a.emission, b.emission, c.emission),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let glass = SceneMaterial::matte(Color::ZERO).with_transparency(Color::ONE, 1.5);
        assert_eq!(glass.ior(), 1.5);
        assert!(!glass.is_emissive());
        assert!(SceneMaterial::default().with_emission(Color::X).is_emissive());
    }

    #[test]
    fn test_blend_at_vertex_returns_that_vertex() {
        let red = SceneMaterial::matte(Color::X).with_roughness(0.1);
        let green = SceneMaterial::matte(Color::Y).with_roughness(0.9);
        let blue = SceneMaterial::matte(Color::Z);

        let at_green = SceneMaterial::blend([&red, &green, &blue], Vec3::Y);
        assert_eq!(at_green, green);
    }

    #[test]
    fn test_blend_centroid_averages() {
        let red = SceneMaterial::matte(Color::X).with_specular(Color::ONE, 30.0);
        let green = SceneMaterial::matte(Color::Y);
        let blue = SceneMaterial::matte(Color::Z);

        let mixed = SceneMaterial::blend([&red, &green, &blue], Vec3::splat(1.0 / 3.0));
        assert!((mixed.diffuse - Color::splat(1.0 / 3.0)).abs().max_element() < 1e-6);
        assert!((mixed.shininess - (30.0 + 1.0 + 1.0) / 3.0).abs() < 1e-4);
    }
}
