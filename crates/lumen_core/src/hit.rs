//! Resolved closest-hit record.

use lumen_math::{Color, Ray, Vec2, Vec3};

use crate::material::SceneMaterial;

/// Everything shading needs about one ray/surface intersection.
///
/// Only ever produced for an actual hit: a miss is `None` at the query site.
#[derive(Clone, Debug)]
pub struct HitInfo<'a> {
    pub point: Vec3,
    /// Unit outward normal of the surface
    pub normal: Vec3,
    /// Whether the ray arrived from the outward side
    pub front_face: bool,
    pub t: f32,
    /// The ray that produced this hit
    pub ray: Ray,
    /// Surface material, already interpolated for multi-vertex primitives
    pub material: SceneMaterial,
    /// Physical material name to resolve in the registry
    pub material_name: &'a str,
    pub object_name: &'a str,
    pub uv: Vec2,
    pub is_light: bool,
    pub emission: Color,
    /// Part of `emission` that an area light already samples directly
    pub light_emission: Color,
}

impl HitInfo<'_> {
    /// Normal flipped to the side the ray came from.
    pub fn facing_normal(&self) -> Vec3 {
        if self.front_face {
            self.normal
        } else {
            -self.normal
        }
    }

    /// Direction back toward the ray origin.
    pub fn wo(&self) -> Vec3 {
        -self.ray.direction
    }
}
