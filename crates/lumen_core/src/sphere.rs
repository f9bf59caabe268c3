//! Sphere primitive.

use std::f32::consts::PI;
use std::sync::Arc;

use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

use crate::material::SceneMaterial;
use crate::shape::{MaterialRef, SurfaceHit, SurfaceSample};
use crate::transform::Transform;

#[derive(Clone, Debug)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<SceneMaterial>,
    bbox: Aabb,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Arc<SceneMaterial>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        Self {
            center,
            radius,
            material,
            bbox: Aabb::from_points(center - rvec, center + rvec),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> &Arc<SceneMaterial> {
        &self.material
    }

    /// Spherical (u, v) of a point on the unit sphere, v measured down from +Y.
    fn sphere_uv(p: Vec3) -> Vec2 {
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit<'_>> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // Nearest root in range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let point = ray.at(root);
        let normal = (point - self.center) / self.radius;
        Some(SurfaceHit {
            t: root,
            point,
            normal,
            uv: Self::sphere_uv(normal),
            material: MaterialRef::Uniform(&self.material),
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    /// Uniform point on the whole sphere.
    pub fn sample(&self, u: Vec2) -> SurfaceSample {
        let z = 1.0 - 2.0 * u.x;
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = 2.0 * PI * u.y;
        let normal = Vec3::new(r * phi.cos(), r * phi.sin(), z);
        SurfaceSample {
            point: self.center + normal * self.radius,
            normal,
            pdf: 1.0 / self.area(),
        }
    }

    /// Non-uniform scale is approximated by the largest axis, with a warning.
    pub fn transformed(&self, transform: &Transform) -> Sphere {
        if !transform.is_uniform_scale() {
            log::warn!(
                "Sphere cannot take non-uniform scale {}, using radius scale {}",
                transform.scale,
                transform.max_scale()
            );
        }
        Sphere::new(
            transform.point(self.center),
            self.radius * transform.max_scale(),
            self.material.clone(),
        )
    }
}
