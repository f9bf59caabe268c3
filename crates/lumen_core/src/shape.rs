//! Intersection and area-sampling contract shared by all primitives.

use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

use crate::material::SceneMaterial;
use crate::mesh::Mesh;
use crate::sphere::Sphere;
use crate::transform::Transform;
use crate::triangle::Triangle;

/// Material at a surface hit, resolved lazily so only the closest hit pays
/// for vertex blending.
#[derive(Clone, Copy, Debug)]
pub enum MaterialRef<'a> {
    Uniform(&'a SceneMaterial),
    Blend([&'a SceneMaterial; 3], Vec3),
}

impl MaterialRef<'_> {
    pub fn resolve(&self) -> SceneMaterial {
        match *self {
            MaterialRef::Uniform(m) => *m,
            MaterialRef::Blend(ms, w) => SceneMaterial::blend(ms, w),
        }
    }
}

/// Raw geometric hit reported by a primitive.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceHit<'a> {
    pub t: f32,
    pub point: Vec3,
    /// Unit geometric (outward) normal, not flipped toward the ray.
    pub normal: Vec3,
    pub uv: Vec2,
    pub material: MaterialRef<'a>,
}

/// A point drawn on a shape's surface.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceSample {
    pub point: Vec3,
    pub normal: Vec3,
    /// Density with respect to surface area.
    pub pdf: f32,
}

/// Closed set of primitives a scene object can carry.
#[derive(Clone, Debug)]
pub enum Shape {
    Sphere(Sphere),
    Triangle(Triangle),
    Mesh(Mesh),
}

impl Shape {
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit<'_>> {
        match self {
            Shape::Sphere(s) => s.hit(ray, ray_t),
            Shape::Triangle(t) => t.hit(ray, ray_t),
            Shape::Mesh(m) => m.hit(ray, ray_t),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bounding_box(),
            Shape::Triangle(t) => t.bounding_box(),
            Shape::Mesh(m) => m.bounding_box(),
        }
    }

    pub fn area(&self) -> f32 {
        match self {
            Shape::Sphere(s) => s.area(),
            Shape::Triangle(t) => t.area(),
            Shape::Mesh(m) => m.area(),
        }
    }

    /// Uniform-by-area point from a unit-square sample.
    pub fn sample(&self, u: Vec2) -> SurfaceSample {
        match self {
            Shape::Sphere(s) => s.sample(u),
            Shape::Triangle(t) => t.sample(u),
            Shape::Mesh(m) => m.sample(u),
        }
    }

    pub fn transformed(&self, transform: &Transform) -> Shape {
        match self {
            Shape::Sphere(s) => Shape::Sphere(s.transformed(transform)),
            Shape::Triangle(t) => Shape::Triangle(t.transformed(transform)),
            Shape::Mesh(m) => Shape::Mesh(m.transformed(transform)),
        }
    }

    /// Non-finite coordinates or zero area.
    pub fn is_degenerate(&self) -> bool {
        let area = self.area();
        let bbox = self.bounding_box();
        !(area.is_finite() && area > 0.0 && bbox.min().is_finite() && bbox.max().is_finite())
    }
}

impl From<Sphere> for Shape {
    fn from(s: Sphere) -> Self {
        Shape::Sphere(s)
    }
}

impl From<Triangle> for Shape {
    fn from(t: Triangle) -> Self {
        Shape::Triangle(t)
    }
}

impl From<Mesh> for Shape {
    fn from(m: Mesh) -> Self {
        Shape::Mesh(m)
    }
}
