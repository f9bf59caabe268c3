//! Renderable objects: a primitive plus the names that bind it to behaviour.

use lumen_math::{Color, Interval, Ray};

use crate::bounds::{self, BoundingVolume};
use crate::shape::{Shape, SurfaceHit};
use crate::transform::Transform;

#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    /// World-space geometry
    pub shape: Shape,
    /// Key into the renderer's physical material registry
    pub physical_material: String,
    /// Pre-tests, outer to inner
    pub bounds: Vec<BoundingVolume>,
    /// Set when the object is an emitter of an area light
    pub is_light: bool,
    pub emission: Color,
}

impl SceneObject {
    /// Meshes get a default sphere-then-box bounding chain.
    pub fn new(name: impl Into<String>, shape: impl Into<Shape>, physical_material: impl Into<String>) -> Self {
        let shape = shape.into();
        let bounds = match &shape {
            Shape::Mesh(_) => BoundingVolume::chain_for(&shape.bounding_box()),
            _ => Vec::new(),
        };
        Self {
            name: name.into(),
            shape,
            physical_material: physical_material.into(),
            bounds,
            is_light: false,
            emission: Color::ZERO,
        }
    }

    /// Bakes `transform` into the geometry and rebuilds any bounds.
    pub fn with_transform(mut self, transform: &Transform) -> Self {
        self.shape = self.shape.transformed(transform);
        if !self.bounds.is_empty() {
            self.bounds = BoundingVolume::chain_for(&self.shape.bounding_box());
        }
        self
    }

    /// Exact intersection, optionally gated by the bounding chain.
    pub fn hit(&self, ray: &Ray, ray_t: Interval, use_bounds: bool) -> Option<SurfaceHit<'_>> {
        if use_bounds && !bounds::passes(&self.bounds, ray, ray_t) {
            return None;
        }
        self.shape.hit(ray, ray_t)
    }
}
