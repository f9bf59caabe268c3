//! Triangle primitive.
//!
//! Möller-Trumbore intersection with optional per-vertex normals, texture
//! coordinates and materials interpolated at the hit point.

use std::sync::Arc;

use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

use crate::material::SceneMaterial;
use crate::shape::{MaterialRef, SurfaceHit, SurfaceSample};
use crate::transform::Transform;

#[derive(Clone, Debug)]
pub struct Triangle {
    vertices: [Vec3; 3],
    /// Per-vertex shading normals
    normals: Option<[Vec3; 3]>,
    uvs: [Vec2; 3],
    materials: [Arc<SceneMaterial>; 3],
    /// Unit face normal, counter-clockwise winding
    face_normal: Vec3,
    area: f32,
    bbox: Aabb,
}

impl Triangle {
    pub fn new(vertices: [Vec3; 3], material: Arc<SceneMaterial>) -> Self {
        let [v0, v1, v2] = vertices;
        let cross = (v1 - v0).cross(v2 - v0);
        Self {
            vertices,
            normals: None,
            uvs: [Vec2::ZERO, Vec2::X, Vec2::Y],
            materials: [material.clone(), material.clone(), material],
            face_normal: cross.normalize_or_zero(),
            area: 0.5 * cross.length(),
            bbox: Aabb::enclosing(vertices),
        }
    }

    /// Smooth shading normals, one per vertex.
    pub fn with_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.normals = Some(normals.map(|n| n.normalize_or_zero()));
        self
    }

    pub fn with_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.uvs = uvs;
        self
    }

    /// One material per vertex, blended barycentrically at each hit.
    pub fn with_vertex_materials(mut self, materials: [Arc<SceneMaterial>; 3]) -> Self {
        self.materials = materials;
        self
    }

    pub fn vertices(&self) -> &[Vec3; 3] {
        &self.vertices
    }

    pub fn face_normal(&self) -> Vec3 {
        self.face_normal
    }

    fn is_uniform_material(&self) -> bool {
        let [a, b, c] = &self.materials;
        Arc::ptr_eq(a, b) && Arc::ptr_eq(a, c)
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit<'_>> {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Parallel to the plane
        if a.abs() < 1e-8 {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        let weights = Vec3::new(1.0 - u - v, u, v);
        let normal = match self.normals {
            Some([n0, n1, n2]) => {
                (n0 * weights.x + n1 * weights.y + n2 * weights.z).normalize_or(self.face_normal)
            }
            None => self.face_normal,
        };
        let uv = self.uvs[0] * weights.x + self.uvs[1] * weights.y + self.uvs[2] * weights.z;
        let material = if self.is_uniform_material() {
            MaterialRef::Uniform(&self.materials[0])
        } else {
            let [a, b, c] = &self.materials;
            MaterialRef::Blend([a.as_ref(), b.as_ref(), c.as_ref()], weights)
        };

        Some(SurfaceHit {
            t,
            point: ray.at(t),
            normal,
            uv,
            material,
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn materials(&self) -> &[Arc<SceneMaterial>; 3] {
        &self.materials
    }

    /// Uniform point via the square-root warp.
    pub fn sample(&self, u: Vec2) -> SurfaceSample {
        let su = u.x.sqrt();
        let b1 = 1.0 - su;
        let b2 = u.y * su;
        let [v0, v1, v2] = self.vertices;
        SurfaceSample {
            point: v0 * b1 + v1 * b2 + v2 * (1.0 - b1 - b2),
            normal: self.face_normal,
            pdf: 1.0 / self.area,
        }
    }

    pub fn transformed(&self, transform: &Transform) -> Triangle {
        let mut out = Triangle::new(self.vertices.map(|v| transform.point(v)), self.materials[0].clone())
            .with_uvs(self.uvs)
            .with_vertex_materials(self.materials.clone());
        if let Some(normals) = self.normals {
            out = out.with_normals(normals.map(|n| transform.normal(n)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey() -> Arc<SceneMaterial> {
        Arc::new(SceneMaterial::default())
    }

    /// Triangle in the z = -1 plane facing +Z.
    fn facing_camera(material: Arc<SceneMaterial>) -> Triangle {
        Triangle::new(
            [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(0.0, 1.0, -1.0),
            ],
            material,
        )
    }

    #[test]
    fn test_triangle_hit() {
        let tri = facing_camera(grey());
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        let hit = tri.hit(&ray, Interval::beyond(0.001)).expect("should hit");
        assert!((hit.t - 1.0).abs() < 0.001);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
        assert!(matches!(hit.material, MaterialRef::Uniform(_)));
    }

    #[test]
    fn test_triangle_miss() {
        let tri = facing_camera(grey());
        let away = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(tri.hit(&away, Interval::beyond(0.001)).is_none());

        let beside = Ray::new(Vec3::new(3.0, 0.0, 0.0), -Vec3::Z);
        assert!(tri.hit(&beside, Interval::beyond(0.001)).is_none());
    }

    #[test]
    fn test_area_and_samples_stay_inside() {
        let tri = facing_camera(grey());
        assert!((tri.area() - 2.0).abs() < 1e-6);
        for &(a, b) in &[(0.3, 0.6), (0.5, 0.5), (0.8, 0.2)] {
            let s = tri.sample(Vec2::new(a, b));
            assert!((s.point.z + 1.0).abs() < 1e-6);
            // shooting back at the sample must hit the triangle
            let down = Ray::new(Vec3::new(s.point.x, s.point.y, 1.0), -Vec3::Z);
            assert!(tri.hit(&down, Interval::new(0.0, 10.0)).is_some());
            assert!((s.pdf - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_vertex_materials_blend_at_hit() {
        let green = Arc::new(SceneMaterial::matte(Vec3::Y));
        let blue = Arc::new(SceneMaterial::matte(Vec3::Z));
        let tri = facing_camera(grey()).with_vertex_materials([
            Arc::new(SceneMaterial::matte(Vec3::X)),
            green,
            blue,
        ]);

        // Centroid of the triangle is (0, -1/3, -1)
        let ray = Ray::new(Vec3::new(0.0, -1.0 / 3.0, 0.0), -Vec3::Z);
        let hit = tri.hit(&ray, Interval::beyond(0.001)).expect("should hit");
        let diffuse = hit.material.resolve().diffuse;
        assert!((diffuse - Vec3::splat(1.0 / 3.0)).abs().max_element() < 1e-4);
    }

    #[test]
    fn test_interpolated_normals() {
        let tri = facing_camera(grey()).with_normals([Vec3::X, Vec3::X, Vec3::X]);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let hit = tri.hit(&ray, Interval::beyond(0.001)).expect("should hit");
        assert!((hit.normal - Vec3::X).length() < 1e-5);
    }
}
