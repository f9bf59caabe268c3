//! Indexed triangle meshes.
//!
//! [`MeshData`] is the loader-facing description (shared vertex arrays plus an
//! index buffer). [`MeshData::build`] validates it and expands it into a
//! [`Mesh`] of world-ready triangles with an area table for light sampling.

use std::sync::Arc;

use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

use crate::error::SceneError;
use crate::material::SceneMaterial;
use crate::shape::{SurfaceHit, SurfaceSample};
use crate::transform::Transform;
use crate::triangle::Triangle;

/// Vertex positions and triangle indices, with optional per-vertex attributes.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    /// Every 3 indices form a counter-clockwise triangle
    pub indices: Vec<u32>,
    pub normals: Option<Vec<Vec3>>,
    pub uvs: Option<Vec<Vec2>>,
    pub vertex_materials: Option<Vec<Arc<SceneMaterial>>>,
}

impl MeshData {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            ..Default::default()
        }
    }

    /// Two-triangle quad through four corners given in counter-clockwise order.
    pub fn quad(corners: [Vec3; 4]) -> Self {
        Self::new(corners.to_vec(), vec![0, 1, 2, 0, 2, 3]).with_uvs(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn with_vertex_materials(mut self, materials: Vec<Arc<SceneMaterial>>) -> Self {
        self.vertex_materials = Some(materials);
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Smooth vertex normals from area-weighted face normals.
    ///
    /// Out-of-range faces are skipped here; [`MeshData::build`] reports them.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }
            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);
            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.normalize_or(Vec3::Y);
        }
        self.normals = Some(normals);
    }

    fn check_attribute<T>(
        attribute: &'static str,
        values: Option<&Vec<T>>,
        expected: usize,
    ) -> Result<(), SceneError> {
        match values {
            Some(v) if v.len() != expected => Err(SceneError::AttributeCount {
                attribute,
                expected,
                found: v.len(),
            }),
            _ => Ok(()),
        }
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        if self.indices.len() % 3 != 0 {
            return Err(SceneError::MalformedIndices(self.indices.len()));
        }
        let vertex_count = self.positions.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(SceneError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Self::check_attribute("normals", self.normals.as_ref(), vertex_count)?;
        Self::check_attribute("uvs", self.uvs.as_ref(), vertex_count)?;
        Self::check_attribute("materials", self.vertex_materials.as_ref(), vertex_count)?;
        Ok(())
    }

    /// Expands into triangles. `material` applies unless vertex materials are set.
    pub fn build(self, material: Arc<SceneMaterial>) -> Result<Mesh, SceneError> {
        self.validate()?;

        let triangles = self
            .indices
            .chunks_exact(3)
            .map(|face| {
                let idx = [face[0] as usize, face[1] as usize, face[2] as usize];
                let mut tri = Triangle::new(idx.map(|i| self.positions[i]), material.clone());
                if let Some(normals) = &self.normals {
                    tri = tri.with_normals(idx.map(|i| normals[i]));
                }
                if let Some(uvs) = &self.uvs {
                    tri = tri.with_uvs(idx.map(|i| uvs[i]));
                }
                if let Some(materials) = &self.vertex_materials {
                    tri = tri.with_vertex_materials(idx.map(|i| materials[i].clone()));
                }
                tri
            })
            .collect();

        Ok(Mesh::from_triangles(triangles))
    }
}

/// Triangle soup with cumulative areas for uniform surface sampling.
#[derive(Clone, Debug)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    /// Running sum of triangle areas; last entry is the total
    cumulative_area: Vec<f32>,
    bbox: Aabb,
}

impl Mesh {
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut total = 0.0;
        let cumulative_area = triangles
            .iter()
            .map(|t| {
                total += t.area();
                total
            })
            .collect();
        let bbox = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| Aabb::surrounding(&acc, &t.bounding_box()));
        Self {
            triangles,
            cumulative_area,
            bbox,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Closest triangle hit.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<SurfaceHit<'_>> {
        let mut closest = None;
        let mut search = ray_t;
        for tri in &self.triangles {
            if let Some(hit) = tri.hit(ray, search) {
                search = search.with_max(hit.t);
                closest = Some(hit);
            }
        }
        closest
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn area(&self) -> f32 {
        self.cumulative_area.last().copied().unwrap_or(0.0)
    }

    /// Picks a triangle proportionally to its area with `u.x`, reusing the
    /// remainder of `u.x` inside the chosen triangle.
    pub fn sample(&self, u: Vec2) -> SurfaceSample {
        let total = self.area();
        let target = u.x * total;
        let index = self
            .cumulative_area
            .partition_point(|&c| c <= target)
            .min(self.triangles.len().saturating_sub(1));
        let Some(tri) = self.triangles.get(index) else {
            return SurfaceSample {
                point: Vec3::ZERO,
                normal: Vec3::Y,
                pdf: 0.0,
            };
        };

        let start = if index == 0 { 0.0 } else { self.cumulative_area[index - 1] };
        let remapped = ((target - start) / tri.area()).clamp(0.0, 1.0);
        let sample = tri.sample(Vec2::new(remapped, u.y));
        SurfaceSample {
            pdf: 1.0 / total,
            ..sample
        }
    }

    pub fn transformed(&self, transform: &Transform) -> Mesh {
        Mesh::from_triangles(self.triangles.iter().map(|t| t.transformed(transform)).collect())
    }
}
