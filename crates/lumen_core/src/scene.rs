//! The scene: geometry, lights, camera placement and background.
//!
//! A [`Scene`] is immutable once built and shared read-only by every render
//! worker. It answers closest-hit and occlusion queries by testing each
//! object in turn.

use std::collections::HashMap;

use lumen_math::{Color, Interval, Ray, Vec3};

use crate::error::SceneError;
use crate::hit::HitInfo;
use crate::light::{Attenuation, LightKind, SceneLight};
use crate::object::SceneObject;

/// Where the camera sits and what it looks at. Projection lives in the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 45.0,
        }
    }
}

impl Camera {
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    fn validate(&self) -> Result<(), SceneError> {
        let finite = self.position.is_finite() && self.target.is_finite() && self.up.is_finite();
        if !finite {
            return Err(SceneError::InvalidCamera("non-finite placement".into()));
        }
        let view = self.target - self.position;
        if view.length_squared() == 0.0 {
            return Err(SceneError::InvalidCamera("position equals target".into()));
        }
        if view.cross(self.up).length_squared() == 0.0 {
            return Err(SceneError::InvalidCamera("up vector parallel to view".into()));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SceneError::InvalidCamera(format!(
                "field of view {} outside (0, 180)",
                self.fov_degrees
            )));
        }
        Ok(())
    }
}

/// Radiance returned by rays that escape, and the constant ambient term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Background {
    pub color: Color,
    pub ambient_light: Color,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: Color::ZERO,
            ambient_light: Color::ZERO,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub camera: Camera,
    pub background: Background,
    objects: Vec<SceneObject>,
    lights: Vec<SceneLight>,
}

impl Scene {
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn lights(&self) -> &[SceneLight] {
        &self.lights
    }

    /// Closest hit with `t` strictly inside `ray_t`.
    ///
    /// Equal distances resolve to the object listed first. Bounding volumes
    /// only skip work and never change the answer.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval, use_bounds: bool) -> Option<HitInfo<'_>> {
        let mut search = ray_t;
        let mut closest = None;
        for object in &self.objects {
            if let Some(hit) = object.hit(ray, search, use_bounds) {
                search = search.with_max(hit.t);
                closest = Some((object, hit));
            }
        }

        let (object, hit) = closest?;
        let material = hit.material.resolve();
        Some(HitInfo {
            point: hit.point,
            normal: hit.normal,
            front_face: ray.direction.dot(hit.normal) < 0.0,
            t: hit.t,
            ray: *ray,
            material,
            material_name: &object.physical_material,
            object_name: &object.name,
            uv: hit.uv,
            is_light: object.is_light || material.is_emissive(),
            emission: object.emission + material.emission,
            light_emission: object.emission,
        })
    }

    /// Whether any non-emitter object blocks `ray` within `ray_t`.
    pub fn occluded(&self, ray: &Ray, ray_t: Interval, use_bounds: bool) -> bool {
        self.objects
            .iter()
            .filter(|o| !o.is_light)
            .any(|o| o.hit(ray, ray_t, use_bounds).is_some())
    }

    /// Structural checks run before any rendering is scheduled.
    pub fn validate(&self) -> Result<(), SceneError> {
        self.camera.validate()?;

        for object in &self.objects {
            if object.physical_material.is_empty() {
                return Err(SceneError::MissingMaterial(object.name.clone()));
            }
            if object.shape.is_degenerate() {
                return Err(SceneError::InvalidGeometry(object.name.clone()));
            }
        }

        for light in &self.lights {
            if let LightKind::Area { objects } = &light.kind {
                if objects.is_empty() {
                    return Err(SceneError::EmptyAreaLight(light.name.clone()));
                }
                if let Some(&bad) = objects.iter().find(|&&i| i >= self.objects.len()) {
                    return Err(SceneError::UnknownLightObject {
                        light: light.name.clone(),
                        object: format!("#{bad}"),
                    });
                }
            }
        }
        Ok(())
    }
}

struct PendingAreaLight {
    name: String,
    color: Color,
    attenuation: Attenuation,
    objects: Vec<String>,
}

/// Collects objects and lights, resolves area-light emitters by object name,
/// and validates the result.
#[derive(Default)]
pub struct SceneBuilder {
    camera: Camera,
    background: Background,
    objects: Vec<SceneObject>,
    lights: Vec<SceneLight>,
    area_lights: Vec<PendingAreaLight>,
}

impl SceneBuilder {
    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background.color = color;
        self
    }

    pub fn ambient(mut self, ambient_light: Color) -> Self {
        self.background.ambient_light = ambient_light;
        self
    }

    pub fn object(mut self, object: SceneObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn light(mut self, light: SceneLight) -> Self {
        self.lights.push(light);
        self
    }

    /// Area light emitting `color` from the named objects, which become
    /// emissive and stop casting shadows.
    pub fn area_light(
        mut self,
        name: impl Into<String>,
        color: Color,
        attenuation: Attenuation,
        objects: &[&str],
    ) -> Self {
        self.area_lights.push(PendingAreaLight {
            name: name.into(),
            color,
            attenuation,
            objects: objects.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> Result<Scene, SceneError> {
        let SceneBuilder {
            camera,
            background,
            mut objects,
            mut lights,
            area_lights,
        } = self;

        let mut by_name = HashMap::with_capacity(objects.len());
        for (index, object) in objects.iter().enumerate() {
            if by_name.insert(object.name.clone(), index).is_some() {
                return Err(SceneError::DuplicateObject(object.name.clone()));
            }
        }

        for pending in area_lights {
            let mut indices = Vec::with_capacity(pending.objects.len());
            for object_name in &pending.objects {
                let &index = by_name.get(object_name).ok_or_else(|| SceneError::UnknownLightObject {
                    light: pending.name.clone(),
                    object: object_name.clone(),
                })?;
                let emitter = &mut objects[index];
                emitter.is_light = true;
                emitter.emission = pending.color;
                indices.push(index);
            }
            lights.push(SceneLight {
                name: pending.name,
                color: pending.color,
                attenuation: pending.attenuation,
                kind: LightKind::Area { objects: indices },
            });
        }

        let scene = Scene {
            camera,
            background,
            objects,
            lights,
        };
        scene.validate()?;
        log::debug!(
            "Built scene: {} objects, {} lights",
            scene.objects.len(),
            scene.lights.len()
        );
        Ok(scene)
    }
}
