//! Radiance estimation along camera rays.
//!
//! [`Tracer::shade`] evaluates one ray recursively: depth cut-off, Russian
//! roulette, closest hit, emitter termination, direct light, indirect diffuse,
//! specular branches and the ambient term. With [`Integrator::Whitted`] the
//! stochastic parts are skipped and both specular branches are followed.

use std::collections::HashSet;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lumen_core::{HitInfo, Scene, SceneLight};
use lumen_math::{Color, Interval, Ray, Vec3};

use crate::camera::PinholeCamera;
use crate::config::{Integrator, RenderConfig};
use crate::material::{MaterialRegistry, PhysicalMaterial};
use crate::sampler::Sampler;

/// Returned for surfaces whose physical material is not registered.
pub const MISSING_MATERIAL: Color = Color::new(1.0, 0.0, 1.0);

/// Per-worker sample sources. Pixel positions come from the stratified
/// sets; path decisions (light points, bounce directions, roulette) draw
/// fresh uniform points so estimates converge to the integral rather than
/// to a fixed set of nodes.
#[derive(Debug, Clone)]
pub struct ThreadSamplers {
    pub pixel: Sampler,
    pub path: Sampler,
}

impl ThreadSamplers {
    pub fn new(config: &RenderConfig, seed: u64) -> Self {
        Self {
            pixel: Sampler::new(
                config.sample_pattern,
                config.samples_per_pixel as usize,
                config.sample_sets,
                seed,
            ),
            path: Sampler::independent(seed ^ 0x5DEE_CE66_D1CE_F00D),
        }
    }
}

/// Shared, read-only shading context for one frame.
pub struct Tracer {
    scene: Arc<Scene>,
    registry: MaterialRegistry,
    config: RenderConfig,
    rays: AtomicU64,
    warned: Mutex<HashSet<String>>,
}

impl Tracer {
    pub fn new(scene: Arc<Scene>, registry: MaterialRegistry, config: RenderConfig) -> Self {
        Self {
            scene,
            registry,
            config,
            rays: AtomicU64::new(0),
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Camera, shadow and scattered rays traced so far.
    pub fn ray_count(&self) -> u64 {
        self.rays.load(Ordering::Relaxed)
    }

    /// Closest hit along `ray`.
    pub fn intersect(&self, ray: &Ray) -> Option<HitInfo<'_>> {
        self.rays.fetch_add(1, Ordering::Relaxed);
        let ray_t = match ray.max_distance {
            Some(d) => Interval::new(self.config.bias, d),
            None => Interval::beyond(self.config.bias),
        };
        self.scene
            .intersect(ray, ray_t, self.config.use_bounding_volumes)
    }

    /// Light arriving at `point` from `light_point`: the light's attenuated
    /// color, or zero when a non-emitter blocks the segment.
    pub fn light_contribution(&self, point: Vec3, light_point: Vec3, light: &SceneLight) -> Color {
        let to_light = light_point - point;
        let distance = to_light.length();
        if !(distance > 0.0) {
            return Color::ZERO;
        }
        let direction = to_light / distance;
        let bias = self.config.bias;
        let shadow = Ray::new(point + direction * bias, direction).with_max_distance(distance);

        self.rays.fetch_add(1, Ordering::Relaxed);
        let blocked = self.scene.occluded(
            &shadow,
            Interval::new(bias, distance - 2.0 * bias),
            self.config.use_bounding_volumes,
        );
        if blocked {
            Color::ZERO
        } else {
            light.attenuation.apply(light.color, distance)
        }
    }

    /// Direct illumination from every scene light.
    ///
    /// Point lights use the `pi * f * L * cos` convention so that a white
    /// Lambertian surface facing a unit light returns its albedo. Area lights
    /// sample one point per light and apply the area-to-solid-angle factor.
    pub fn direct_lighting(&self, hit: &HitInfo, material: PhysicalMaterial, sampler: &mut Sampler) -> Color {
        let n = hit.facing_normal();
        let mut total = Color::ZERO;
        for light in self.scene.lights() {
            let select = sampler.next_f32();
            let Some(sample) = light.sample(self.scene.objects(), select, sampler.next_square()) else {
                continue;
            };
            let to_light = sample.point - hit.point;
            let distance_sq = to_light.length_squared();
            if !(distance_sq > 0.0) {
                continue;
            }
            let wi = to_light / distance_sq.sqrt();
            let cos_theta = n.dot(wi);
            if cos_theta <= 0.0 {
                continue;
            }

            let weight = match sample.normal {
                // Emitters radiate from their outward side only
                Some(light_normal) => {
                    let cos_light = light_normal.dot(-wi);
                    if cos_light <= 0.0 {
                        continue;
                    }
                    cos_light / (distance_sq * sample.pdf)
                }
                None => PI / sample.pdf,
            };

            let f = material.diffuse_brdf(hit, wi) + material.specular_brdf(hit, wi);
            if f == Color::ZERO {
                continue;
            }
            let arriving = self.light_contribution(hit.point, sample.point, light);
            total += f * arriving * (cos_theta * weight);
        }
        total
    }

    /// Radiance arriving along `ray`.
    pub fn shade(&self, ray: &Ray, sampler: &mut Sampler) -> Color {
        self.trace(ray, sampler, true)
    }

    /// `shade` with control over emitters that direct lighting samples.
    /// Indirect diffuse rays pass `false`: those lights were already added
    /// at the previous vertex.
    fn trace(&self, ray: &Ray, sampler: &mut Sampler, sampled_lights: bool) -> Color {
        let background = self.scene.background.color;
        if ray.depth >= self.config.max_bounces {
            return background;
        }

        let mut survival = 1.0;
        if self.config.integrator == Integrator::MonteCarlo && ray.depth > self.config.roulette_min_depth {
            let p = ray
                .weight
                .unwrap_or(1.0)
                .clamp(self.config.roulette_min_survival, 1.0);
            if sampler.next_f32() >= p {
                return Color::ZERO;
            }
            survival = p;
        }

        let radiance = match self.intersect(ray) {
            Some(hit) => self.shade_hit(&hit, sampler, sampled_lights),
            None => background,
        };
        radiance / survival
    }

    fn shade_hit(&self, hit: &HitInfo, sampler: &mut Sampler, sampled_lights: bool) -> Color {
        if hit.is_light {
            return if sampled_lights {
                hit.emission
            } else {
                hit.emission - hit.light_emission
            };
        }
        let Some(material) = self.resolve(hit.material_name) else {
            return MISSING_MATERIAL;
        };
        let bias = self.config.bias;

        let mut radiance = self.direct_lighting(hit, material, sampler);

        match self.config.integrator {
            Integrator::MonteCarlo => {
                let count = self.config.diffuse_samples;
                if count > 0 {
                    let mut indirect = Color::ZERO;
                    for _ in 0..count {
                        if let Some(s) = material.sample_diffuse(hit, sampler, bias) {
                            let incoming = self.trace(&s.ray, sampler, false);
                            indirect += s.color * incoming * (s.cos_theta / s.pdf);
                        }
                    }
                    radiance += indirect / count as f32;
                }

                if let Some((branch, pdf)) = material.sample_scatter(hit, sampler, bias) {
                    radiance += branch.weight() * self.shade(&branch.ray, sampler) / pdf;
                }
            }
            Integrator::Whitted => {
                let scatter = material.scatter(hit, bias);
                for branch in [scatter.reflection, scatter.transmission].into_iter().flatten() {
                    radiance += branch.weight() * self.shade(&branch.ray, sampler);
                }
            }
        }

        radiance + material.ambient_radiance(hit, self.scene.background.ambient_light)
    }

    fn resolve(&self, name: &str) -> Option<PhysicalMaterial> {
        let material = self.registry.get(name);
        if material.is_none() {
            let mut warned = self.warned.lock().unwrap_or_else(PoisonError::into_inner);
            if warned.insert(name.to_string()) {
                log::warn!("Unknown physical material '{name}', shading it magenta");
            }
        }
        material
    }

    /// Averages `samples_per_pixel` jittered camera rays through `(x, y)`.
    pub fn sample_pixel(&self, camera: &PinholeCamera, x: u32, y: u32, samplers: &mut ThreadSamplers) -> Color {
        let count = self.config.samples_per_pixel.max(1);
        let mut sum = Color::ZERO;
        for _ in 0..count {
            let jitter = samplers.pixel.next_square();
            let ray = camera.ray_for_pixel(x, y, (jitter.x, jitter.y));
            sum += self.shade(&ray, &mut samplers.path);
        }
        sum / count as f32
    }
}
