//! Physical materials: how a surface turns its [`SceneMaterial`] parameters
//! into scattered light.
//!
//! Behaviours form a closed set ([`PhysicalMaterial`]). Scene objects refer
//! to them by name through a [`MaterialRegistry`] built once before
//! rendering and only read afterwards.
//!
//! [`SceneMaterial`]: lumen_core::SceneMaterial

use std::collections::HashMap;
use std::f32::consts::PI;

use lumen_core::HitInfo;
use lumen_math::{Color, Ray, Vec3};

use crate::brdf::{
    beckmann_d, fresnel_dielectric, reflect, sample_beckmann, schlick, schlick_r0, smith_g,
    to_world,
};
use crate::sampler::{hemisphere_pdf, Sampler};

/// Smallest Beckmann slope; smoother surfaces behave as mirrors anyway.
const MIN_ALPHA: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalMaterial {
    /// Lambertian diffuse
    Matte,
    /// Lambertian plus a normalized Phong highlight
    Plastic,
    /// Plastic plus a perfect reflection weighted by `reflective`
    ReflectivePlastic,
    /// Perfect reflection weighted by `reflective`
    Mirror,
    /// Perfect reflection tinted by the diffuse color
    Metallic,
    /// Fresnel-weighted reflection and refraction
    Glass,
    /// Beckmann microfacet conductor
    Rough,
}

/// One importance-sampled diffuse bounce.
#[derive(Debug, Clone, Copy)]
pub struct DiffuseSample {
    pub ray: Ray,
    /// BRDF value for the sampled direction
    pub color: Color,
    /// Solid-angle density of the sampled direction
    pub pdf: f32,
    /// Cosine between the sampled direction and the shading normal
    pub cos_theta: f32,
}

/// A deterministic specular branch.
#[derive(Debug, Clone, Copy)]
pub struct Branch {
    pub ray: Ray,
    /// Energy fraction carried by the branch
    pub k: f32,
    pub tint: Color,
}

impl Branch {
    /// Combined weight applied to the radiance arriving along `ray`.
    pub fn weight(&self) -> Color {
        self.tint * self.k
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scatter {
    pub reflection: Option<Branch>,
    pub transmission: Option<Branch>,
}

impl Scatter {
    pub fn kr(&self) -> f32 {
        self.reflection.map_or(0.0, |b| b.k)
    }

    pub fn kt(&self) -> f32 {
        self.transmission.map_or(0.0, |b| b.k)
    }

    pub fn is_empty(&self) -> bool {
        self.reflection.is_none() && self.transmission.is_none()
    }
}

impl PhysicalMaterial {
    pub const ALL: [PhysicalMaterial; 7] = [
        PhysicalMaterial::Matte,
        PhysicalMaterial::Plastic,
        PhysicalMaterial::ReflectivePlastic,
        PhysicalMaterial::Mirror,
        PhysicalMaterial::Metallic,
        PhysicalMaterial::Glass,
        PhysicalMaterial::Rough,
    ];

    /// Registry key used by scene objects.
    pub fn name(self) -> &'static str {
        match self {
            PhysicalMaterial::Matte => "matte",
            PhysicalMaterial::Plastic => "plastic",
            PhysicalMaterial::ReflectivePlastic => "reflective_plastic",
            PhysicalMaterial::Mirror => "mirror",
            PhysicalMaterial::Metallic => "metallic",
            PhysicalMaterial::Glass => "glass",
            PhysicalMaterial::Rough => "rough",
        }
    }

    fn has_lambert_lobe(self) -> bool {
        matches!(
            self,
            PhysicalMaterial::Matte | PhysicalMaterial::Plastic | PhysicalMaterial::ReflectivePlastic
        )
    }

    /// Constant term: diffuse albedo times the scene ambient light.
    pub fn ambient_radiance(self, hit: &HitInfo, ambient_light: Color) -> Color {
        if self.has_lambert_lobe() {
            hit.material.diffuse * ambient_light
        } else {
            Color::ZERO
        }
    }

    /// Diffuse BRDF toward the unit light direction `wi`.
    ///
    /// Lambertian for the plastic family, the microfacet BRDF for `Rough`,
    /// zero for purely specular materials.
    pub fn diffuse_brdf(self, hit: &HitInfo, wi: Vec3) -> Color {
        let n = hit.facing_normal();
        if wi.dot(n) <= 0.0 {
            return Color::ZERO;
        }
        match self {
            PhysicalMaterial::Rough => microfacet_brdf(hit, wi),
            m if m.has_lambert_lobe() => hit.material.diffuse / PI,
            _ => Color::ZERO,
        }
    }

    /// Normalized Phong highlight toward `wi`; zero for materials without one.
    pub fn specular_brdf(self, hit: &HitInfo, wi: Vec3) -> Color {
        if !matches!(self, PhysicalMaterial::Plastic | PhysicalMaterial::ReflectivePlastic) {
            return Color::ZERO;
        }
        let n = hit.facing_normal();
        if wi.dot(n) <= 0.0 {
            return Color::ZERO;
        }
        let cos_alpha = reflect(-wi, n).dot(hit.wo()).clamp(0.0, 1.0);
        if cos_alpha <= 0.0 {
            return Color::ZERO;
        }
        let shininess = hit.material.shininess.max(0.0);
        hit.material.specular * ((shininess + 2.0) / (2.0 * PI)) * cos_alpha.powf(shininess)
    }

    /// Importance-samples an indirect bounce.
    ///
    /// Cosine-weighted for the Lambertian family, Beckmann half-vector
    /// sampling for `Rough`. `None` when the material has no glossy or diffuse
    /// lobe or the draw lands below the surface.
    pub fn sample_diffuse(self, hit: &HitInfo, sampler: &mut Sampler, bias: f32) -> Option<DiffuseSample> {
        let n = hit.facing_normal();
        let (wi, color, pdf) = match self {
            PhysicalMaterial::Rough => {
                let alpha = hit.material.roughness.max(MIN_ALPHA);
                let h = to_world(sample_beckmann(sampler.next_square(), alpha), n);
                let wo = hit.wo();
                let wi = reflect(-wo, h);
                let wo_h = wo.dot(h).abs();
                if wo_h <= 0.0 {
                    return None;
                }
                let pdf = beckmann_d(n.dot(h), alpha) * n.dot(h) / (4.0 * wo_h);
                (wi, microfacet_brdf(hit, wi), pdf)
            }
            m if m.has_lambert_lobe() => {
                let wi = to_world(sampler.next_hemisphere(1.0), n);
                (wi, hit.material.diffuse / PI, hemisphere_pdf(wi.dot(n), 1.0))
            }
            _ => return None,
        };

        let cos_theta = wi.dot(n);
        if cos_theta <= 0.0 || !(pdf > 0.0) || !pdf.is_finite() {
            return None;
        }
        Some(DiffuseSample {
            ray: hit.ray.scattered(hit.point + n * bias, wi).with_weight(cos_theta),
            color,
            pdf,
            cos_theta,
        })
    }

    /// Specular reflection and transmission branches with their energy split.
    pub fn scatter(self, hit: &HitInfo, bias: f32) -> Scatter {
        let n = hit.facing_normal();
        let mirror = |tint: Color| -> Option<Branch> {
            if tint.max_element() <= 0.0 {
                return None;
            }
            let dir = reflect(hit.ray.direction, n);
            Some(Branch {
                ray: hit.ray.scattered(hit.point + n * bias, dir).with_weight(dir.dot(n)),
                k: 1.0,
                tint,
            })
        };

        match self {
            PhysicalMaterial::Matte | PhysicalMaterial::Plastic | PhysicalMaterial::Rough => {
                Scatter::default()
            }
            PhysicalMaterial::ReflectivePlastic | PhysicalMaterial::Mirror => Scatter {
                reflection: mirror(hit.material.reflective),
                transmission: None,
            },
            PhysicalMaterial::Metallic => Scatter {
                reflection: mirror(hit.material.diffuse),
                transmission: None,
            },
            PhysicalMaterial::Glass => {
                let split = fresnel_dielectric(hit.ray.direction, hit.normal, hit.material.ior());
                let nf = split.facing_normal;
                let reflected = reflect(hit.ray.direction, nf);
                let reflection = (split.kr > 0.0).then(|| Branch {
                    ray: hit
                        .ray
                        .scattered(hit.point + nf * bias, reflected)
                        .with_weight(reflected.dot(nf)),
                    k: split.kr,
                    tint: Color::ONE,
                });
                let transmission = split.refracted.filter(|_| split.kt > 0.0).map(|dir| Branch {
                    ray: hit
                        .ray
                        .scattered(hit.point - nf * bias, dir)
                        .with_weight(-dir.dot(nf)),
                    k: split.kt,
                    tint: hit.material.transparent,
                });
                Scatter {
                    reflection,
                    transmission,
                }
            }
        }
    }

    /// Picks one specular branch with probability proportional to its `k`.
    ///
    /// Returns the branch and its selection probability.
    pub fn sample_scatter(self, hit: &HitInfo, sampler: &mut Sampler, bias: f32) -> Option<(Branch, f32)> {
        let scatter = self.scatter(hit, bias);
        let (kr, kt) = (scatter.kr(), scatter.kt());
        let total = kr + kt;
        if total <= 0.0 {
            return None;
        }
        let reflect_p = kr / total;
        match (scatter.reflection, scatter.transmission) {
            (Some(r), Some(t)) => {
                if sampler.next_f32() < reflect_p {
                    Some((r, reflect_p))
                } else {
                    Some((t, 1.0 - reflect_p))
                }
            }
            (Some(r), None) => Some((r, 1.0)),
            (None, Some(t)) => Some((t, 1.0)),
            (None, None) => None,
        }
    }
}

/// Beckmann / Smith / Schlick conductor BRDF tinted by the diffuse color.
fn microfacet_brdf(hit: &HitInfo, wi: Vec3) -> Color {
    let n = hit.facing_normal();
    let wo = hit.wo();
    let cos_l = n.dot(wi);
    let cos_v = n.dot(wo);
    if cos_l <= 0.0 || cos_v <= 0.0 {
        return Color::ZERO;
    }
    let h = (wi + wo).normalize_or_zero();
    if h == Vec3::ZERO {
        return Color::ZERO;
    }
    let alpha = hit.material.roughness.max(MIN_ALPHA);
    let d = beckmann_d(n.dot(h), alpha);
    let g = smith_g(cos_l, cos_v, alpha);
    let f = schlick(Color::splat(schlick_r0(hit.material.ior())), wo.dot(h));
    hit.material.diffuse * f * (d * g / (4.0 * cos_l * cos_v))
}

/// Name to behaviour lookup, immutable once handed to the tracer.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    table: HashMap<String, PhysicalMaterial>,
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MaterialRegistry {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Every built-in behaviour under its [`PhysicalMaterial::name`].
    pub fn standard() -> Self {
        PhysicalMaterial::ALL
            .into_iter()
            .fold(Self::empty(), |reg, m| reg.with(m.name(), m))
    }

    /// Registers `material` under `name`, replacing any previous entry.
    pub fn with(mut self, name: impl Into<String>, material: PhysicalMaterial) -> Self {
        self.table.insert(name.into(), material);
        self
    }

    pub fn get(&self, name: &str) -> Option<PhysicalMaterial> {
        self.table.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{SamplePattern, DEFAULT_SAMPLE_SETS};
    use lumen_core::SceneMaterial;
    use lumen_math::Vec2;

    const BIAS: f32 = 1e-4;

    fn hit_with<'a>(material: SceneMaterial, incoming: Vec3) -> HitInfo<'a> {
        HitInfo {
            point: Vec3::ZERO,
            normal: Vec3::Y,
            front_face: incoming.dot(Vec3::Y) < 0.0,
            t: 1.0,
            ray: Ray::new(-incoming.normalize() * 1.0, incoming),
            material,
            material_name: "test",
            object_name: "test",
            uv: Vec2::ZERO,
            is_light: false,
            emission: Color::ZERO,
            light_emission: Color::ZERO,
        }
    }

    fn test_surface() -> SceneMaterial {
        SceneMaterial::matte(Color::new(0.8, 0.5, 0.2))
            .with_specular(Color::splat(0.3), 20.0)
            .with_reflective(Color::splat(0.9))
            .with_roughness(0.3)
            .with_transparency(Color::ONE, 1.5)
    }

    fn sampler() -> Sampler {
        Sampler::new(SamplePattern::MultiJittered, 16, DEFAULT_SAMPLE_SETS, 42)
    }

    fn directions() -> Vec<Vec3> {
        let mut dirs = Vec::new();
        for i in 0..8 {
            for j in 1..8 {
                let phi = i as f32 * 0.8;
                let theta = j as f32 * 0.2;
                dirs.push(Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()));
            }
        }
        dirs
    }

    #[test]
    fn test_opaque_materials_conserve_energy() {
        let opaque = [
            PhysicalMaterial::Matte,
            PhysicalMaterial::Plastic,
            PhysicalMaterial::ReflectivePlastic,
            PhysicalMaterial::Mirror,
            PhysicalMaterial::Metallic,
            PhysicalMaterial::Rough,
        ];
        for m in opaque {
            for incoming in directions() {
                let hit = hit_with(test_surface(), -incoming);
                let s = m.scatter(&hit, BIAS);
                assert!(s.kr() + s.kt() <= 1.0 + 1e-6, "{m:?}");
                assert_eq!(s.kt(), 0.0, "{m:?} must not transmit");
            }
        }
    }

    #[test]
    fn test_brdfs_are_non_negative() {
        for m in PhysicalMaterial::ALL {
            for incoming in directions() {
                let hit = hit_with(test_surface(), -incoming);
                for wi in directions() {
                    for wi in [wi, -wi] {
                        let d = m.diffuse_brdf(&hit, wi);
                        let s = m.specular_brdf(&hit, wi);
                        assert!(d.min_element() >= 0.0 && d.is_finite(), "{m:?} diffuse {d}");
                        assert!(s.min_element() >= 0.0 && s.is_finite(), "{m:?} specular {s}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_lambert_albedo_integrates() {
        // integral of f * cos over the hemisphere equals the albedo
        let hit = hit_with(test_surface(), -Vec3::Y);
        let mut sampler = sampler();
        let n = 20_000;
        let mut sum = Color::ZERO;
        for _ in 0..n {
            let s = PhysicalMaterial::Matte
                .sample_diffuse(&hit, &mut sampler, BIAS)
                .expect("lambert always samples above the surface");
            assert!(s.pdf > 0.0);
            assert!(s.ray.direction.dot(Vec3::Y) > 0.0);
            assert_eq!(s.ray.depth, 1);
            sum += s.color * s.cos_theta / s.pdf;
        }
        let estimate = sum / n as f32;
        assert!((estimate - test_surface().diffuse).abs().max_element() < 1e-3);
    }

    #[test]
    fn test_rough_albedo_stays_below_one() {
        let hit = hit_with(SceneMaterial::matte(Color::ONE).with_roughness(0.3).with_transparency(Color::ZERO, 20.0), -Vec3::new(0.3, 1.0, 0.0).normalize());
        let mut sampler = sampler();
        let n = 20_000;
        let mut sum = 0.0;
        for _ in 0..n {
            if let Some(s) = PhysicalMaterial::Rough.sample_diffuse(&hit, &mut sampler, BIAS) {
                // sampled pdf must match the closed form pdf of the sampled direction
                assert!(s.pdf > 0.0 && s.pdf.is_finite());
                sum += (s.color.x * s.cos_theta / s.pdf) as f64;
            }
        }
        let albedo = sum / n as f64;
        assert!(albedo > 0.5 && albedo <= 1.02, "albedo {albedo}");
    }

    #[test]
    fn test_specular_materials_do_not_sample_diffuse() {
        let hit = hit_with(test_surface(), -Vec3::Y);
        let mut sampler = sampler();
        for m in [PhysicalMaterial::Mirror, PhysicalMaterial::Metallic, PhysicalMaterial::Glass] {
            assert!(m.sample_diffuse(&hit, &mut sampler, BIAS).is_none());
            assert_eq!(m.diffuse_brdf(&hit, Vec3::Y), Color::ZERO);
        }
    }

    #[test]
    fn test_mirror_reflects_about_normal() {
        let incoming = Vec3::new(1.0, -1.0, 0.0).normalize();
        let hit = hit_with(test_surface(), incoming);
        let s = PhysicalMaterial::Mirror.scatter(&hit, BIAS);
        let r = s.reflection.expect("mirror reflects");
        assert!((r.ray.direction - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-5);
        assert_eq!(r.k, 1.0);
        assert_eq!(r.tint, Color::splat(0.9));
        assert!(r.ray.origin.y > 0.0);
        assert!(s.transmission.is_none());

        let dull = hit_with(test_surface().with_reflective(Color::ZERO), incoming);
        assert!(PhysicalMaterial::Mirror.scatter(&dull, BIAS).is_empty());
    }

    #[test]
    fn test_glass_splits_energy() {
        let hit = hit_with(test_surface(), Vec3::new(0.3, -1.0, 0.0).normalize());
        let s = PhysicalMaterial::Glass.scatter(&hit, BIAS);
        assert!((s.kr() + s.kt() - 1.0).abs() < 1e-5);
        let t = s.transmission.expect("transmits");
        // refracted ray starts below the surface and bends toward the normal
        assert!(t.ray.origin.y < 0.0);
        assert!(t.ray.direction.x < hit.ray.direction.x);
        assert!(t.ray.direction.y < 0.0);
    }

    #[test]
    fn test_glass_total_internal_reflection() {
        // inside glass of IOR 1.5, 60 degrees from the normal: beyond the critical angle
        let angle = 60f32.to_radians();
        let incoming = Vec3::new(angle.sin(), angle.cos(), 0.0);
        let hit = hit_with(SceneMaterial::default().with_transparency(Color::ONE, 1.5), incoming);
        assert!(!hit.front_face);

        let s = PhysicalMaterial::Glass.scatter(&hit, BIAS);
        assert_eq!(s.kr(), 1.0);
        assert_eq!(s.kt(), 0.0);
        let r = s.reflection.expect("reflects internally");
        assert!(r.ray.direction.is_finite());
        assert!(r.ray.direction.y < 0.0, "stays inside the glass");
        assert!(r.ray.origin.y < 0.0);
    }

    #[test]
    fn test_sample_scatter_picks_by_energy() {
        let hit = hit_with(test_surface(), Vec3::new(0.5, -1.0, 0.0).normalize());
        let split = PhysicalMaterial::Glass.scatter(&hit, BIAS);
        let mut sampler = sampler();
        let n = 10_000;
        let mut reflected = 0;
        for _ in 0..n {
            let (branch, pdf) = PhysicalMaterial::Glass
                .sample_scatter(&hit, &mut sampler, BIAS)
                .expect("glass always scatters");
            if branch.ray.direction.y > 0.0 {
                reflected += 1;
                assert!((pdf - split.kr()).abs() < 1e-5);
            } else {
                assert!((pdf - split.kt()).abs() < 1e-5);
            }
        }
        let frac = reflected as f32 / n as f32;
        assert!((frac - split.kr()).abs() < 0.02, "{frac} vs {}", split.kr());
        assert!(PhysicalMaterial::Matte.sample_scatter(&hit, &mut sampler, BIAS).is_none());
    }

    #[test]
    fn test_ambient_only_for_diffuse_family() {
        let hit = hit_with(test_surface(), -Vec3::Y);
        let ambient = Color::splat(0.5);
        assert_eq!(
            PhysicalMaterial::Matte.ambient_radiance(&hit, ambient),
            test_surface().diffuse * 0.5
        );
        assert_eq!(PhysicalMaterial::Glass.ambient_radiance(&hit, ambient), Color::ZERO);
        assert_eq!(PhysicalMaterial::Metallic.ambient_radiance(&hit, ambient), Color::ZERO);
    }

    #[test]
    fn test_registry() {
        let registry = MaterialRegistry::standard();
        assert_eq!(registry.len(), PhysicalMaterial::ALL.len());
        for m in PhysicalMaterial::ALL {
            assert_eq!(registry.get(m.name()), Some(m));
        }
        assert_eq!(registry.get("velvet"), None);

        let custom = MaterialRegistry::empty().with("chrome", PhysicalMaterial::Metallic);
        assert_eq!(custom.get("chrome"), Some(PhysicalMaterial::Metallic));
        assert!(custom.get("matte").is_none());
    }
}
