//! Reflection, refraction and microfacet building blocks.
//!
//! Directions follow the ray convention: `incident` points toward the
//! surface, normals are unit length.

use std::f32::consts::PI;

use lumen_math::{Color, Vec2, Vec3};

/// Mirror `v` about `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Snell refraction of `incident` through a surface whose `normal` faces the
/// incident side, with `eta = eta_incident / eta_transmitted`.
///
/// `None` means total internal reflection.
pub fn refract(incident: Vec3, normal: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = (-incident.dot(normal)).clamp(0.0, 1.0);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k <= 0.0 {
        return None;
    }
    Some((eta * incident + (eta * cos_i - k.sqrt()) * normal).normalize())
}

/// Energy split at a dielectric boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FresnelSplit {
    /// Reflected fraction
    pub kr: f32,
    /// Transmitted fraction, `1 - kr`, or 0 under total internal reflection
    pub kt: f32,
    /// Refracted direction when transmission is possible
    pub refracted: Option<Vec3>,
    /// Normal on the incident side of the boundary
    pub facing_normal: Vec3,
    pub entering: bool,
}

/// Fresnel equations for unpolarized light between vacuum and a medium of
/// index `ior`.
///
/// `outward_normal` is the geometric normal; whether the ray enters or leaves
/// the medium follows from its sign against `incident`. Reflectance averages
/// the s- and p-polarized terms.
pub fn fresnel_dielectric(incident: Vec3, outward_normal: Vec3, ior: f32) -> FresnelSplit {
    let entering = incident.dot(outward_normal) < 0.0;
    let (eta_i, eta_t, normal) = if entering {
        (1.0, ior, outward_normal)
    } else {
        (ior, 1.0, -outward_normal)
    };

    let total_internal = FresnelSplit {
        kr: 1.0,
        kt: 0.0,
        refracted: None,
        facing_normal: normal,
        entering,
    };

    let Some(refracted) = refract(incident, normal, eta_i / eta_t) else {
        return total_internal;
    };
    let cos_i = (-incident.dot(normal)).clamp(0.0, 1.0);
    let cos_t = (-refracted.dot(normal)).clamp(0.0, 1.0);

    let rs = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    let rp = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let kr = (0.5 * (rs * rs + rp * rp)).clamp(0.0, 1.0);
    if !kr.is_finite() {
        return total_internal;
    }

    FresnelSplit {
        kr,
        kt: 1.0 - kr,
        refracted: Some(refracted),
        facing_normal: normal,
        entering,
    }
}

/// Normal-incidence reflectance for index `ior` against vacuum.
#[inline]
pub fn schlick_r0(ior: f32) -> f32 {
    let r = (1.0 - ior) / (1.0 + ior);
    r * r
}

/// `(1 - cos)^5`
#[inline]
pub fn schlick_weight(cos_theta: f32) -> f32 {
    let x = (1.0 - cos_theta).clamp(0.0, 1.0);
    let x2 = x * x;
    x2 * x2 * x
}

/// Schlick approximation with a colored normal-incidence reflectance.
#[inline]
pub fn schlick(f0: Color, cos_theta: f32) -> Color {
    f0 + (Color::ONE - f0) * schlick_weight(cos_theta)
}

/// Beckmann normal distribution. `alpha` is the RMS slope.
pub fn beckmann_d(n_dot_h: f32, alpha: f32) -> f32 {
    if n_dot_h <= 0.0 {
        return 0.0;
    }
    let cos2 = n_dot_h * n_dot_h;
    let tan2 = (1.0 - cos2) / cos2;
    let a2 = alpha * alpha;
    (-tan2 / a2).exp() / (PI * a2 * cos2 * cos2)
}

/// Smith masking for one direction, Walter's rational fit for Beckmann.
pub fn smith_g1(n_dot_v: f32, alpha: f32) -> f32 {
    if n_dot_v <= 0.0 {
        return 0.0;
    }
    let tan = (1.0 - n_dot_v * n_dot_v).max(0.0).sqrt() / n_dot_v;
    if tan == 0.0 {
        return 1.0;
    }
    let a = 1.0 / (alpha * tan);
    if a >= 1.6 {
        return 1.0;
    }
    (3.535 * a + 2.181 * a * a) / (1.0 + 2.276 * a + 2.577 * a * a)
}

/// Separable Smith shadowing-masking.
pub fn smith_g(n_dot_l: f32, n_dot_v: f32, alpha: f32) -> f32 {
    smith_g1(n_dot_l, alpha) * smith_g1(n_dot_v, alpha)
}

/// Beckmann microfacet normal in the z-up frame, distributed as
/// `D(h) * cos(theta_h)`.
pub fn sample_beckmann(u: Vec2, alpha: f32) -> Vec3 {
    let tan2 = -alpha * alpha * (1.0 - u.x).max(f32::MIN_POSITIVE).ln();
    let cos_theta = 1.0 / (1.0 + tan2).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Tangent and bitangent completing `n` to a right-handed basis.
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);
    (tangent, bitangent)
}

/// Rotate a z-up local direction into the frame around `n`.
#[inline]
pub fn to_world(local: Vec3, n: Vec3) -> Vec3 {
    let (t, b) = orthonormal_basis(n);
    (local.x * t + local.y * b + local.z * n).normalize()
}
