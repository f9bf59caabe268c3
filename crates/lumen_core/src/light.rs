//! Point and area lights.

use lumen_math::{Color, Vec2, Vec3};

use crate::object::SceneObject;

/// `1 / (constant + linear * d + quadratic * d^2)` falloff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

impl Attenuation {
    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// Physically based inverse-square falloff.
    pub fn inverse_square() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn apply(&self, color: Color, distance: f32) -> Color {
        let denom = self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denom > 0.0 {
            color / denom
        } else {
            Color::ZERO
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LightKind {
    Point { position: Vec3 },
    /// Indices into the scene's object list
    Area { objects: Vec<usize> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneLight {
    pub name: String,
    pub color: Color,
    pub attenuation: Attenuation,
    pub kind: LightKind,
}

/// A sampled point on a light.
#[derive(Clone, Copy, Debug)]
pub struct LightSample {
    pub point: Vec3,
    /// Surface normal at `point`; `None` for point lights
    pub normal: Option<Vec3>,
    /// Area density times the discrete shape-selection probability, or 1 for
    /// point lights.
    pub pdf: f32,
}

impl SceneLight {
    pub fn point(name: impl Into<String>, position: Vec3, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            attenuation: Attenuation::default(),
            kind: LightKind::Point { position },
        }
    }

    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn is_area(&self) -> bool {
        matches!(self.kind, LightKind::Area { .. })
    }

    /// Draws a point on the light.
    ///
    /// Area lights pick one emitter uniformly with `select` in [0, 1), then a
    /// uniform point on it with `u`. Returns `None` when nothing can be sampled.
    pub fn sample(&self, objects: &[SceneObject], select: f32, u: Vec2) -> Option<LightSample> {
        match &self.kind {
            LightKind::Point { position } => Some(LightSample {
                point: *position,
                normal: None,
                pdf: 1.0,
            }),
            LightKind::Area { objects: emitters } => {
                if emitters.is_empty() {
                    return None;
                }
                let n = emitters.len();
                let pick = ((select * n as f32) as usize).min(n - 1);
                let shape = &objects.get(emitters[pick])?.shape;
                let s = shape.sample(u);
                let pdf = s.pdf / n as f32;
                (pdf > 0.0 && pdf.is_finite()).then_some(LightSample {
                    point: s.point,
                    normal: Some(s.normal),
                    pdf,
                })
            }
        }
    }
}
