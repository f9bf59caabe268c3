use crate::Vec3;

/// A ray segment of a light path.
///
/// Rays are immutable: every scatter event builds a new ray through
/// [`Ray::scattered`], which bumps `depth` by one. `weight` carries the cosine
/// term of the sampling step that produced the ray and drives Russian
/// roulette; `max_distance` bounds shadow rays to the light distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
    pub depth: u32,
    pub weight: Option<f32>,
    pub max_distance: Option<f32>,
}

impl Ray {
    /// Primary ray (depth 0). `direction` is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            depth: 0,
            weight: None,
            max_distance: None,
        }
    }

    /// Child ray one bounce deeper than `self`.
    pub fn scattered(&self, origin: Vec3, direction: Vec3) -> Self {
        Self {
            depth: self.depth + 1,
            ..Self::new(origin, direction)
        }
    }

    pub fn with_weight(self, weight: f32) -> Self {
        Self {
            weight: Some(weight),
            ..self
        }
    }

    pub fn with_max_distance(self, distance: f32) -> Self {
        Self {
            max_distance: Some(distance),
            ..self
        }
    }

    /// Point at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(ray.depth, 0);
        assert!(ray.weight.is_none());
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_scattered_increments_depth_and_drops_weight() {
        let parent = Ray::new(Vec3::ZERO, Vec3::Z).with_weight(0.3);
        let child = parent.scattered(Vec3::ONE, Vec3::Y);
        assert_eq!(child.depth, 1);
        assert_eq!(child.origin, Vec3::ONE);
        assert!(child.weight.is_none());
        // parent is untouched
        assert_eq!(parent.depth, 0);
        assert_eq!(parent.weight, Some(0.3));

        let grandchild = child.scattered(Vec3::ZERO, Vec3::X).with_weight(0.5);
        assert_eq!(grandchild.depth, 2);
        assert_eq!(grandchild.weight, Some(0.5));
    }
}
