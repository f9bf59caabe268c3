//! Cheap conservative pre-tests run before an object's exact intersection.
//!
//! An object keeps its volumes in a flat list ordered outer to inner. A ray
//! must pass every volume before the primitive itself is tested.

use lumen_math::{Aabb, Interval, Ray, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundingVolume {
    Box(Aabb),
    Sphere { center: Vec3, radius: f32 },
}

impl BoundingVolume {
    /// Sphere circumscribing `aabb`.
    pub fn sphere_around(aabb: &Aabb) -> Self {
        let center = aabb.centroid();
        BoundingVolume::Sphere {
            center,
            radius: (aabb.max() - center).length(),
        }
    }

    /// `false` only when the ray cannot touch anything inside within `ray_t`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        match *self {
            BoundingVolume::Box(aabb) => aabb.hit(ray, ray_t),
            BoundingVolume::Sphere { center, radius } => {
                let oc = center - ray.origin;
                let h = ray.direction.dot(oc);
                let c = oc.length_squared() - radius * radius;
                let discriminant = h * h - c;
                if discriminant < 0.0 {
                    return false;
                }
                let sqrtd = discriminant.sqrt();
                let (t0, t1) = (h - sqrtd, h + sqrtd);
                t1 >= ray_t.min && t0 <= ray_t.max
            }
        }
    }

    /// Default chain for a primitive: circumscribed sphere, then its box.
    pub fn chain_for(aabb: &Aabb) -> Vec<BoundingVolume> {
        vec![BoundingVolume::sphere_around(aabb), BoundingVolume::Box(*aabb)]
    }
}

/// Runs the chain outer to inner, stopping at the first rejection.
pub fn passes(volumes: &[BoundingVolume], ray: &Ray, ray_t: Interval) -> bool {
    volumes.iter().all(|v| v.hit(ray, ray_t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_sphere_around_contains_corners() {
        let BoundingVolume::Sphere { center, radius } = BoundingVolume::sphere_around(&unit_box())
        else {
            panic!("expected sphere");
        };
        assert_eq!(center, Vec3::ZERO);
        assert!((radius - 3f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_sphere_volume_rejects_and_accepts() {
        let volume = BoundingVolume::Sphere {
            center: Vec3::new(0.0, 0.0, -5.0),
            radius: 1.0,
        };
        let toward = Ray::new(Vec3::ZERO, -Vec3::Z);
        let away = Ray::new(Vec3::ZERO, Vec3::Z);
        let past = Ray::new(Vec3::new(2.0, 0.0, 0.0), -Vec3::Z);

        assert!(volume.hit(&toward, Interval::beyond(0.0)));
        assert!(!volume.hit(&away, Interval::beyond(0.0)));
        assert!(!volume.hit(&past, Interval::beyond(0.0)));
        // too short to reach it
        assert!(!volume.hit(&toward, Interval::new(0.0, 3.0)));
    }

    #[test]
    fn test_origin_inside_volume_passes() {
        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        for volume in BoundingVolume::chain_for(&unit_box()) {
            assert!(volume.hit(&inside, Interval::beyond(0.001)));
        }
    }

    #[test]
    fn test_chain_stops_at_first_rejection() {
        // Sphere passes, box misses: a ray clipping the sphere's cap outside the box
        let chain = BoundingVolume::chain_for(&unit_box());
        let grazing = Ray::new(Vec3::new(1.2, 1.0, -5.0), Vec3::Z);
        assert!(chain[0].hit(&grazing, Interval::beyond(0.0)));
        assert!(!passes(&chain, &grazing, Interval::beyond(0.0)));
        assert!(passes(&[], &grazing, Interval::beyond(0.0)));
    }
}
