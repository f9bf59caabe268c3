//! Pinhole camera for primary ray generation.

use lumen_core::Camera;
use lumen_math::{Ray, Vec3};

/// Image plane derived once per frame from a scene [`Camera`] and the
/// output resolution.
///
/// `t` runs left to right and `s` bottom to top across the image plane, both
/// in `[0, 1]`. Pixel row 0 is the top of the image.
#[derive(Debug, Clone, Copy)]
pub struct PinholeCamera {
    origin: Vec3,
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    width: u32,
    height: u32,
}

impl PinholeCamera {
    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        let half_height = (camera.fov_degrees.to_radians() / 2.0).tan();
        let half_width = aspect * half_height;

        // Camera basis, looking down -w
        let w = (camera.position - camera.target).normalize();
        let u = camera.up.cross(w).normalize();
        let v = w.cross(u);

        Self {
            origin: camera.position,
            lower_left: camera.position - u * half_width - v * half_height - w,
            horizontal: u * (2.0 * half_width),
            vertical: v * (2.0 * half_height),
            width,
            height,
        }
    }

    /// Ray through the image plane coordinate `(t, s)`.
    pub fn ray_for_point(&self, t: f32, s: f32) -> Ray {
        let target = self.lower_left + self.horizontal * t + self.vertical * s;
        Ray::new(self.origin, target - self.origin)
    }

    /// Ray through pixel `(x, y)` offset by `jitter` in `[0, 1)²`.
    pub fn ray_for_pixel(&self, x: u32, y: u32, jitter: (f32, f32)) -> Ray {
        let t = (x as f32 + jitter.0) / self.width as f32;
        let s = 1.0 - (y as f32 + jitter.1) / self.height as f32;
        self.ray_for_point(t, s)
    }
}
