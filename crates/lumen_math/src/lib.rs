//! Math primitives shared by every lumen crate.
//!
//! Re-exports glam so downstream crates agree on one vector type, and adds the
//! ray, interval and bounding-box types used by intersection code.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

/// Linear RGB radiance. Components are unbounded until tone mapping.
pub type Color = Vec3;
