//! lumen core - scene description and ray intersection.
//!
//! This crate provides:
//!
//! - **Scene data**: [`SceneMaterial`], [`SceneObject`], [`SceneLight`], [`Scene`]
//! - **Geometry**: [`Sphere`], [`Triangle`] and indexed [`Mesh`] primitives
//!   with intersection and uniform area sampling
//! - **Bounding volumes**: ordered pre-test chains that cull rays cheaply
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lumen_core::{Scene, SceneLight, SceneMaterial, SceneObject, Sphere};
//! use lumen_math::Vec3;
//!
//! let red = Arc::new(SceneMaterial::matte(Vec3::new(0.8, 0.1, 0.1)));
//! let scene = Scene::builder()
//!     .object(SceneObject::new("ball", Sphere::new(Vec3::ZERO, 1.0, red), "matte"))
//!     .light(SceneLight::point("key", Vec3::new(0.0, 5.0, 5.0), Vec3::ONE))
//!     .build()?;
//! ```

pub mod bounds;
pub mod error;
pub mod hit;
pub mod light;
pub mod material;
pub mod mesh;
pub mod object;
pub mod scene;
pub mod shape;
pub mod sphere;
pub mod transform;
pub mod triangle;

pub use bounds::BoundingVolume;
pub use error::SceneError;
pub use hit::HitInfo;
pub use light::{Attenuation, LightKind, LightSample, SceneLight};
pub use material::SceneMaterial;
pub use mesh::{Mesh, MeshData};
pub use object::SceneObject;
pub use scene::{Background, Camera, Scene, SceneBuilder};
pub use shape::{MaterialRef, Shape, SurfaceHit, SurfaceSample};
pub use sphere::Sphere;
pub use transform::Transform;
pub use triangle::Triangle;
