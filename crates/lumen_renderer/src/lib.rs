//! lumen renderer - Monte Carlo light transport on the CPU.
//!
//! A [`Renderer`] takes a validated [`lumen_core::Scene`], splits the image
//! into pixel or bucket tasks, and runs them on a fixed pool of worker
//! threads. Each worker owns its samplers; the scene, the
//! [`MaterialRegistry`] and the [`Tracer`] are shared read-only.
//!
//! ```ignore
//! use std::sync::Arc;
//! use lumen_renderer::{RenderConfig, Renderer};
//!
//! let config = RenderConfig::default().with_resolution(640, 480);
//! let frame = Renderer::new(config).render(Arc::new(scene))?;
//! let rgba = frame.to_rgba();
//! ```

pub mod brdf;
mod bucket;
mod camera;
mod config;
mod error;
mod framebuffer;
mod material;
mod pool;
mod renderer;
mod sampler;
mod tracer;

pub use bucket::{generate_buckets, pixel_tasks, plan_tasks, Bucket, DEFAULT_BUCKET_SIZE};
pub use camera::PinholeCamera;
pub use config::{Integrator, RenderConfig, TaskGranularity};
pub use error::RenderError;
pub use framebuffer::{color_to_rgba, linear_to_gamma, FrameCells, Framebuffer};
pub use material::{Branch, DiffuseSample, MaterialRegistry, PhysicalMaterial, Scatter};
pub use pool::{Completion, CompletionGuard, Task, ThreadPool};
pub use renderer::{RenderStats, Renderer};
pub use sampler::{
    hemisphere_from_square, hemisphere_pdf, Rng, SamplePattern, Sampler, DEFAULT_SAMPLE_SETS,
};
pub use tracer::{ThreadSamplers, Tracer, MISSING_MATERIAL};
