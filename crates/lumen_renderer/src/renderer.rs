//! Frame driver: validates inputs, fans pixels out to the worker pool and
//! blocks until every pixel is in the framebuffer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_core::Scene;

use crate::bucket::{plan_tasks, Bucket};
use crate::camera::PinholeCamera;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::framebuffer::{FrameCells, Framebuffer};
use crate::material::MaterialRegistry;
use crate::pool::{Completion, CompletionGuard, Task, ThreadPool};
use crate::tracer::{ThreadSamplers, Tracer};

/// Summary of one finished frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub workers: usize,
    pub tasks: usize,
    pub rays: u64,
    pub elapsed: Duration,
}

impl RenderStats {
    pub fn rays_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.rays as f64 / secs
        } else {
            0.0
        }
    }
}

/// Renders scenes with a fixed configuration and material registry.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
    registry: MaterialRegistry,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            registry: MaterialRegistry::standard(),
        }
    }

    pub fn with_registry(mut self, registry: MaterialRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders one frame, blocking until it is complete.
    pub fn render(&self, scene: Arc<Scene>) -> Result<Framebuffer, RenderError> {
        self.render_with_stats(scene).map(|(frame, _)| frame)
    }

    /// As [`Renderer::render`], also returning timing and ray counts.
    ///
    /// Configuration and scene are validated before any task is queued, so
    /// an invalid input never yields a partial frame.
    pub fn render_with_stats(&self, scene: Arc<Scene>) -> Result<(Framebuffer, RenderStats), RenderError> {
        self.config.validate()?;
        scene.validate()?;

        let (width, height) = (self.config.width, self.config.height);
        let total = width as usize * height as usize;
        let camera = PinholeCamera::new(&scene.camera, width, height);
        let tracer = Arc::new(Tracer::new(scene, self.registry.clone(), self.config.clone()));
        let cells = Arc::new(FrameCells::new(width, height));
        let completion = Arc::new(Completion::new(total, (total / 10).max(1)));
        let buckets = plan_tasks(width, height, self.config.task_granularity);

        let sampler_config = self.config.clone();
        let base_seed = self.config.seed;
        let mut pool = ThreadPool::new(self.config.worker_count(), move |worker| {
            ThreadSamplers::new(&sampler_config, worker_seed(base_seed, worker))
        })?;
        let workers = pool.worker_count();
        log::info!(
            "Rendering {}x{} with {} worker(s), {} task(s), {} spp",
            width,
            height,
            workers,
            buckets.len(),
            self.config.samples_per_pixel
        );

        let start = Instant::now();
        let task_count = buckets.len();
        for bucket in buckets {
            pool.execute(TileTask {
                bucket,
                camera,
                tracer: Arc::clone(&tracer),
                cells: Arc::clone(&cells),
                _done: CompletionGuard::new(Arc::clone(&completion), bucket.pixel_count()),
            })?;
        }

        let mut next_decile = 1;
        completion.wait(|done| {
            let decile = done * 10 / total;
            if decile >= next_decile && done < total {
                log::debug!("Render progress: {}% ({done}/{total} pixels)", decile * 10);
                next_decile = decile + 1;
            }
        });
        pool.shutdown();

        let panicked = pool.panicked();
        if panicked > 0 {
            return Err(RenderError::TaskPanicked { count: panicked });
        }
        let frame = cells.to_framebuffer().ok_or_else(|| RenderError::IncompleteFrame {
            missing: cells.missing(),
        })?;

        let stats = RenderStats {
            workers,
            tasks: task_count,
            rays: tracer.ray_count(),
            elapsed: start.elapsed(),
        };
        log::info!(
            "Rendered in {:.2?}: {} rays ({:.2} Mrays/s)",
            stats.elapsed,
            stats.rays,
            stats.rays_per_second() / 1e6
        );
        Ok((frame, stats))
    }
}

/// Decorrelated sampler seed for each worker.
fn worker_seed(seed: u64, worker: usize) -> u64 {
    seed.wrapping_add((worker as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Renders the pixels of one bucket into the shared cells.
struct TileTask {
    bucket: Bucket,
    camera: PinholeCamera,
    tracer: Arc<Tracer>,
    cells: Arc<FrameCells>,
    // Reports the bucket's pixels when the task is dropped, even on panic.
    _done: CompletionGuard,
}

impl Task<ThreadSamplers> for TileTask {
    fn run(self: Box<Self>, samplers: &mut ThreadSamplers) {
        for (x, y) in self.bucket.pixels() {
            let color = self.tracer.sample_pixel(&self.camera, x, y, samplers);
            if !self.cells.write(x, y, color) {
                log::error!("Pixel ({x}, {y}) was already written");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Integrator, TaskGranularity};
    use lumen_core::{Camera, SceneError, SceneLight, SceneMaterial, SceneObject, Sphere};
    use lumen_math::{Color, Vec3};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn ball_scene(background: Color) -> Arc<Scene> {
        Arc::new(
            Scene::builder()
                .background(background)
                .object(SceneObject::new(
                    "ball",
                    Sphere::new(Vec3::ZERO, 1.0, Arc::new(SceneMaterial::matte(Color::splat(0.7)))),
                    "matte",
                ))
                .light(SceneLight::point("key", Vec3::new(3.0, 3.0, 5.0), Color::ONE))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_every_pixel_written() {
        init();
        let background = Color::new(0.25, 0.5, 0.75);
        let scene = ball_scene(background);
        for granularity in [TaskGranularity::Pixel, TaskGranularity::Bucket { size: 5 }] {
            let config = RenderConfig {
                task_granularity: granularity,
                threads: 4,
                samples_per_pixel: 1,
                ..RenderConfig::default().with_resolution(24, 16)
            };
            let (frame, stats) = Renderer::new(config)
                .render_with_stats(Arc::clone(&scene))
                .unwrap();
            assert_eq!((frame.width(), frame.height()), (24, 16));
            assert_eq!(frame.pixels().len(), 24 * 16);
            assert!(frame.pixels().iter().all(|c| c.is_finite()));
            assert_eq!(frame.get(0, 0), Some(background));
            assert_ne!(frame.get(12, 8), Some(background));
            assert!(stats.rays >= 24 * 16);
            assert_eq!(stats.workers, 4);
        }
    }

    #[test]
    fn test_single_worker_is_reproducible() {
        let scene = ball_scene(Color::ZERO);
        let config = RenderConfig {
            threads: 1,
            seed: 3,
            ..RenderConfig::default().with_resolution(8, 8)
        };
        let renderer = Renderer::new(config);
        let a = renderer.render(Arc::clone(&scene)).unwrap();
        let b = renderer.render(scene).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_thread_count_does_not_bias_whitted() {
        let scene = ball_scene(Color::ZERO);
        let base = RenderConfig {
            integrator: Integrator::Whitted,
            samples_per_pixel: 16,
            ..RenderConfig::default().with_resolution(16, 16)
        };
        let one = Renderer::new(base.clone().with_threads(1)).render(Arc::clone(&scene)).unwrap();
        let many = Renderer::new(base.with_threads(3)).render(scene).unwrap();
        let diff = (one.average() - many.average()).abs().max_element();
        assert!(diff < 0.01, "average differs by {diff}");
    }

    #[test]
    fn test_invalid_scene_produces_no_frame() {
        let mut scene = (*ball_scene(Color::ZERO)).clone();
        scene.camera = Camera::look_at(Vec3::ONE, Vec3::ONE);
        let result = Renderer::new(RenderConfig::default().with_resolution(4, 4)).render(Arc::new(scene));
        assert!(matches!(
            result,
            Err(RenderError::Scene(SceneError::InvalidCamera(_)))
        ));
    }

    #[test]
    fn test_invalid_config_produces_no_frame() {
        let config = RenderConfig {
            samples_per_pixel: 0,
            ..Default::default()
        };
        let result = Renderer::new(config).render(ball_scene(Color::ZERO));
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_worker_seeds_differ() {
        assert_ne!(worker_seed(0, 0), worker_seed(0, 1));
        assert_eq!(worker_seed(5, 0), 5);
    }
}
