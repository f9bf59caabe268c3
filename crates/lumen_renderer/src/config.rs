//! Render settings.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "width": 640, "height": 480, "samples_per_pixel": 16,
//!   "task_granularity": { "kind": "bucket", "size": 32 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::bucket::DEFAULT_BUCKET_SIZE;
use crate::error::RenderError;
use crate::sampler::{SamplePattern, DEFAULT_SAMPLE_SETS};

/// Light transport algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    /// Direct light, Fresnel reflection and refraction, ambient. No indirect
    /// diffuse and no roulette.
    Whitted,
    /// Adds stochastic indirect lighting and Russian roulette.
    #[default]
    MonteCarlo,
}

/// Unit of work handed to the thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TaskGranularity {
    Pixel,
    Bucket { size: u32 },
}

impl Default for TaskGranularity {
    fn default() -> Self {
        TaskGranularity::Bucket {
            size: DEFAULT_BUCKET_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub integrator: Integrator,
    /// Rays at this depth return the background without further work
    pub max_bounces: u32,
    /// Offset applied to secondary and shadow ray origins
    pub bias: f32,
    pub samples_per_pixel: u32,
    pub sample_pattern: SamplePattern,
    pub sample_sets: usize,
    /// Indirect rays spawned per diffuse hit
    pub diffuse_samples: u32,
    /// Roulette applies to rays deeper than this
    pub roulette_min_depth: u32,
    /// Lower clamp on the survival probability
    pub roulette_min_survival: f32,
    /// Worker threads; 0 uses the hardware concurrency
    pub threads: usize,
    pub task_granularity: TaskGranularity,
    pub use_bounding_volumes: bool,
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            integrator: Integrator::default(),
            max_bounces: 4,
            bias: 1e-4,
            samples_per_pixel: 4,
            sample_pattern: SamplePattern::default(),
            sample_sets: DEFAULT_SAMPLE_SETS,
            diffuse_samples: 1,
            roulette_min_depth: 2,
            roulette_min_survival: 0.1,
            threads: 0,
            task_granularity: TaskGranularity::default(),
            use_bounding_volumes: true,
            seed: 0,
        }
    }
}

impl RenderConfig {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Number of worker threads actually spawned, at least 1.
    pub fn worker_count(&self) -> usize {
        match self.threads {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |msg: String| Err(RenderError::InvalidConfig(msg));
        if self.width == 0 || self.height == 0 {
            return invalid(format!("image size {}x{} is empty", self.width, self.height));
        }
        if self.samples_per_pixel == 0 {
            return invalid("samples_per_pixel must be at least 1".into());
        }
        if self.max_bounces == 0 {
            return invalid("max_bounces must be at least 1".into());
        }
        if !(self.bias > 0.0 && self.bias.is_finite()) {
            return invalid(format!("bias must be a positive number, got {}", self.bias));
        }
        if self.sample_sets == 0 {
            return invalid("sample_sets must be at least 1".into());
        }
        if !(self.roulette_min_survival > 0.0 && self.roulette_min_survival <= 1.0) {
            return invalid(format!(
                "roulette_min_survival must be in (0, 1], got {}",
                self.roulette_min_survival
            ));
        }
        if let TaskGranularity::Bucket { size: 0 } = self.task_granularity {
            return invalid("bucket size must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_bounces, 4);
        assert_eq!(config.sample_sets, 83);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RenderConfig = serde_json::from_str(
            r#"{
                "width": 64,
                "integrator": "whitted",
                "sample_pattern": "multi_jittered",
                "task_granularity": { "kind": "pixel" }
            }"#,
        )
        .expect("valid json");
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 240);
        assert_eq!(config.integrator, Integrator::Whitted);
        assert_eq!(config.sample_pattern, SamplePattern::MultiJittered);
        assert_eq!(config.task_granularity, TaskGranularity::Pixel);
        assert_eq!(config.bias, 1e-4);
    }

    #[test]
    fn test_bucket_granularity_from_json() {
        let config: RenderConfig =
            serde_json::from_str(r#"{ "task_granularity": { "kind": "bucket", "size": 16 } }"#)
                .expect("valid json");
        assert_eq!(config.task_granularity, TaskGranularity::Bucket { size: 16 });
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            RenderConfig::default().with_resolution(0, 10),
            RenderConfig {
                samples_per_pixel: 0,
                ..Default::default()
            },
            RenderConfig {
                max_bounces: 0,
                ..Default::default()
            },
            RenderConfig {
                bias: 0.0,
                ..Default::default()
            },
            RenderConfig {
                bias: f32::NAN,
                ..Default::default()
            },
            RenderConfig {
                roulette_min_survival: 0.0,
                ..Default::default()
            },
            RenderConfig {
                task_granularity: TaskGranularity::Bucket { size: 0 },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(RenderError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_explicit_thread_count() {
        assert_eq!(RenderConfig::default().with_threads(3).worker_count(), 3);
    }
}
