//! Render driver errors.

use lumen_core::SceneError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid scene: {0}")]
    Scene(#[from] SceneError),

    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("Thread pool is shut down")]
    PoolShutDown,

    #[error("Failed to spawn render worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("{count} render task(s) panicked")]
    TaskPanicked { count: usize },

    #[error("Frame finished with {missing} unwritten pixel(s)")]
    IncompleteFrame { missing: usize },
}
