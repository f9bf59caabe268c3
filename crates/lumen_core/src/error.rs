//! Scene construction and validation errors.

use thiserror::Error;

/// A scene that cannot be rendered.
///
/// Raised while building or validating a [`Scene`](crate::Scene), always
/// before any render work is scheduled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Light '{light}' references unknown object '{object}'")]
    UnknownLightObject { light: String, object: String },

    #[error("Area light '{0}' has no emitting shapes")]
    EmptyAreaLight(String),

    #[error("Object '{0}' has non-finite or degenerate geometry")]
    InvalidGeometry(String),

    #[error("Object '{0}' has no physical material name")]
    MissingMaterial(String),

    #[error("Mesh index buffer length {0} is not a multiple of 3")]
    MalformedIndices(usize),

    #[error("Mesh index {index} out of range (vertex count: {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Mesh attribute '{attribute}' has {found} entries, expected {expected}")]
    AttributeCount {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid camera: {0}")]
    InvalidCamera(String),

    #[error("Duplicate object name '{0}'")]
    DuplicateObject(String),
}
