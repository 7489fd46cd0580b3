//! Error types for the selection engine

use omni_core::GeometryError;
use thiserror::Error;

/// Result type for engine operations
pub type ViewportResult<T> = Result<T, ViewportError>;

/// Errors that can occur while configuring or querying the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Viewport covers no source region")]
    NoCoverage,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GeometryError> for ViewportError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::InvalidConfig(msg) => ViewportError::InvalidConfig(msg),
            GeometryError::UnsupportedOperation(msg) => ViewportError::UnsupportedOperation(msg),
            GeometryError::DegenerateGeometry(msg) => ViewportError::DegenerateGeometry(msg),
            err @ GeometryError::InvalidFace { .. } => ViewportError::OutOfRange(err.to_string()),
            err @ GeometryError::MappingInvalid => ViewportError::Internal(err.to_string()),
        }
    }
}
