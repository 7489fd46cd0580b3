//! Error types for geometry construction and mapping

use thiserror::Error;

/// Result type for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors that can occur while building or mapping a geometry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid geometry config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Face index {face} out of range for {kind} geometry")]
    InvalidFace { face: usize, kind: &'static str },

    #[error("Mapping not computed for this geometry")]
    MappingInvalid,
}
