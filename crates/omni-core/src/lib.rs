//! Sphere/plane geometry for 360° video
//!
//! Maps sampling grids of equirectangular, cubemap and pinhole viewport
//! projections onto the unit sphere and back, and scans a viewport against
//! a source projection to find the source region it covers.

pub mod constants;
pub mod coordinates;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod rotation;


pub use constants::*;
pub use coordinates::SpherePos;
pub use error::{GeometryError, GeometryResult};
pub use geometry::{
    CubeMap, EquiRect, Geometry, GeometryKind, Projection, SphereMapping, VideoInfo, ViewPort,
    ViewportSettings,
};
pub use mapping::{FaceBounds, ScanResult, SEAM_SLOT};
pub use rotation::{rotate_3d, Rotation};
