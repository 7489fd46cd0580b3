//! Viewport-driven tile selection for tiled 360° video
//!
//! A `ViewportEngine` owns a source projection (ERP or cubemap), a pinhole
//! viewport and a coarse tile grid over the source. Each viewport update
//! re-runs the geometry mapping scan, marks the tiles the view touches and
//! hands out ordered tile lists or a content coverage summary.

pub mod config;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod region;
pub mod selection;
pub mod tile_grid;

pub use config::{FaceLayout, FaceProperty, FaceTransform, UsageType, ViewportConfig};
pub use coverage::ContentCoverage;
pub use engine::{ProcessOutput, TileBudget, ViewportEngine};
pub use error::{ViewportError, ViewportResult};
pub use selection::{EmissionOrder, SelectedTile, CUBEMAP_FACE_MAP};
pub use tile_grid::{TileCell, TileGrid};

pub use omni_core::{FaceBounds, GeometryKind};
