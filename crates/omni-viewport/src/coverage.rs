//! Content coverage: the spherical region currently selected, as a centre
//! and angular extent in 1/65536 degree.
//!
//! Azimuth follows the packing convention: positive to the left of the
//! frame centre, so a view turned to yaw +90° is centred at azimuth -90°.

use crate::engine::ViewportEngine;
use crate::error::{ViewportError, ViewportResult};
use glam::DVec3;
use omni_core::{FaceBounds, GeometryKind, SpherePos, Q16, SEAM_SLOT};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Samples taken along each edge of a cubemap box
const EDGE_SAMPLES: i32 = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCoverage {
    pub centre_azimuth: i32,
    pub centre_elevation: i32,
    pub azimuth_range: u32,
    pub elevation_range: u32,
}

impl ContentCoverage {
    pub fn from_degrees(centre_azimuth: f64, centre_elevation: f64, azimuth_range: f64, elevation_range: f64) -> Self {
        Self {
            centre_azimuth: (wrap_degrees(centre_azimuth) * Q16) as i32,
            centre_elevation: (centre_elevation * Q16) as i32,
            azimuth_range: (azimuth_range.clamp(0.0, 360.0) * Q16) as u32,
            elevation_range: (elevation_range.clamp(0.0, 180.0) * Q16) as u32,
        }
    }

    pub fn centre_azimuth_deg(&self) -> f64 {
        self.centre_azimuth as f64 / Q16
    }

    pub fn centre_elevation_deg(&self) -> f64 {
        self.centre_elevation as f64 / Q16
    }

    pub fn azimuth_range_deg(&self) -> f64 {
        self.azimuth_range as f64 / Q16
    }

    pub fn elevation_range_deg(&self) -> f64 {
        self.elevation_range as f64 / Q16
    }
}

/// Fold an angle into (-180, 180]
fn wrap_degrees(deg: f64) -> f64 {
    let folded = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if folded == -180.0 {
        180.0
    } else {
        folded
    }
}

impl ViewportEngine {
    /// Coverage of the current bounding boxes. Fails with `NoCoverage`
    /// before the first `process`.
    pub fn content_coverage(&self) -> ViewportResult<ContentCoverage> {
        if self.bounds.is_empty() {
            return Err(ViewportError::NoCoverage);
        }
        let cc = match self.config.source {
            GeometryKind::EquiRect => self.erp_coverage()?,
            GeometryKind::CubeMap => self.cubemap_coverage()?,
            GeometryKind::ViewPort => {
                return Err(ViewportError::UnsupportedOperation(
                    "content coverage of a viewport source".to_string(),
                ))
            }
        };
        debug!(
            azimuth = cc.centre_azimuth_deg(),
            elevation = cc.centre_elevation_deg(),
            azimuth_range = cc.azimuth_range_deg(),
            elevation_range = cc.elevation_range_deg(),
            "content coverage"
        );
        Ok(cc)
    }

    fn erp_coverage(&self) -> ViewportResult<ContentCoverage> {
        let width = self.config.input_width as f64;
        let height = self.config.input_height as f64;
        let main = self.bounds.slot(0).ok_or(ViewportError::NoCoverage)?;

        // A seam split is unwrapped into one span running past the right edge
        let (left, span, top, bottom) = match self.bounds.slot(SEAM_SLOT).filter(|b| b.face == main.face) {
            Some(wrapped) => (
                main.up_left.x,
                self.config.input_width - main.up_left.x + wrapped.down_right.x,
                main.up_left.y.min(wrapped.up_left.y),
                main.down_right.y.max(wrapped.down_right.y),
            ),
            None => (main.up_left.x, main.width(), main.up_left.y, main.down_right.y),
        };
        let rows = bottom - top;

        let centre_x = left as f64 + span as f64 / 2.0;
        let centre_y = top as f64 + rows as f64 / 2.0;

        Ok(ContentCoverage::from_degrees(
            (width / 2.0 - centre_x) * 360.0 / width,
            (height / 2.0 - centre_y) * 180.0 / height,
            span as f64 * 360.0 / width,
            rows as f64 * 180.0 / height,
        ))
    }

    fn cubemap_coverage(&self) -> ViewportResult<ContentCoverage> {
        let mut lons = Vec::new();
        let mut lat_min = f64::MAX;
        let mut lat_max = f64::MIN;

        for (_, b) in self.bounds.touched() {
            for (x, y) in perimeter(b) {
                let dir = self.source.map_2d_to_3d(&SpherePos::grid(b.face, x as f64, y as f64))?;
                let (lon, lat) = dir.to_lon_lat();
                lons.push(lon.to_degrees());
                lat_min = lat_min.min(lat.to_degrees());
                lat_max = lat_max.max(lat.to_degrees());
            }
        }

        let north = self.covers_direction(DVec3::Y)?;
        let south = self.covers_direction(DVec3::NEG_Y)?;
        if north {
            lat_max = 90.0;
        }
        if south {
            lat_min = -90.0;
        }

        let (centre_lon, lon_range) = if north || south {
            (0.0, 360.0)
        } else {
            shortest_arc(&mut lons)
        };

        Ok(ContentCoverage::from_degrees(
            -centre_lon,
            (lat_max + lat_min) / 2.0,
            lon_range,
            lat_max - lat_min,
        ))
    }

    fn covers_direction(&self, dir: DVec3) -> ViewportResult<bool> {
        let p = self.source.map_3d_to_2d(&SpherePos::from_vec(0, dir))?;
        let (x, y) = (p.x as i32, p.y as i32);
        Ok(self
            .bounds
            .touched()
            .any(|(_, b)| b.face == p.face && b.contains(x, y)))
    }
}

/// Points along the edges of a box plus its centre
fn perimeter(b: &FaceBounds) -> Vec<(i32, i32)> {
    let (x0, y0) = (b.up_left.x, b.up_left.y);
    let (x1, y1) = (b.down_right.x, b.down_right.y);
    let mut points = Vec::with_capacity(4 * EDGE_SAMPLES as usize + 5);
    for k in 0..=EDGE_SAMPLES {
        let x = x0 + (x1 - x0) * k / EDGE_SAMPLES;
        let y = y0 + (y1 - y0) * k / EDGE_SAMPLES;
        points.push((x, y0));
        points.push((x, y1));
        points.push((x0, y));
        points.push((x1, y));
    }
    points.push(((x0 + x1) / 2, (y0 + y1) / 2));
    points
}

/// Centre and length in degrees of the shortest arc holding every longitude
fn shortest_arc(lons: &mut [f64]) -> (f64, f64) {
    if lons.is_empty() {
        return (0.0, 0.0);
    }
    lons.sort_by(|a, b| a.total_cmp(b));

    // The largest gap between neighbours, including the wrap-around gap,
    // is the part of the circle left uncovered.
    let n = lons.len();
    let mut gap = lons[0] + 360.0 - lons[n - 1];
    let mut start = lons[0];
    for i in 1..n {
        let g = lons[i] - lons[i - 1];
        if g > gap {
            gap = g;
            start = lons[i];
        }
    }
    let range = 360.0 - gap;
    (wrap_degrees(start + range / 2.0), range)
}
