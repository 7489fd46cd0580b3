//! Look-up-table region selection for ERP sources: instead of scanning the
//! viewport, centre a fixed pixel window on the tile that holds the view
//! direction.

use crate::engine::{ProcessOutput, ViewportEngine};
use crate::error::{ViewportError, ViewportResult};
use glam::IVec2;
use omni_core::{FaceBounds, GeometryKind, ScanResult, ERP_HORZ_ANGLE, ERP_VERT_ANGLE, SEAM_SLOT};
use std::time::Instant;
use tracing::debug;

impl ViewportEngine {
    /// Index of the tile whose angular span holds the current yaw/pitch.
    /// Falls back to the last tile when none matches.
    fn centre_tile(&self) -> usize {
        let step_horz = ERP_HORZ_ANGLE / self.grid.cols() as f32;
        let step_vert = ERP_VERT_ANGLE / self.grid.rows() as f32;
        let (yaw, pitch) = (self.config.yaw, self.config.pitch);

        self.grid
            .cells()
            .iter()
            .position(|c| {
                yaw >= c.horz_pos
                    && yaw <= c.horz_pos + step_horz
                    && pitch <= c.vert_pos
                    && pitch >= c.vert_pos - step_vert
            })
            .unwrap_or(self.grid.len() - 1)
    }

    /// Replace the bounding boxes with a `dest_width × dest_height` window
    /// centred on the tile under the view direction. The window is clamped
    /// at the poles (one running over a pole by more than a tile widens to
    /// the full frame) and split across the horizontal seam into slots 0
    /// and 1.
    pub fn select_region(&mut self, dest_width: i32, dest_height: i32) -> ViewportResult<ProcessOutput> {
        if self.config.source != GeometryKind::EquiRect {
            return Err(ViewportError::UnsupportedOperation(format!(
                "region selection on {} source",
                self.config.source.name()
            )));
        }
        if dest_width <= 0 || dest_height <= 0 {
            return Err(ViewportError::InvalidConfig(format!(
                "region {}x{} must be positive",
                dest_width, dest_height
            )));
        }
        let started = Instant::now();

        let width = self.config.input_width;
        let height = self.config.input_height;
        let tile = *self.grid.cell(self.centre_tile())?;

        let half_horz = (dest_width - tile.width).max(0) >> 1;
        let half_vert = (dest_height - tile.height).max(0) >> 1;
        let mut left = tile.x - half_horz;
        let mut right = tile.x + tile.width + half_horz - 1;
        let mut top = tile.y - half_vert;
        let mut bottom = tile.y + tile.height + half_vert - 1;

        let mut full_width = dest_width >= width;
        if top < -tile.height {
            full_width = true;
        }
        if bottom >= height + tile.height {
            full_width = true;
        }
        top = top.max(0);
        bottom = bottom.min(height - 1);

        let mut scan = ScanResult::new();
        if full_width {
            left = 0;
            right = width - 1;
        }
        let main = if left < 0 {
            scan.set_slot(
                SEAM_SLOT,
                Some(FaceBounds::new(0, IVec2::new(0, top), IVec2::new(right, bottom))),
            )?;
            FaceBounds::new(0, IVec2::new(width + left, top), IVec2::new(width - 1, bottom))
        } else if right >= width {
            scan.set_slot(
                SEAM_SLOT,
                Some(FaceBounds::new(0, IVec2::new(0, top), IVec2::new(right - width, bottom))),
            )?;
            FaceBounds::new(0, IVec2::new(left, top), IVec2::new(width - 1, bottom))
        } else {
            FaceBounds::new(0, IVec2::new(left, top), IVec2::new(right, bottom))
        };
        scan.set_slot(0, Some(main))?;

        self.bounds = scan;
        debug!(
            tile = tile.x / tile.width.max(1),
            faces = self.bounds.num_faces(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "region selected"
        );
        Ok(ProcessOutput::from_scan(&self.bounds))
    }
}
