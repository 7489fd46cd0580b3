//! Selection policies turning the current bounding boxes into ordered tile
//! lists.

use crate::engine::ViewportEngine;
use crate::error::{ViewportError, ViewportResult};
use omni_core::GeometryKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Internal cubemap face index (PX, NX, PY, NY, PZ, NZ) to the canonical id
/// reported to callers (PX, NX, PZ, NZ, PY, NY). The table swaps the y and z
/// face pairs and is its own inverse.
pub const CUBEMAP_FACE_MAP: [usize; 6] = [0, 1, 4, 5, 2, 3];

/// A selected tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTile {
    pub face_id: usize,
    /// Pixel origin on the face
    pub x: i32,
    pub y: i32,
    /// Flat index into the tile grid
    pub idx: usize,
    /// Pixel origin in the packed frame
    pub frame_x: i32,
    pub frame_y: i32,
}

/// Order in which occupied tiles are emitted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionOrder {
    /// Face, row, column ascending
    Forward,
    /// Face ascending, column descending, row descending
    Reverse,
}

impl ViewportEngine {
    /// Reverse order when the region was split across the ERP seam
    pub fn emission_order(&self) -> EmissionOrder {
        if self.bounds.wraps_seam() {
            EmissionOrder::Reverse
        } else {
            EmissionOrder::Forward
        }
    }

    fn canonical_face(&self, face: usize) -> usize {
        match self.config.source {
            GeometryKind::CubeMap => CUBEMAP_FACE_MAP.get(face).copied().unwrap_or(face),
            _ => face,
        }
    }

    fn describe(&self, idx: usize, remap: bool) -> ViewportResult<SelectedTile> {
        let cell = self.grid.cell(idx)?;
        let canonical = self.canonical_face(cell.face);
        let (ox, oy) = self.config.layout.frame_origin(canonical).ok_or_else(|| {
            ViewportError::InvalidConfig(format!("face {} missing from layout", canonical))
        })?;
        Ok(SelectedTile {
            face_id: if remap { canonical } else { cell.face },
            x: cell.x,
            y: cell.y,
            idx,
            frame_x: ox + cell.x,
            frame_y: oy + cell.y,
        })
    }

    /// Occupied tiles in emission order
    fn collect_occupied(&self, remap: bool) -> ViewportResult<Vec<SelectedTile>> {
        let (faces, rows, cols) = (self.grid.faces(), self.grid.rows(), self.grid.cols());
        let order = self.emission_order();
        let mut out = Vec::with_capacity(self.grid.occupied_count());

        for face in 0..faces {
            let walk: Vec<(usize, usize)> = match order {
                EmissionOrder::Forward => (0..rows)
                    .flat_map(|r| (0..cols).map(move |c| (r, c)))
                    .collect(),
                EmissionOrder::Reverse => (0..cols)
                    .rev()
                    .flat_map(|c| (0..rows).rev().map(move |r| (r, c)))
                    .collect(),
            };
            for (row, col) in walk {
                let idx = self.grid.index(face, row, col).ok_or_else(|| {
                    ViewportError::OutOfRange(format!("tile {}/{}/{}", face, row, col))
                })?;
                if self.grid.cells()[idx].occupied {
                    out.push(self.describe(idx, remap)?);
                }
            }
        }
        Ok(out)
    }

    /// Viewport tiles topped up to the tile budget with further tiles in
    /// grid order. Single-NAL usage is never topped up.
    pub fn fixed_num_tiles(&mut self) -> ViewportResult<Vec<SelectedTile>> {
        let raw = self.calc_tiles_in_viewport();
        let budget = self.budget.total as usize;

        if raw > budget {
            warn!(raw, budget, "viewport needs more tiles than the budget allows");
        }
        let additional = if self.config.usage.pads_budget() {
            budget.saturating_sub(raw)
        } else {
            0
        };

        let mut added = 0;
        for cell in self.grid.cells_mut().iter_mut() {
            if added == additional {
                break;
            }
            if !cell.occupied {
                cell.occupied = true;
                added += 1;
            }
        }

        let tiles = self.collect_occupied(false)?;
        debug!(raw, added, selected = tiles.len(), budget, "fixed-count selection");
        Ok(tiles)
    }

    /// Exactly the tiles overlapping the viewport boxes
    pub fn tiles_in_viewport(&mut self) -> ViewportResult<Vec<SelectedTile>> {
        let raw = self.calc_tiles_in_viewport();
        let tiles = self.collect_occupied(true)?;
        debug!(raw, order = ?self.emission_order(), "exact selection");
        Ok(tiles)
    }

    /// Tiles that have a corner inside a viewport box
    pub fn tiles_in_viewport_legacy(&mut self) -> ViewportResult<Vec<SelectedTile>> {
        let marks: Vec<bool> = self
            .grid
            .cells()
            .iter()
            .map(|c| self.is_inside(c.x, c.y, c.width, c.height, c.face))
            .collect();
        for (cell, mark) in self.grid.cells_mut().iter_mut().zip(marks) {
            cell.occupied = mark;
        }

        let tiles = self.collect_occupied(true)?;
        debug!(selected = tiles.len(), "legacy selection");
        Ok(tiles)
    }

    /// Block of exactly `max_tile_num` tiles anchored at the top-left tile
    /// of the main box. The block starts from the init-time budget shape and
    /// grows rows, then columns, until it holds the budget. Columns wrap
    /// around the frame; rows are kept inside it. The grid's occupancy is
    /// replaced by the block. ERP sources only.
    pub fn viewport_tiles(&mut self) -> ViewportResult<Vec<SelectedTile>> {
        if self.config.source != GeometryKind::EquiRect {
            return Err(ViewportError::UnsupportedOperation(format!(
                "contiguous block selection on {} source",
                self.config.source.name()
            )));
        }
        let anchor = *self.bounds.slot(0).ok_or(ViewportError::NoCoverage)?;

        let cols = self.grid.cols();
        let rows = self.grid.rows();
        let limit = self.budget.total as usize;
        let mut block_cols = (self.budget.cols as usize).clamp(1, cols);
        let mut block_rows = (self.budget.rows as usize).clamp(1, rows);
        while block_cols * block_rows < limit {
            if block_rows < rows {
                block_rows += 1;
            } else if block_cols < cols {
                block_cols += 1;
            } else {
                return Err(ViewportError::OutOfRange(format!(
                    "tile budget {} exceeds {}x{} grid",
                    limit, cols, rows
                )));
            }
        }

        let col_start = (anchor.up_left.x.max(0) / self.grid.tile_width()) as usize % cols;
        let row_start = ((anchor.up_left.y.max(0) / self.grid.tile_height()) as usize).min(rows - block_rows);

        let mut block = Vec::with_capacity(limit);
        'block: for row in row_start..row_start + block_rows {
            for step in 0..block_cols {
                if block.len() == limit {
                    break 'block;
                }
                let col = (col_start + step) % cols;
                let idx = self.grid.index(0, row, col).ok_or_else(|| {
                    ViewportError::OutOfRange(format!("tile 0/{}/{}", row, col))
                })?;
                block.push(idx);
            }
        }

        self.grid.clear_occupancy();
        for &idx in &block {
            if let Some(cell) = self.grid.cells_mut().get_mut(idx) {
                cell.occupied = true;
            }
        }

        let tiles = block
            .into_iter()
            .map(|idx| self.describe(idx, false))
            .collect::<ViewportResult<Vec<_>>>()?;
        debug!(col_start, row_start, block_cols, block_rows, selected = tiles.len(), "contiguous block selection");
        Ok(tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UsageType, ViewportConfig};
    use std::collections::HashSet;

    fn erp_engine(yaw: f32, pitch: f32) -> ViewportEngine {
        let mut engine = ViewportEngine::new(ViewportConfig::default().with_viewport(256, 256)).unwrap();
        engine.set_viewport(yaw, pitch).unwrap();
        engine.process().unwrap();
        engine
    }

    fn row_col(t: &SelectedTile) -> (usize, usize) {
        ((t.idx / 8), (t.idx % 8))
    }

    #[test]
    fn test_face_map_is_an_involution() {
        let seen: HashSet<usize> = CUBEMAP_FACE_MAP.iter().copied().collect();
        assert_eq!(seen.len(), 6);
        for face in 0..6 {
            assert!(CUBEMAP_FACE_MAP[face] < 6);
            assert_eq!(CUBEMAP_FACE_MAP[CUBEMAP_FACE_MAP[face]], face);
        }
    }

    #[test]
    fn test_forward_view_block() {
        let mut engine = erp_engine(0.0, 0.0);
        let tiles = engine.tiles_in_viewport().unwrap();
        assert!(!tiles.is_empty());
        assert!(tiles.len() <= engine.max_tile_num() as usize);
        assert_eq!(engine.emission_order(), EmissionOrder::Forward);

        let cells: Vec<(usize, usize)> = tiles.iter().map(row_col).collect();
        for centre in [(1, 3), (1, 4), (2, 3), (2, 4)] {
            assert!(cells.contains(&centre), "missing centre tile {:?}", centre);
        }

        // Contiguous rectangle emitted row-major
        let (r0, c0) = cells[0];
        let (r1, c1) = cells[cells.len() - 1];
        let width = c1 - c0 + 1;
        assert_eq!(cells.len(), (r1 - r0 + 1) * width);
        for (i, &(r, c)) in cells.iter().enumerate() {
            assert_eq!((r, c), (r0 + i / width, c0 + i % width));
        }
    }

    #[test]
    fn test_seam_view_reverses_order() {
        let mut engine = erp_engine(179.0, 0.0);
        assert_eq!(engine.emission_order(), EmissionOrder::Reverse);
        let tiles = engine.tiles_in_viewport().unwrap();
        let cols: Vec<usize> = tiles.iter().map(|t| row_col(t).1).collect();
        assert!(cols.contains(&0));
        assert!(cols.contains(&7));
        // Column descending
        assert!(cols.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_fixed_num_pads_to_budget() {
        let mut engine = erp_engine(0.0, 0.0);
        let budget = engine.max_tile_num() as usize;
        let tiles = engine.fixed_num_tiles().unwrap();
        assert_eq!(tiles.len(), budget);

        let exact: HashSet<usize> = engine.tiles_in_viewport().unwrap().iter().map(|t| t.idx).collect();
        let padded: HashSet<usize> = tiles.iter().map(|t| t.idx).collect();
        assert!(exact.is_subset(&padded));
    }

    #[test]
    fn test_fixed_num_without_padding_for_single_nal() {
        let cfg = ViewportConfig::default()
            .with_viewport(256, 256)
            .with_usage(UsageType::ParserOneNal);
        let mut engine = ViewportEngine::new(cfg).unwrap();
        engine.process().unwrap();
        let raw = engine.tiles_in_viewport().unwrap().len();
        assert_eq!(engine.fixed_num_tiles().unwrap().len(), raw);
    }

    #[test]
    fn test_fixed_num_over_budget_keeps_viewport_tiles() {
        let mut engine = erp_engine(0.0, 0.0);
        engine.set_max_sel_tiles(1).unwrap();
        let tiles = engine.fixed_num_tiles().unwrap();
        assert!(tiles.len() >= 4);
    }

    #[test]
    fn test_legacy_marks_corner_hits() {
        let mut engine = erp_engine(0.0, 0.0);
        let legacy = engine.tiles_in_viewport_legacy().unwrap();
        // Tile (row 2, col 4) has its top-left corner at the frame centre
        assert!(legacy.iter().any(|t| t.idx == 20));
        for t in &legacy {
            let cell = engine.grid().cell(t.idx).unwrap();
            assert!(engine.is_inside(cell.x, cell.y, cell.width, cell.height, cell.face));
        }
        // Far corner of the frame is never picked
        assert!(legacy.iter().all(|t| t.idx != 31));
    }

    #[test]
    fn test_viewport_tiles_block() {
        let mut engine = erp_engine(0.0, 0.0);
        let tiles = engine.viewport_tiles().unwrap();
        assert_eq!(tiles.len(), engine.max_tile_num() as usize);
        let first = row_col(&tiles[0]);
        assert_eq!(first, (1, 3));
    }

    #[test]
    fn test_viewport_tiles_marks_block() {
        let mut engine = erp_engine(0.0, 0.0);
        let tiles = engine.viewport_tiles().unwrap();
        for t in &tiles {
            assert!(engine.grid().cells()[t.idx].occupied, "tile {} not marked", t.idx);
        }
        assert_eq!(engine.grid().occupied_count(), tiles.len());
    }

    #[test]
    fn test_viewport_tiles_follows_budget_override() {
        let mut engine = erp_engine(0.0, 0.0);
        engine.set_max_sel_tiles(12).unwrap();
        let raised = engine.viewport_tiles().unwrap();
        assert_eq!(raised.len(), 12);
        let unique: HashSet<usize> = raised.iter().map(|t| t.idx).collect();
        assert_eq!(unique.len(), 12);

        engine.set_max_sel_tiles(5).unwrap();
        let lowered = engine.viewport_tiles().unwrap();
        assert_eq!(lowered.len(), 5);
        assert_eq!(row_col(&lowered[0]), (1, 3));
        assert_eq!(engine.grid().occupied_count(), 5);

        engine.set_max_sel_tiles(32).unwrap();
        assert_eq!(engine.viewport_tiles().unwrap().len(), 32);
    }

    #[test]
    fn test_viewport_tiles_wraps_columns() {
        let mut engine = erp_engine(179.0, 0.0);
        let tiles = engine.viewport_tiles().unwrap();
        let cols: HashSet<usize> = tiles.iter().map(|t| row_col(t).1).collect();
        assert!(cols.contains(&7));
        assert!(cols.contains(&0));
        assert!(tiles.iter().all(|t| t.idx < 32));
    }

    #[test]
    fn test_viewport_tiles_needs_erp() {
        let mut engine =
            ViewportEngine::new(ViewportConfig::cubemap(480, 2, 2).with_viewport(128, 128)).unwrap();
        engine.process().unwrap();
        assert!(matches!(
            engine.viewport_tiles(),
            Err(ViewportError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_viewport_tiles_without_process() {
        let mut engine = ViewportEngine::new(ViewportConfig::default().with_viewport(128, 128)).unwrap();
        assert_eq!(engine.viewport_tiles(), Err(ViewportError::NoCoverage));
    }

    #[test]
    fn test_cubemap_tiles_report_canonical_faces() {
        let mut engine = ViewportEngine::new(
            ViewportConfig::cubemap(480, 2, 2)
                .with_viewport(128, 128)
                .with_view(0.0, 90.0, 60.0, 60.0),
        )
        .unwrap();
        engine.process().unwrap();
        // Looking straight up only touches PY, internal face 2
        assert_eq!(engine.bounds().num_faces(), 1);
        assert!(engine.bounds().slot(2).is_some());

        let tiles = engine.tiles_in_viewport().unwrap();
        assert_eq!(tiles.len(), 4);
        for t in &tiles {
            assert_eq!(t.face_id, CUBEMAP_FACE_MAP[2]);
            // Canonical face 4 sits at column 1, row 1 of the 3x2 frame
            assert_eq!((t.frame_x - t.x, t.frame_y - t.y), (480, 480));
        }
    }
}
