//! Coarse tile grid over the source faces

use crate::error::{ViewportError, ViewportResult};
use omni_core::{ERP_HORZ_ANGLE, ERP_HORZ_START, ERP_VERT_ANGLE, ERP_VERT_START};
use serde::{Deserialize, Serialize};

/// One tile of the grid. `x`/`y` are the pixel origin on its face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileCell {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub face: usize,
    pub occupied: bool,
    /// Longitude of the left edge, degrees (ERP layout)
    pub horz_pos: f32,
    /// Latitude of the top edge, degrees (ERP layout)
    pub vert_pos: f32,
}

/// Flat `faces × rows × cols` array of tiles; faces outermost, row-major
/// within a face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    faces: usize,
    rows: usize,
    cols: usize,
    tile_width: i32,
    tile_height: i32,
    cells: Vec<TileCell>,
}

impl TileGrid {
    /// Split each `face_width × face_height` face into `rows × cols` tiles
    pub fn new(faces: usize, rows: usize, cols: usize, face_width: i32, face_height: i32) -> ViewportResult<Self> {
        if faces == 0 || rows == 0 || cols == 0 {
            return Err(ViewportError::InvalidConfig(format!(
                "tile grid {}x{}x{} is empty",
                faces, rows, cols
            )));
        }
        let tile_width = face_width / cols as i32;
        let tile_height = face_height / rows as i32;
        if tile_width <= 0 || tile_height <= 0 {
            return Err(ViewportError::InvalidConfig(format!(
                "tile size {}x{} must be positive",
                tile_width, tile_height
            )));
        }

        let step_horz = ERP_HORZ_ANGLE / cols as f32;
        let step_vert = ERP_VERT_ANGLE / rows as f32;

        let mut cells = Vec::with_capacity(faces * rows * cols);
        for face in 0..faces {
            for row in 0..rows {
                for col in 0..cols {
                    cells.push(TileCell {
                        x: col as i32 * tile_width,
                        y: row as i32 * tile_height,
                        width: tile_width,
                        height: tile_height,
                        face,
                        occupied: false,
                        horz_pos: ERP_HORZ_START + col as f32 * step_horz,
                        vert_pos: ERP_VERT_START - row as f32 * step_vert,
                    });
                }
            }
        }

        Ok(Self { faces, rows, cols, tile_width, tile_height, cells })
    }

    pub fn faces(&self) -> usize {
        self.faces
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn tile_width(&self) -> i32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> i32 {
        self.tile_height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat index of a tile, if inside the grid
    pub fn index(&self, face: usize, row: usize, col: usize) -> Option<usize> {
        if face < self.faces && row < self.rows && col < self.cols {
            Some((face * self.rows + row) * self.cols + col)
        } else {
            None
        }
    }

    /// `(face, row, col)` of a flat index
    pub fn coords(&self, idx: usize) -> Option<(usize, usize, usize)> {
        if idx >= self.cells.len() {
            return None;
        }
        let per_face = self.rows * self.cols;
        Some((idx / per_face, (idx % per_face) / self.cols, idx % self.cols))
    }

    pub fn cell(&self, idx: usize) -> ViewportResult<&TileCell> {
        self.cells.get(idx).ok_or_else(|| {
            ViewportError::OutOfRange(format!("tile {} of {}", idx, self.cells.len()))
        })
    }

    pub fn cells(&self) -> &[TileCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [TileCell] {
        &mut self.cells
    }

    pub fn clear_occupancy(&mut self) {
        for cell in &mut self.cells {
            cell.occupied = false;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.occupied).count()
    }
}
