//! The selection engine: owns the source and viewport geometries plus the
//! tile grid, sizes the tile budget once at init and re-runs the mapping
//! scan on every viewport update.

use crate::config::{UsageType, ViewportConfig};
use crate::error::{ViewportError, ViewportResult};
use crate::tile_grid::TileGrid;
use omni_core::{FaceBounds, Geometry, GeometryKind, ScanResult, VideoInfo, ViewportSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Reference view used to size a cubemap budget (looking straight down)
const CUBEMAP_PROBE: (f32, f32) = (45.0, -90.0);

/// Reference view used to size an ERP budget
const ERP_PROBE: (f32, f32) = (0.0, 0.0);

/// Tile budget fixed at init
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBudget {
    /// Widest selection in tile columns
    pub cols: u32,
    /// Tallest selection in tile rows
    pub rows: u32,
    /// Maximum number of tiles a selection may hold
    pub total: u32,
}

/// Touched faces and their bounding boxes after a mapping run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub num_faces: usize,
    pub corners: Vec<FaceBounds>,
}

impl ProcessOutput {
    pub fn from_scan(scan: &ScanResult) -> Self {
        Self {
            num_faces: scan.num_faces(),
            corners: scan.touched().map(|(_, b)| *b).collect(),
        }
    }
}

#[derive(Debug)]
pub struct ViewportEngine {
    pub(crate) config: ViewportConfig,
    pub(crate) source: Geometry,
    pub(crate) coding: Geometry,
    pub(crate) grid: TileGrid,
    pub(crate) bounds: ScanResult,
    pub(crate) budget: TileBudget,
    pub(crate) output_size: (i32, i32),
}

impl ViewportEngine {
    /// Build the geometries and tile grid, then probe a reference view to
    /// size the tile budget. The configured view is restored afterwards.
    pub fn new(config: ViewportConfig) -> ViewportResult<Self> {
        config.validate()?;

        let source = Geometry::create(VideoInfo::for_kind(
            config.source,
            config.input_width,
            config.input_height,
            ViewportSettings::default(),
        ))?;
        let coding = Geometry::create(VideoInfo::viewport(
            config.viewport_width,
            config.viewport_height,
            ViewportSettings::new(config.yaw, config.pitch, config.h_fov, config.v_fov),
        ))?;
        let grid = TileGrid::new(
            source.info().num_faces,
            config.tile_rows as usize,
            config.tile_cols as usize,
            config.input_width,
            config.input_height,
        )?;

        let mut engine = Self {
            config,
            source,
            coding,
            grid,
            bounds: ScanResult::new(),
            budget: TileBudget::default(),
            output_size: (0, 0),
        };
        engine.size_budget()?;

        info!(
            source = engine.config.source.name(),
            tiles = engine.grid.len(),
            max_tiles = engine.budget.total,
            budget_cols = engine.budget.cols,
            budget_rows = engine.budget.rows,
            output_width = engine.output_size.0,
            output_height = engine.output_size.1,
            "viewport engine ready"
        );
        Ok(engine)
    }

    fn size_budget(&mut self) -> ViewportResult<()> {
        let (yaw, pitch) = (self.config.yaw, self.config.pitch);
        let tw = self.grid.tile_width();
        let th = self.grid.tile_height();
        let grid_cols = self.grid.cols() as u32;
        let grid_rows = self.grid.rows() as u32;

        match self.config.source {
            GeometryKind::CubeMap => {
                self.set_viewport(CUBEMAP_PROBE.0, CUBEMAP_PROBE.1)?;
                self.process()?;

                let mut budget = TileBudget::default();
                for (_, b) in self.bounds.touched() {
                    let cols = (div_ceil(b.width(), tw) as u32 + 1).min(grid_cols);
                    let rows = (div_ceil(b.height(), th) as u32 + 1).min(grid_rows);
                    budget.total += cols * rows;
                    budget.cols = budget.cols.max(cols);
                    budget.rows = budget.rows.max(rows);
                }
                self.budget = budget;
            }
            GeometryKind::EquiRect => {
                self.set_viewport(ERP_PROBE.0, ERP_PROBE.1)?;
                self.process()?;

                let mut width = 0;
                let mut height = 0;
                for (_, b) in self.bounds.touched().take(2) {
                    width += b.width();
                    height = height.max(b.height());
                }

                let pad = if self.config.usage == UsageType::ParserOneNal {
                    width = round_to_tiles(width, tw);
                    height = round_to_tiles(height, th);
                    1
                } else {
                    2
                };
                let cols = ((width / tw) as u32 + pad).min(grid_cols);
                let rows = ((height / th) as u32 + pad).min(grid_rows);
                self.budget = TileBudget { cols, rows, total: cols * rows };
            }
            GeometryKind::ViewPort => {
                return Err(ViewportError::InvalidConfig(
                    "a viewport cannot be the source projection".to_string(),
                ))
            }
        }

        self.output_size = (self.budget.cols as i32 * tw, self.budget.rows as i32 * th);
        self.set_viewport(yaw, pitch)?;
        self.bounds = ScanResult::new();
        Ok(())
    }

    /// Re-run the mapping scan for the current view and keep its boxes
    pub fn process(&mut self) -> ViewportResult<ProcessOutput> {
        let scan = self.source.geo_convert(&mut self.coding)?;
        self.bounds = scan.clone();
        debug!(
            yaw = self.config.yaw,
            pitch = self.config.pitch,
            faces = self.bounds.num_faces(),
            "viewport processed"
        );
        Ok(ProcessOutput::from_scan(&self.bounds))
    }

    /// Re-target the view. Takes effect on the next `process`.
    pub fn set_viewport(&mut self, yaw: f32, pitch: f32) -> ViewportResult<()> {
        let settings = ViewportSettings { yaw, pitch, ..self.coding.info().viewport };
        self.coding.set_viewport(settings)?;
        self.config.yaw = yaw;
        self.config.pitch = pitch;
        Ok(())
    }

    /// Override the init-time tile budget
    pub fn set_max_sel_tiles(&mut self, count: u32) -> ViewportResult<()> {
        if count == 0 {
            return Err(ViewportError::InvalidConfig("tile budget must be positive".to_string()));
        }
        if count as usize > self.grid.len() {
            return Err(ViewportError::OutOfRange(format!(
                "tile budget {} exceeds grid of {}",
                count,
                self.grid.len()
            )));
        }
        self.budget.total = count;
        Ok(())
    }

    /// Corner test of a rectangle against every box on `face`: true when
    /// any of its four corners lies inside one of them.
    pub fn is_inside(&self, x: i32, y: i32, width: i32, height: i32, face: usize) -> bool {
        let corners = [(x, y), (x + width, y + height), (x + width, y), (x, y + height)];
        self.bounds
            .touched()
            .filter(|(_, b)| b.face == face)
            .any(|(_, b)| corners.iter().any(|&(cx, cy)| b.contains(cx, cy)))
    }

    /// Mark every tile whose rectangle overlaps a box on its face; returns
    /// how many were marked.
    pub fn calc_tiles_in_viewport(&mut self) -> usize {
        let bounds = &self.bounds;
        let mut count = 0;
        for cell in self.grid.cells_mut() {
            cell.occupied = bounds
                .touched()
                .any(|(_, b)| b.face == cell.face && b.intersects(cell.x, cell.y, cell.width, cell.height));
            if cell.occupied {
                count += 1;
            }
        }
        count
    }

    /// Release the engine and everything it owns
    pub fn destroy(self) {
        debug!(tiles = self.grid.len(), "viewport engine destroyed");
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn bounds(&self) -> &ScanResult {
        &self.bounds
    }

    pub fn budget(&self) -> TileBudget {
        self.budget
    }

    pub fn max_tile_num(&self) -> u32 {
        self.budget.total
    }

    /// Coding output size in pixels derived from the budget
    pub fn output_size(&self) -> (i32, i32) {
        self.output_size
    }

    pub fn num_faces(&self) -> usize {
        self.bounds.num_faces()
    }

    pub fn source(&self) -> &Geometry {
        &self.source
    }
}

fn div_ceil(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

/// Round a pixel extent to the nearest whole number of tiles
fn round_to_tiles(extent: i32, tile: i32) -> i32 {
    ((extent as f32 / tile as f32 + 0.499).floor() as i32) * tile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn erp_engine() -> ViewportEngine {
        ViewportEngine::new(ViewportConfig::default().with_viewport(256, 256)).unwrap()
    }

    #[test]
    fn test_erp_budget() {
        let engine = erp_engine();
        let budget = engine.budget();
        // Probe spans ~958 px both ways over 480 px tiles: 958/480 + 2
        assert_eq!(budget.cols, 3);
        assert_eq!(budget.rows, 3);
        assert_eq!(budget.total, 9);
        assert_eq!(engine.output_size(), (1440, 1440));
        // Probe results are not left behind
        assert_eq!(engine.num_faces(), 0);
    }

    #[test]
    fn test_single_nal_budget_pads_one_tile() {
        let cfg = ViewportConfig::default()
            .with_viewport(256, 256)
            .with_usage(UsageType::ParserOneNal);
        let engine = ViewportEngine::new(cfg).unwrap();
        // 958 rounds to two whole tiles, plus one
        assert_eq!(engine.budget().cols, 3);
        assert_eq!(engine.budget().total, 9);
    }

    #[test]
    fn test_budget_monotonic_in_fov() {
        let mut last = 0;
        for fov in [40.0, 60.0, 90.0, 110.0, 140.0] {
            let cfg = ViewportConfig::default()
                .with_viewport(128, 128)
                .with_view(0.0, 0.0, fov, fov);
            let total = ViewportEngine::new(cfg).unwrap().max_tile_num();
            assert!(total >= last, "fov {} shrank budget {} -> {}", fov, last, total);
            last = total;
        }
    }

    #[test]
    fn test_cubemap_budget_monotonic_in_fov() {
        let small = ViewportEngine::new(
            ViewportConfig::cubemap(480, 3, 3).with_viewport(128, 128).with_view(0.0, 0.0, 60.0, 60.0),
        )
        .unwrap();
        let large = ViewportEngine::new(
            ViewportConfig::cubemap(480, 3, 3).with_viewport(128, 128).with_view(0.0, 0.0, 120.0, 120.0),
        )
        .unwrap();
        assert!(small.max_tile_num() >= 1);
        assert!(large.max_tile_num() >= small.max_tile_num());
    }

    #[test]
    fn test_init_restores_view() {
        let cfg = ViewportConfig::default()
            .with_viewport(128, 128)
            .with_view(100.0, 20.0, 90.0, 90.0);
        let engine = ViewportEngine::new(cfg).unwrap();
        assert_eq!(engine.config().yaw, 100.0);
        assert_eq!(engine.config().pitch, 20.0);
    }

    #[test]
    fn test_degenerate_fov_fails_init() {
        let cfg = ViewportConfig::default().with_view(0.0, 0.0, 180.0, 90.0);
        let err = ViewportEngine::new(cfg).unwrap_err();
        assert!(matches!(err, ViewportError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_cubemap_probe_scenario() {
        let mut engine = ViewportEngine::new(
            ViewportConfig::cubemap(960, 4, 4)
                .with_viewport(256, 256)
                .with_view(CUBEMAP_PROBE.0, CUBEMAP_PROBE.1, 90.0, 90.0),
        )
        .unwrap();
        let out = engine.process().unwrap();
        assert!(out.num_faces >= 1 && out.num_faces <= 6);
        assert_eq!(out.corners.len(), out.num_faces);
        for slot in 0..6 {
            let touched = out.corners.iter().any(|b| b.face == slot);
            assert_eq!(engine.bounds().slot(slot).is_some(), touched);
        }
        assert!(engine.bounds().slot(6).is_none());
    }

    #[test]
    fn test_process_tracks_viewport() {
        let mut engine = erp_engine();
        let ahead = engine.process().unwrap();
        assert_eq!(ahead.num_faces, 1);

        engine.set_viewport(179.0, 0.0).unwrap();
        let seam = engine.process().unwrap();
        assert_eq!(seam.num_faces, 2);
        assert!(engine.bounds().wraps_seam());
    }

    #[test]
    fn test_set_max_sel_tiles() {
        let mut engine = erp_engine();
        engine.set_max_sel_tiles(12).unwrap();
        assert_eq!(engine.max_tile_num(), 12);
        assert!(matches!(engine.set_max_sel_tiles(0), Err(ViewportError::InvalidConfig(_))));
        assert!(matches!(engine.set_max_sel_tiles(33), Err(ViewportError::OutOfRange(_))));
        assert_eq!(engine.max_tile_num(), 12);
    }

    #[test]
    fn test_is_inside_corner_test() {
        let mut engine = erp_engine();
        engine.process().unwrap();
        // Central tile origin lies inside the forward box
        assert!(engine.is_inside(1920, 960, 480, 480, 0));
        // Far-left tile has no corner inside
        assert!(!engine.is_inside(0, 0, 480, 480, 0));
        // Wrong face never matches
        assert!(!engine.is_inside(1920, 960, 480, 480, 3));
    }

    #[test]
    fn test_occupancy_within_bounds() {
        let mut engine = erp_engine();
        for &(yaw, pitch) in &[(0.0, 0.0), (179.0, 0.0), (-60.0, 50.0), (120.0, -70.0)] {
            engine.set_viewport(yaw, pitch).unwrap();
            engine.process().unwrap();
            let marked = engine.calc_tiles_in_viewport();
            assert!(marked > 0);
            assert_eq!(marked, engine.grid().occupied_count());
            for cell in engine.grid().cells().iter().filter(|c| c.occupied) {
                let hit = engine.bounds().touched().any(|(_, b)| {
                    b.face == cell.face && b.intersects(cell.x, cell.y, cell.width, cell.height)
                });
                assert!(hit, "tile at ({}, {}) outside every box", cell.x, cell.y);
            }
        }
    }

    #[test]
    fn test_destroy_consumes() {
        let engine = erp_engine();
        engine.destroy();
    }
}
