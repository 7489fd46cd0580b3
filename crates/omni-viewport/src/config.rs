//! Engine configuration

use crate::error::{ViewportError, ViewportResult};
use omni_core::{GeometryKind, FACE_NUMBER, MAX_LAYOUT_DIM};
use serde::{Deserialize, Serialize};

/// How the selected tiles are consumed downstream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageType {
    StreamStitchOnly,
    #[default]
    MergeAndViewport,
    /// Tiles are merged into a single NAL unit; the budget is never padded
    ParserOneNal,
    ParserForClient,
    ViewportOnly,
}

impl UsageType {
    /// Whether fixed-count selection tops the tile list up to the budget
    pub fn pads_budget(&self) -> bool {
        !matches!(self, UsageType::ParserOneNal)
    }
}

/// Region-wise packing transform of a face inside the packed frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceTransform {
    #[default]
    Identity,
    MirrorHorizontal,
    Rotate180,
    Rotate180Mirror,
    Rotate90Mirror,
    Rotate90,
    Rotate270Mirror,
    Rotate270,
}

impl FaceTransform {
    /// Packing type code as signalled in the bitstream
    pub fn code(&self) -> u8 {
        match self {
            FaceTransform::Identity => 0,
            FaceTransform::MirrorHorizontal => 1,
            FaceTransform::Rotate180 => 2,
            FaceTransform::Rotate180Mirror => 3,
            FaceTransform::Rotate90Mirror => 4,
            FaceTransform::Rotate90 => 5,
            FaceTransform::Rotate270Mirror => 6,
            FaceTransform::Rotate270 => 7,
        }
    }

    /// Quarter turns exchange the packed width and height
    pub fn swaps_axes(&self) -> bool {
        matches!(
            self,
            FaceTransform::Rotate90Mirror
                | FaceTransform::Rotate90
                | FaceTransform::Rotate270Mirror
                | FaceTransform::Rotate270
        )
    }
}

/// One face slot in the packed frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceProperty {
    pub width: i32,
    pub height: i32,
    /// Canonical face id. Cubemaps report PX=0, NX=1, PZ=2, NZ=3, PY=4, NY=5,
    /// which differs from the internal PX, NX, PY, NY, PZ, NZ storage order.
    pub id_face: usize,
    pub transform: FaceTransform,
}

impl FaceProperty {
    pub fn new(id_face: usize, width: i32, height: i32) -> Self {
        Self { width, height, id_face, transform: FaceTransform::Identity }
    }

    /// Size the face occupies in the packed frame
    pub fn packed_size(&self) -> (i32, i32) {
        if self.transform.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Grid of faces making up the packed frame, stored row-major
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceLayout {
    pub rows: usize,
    pub cols: usize,
    pub faces: Vec<FaceProperty>,
}

impl FaceLayout {
    /// A frame carrying one face
    pub fn single(width: i32, height: i32) -> Self {
        Self {
            rows: 1,
            cols: 1,
            faces: vec![FaceProperty::new(0, width, height)],
        }
    }

    /// Cubemap packed three faces across, two down, in canonical id order
    pub fn cubemap_3x2(face_width: i32, face_height: i32) -> Self {
        Self {
            rows: 2,
            cols: 3,
            faces: (0..FACE_NUMBER)
                .map(|id| FaceProperty::new(id, face_width, face_height))
                .collect(),
        }
    }

    pub fn validate(&self) -> ViewportResult<()> {
        if self.rows == 0 || self.cols == 0 || self.rows > MAX_LAYOUT_DIM || self.cols > MAX_LAYOUT_DIM {
            return Err(ViewportError::InvalidConfig(format!(
                "face layout {}x{} outside 1..={}",
                self.rows, self.cols, MAX_LAYOUT_DIM
            )));
        }
        if self.faces.len() != self.rows * self.cols {
            return Err(ViewportError::InvalidConfig(format!(
                "face layout {}x{} lists {} faces",
                self.rows,
                self.cols,
                self.faces.len()
            )));
        }
        if let Some(f) = self.faces.iter().find(|f| f.width <= 0 || f.height <= 0) {
            return Err(ViewportError::InvalidConfig(format!(
                "face {} has size {}x{}",
                f.id_face, f.width, f.height
            )));
        }
        Ok(())
    }

    /// Row and column of the face with canonical id `id_face`
    pub fn locate(&self, id_face: usize) -> Option<(usize, usize)> {
        if self.cols == 0 {
            return None;
        }
        self.faces
            .iter()
            .position(|f| f.id_face == id_face)
            .map(|i| (i / self.cols, i % self.cols))
    }

    /// Pixel origin of a face in the packed frame
    pub fn frame_origin(&self, id_face: usize) -> Option<(i32, i32)> {
        let (row, col) = self.locate(id_face)?;
        let x = self
            .faces
            .get(row * self.cols..row * self.cols + col)?
            .iter()
            .map(|f| f.packed_size().0)
            .sum();
        let y = (0..row)
            .map(|r| self.faces.get(r * self.cols).map(|f| f.packed_size().1))
            .sum::<Option<i32>>()?;
        Some((x, y))
    }
}

/// Everything the engine needs at init
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub source: GeometryKind,
    pub coding: GeometryKind,
    pub layout: FaceLayout,
    /// Tile grid per face
    pub tile_rows: u32,
    pub tile_cols: u32,
    /// Pixel size of the viewport used for the mapping scan
    pub viewport_width: i32,
    pub viewport_height: i32,
    /// View direction and field of view, degrees
    pub yaw: f32,
    pub pitch: f32,
    pub h_fov: f32,
    pub v_fov: f32,
    /// Source frame size; per face for a cubemap source
    pub input_width: i32,
    pub input_height: i32,
    pub usage: UsageType,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            source: GeometryKind::EquiRect,
            coding: GeometryKind::ViewPort,
            layout: FaceLayout::single(3840, 1920),
            tile_rows: 4,
            tile_cols: 8,
            viewport_width: 1024,
            viewport_height: 1024,
            yaw: 0.0,
            pitch: 0.0,
            h_fov: 90.0,
            v_fov: 90.0,
            input_width: 3840,
            input_height: 1920,
            usage: UsageType::default(),
        }
    }
}

impl ViewportConfig {
    /// Cubemap source with `face_size` square faces packed 3x2
    pub fn cubemap(face_size: i32, tile_rows: u32, tile_cols: u32) -> Self {
        Self {
            source: GeometryKind::CubeMap,
            layout: FaceLayout::cubemap_3x2(face_size, face_size),
            tile_rows,
            tile_cols,
            input_width: face_size,
            input_height: face_size,
            ..Self::default()
        }
    }

    pub fn with_viewport(mut self, width: i32, height: i32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn with_view(mut self, yaw: f32, pitch: f32, h_fov: f32, v_fov: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self.h_fov = h_fov;
        self.v_fov = v_fov;
        self
    }

    pub fn with_usage(mut self, usage: UsageType) -> Self {
        self.usage = usage;
        self
    }

    pub fn validate(&self) -> ViewportResult<()> {
        if self.source == GeometryKind::ViewPort {
            return Err(ViewportError::InvalidConfig(
                "a viewport cannot be the source projection".to_string(),
            ));
        }
        if self.coding != GeometryKind::ViewPort {
            return Err(ViewportError::InvalidConfig(format!(
                "coding projection must be a viewport, got {}",
                self.coding.name()
            )));
        }
        if self.tile_rows == 0 || self.tile_cols == 0 {
            return Err(ViewportError::InvalidConfig(format!(
                "tile grid {}x{} is empty",
                self.tile_rows, self.tile_cols
            )));
        }
        if self.input_width / self.tile_cols as i32 <= 0 || self.input_height / self.tile_rows as i32 <= 0 {
            return Err(ViewportError::InvalidConfig(format!(
                "input {}x{} too small for a {}x{} tile grid",
                self.input_width, self.input_height, self.tile_rows, self.tile_cols
            )));
        }
        if self.viewport_width <= 0 || self.viewport_height <= 0 {
            return Err(ViewportError::InvalidConfig(format!(
                "viewport size {}x{} must be positive",
                self.viewport_width, self.viewport_height
            )));
        }

        self.layout.validate()?;
        if let Some(missing) = (0..self.source.face_count()).find(|id| self.layout.locate(*id).is_none()) {
            return Err(ViewportError::InvalidConfig(format!(
                "face layout lacks face {}",
                missing
            )));
        }
        Ok(())
    }
}
