//! Projection geometries: the sampling grid ⇄ unit sphere mapping for each
//! supported projection, behind a single factory-built `Geometry`.

mod cubemap;
mod equirect;
mod viewport;

pub use cubemap::CubeMap;
pub use equirect::EquiRect;
pub use viewport::ViewPort;

use crate::constants::PAD_MAX;
use crate::coordinates::SpherePos;
use crate::error::{GeometryError, GeometryResult};
use crate::mapping::ScanResult;
use crate::rotation::Rotation;
use serde::{Deserialize, Serialize};

/// Projection kind of a geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    EquiRect,
    CubeMap,
    ViewPort,
}

impl GeometryKind {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::EquiRect => "equirect",
            GeometryKind::CubeMap => "cubemap",
            GeometryKind::ViewPort => "viewport",
        }
    }

    /// Number of faces this projection lays out
    pub fn face_count(&self) -> usize {
        match self {
            GeometryKind::CubeMap => 6,
            GeometryKind::EquiRect | GeometryKind::ViewPort => 1,
        }
    }
}

/// Pinhole view parameters, all in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    pub h_fov: f32,
    pub v_fov: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl ViewportSettings {
    pub fn new(yaw: f32, pitch: f32, h_fov: f32, v_fov: f32) -> Self {
        Self { h_fov, v_fov, yaw, pitch }
    }
}

/// Per-geometry configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub kind: GeometryKind,
    pub rotation: Rotation,
    pub face_width: i32,
    pub face_height: i32,
    pub num_faces: usize,
    /// Only meaningful for `GeometryKind::ViewPort`
    pub viewport: ViewportSettings,
}

impl VideoInfo {
    pub fn equirect(width: i32, height: i32) -> Self {
        Self {
            kind: GeometryKind::EquiRect,
            rotation: Rotation::IDENTITY,
            face_width: width,
            face_height: height,
            num_faces: 1,
            viewport: ViewportSettings::default(),
        }
    }

    pub fn cubemap(face_width: i32, face_height: i32) -> Self {
        Self {
            kind: GeometryKind::CubeMap,
            rotation: Rotation::IDENTITY,
            face_width,
            face_height,
            num_faces: 6,
            viewport: ViewportSettings::default(),
        }
    }

    pub fn viewport(width: i32, height: i32, settings: ViewportSettings) -> Self {
        Self {
            kind: GeometryKind::ViewPort,
            rotation: Rotation::IDENTITY,
            face_width: width,
            face_height: height,
            num_faces: 1,
            viewport: settings,
        }
    }

    /// Build the info for `kind` with the given per-face size
    pub fn for_kind(kind: GeometryKind, face_width: i32, face_height: i32, settings: ViewportSettings) -> Self {
        match kind {
            GeometryKind::EquiRect => Self::equirect(face_width, face_height),
            GeometryKind::CubeMap => Self::cubemap(face_width, face_height),
            GeometryKind::ViewPort => Self::viewport(face_width, face_height, settings),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Bidirectional mapping between a face's sampling grid and the unit sphere.
///
/// `map_2d_to_3d` takes a grid coordinate and applies the pixel-centre
/// (+0.5) convention itself. `map_3d_to_2d` returns a coordinate in
/// `[0, width) × [0, height)` of the face it lands on.
pub trait SphereMapping {
    fn map_2d_to_3d(&self, pos: &SpherePos) -> GeometryResult<SpherePos>;
    fn map_3d_to_2d(&self, pos: &SpherePos) -> GeometryResult<SpherePos>;
}

/// Projection-specific state
#[derive(Clone, Debug)]
pub enum Projection {
    EquiRect(EquiRect),
    CubeMap(CubeMap),
    ViewPort(ViewPort),
}

impl SphereMapping for Projection {
    fn map_2d_to_3d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        match self {
            Projection::EquiRect(p) => p.map_2d_to_3d(pos),
            Projection::CubeMap(p) => p.map_2d_to_3d(pos),
            Projection::ViewPort(p) => p.map_2d_to_3d(pos),
        }
    }

    fn map_3d_to_2d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        match self {
            Projection::EquiRect(p) => p.map_3d_to_2d(pos),
            Projection::CubeMap(p) => p.map_3d_to_2d(pos),
            Projection::ViewPort(p) => p.map_3d_to_2d(pos),
        }
    }
}

/// A projection instance with the state shared by every variant: its
/// configuration, scan margins and the cached result of the last mapping.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub(crate) info: VideoInfo,
    pub(crate) margin_x: i32,
    pub(crate) margin_y: i32,
    pub(crate) output_padding: bool,
    pub(crate) projection: Projection,
    pub(crate) mapping: Option<ScanResult>,
}

impl Geometry {
    /// Factory: build the variant matching `info.kind`
    pub fn create(info: VideoInfo) -> GeometryResult<Self> {
        if info.face_width <= 0 || info.face_height <= 0 {
            return Err(GeometryError::InvalidConfig(format!(
                "face size {}x{} must be positive",
                info.face_width, info.face_height
            )));
        }
        if info.num_faces != info.kind.face_count() {
            return Err(GeometryError::InvalidConfig(format!(
                "{} geometry needs {} faces, got {}",
                info.kind.name(),
                info.kind.face_count(),
                info.num_faces
            )));
        }

        let projection = match info.kind {
            GeometryKind::EquiRect => {
                Projection::EquiRect(EquiRect::new(info.face_width, info.face_height))
            }
            GeometryKind::CubeMap => {
                Projection::CubeMap(CubeMap::new(info.face_width, info.face_height))
            }
            GeometryKind::ViewPort => Projection::ViewPort(ViewPort::new(
                info.face_width,
                info.face_height,
                &info.viewport,
            )?),
        };

        Ok(Self {
            info,
            margin_x: PAD_MAX,
            margin_y: PAD_MAX,
            output_padding: false,
            projection,
            mapping: None,
        })
    }

    pub fn kind(&self) -> GeometryKind {
        self.info.kind
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn margins(&self) -> (i32, i32) {
        (self.margin_x, self.margin_y)
    }

    /// Include margin samples outside the face in the mapping scan
    pub fn set_output_padding(&mut self, padding: bool) {
        if self.output_padding != padding {
            self.output_padding = padding;
            self.mapping = None;
        }
    }

    pub fn output_padding(&self) -> bool {
        self.output_padding
    }

    pub fn inside_face(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.info.face_width && y >= 0 && y < self.info.face_height
    }

    /// Re-target a viewport geometry. Invalidates the cached mapping.
    pub fn set_viewport(&mut self, settings: ViewportSettings) -> GeometryResult<()> {
        match &mut self.projection {
            Projection::ViewPort(vp) => {
                vp.configure(&settings)?;
                self.info.viewport = settings;
                self.mapping = None;
                Ok(())
            }
            _ => Err(GeometryError::UnsupportedOperation(format!(
                "set_viewport on {} geometry",
                self.info.kind.name()
            ))),
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    /// Force the next `geo_convert` into this geometry to rescan
    pub fn invalidate_mapping(&mut self) {
        self.mapping = None;
    }

    /// Result of the last mapping scan into this geometry, if still valid
    pub fn mapping(&self) -> Option<&ScanResult> {
        self.mapping.as_ref()
    }

    pub fn map_2d_to_3d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        self.projection.map_2d_to_3d(pos)
    }

    pub fn map_3d_to_2d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        self.projection.map_3d_to_2d(pos)
    }
}
