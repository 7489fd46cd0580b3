//! Geometry mapping: scan every destination sample, carry it onto the source
//! projection and record the covered bounding box per source face.
//!
//! For an ERP source the covered area can straddle the ±180° seam. The part
//! of each row that lands past the seam is recorded in slot 1 so that slot 0
//! and slot 1 together describe the region as two boxes.

use crate::constants::FACE_NUMBER;
use crate::coordinates::SpherePos;
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{Geometry, GeometryKind};
use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Slot holding the post-seam part of an ERP region
pub const SEAM_SLOT: usize = 1;

/// Inclusive integer bounding box on one source face
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBounds {
    pub face: usize,
    pub up_left: IVec2,
    pub down_right: IVec2,
}

impl FaceBounds {
    pub fn from_point(face: usize, x: i32, y: i32) -> Self {
        let p = IVec2::new(x, y);
        Self { face, up_left: p, down_right: p }
    }

    pub fn new(face: usize, up_left: IVec2, down_right: IVec2) -> Self {
        Self { face, up_left, down_right }
    }

    pub fn extend(&mut self, x: i32, y: i32) {
        let p = IVec2::new(x, y);
        self.up_left = self.up_left.min(p);
        self.down_right = self.down_right.max(p);
    }

    /// Extent as `down_right - up_left`
    pub fn width(&self) -> i32 {
        self.down_right.x - self.up_left.x
    }

    pub fn height(&self) -> i32 {
        self.down_right.y - self.up_left.y
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.up_left.x && x <= self.down_right.x && y >= self.up_left.y && y <= self.down_right.y
    }

    /// Whether the half-open rectangle `[x, x+w) × [y, y+h)` overlaps the box
    pub fn intersects(&self, x: i32, y: i32, width: i32, height: i32) -> bool {
        x <= self.down_right.x
            && x + width > self.up_left.x
            && y <= self.down_right.y
            && y + height > self.up_left.y
    }
}

/// Per-slot bounding boxes produced by one mapping scan.
///
/// For a cubemap source the slot index is the face index. For an ERP
/// source slot 0 holds the main region and slot 1 the post-seam region.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    slots: [Option<FaceBounds>; FACE_NUMBER],
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, slot: usize) -> Option<&FaceBounds> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn set_slot(&mut self, slot: usize, bounds: Option<FaceBounds>) -> GeometryResult<()> {
        match self.slots.get_mut(slot) {
            Some(s) => {
                *s = bounds;
                Ok(())
            }
            None => Err(GeometryError::InvalidFace { face: slot, kind: "scan" }),
        }
    }

    /// Grow the box in `slot`, creating it on first touch
    pub fn record(&mut self, slot: usize, face: usize, x: i32, y: i32) -> GeometryResult<()> {
        match self.slots.get_mut(slot) {
            Some(Some(b)) => {
                b.extend(x, y);
                Ok(())
            }
            Some(s) => {
                *s = Some(FaceBounds::from_point(face, x, y));
                Ok(())
            }
            None => Err(GeometryError::InvalidFace { face: slot, kind: "scan" }),
        }
    }

    /// Populated slots with their indices
    pub fn touched(&self) -> impl Iterator<Item = (usize, &FaceBounds)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|b| (i, b)))
    }

    pub fn num_faces(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.num_faces() == 0
    }

    /// Whether the region was split across the ERP seam
    pub fn wraps_seam(&self) -> bool {
        self.slot(SEAM_SLOT).map_or(false, |b| b.face != SEAM_SLOT)
    }
}

impl Geometry {
    /// Scan this geometry's samples (plus margins when output padding is
    /// on), map each onto `src` and collect the bounding boxes.
    pub fn geometry_mapping(&self, src: &Geometry) -> GeometryResult<ScanResult> {
        let started = Instant::now();
        let mut scan = ScanResult::new();

        let seam_aware = src.kind() == GeometryKind::EquiRect;
        let src_width = src.info().face_width;
        let half_width = src_width / 2;
        let (mx, my) = if self.output_padding { (self.margin_x, self.margin_y) } else { (0, 0) };
        let width = self.info.face_width;
        let height = self.info.face_height;

        for face in 0..self.info.num_faces {
            for j in -my..height + my {
                let mut prev: Option<(usize, i32, i32)> = None;
                let mut crossed = false;

                for i in -mx..width + mx {
                    let on_sphere = self.map_2d_to_3d(&SpherePos::grid(face, i as f64, j as f64))?;
                    let rotated = self.info.rotation.apply(on_sphere.to_vec());
                    let mapped = src.map_3d_to_2d(&SpherePos::from_vec(on_sphere.face, rotated))?;

                    let x = mapped.x as i32;
                    let y = mapped.y as i32;

                    // A backwards jump of more than half the frame inside a
                    // row means the scan stepped over the ±180° meridian.
                    // Both halves are pinned to the frame edge on that row.
                    if seam_aware && !crossed {
                        if let Some((pface, px, py)) = prev {
                            if px - x > half_width {
                                crossed = true;
                                scan.record(pface, pface, src_width - 1, py)?;
                                scan.record(SEAM_SLOT, mapped.face, 0, y)?;
                            }
                        }
                    }
                    prev = Some((mapped.face, x, y));

                    let slot = if crossed { SEAM_SLOT } else { mapped.face };
                    scan.record(slot, mapped.face, x, y)?;
                }
            }
        }

        debug!(
            dst = self.kind().name(),
            src = src.kind().name(),
            faces = scan.num_faces(),
            seam = scan.wraps_seam(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "geometry mapping done"
        );
        Ok(scan)
    }

    /// Compute the mapping from this source into `dst` unless `dst` already
    /// holds a valid one, and return it.
    pub fn geo_convert<'a>(&self, dst: &'a mut Geometry) -> GeometryResult<&'a ScanResult> {
        if dst.mapping.is_none() {
            let scan = dst.geometry_mapping(self)?;
            dst.mapping = Some(scan);
        }
        dst.mapping.as_ref().ok_or(GeometryError::MappingInvalid)
    }
}
