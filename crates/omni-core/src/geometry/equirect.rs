use super::SphereMapping;
use crate::constants::EPS;
use crate::coordinates::SpherePos;
use crate::error::GeometryResult;
use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Equirectangular projection: longitude along x from -180° at the left
/// edge, latitude along y from +90° at the top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquiRect {
    width: i32,
    height: i32,
}

impl EquiRect {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Fold a pixel-centre coordinate that fell outside the frame back
    /// into it. Horizontal overflow wraps; vertical overflow crosses the
    /// pole, which mirrors v and shifts u by half a turn.
    fn fold(&self, mut u: f64, mut v: f64) -> (f64, f64) {
        let w = self.width as f64;
        let h = self.height as f64;
        let half = (self.width >> 1) as f64;

        if (u < 0.0 || u >= w) && (v >= 0.0 && v < h) {
            u = if u < 0.0 { w + u } else { u - w };
        } else if v < 0.0 {
            v = -v;
            u += half;
            if u >= w {
                u -= w;
            }
        } else if v >= h {
            v = 2.0 * h - v;
            u += half;
            if u >= w {
                u -= w;
            }
        }
        (u, v)
    }
}

impl SphereMapping for EquiRect {
    fn map_2d_to_3d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        let (u, v) = self.fold(pos.x + 0.5, pos.y + 0.5);

        let yaw = u * TAU / self.width as f64 - PI;
        let pitch = FRAC_PI_2 - v * PI / self.height as f64;

        let dir = DVec3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            -(pitch.cos() * yaw.sin()),
        );
        Ok(SpherePos::from_vec(pos.face, dir))
    }

    fn map_3d_to_2d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        let x = (PI - pos.z.atan2(pos.x)) * self.width as f64 / TAU - 0.5;

        let len = pos.magnitude();
        let polar = if len < EPS { 0.5 } else { (pos.y / len).clamp(-1.0, 1.0).acos() / PI };
        let y = polar * self.height as f64 - 0.5;

        Ok(SpherePos::new(0, x, y, 0.0))
    }
}
