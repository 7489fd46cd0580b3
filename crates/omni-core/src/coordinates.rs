use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A point either on a face's sampling grid `(face, x, y)` or on the unit
/// sphere `(x, y, z)`. When used as a grid coordinate `z` is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpherePos {
    pub face: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SpherePos {
    pub fn new(face: usize, x: f64, y: f64, z: f64) -> Self {
        Self { face, x, y, z }
    }

    /// Sampling-grid coordinate on `face`
    pub fn grid(face: usize, x: f64, y: f64) -> Self {
        Self { face, x, y, z: 0.0 }
    }

    pub fn from_vec(face: usize, v: DVec3) -> Self {
        Self { face, x: v.x, y: v.y, z: v.z }
    }

    pub fn to_vec(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn magnitude(&self) -> f64 {
        self.to_vec().length()
    }

    /// Longitude/latitude in radians of the 3D direction, using the ERP
    /// convention `x = cos(lat)cos(lon)`, `y = sin(lat)`, `z = -cos(lat)sin(lon)`.
    pub fn to_lon_lat(&self) -> (f64, f64) {
        let len = self.magnitude();
        let lon = (-self.z).atan2(self.x);
        let lat = if len > 0.0 { (self.y / len).clamp(-1.0, 1.0).asin() } else { 0.0 };
        (lon, lat)
    }
}
