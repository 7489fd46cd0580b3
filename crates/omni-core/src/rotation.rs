//! Fixed-order 3-axis rotation kernel
//!
//! Rotations are applied about X, then Y, then Z. There is no inverse:
//! callers undo a rotation by re-querying with negated angles in reverse order.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Integer rotation in degrees about the X, Y and Z axes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    pub degrees: [i32; 3],
}

impl Rotation {
    pub const IDENTITY: Self = Self { degrees: [0, 0, 0] };

    pub fn new(rx: i32, ry: i32, rz: i32) -> Self {
        Self { degrees: [rx, ry, rz] }
    }

    pub fn is_identity(&self) -> bool {
        self.degrees == [0, 0, 0]
    }

    pub fn apply(&self, p: DVec3) -> DVec3 {
        rotate_3d(p, self.degrees[0], self.degrees[1], self.degrees[2])
    }
}

#[inline]
fn sin_cos_deg(deg: i32) -> (f64, f64) {
    (deg as f64).to_radians().sin_cos()
}

/// Rotate `p` about X by `rx`, then Y by `ry`, then Z by `rz` degrees.
/// Zero angles are skipped.
pub fn rotate_3d(p: DVec3, rx: i32, ry: i32, rz: i32) -> DVec3 {
    let DVec3 { mut x, mut y, mut z } = p;

    if rx != 0 {
        let (s, c) = sin_cos_deg(rx);
        let t1 = c * y - s * z;
        let t2 = s * y + c * z;
        y = t1;
        z = t2;
    }
    if ry != 0 {
        let (s, c) = sin_cos_deg(ry);
        let t1 = c * x + s * z;
        let t2 = -s * x + c * z;
        x = t1;
        z = t2;
    }
    if rz != 0 {
        let (s, c) = sin_cos_deg(rz);
        let t1 = c * x - s * y;
        let t2 = s * x + c * y;
        x = t1;
        y = t2;
    }

    DVec3::new(x, y, z)
}
