use super::SphereMapping;
use crate::constants::{EPS, FACE_NUMBER};
use crate::coordinates::SpherePos;
use crate::error::{GeometryError, GeometryResult};
use glam::DVec3;

/// Cube faces in internal storage order. Callers of the selection engine see
/// the y and z pairs swapped.
pub const FACE_NAMES: [&str; FACE_NUMBER] = ["PX", "NX", "PY", "NY", "PZ", "NZ"];

/// Six-face cubemap. Faces are stored PX=0, NX=1, PY=2, NY=3, PZ=4, NZ=5.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeMap {
    width: i32,
    height: i32,
}

impl CubeMap {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl SphereMapping for CubeMap {
    fn map_2d_to_3d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        let u = pos.x + 0.5;
        let v = pos.y + 0.5;
        let pu = 2.0 * u / self.width as f64 - 1.0;
        let pv = 2.0 * v / self.height as f64 - 1.0;

        let on_cube = match pos.face {
            0 => DVec3::new(1.0, -pv, -pu),
            1 => DVec3::new(-1.0, -pv, pu),
            2 => DVec3::new(pu, 1.0, pv),
            3 => DVec3::new(pu, -1.0, -pv),
            4 => DVec3::new(pu, -pv, 1.0),
            5 => DVec3::new(-pu, -pv, -1.0),
            face => return Err(GeometryError::InvalidFace { face, kind: "cubemap" }),
        };

        Ok(SpherePos::from_vec(pos.face, on_cube.normalize()))
    }

    fn map_3d_to_2d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        let (ax, ay, az) = (pos.x.abs(), pos.y.abs(), pos.z.abs());
        if ax.max(ay).max(az) < EPS {
            return Err(GeometryError::DegenerateGeometry(
                "zero-length direction has no cube face".to_string(),
            ));
        }

        // Dominant axis picks the face; ties favour x, then y
        let (face, pu, pv) = if ax >= ay && ax >= az {
            if pos.x > 0.0 {
                (0, -pos.z / ax, -pos.y / ax)
            } else {
                (1, pos.z / ax, -pos.y / ax)
            }
        } else if ay >= ax && ay >= az {
            if pos.y > 0.0 {
                (2, pos.x / ay, pos.z / ay)
            } else {
                (3, pos.x / ay, -pos.z / ay)
            }
        } else if pos.z > 0.0 {
            (4, pos.x / az, -pos.y / az)
        } else {
            (5, -pos.x / az, -pos.y / az)
        };

        let x = (pu + 1.0) * (self.width >> 1) as f64 - 0.5;
        let y = (pv + 1.0) * (self.height >> 1) as f64 - 0.5;
        Ok(SpherePos::new(face, x, y, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube() -> CubeMap {
        CubeMap::new(960, 960)
    }

    #[test]
    fn test_face_centres() {
        let expected = [
            DVec3::X,
            DVec3::NEG_X,
            DVec3::Y,
            DVec3::NEG_Y,
            DVec3::Z,
            DVec3::NEG_Z,
        ];
        let g = cube();
        for (face, dir) in expected.iter().enumerate() {
            let p = g.map_2d_to_3d(&SpherePos::grid(face, 479.5, 479.5)).unwrap();
            assert_relative_eq!(p.x, dir.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, dir.y, epsilon = 1e-9);
            assert_relative_eq!(p.z, dir.z, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_round_trip_every_face() {
        let g = cube();
        for face in 0..FACE_NUMBER {
            for &(x, y) in &[(10.0, 20.0), (479.0, 479.0), (900.0, 300.0)] {
                let p3 = g.map_2d_to_3d(&SpherePos::grid(face, x, y)).unwrap();
                let p2 = g.map_3d_to_2d(&p3).unwrap();
                assert_eq!(p2.face, face, "{} drifted", FACE_NAMES[face]);
                assert_relative_eq!(p2.x, x, epsilon = 1e-6);
                assert_relative_eq!(p2.y, y, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_unit_length() {
        let g = cube();
        let p = g.map_2d_to_3d(&SpherePos::grid(3, 0.0, 959.0)).unwrap();
        assert_relative_eq!(p.magnitude(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_face() {
        let err = cube().map_2d_to_3d(&SpherePos::grid(6, 0.0, 0.0)).unwrap_err();
        assert_eq!(err, GeometryError::InvalidFace { face: 6, kind: "cubemap" });
    }

    #[test]
    fn test_tie_breaks_towards_x() {
        let p = cube().map_3d_to_2d(&SpherePos::new(0, 1.0, 1.0, 1.0)).unwrap();
        assert_eq!(p.face, 0);
        let p = cube().map_3d_to_2d(&SpherePos::new(0, 0.0, -1.0, 1.0)).unwrap();
        assert_eq!(p.face, 3);
    }

    #[test]
    fn test_zero_vector_rejected() {
        assert!(cube().map_3d_to_2d(&SpherePos::default()).is_err());
    }
}
