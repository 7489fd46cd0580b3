use super::{SphereMapping, ViewportSettings};
use crate::constants::EPS;
use crate::coordinates::SpherePos;
use crate::error::{GeometryError, GeometryResult};
use glam::{DMat3, DVec3};

/// Pinhole camera looking out from the sphere centre.
///
/// Only the grid → sphere direction is defined; projecting a direction back
/// onto the image plane is not supported.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewPort {
    width: i32,
    height: i32,
    inv_k: DMat3,
    rot: DMat3,
}

impl ViewPort {
    pub fn new(width: i32, height: i32, settings: &ViewportSettings) -> GeometryResult<Self> {
        let mut vp = Self {
            width,
            height,
            inv_k: DMat3::IDENTITY,
            rot: DMat3::IDENTITY,
        };
        vp.configure(settings)?;
        Ok(vp)
    }

    /// Recompute both matrices for a new view direction and field of view
    pub fn configure(&mut self, settings: &ViewportSettings) -> GeometryResult<()> {
        let inv_k = intrinsics_inverse(self.width, self.height, settings.h_fov, settings.v_fov)?;
        self.inv_k = inv_k;
        self.rot = view_rotation(settings.yaw, settings.pitch);
        Ok(())
    }

    pub fn inv_k(&self) -> &DMat3 {
        &self.inv_k
    }

    pub fn rotation(&self) -> &DMat3 {
        &self.rot
    }
}

/// Camera-to-world rotation for a view at (yaw, pitch) in degrees
pub fn view_rotation(yaw: f32, pitch: f32) -> DMat3 {
    let (st, ct) = (yaw as f64 + 90.0).to_radians().sin_cos();
    let (sp, cp) = (-(pitch as f64)).to_radians().sin_cos();

    DMat3::from_cols(
        DVec3::new(ct, 0.0, -st),
        DVec3::new(st * sp, cp, ct * sp),
        DVec3::new(st * cp, -sp, ct * cp),
    )
}

/// Inverse of the intrinsics `K = [[fx, 0, w/2], [0, -fy, h/2], [0, 0, 1]]`,
/// with the focal lengths derived from the field of view.
pub fn intrinsics_inverse(width: i32, height: i32, h_fov: f32, v_fov: f32) -> GeometryResult<DMat3> {
    for (name, fov) in [("horizontal", h_fov), ("vertical", v_fov)] {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(GeometryError::DegenerateGeometry(format!(
                "{} field of view {} outside (0, 180)",
                name, fov
            )));
        }
    }

    let fx = (width as f64 / 2.0) / ((h_fov as f64).to_radians() * 0.5).tan();
    let fy = (height as f64 / 2.0) / ((v_fov as f64).to_radians() * 0.5).tan();
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;

    let det = fx * -fy;
    if det.abs() < EPS {
        return Err(GeometryError::DegenerateGeometry(format!(
            "intrinsics determinant {} is singular",
            det
        )));
    }

    // Rows: [1/fx, 0, -cx/fx], [0, -1/fy, cy/fy], [0, 0, 1]
    Ok(DMat3::from_cols(
        DVec3::new(1.0 / fx, 0.0, 0.0),
        DVec3::new(0.0, -1.0 / fy, 0.0),
        DVec3::new(-cx / fx, cy / fy, 1.0),
    ))
}

impl SphereMapping for ViewPort {
    fn map_2d_to_3d(&self, pos: &SpherePos) -> GeometryResult<SpherePos> {
        let pixel = DVec3::new(pos.x + 0.5, pos.y + 0.5, 1.0);
        let plane = self.inv_k * pixel;

        // Undo the perspective division onto the unit sphere
        let z1 = 1.0 / (plane.x * plane.x + plane.y * plane.y + 1.0).sqrt();
        let cam = DVec3::new(z1 * plane.x, z1 * plane.y, z1);

        Ok(SpherePos::from_vec(pos.face, self.rot * cam))
    }

    fn map_3d_to_2d(&self, _pos: &SpherePos) -> GeometryResult<SpherePos> {
        Err(GeometryError::UnsupportedOperation(
            "viewport 3D to 2D mapping".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn forward(yaw: f32, pitch: f32) -> DVec3 {
        let vp = ViewPort::new(1024, 1024, &ViewportSettings::new(yaw, pitch, 90.0, 90.0)).unwrap();
        vp.map_2d_to_3d(&SpherePos::grid(0, 511.5, 511.5)).unwrap().to_vec()
    }

    #[test]
    fn test_centre_ray_follows_yaw_and_pitch() {
        let f = forward(0.0, 0.0);
        assert_relative_eq!(f.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(f.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(f.z, 0.0, epsilon = 1e-9);

        // Positive yaw turns towards -z, positive longitude in ERP
        let f = forward(90.0, 0.0);
        assert_relative_eq!(f.z, -1.0, epsilon = 1e-9);

        let f = forward(0.0, 90.0);
        assert_relative_eq!(f.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let r = view_rotation(37.0, -21.0);
        let should_be_identity = r * r.transpose();
        for (c, axis) in [DVec3::X, DVec3::Y, DVec3::Z].iter().enumerate() {
            let col = should_be_identity.col(c);
            assert_relative_eq!(col.x, axis.x, epsilon = 1e-12);
            assert_relative_eq!(col.y, axis.y, epsilon = 1e-12);
            assert_relative_eq!(col.z, axis.z, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_edge_ray_at_half_fov() {
        let vp = ViewPort::new(1024, 1024, &ViewportSettings::new(0.0, 0.0, 90.0, 90.0)).unwrap();
        // Left edge of the image plane sits 45 degrees off axis
        let p = vp.map_2d_to_3d(&SpherePos::grid(0, -0.5, 511.5)).unwrap();
        let (lon, lat) = p.to_lon_lat();
        assert_relative_eq!(lon.to_degrees(), -45.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unit_length() {
        let vp = ViewPort::new(800, 600, &ViewportSettings::new(12.0, 33.0, 100.0, 70.0)).unwrap();
        for &(x, y) in &[(0.0, 0.0), (799.0, 599.0), (400.0, 10.0)] {
            let p = vp.map_2d_to_3d(&SpherePos::grid(0, x, y)).unwrap();
            assert_relative_eq!(p.magnitude(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_degenerate_fov_rejected() {
        for fov in [0.0, 180.0, -5.0] {
            let err = ViewPort::new(1024, 1024, &ViewportSettings::new(0.0, 0.0, fov, 90.0)).unwrap_err();
            assert!(matches!(err, GeometryError::DegenerateGeometry(_)));
        }
    }

    #[test]
    fn test_inverse_mapping_unsupported() {
        let vp = ViewPort::new(64, 64, &ViewportSettings::new(0.0, 0.0, 90.0, 90.0)).unwrap();
        let err = vp.map_3d_to_2d(&SpherePos::new(0, 1.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, GeometryError::UnsupportedOperation(_)));
    }
}
