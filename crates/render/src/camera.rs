//! Fixed viewer camera.
//!
//! Left-handed look-at from a fixed eye position with a perspective
//! projection; the matrices feed straight into the transform block. The
//! aspect ratio follows the presentation surface through the resize path.

use glam::{Mat4, Vec3};

/// Left-handed look-at camera with a perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width/height ratio.
    pub aspect: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
}

impl Camera {
    /// Creates a camera with the viewer defaults: eye at (0, 0, -2)
    /// looking at the origin, Y up.
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -2.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    /// World-to-view matrix.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye, self.target, self.up)
    }

    /// View-to-clip matrix.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Updates the aspect ratio after a surface resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_view_maps_eye_to_origin() {
        let camera = Camera::new(45.0, 4.0 / 3.0, 0.1, 100.0);
        let transformed = camera.view() * Vec4::new(0.0, 0.0, -2.0, 1.0);
        assert!(transformed.truncate().length() < 1e-5);
    }

    #[test]
    fn test_projection_is_finite() {
        let camera = Camera::new(45.0, 4.0 / 3.0, 0.1, 100.0);
        let projection = camera.projection();
        assert!(projection.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_set_aspect() {
        let mut camera = Camera::new(45.0, 1.0, 0.1, 100.0);
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
