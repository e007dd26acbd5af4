//! # 3D Camera
//!
//! Look-at perspective camera whose combined view-projection matrix feeds
//! frustum plane extraction.
//!
//! ## Coordinate System
//! Standard right-handed Y-up view space. The clip-space conversion (Y down,
//! depth in `[0, 1]`) is applied as a separate matrix, so the chain is
//! `P × X × V`.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Perspective camera described by a pose and projection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// # Example
    /// ```rust
    /// use belt_engine::foundation::math::Vec3;
    /// use belt_engine::render::Camera;
    ///
    /// let camera = Camera::perspective(Vec3::new(0.0, 20.0, 20.0), 60.0, 16.0 / 9.0, 0.1, 500.0);
    /// assert_eq!(camera.target, Vec3::zeros());
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Update camera target (look-at point)
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        log::trace!("Camera target updated to: {:?}", target);
    }

    /// Place the camera on a circle around `center`, looking at it
    ///
    /// `angle` is in radians, measured from +X towards +Z.
    pub fn orbit(&mut self, center: Vec3, radius: f32, height: f32, angle: f32) {
        let position = center + Vec3::new(radius * angle.cos(), height, radius * angle.sin());
        self.set_position(position);
        self.set_target(center);
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection with depth mapped to `[0, 1]`
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined `P × X × V` matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        let view_matrix = self.view_matrix();
        let coord_transform = Mat4::vulkan_coordinate_transform();
        let projection_matrix = self.projection_matrix();

        projection_matrix * coord_transform * view_matrix
    }

    /// Whether pose or projection differ from `other` by more than `epsilon`
    pub fn differs_from(&self, other: &Camera, epsilon: f32) -> bool {
        let vec_moved = |a: &Vec3, b: &Vec3| (a - b).abs().max() > epsilon;
        let scalar_moved = |a: f32, b: f32| (a - b).abs() > epsilon;

        vec_moved(&self.position, &other.position)
            || vec_moved(&self.target, &other.target)
            || vec_moved(&self.up, &other.up)
            || scalar_moved(self.fov, other.fov)
            || scalar_moved(self.aspect, other.aspect)
            || scalar_moved(self.near, other.near)
            || scalar_moved(self.far, other.far)
    }
}

impl Default for Camera {
    /// Elevated view of a grid centered at the origin
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 30.0, 30.0),
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn to_ndc(camera: &Camera, point: Vec3) -> Vec3 {
        let clip = camera.view_projection_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = Camera::perspective(Vec3::new(3.0, 4.0, 5.0), 60.0, 1.5, 0.1, 100.0);
        let ndc = to_ndc(&camera, camera.target);

        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_depth_range_is_zero_to_one() {
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 1.0, 50.0);

        let near = to_ndc(&camera, Vec3::new(0.0, 0.0, 9.0));
        let far = to_ndc(&camera, Vec3::new(0.0, 0.0, -40.0));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_orbit_keeps_radius_and_target() {
        let mut camera = Camera::default();
        camera.orbit(Vec3::new(1.0, 0.0, 1.0), 10.0, 5.0, 0.3);

        let offset = camera.position - Vec3::new(1.0, 0.0, 1.0);
        assert_relative_eq!(offset.y, 5.0, epsilon = 1e-5);
        assert_relative_eq!(offset.xz().norm(), 10.0, epsilon = 1e-4);
        assert_eq!(camera.target, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_differs_from_respects_epsilon() {
        let camera = Camera::default();
        let mut nudged = camera.clone();
        nudged.position.x += 1e-4;
        assert!(!camera.differs_from(&nudged, 1e-3));

        nudged.fov += 0.01;
        assert!(camera.differs_from(&nudged, 1e-3));
    }
}
