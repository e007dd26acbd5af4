//! Frustum planes and bounding boxes for visibility tests

use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};

/// Axis-aligned bounding box stored as center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Center of the box
    pub center: Vec3,
    /// Half size along each axis
    pub extents: Vec3,
}

impl Aabb {
    /// Create a box from center and half extents
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Create a box from min and max corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    /// Unit tile footprint: one cell wide and deep, `height` tall, resting on y = 0
    pub fn tile(height: f32) -> Self {
        Self::new(Vec3::new(0.0, height * 0.5, 0.0), Vec3::new(0.5, height * 0.5, 0.5))
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// Conservative world-space box of this local box under an affine transform
    ///
    /// The world half extent on axis `i` is `Σ_j |m[i][j]| * e_j`, which
    /// encloses the transformed box for any rotation and scale.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let center = matrix.transform_point3(&self.center);
        let e = &self.extents;
        let extents = Vec3::new(
            matrix[(0, 0)].abs() * e.x + matrix[(0, 1)].abs() * e.y + matrix[(0, 2)].abs() * e.z,
            matrix[(1, 0)].abs() * e.x + matrix[(1, 1)].abs() * e.y + matrix[(1, 2)].abs() * e.z,
            matrix[(2, 0)].abs() * e.x + matrix[(2, 1)].abs() * e.y + matrix[(2, 2)].abs() * e.z,
        );
        Aabb { center, extents }
    }
}

/// Plane defined by unit normal and signed distance from origin
///
/// A point `p` is inside when `normal · p + distance >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector, pointing to the inside
    pub normal: Vec3,
    /// Distance term of the plane equation
    pub distance: f32,
}

impl Plane {
    /// Create a plane, normalizing the normal
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self::from_coefficients(Vec4::new(normal.x, normal.y, normal.z, distance))
    }

    /// Plane from raw `(a, b, c, d)` coefficients, scaled to a unit normal
    fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON {
            // Degenerate rows never reject anything
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Whether the whole box lies on the outside of the plane
    pub fn culls(&self, aabb: &Aabb) -> bool {
        let n = &self.normal;
        let e = &aabb.extents;
        let radius = (e.x * n.x).abs() + (e.y * n.y).abs() + (e.z * n.z).abs();
        self.normal.dot(&aabb.center) + radius < -self.distance
    }
}

/// Six planes bounding the visible volume
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Frustum that rejects nothing
    pub fn unbounded() -> Self {
        Self { planes: [Plane { normal: Vec3::zeros(), distance: 0.0 }; 6] }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for clip space with depth in `[0, w]`:
    /// the near plane is row 2 alone rather than `row3 + row2`.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { view_projection.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Check if a world-space box is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        !self.planes.iter().any(|plane| plane.culls(aabb))
    }

    /// Check if a point lies inside the frustum
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Camera;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5))
    }

    fn single_plane(plane: Plane) -> Frustum {
        Frustum::new([plane; 6])
    }

    #[test]
    fn test_plane_x_at_five_culls_unit_box() {
        let frustum = single_plane(Plane::new(Vec3::new(1.0, 0.0, 0.0), -5.0));
        assert!(!frustum.intersects_aabb(&unit_box()));
    }

    #[test]
    fn test_plane_with_positive_distance_keeps_unit_box() {
        let frustum = single_plane(Plane::new(Vec3::new(1.0, 0.0, 0.0), 5.0));
        assert!(frustum.intersects_aabb(&unit_box()));
    }

    #[test]
    fn test_unit_extent_box_against_plane_x_at_five() {
        let cube = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));

        // 0 + 1 < 5
        assert!(Plane::new(Vec3::new(1.0, 0.0, 0.0), -5.0).culls(&cube));
        // 0 + 1 >= -5
        assert!(!Plane::new(Vec3::new(1.0, 0.0, 0.0), 5.0).culls(&cube));

        // A box whose face touches the plane is kept
        let touching = Aabb::new(Vec3::new(4.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(!Plane::new(Vec3::new(1.0, 0.0, 0.0), -5.0).culls(&touching));
    }

    #[test]
    fn test_box_straddling_plane_is_kept() {
        let plane = Plane::new(Vec3::new(1.0, 0.0, 0.0), -0.25);
        assert!(!plane.culls(&unit_box()));
    }

    #[test]
    fn test_plane_normal_is_normalized() {
        let plane = Plane::new(Vec3::new(0.0, 3.0, 4.0), 10.0);
        assert_relative_eq!(plane.normal.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(plane.distance, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_transformed_box_under_yaw() {
        let matrix = Mat4::from_translation_yaw(Vec3::new(10.0, 0.0, 0.0), std::f32::consts::FRAC_PI_4);
        let local = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 0.5, 1.0));
        let world = local.transformed(&matrix);

        assert_relative_eq!(world.center, Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-5);
        // A 45° yaw widens the square footprint to its diagonal
        assert_relative_eq!(world.extents.x, std::f32::consts::SQRT_2, epsilon = 1e-5);
        assert_relative_eq!(world.extents.y, 0.5, epsilon = 1e-5);
        assert_relative_eq!(world.extents.z, std::f32::consts::SQRT_2, epsilon = 1e-5);
    }

    #[test]
    fn test_camera_frustum_front_and_behind() {
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_view_projection(&camera.view_projection_matrix());

        let in_front = unit_box();
        let behind = Aabb::new(Vec3::new(0.0, 0.0, 20.0), Vec3::new(0.5, 0.5, 0.5));
        let far_left = Aabb::new(Vec3::new(-100.0, 0.0, 0.0), Vec3::new(0.5, 0.5, 0.5));
        let beyond_far = Aabb::new(Vec3::new(0.0, 0.0, -200.0), Vec3::new(0.5, 0.5, 0.5));

        assert!(frustum.intersects_aabb(&in_front));
        assert!(!frustum.intersects_aabb(&behind));
        assert!(!frustum.intersects_aabb(&far_left));
        assert!(!frustum.intersects_aabb(&beyond_far));
    }

    #[test]
    fn test_camera_frustum_contains_target() {
        let camera = Camera::perspective(Vec3::new(5.0, 8.0, 5.0), 45.0, 16.0 / 9.0, 0.1, 100.0);
        let frustum = Frustum::from_view_projection(&camera.view_projection_matrix());

        assert!(frustum.contains_point(&camera.target));
        assert!(!frustum.contains_point(&camera.position));
    }

    #[test]
    fn test_unbounded_frustum_keeps_everything() {
        let frustum = Frustum::unbounded();
        let far_away = Aabb::new(Vec3::new(1e6, -1e6, 1e6), Vec3::new(0.1, 0.1, 0.1));
        assert!(frustum.intersects_aabb(&far_away));
    }
}
