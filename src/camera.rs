use glam::{Mat4, Vec3};

/// A perspective camera for 3D scenes.
///
/// The projection matrix is cached: after changing `aspect` (or any other
/// frustum parameter) call [`update_projection`](Self::update_projection) to
/// recompute it. The resize handler is the only place that needs to.
#[derive(Clone, Copy, Debug)]
pub struct PerspectiveCamera {
    /// World-space position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Up reference for the view matrix.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height of the output.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    /// Create a camera with the given vertical field of view (degrees) and
    /// aspect ratio, at the origin looking down -Z.
    pub fn new(fov_degrees: f32, aspect: f32) -> Self {
        let fov_y = fov_degrees.to_radians();
        let near = 0.1;
        let far = 2000.0;
        Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_y,
            aspect,
            near,
            far,
            projection: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }

    /// Set the camera position.
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Aim the camera at a world-space point.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Store a new aspect ratio. Call [`update_projection`](Self::update_projection)
    /// afterwards to rebuild the cached matrix.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Recompute the cached projection matrix from the current parameters.
    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Normalized direction from the camera toward its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn mat_approx_eq(a: Mat4, b: Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < EPSILON)
    }

    #[test]
    fn set_aspect_then_update_rebuilds_projection() {
        let mut cam = PerspectiveCamera::new(75.0, 16.0 / 9.0);
        let before = cam.projection_matrix();

        cam.set_aspect(800.0 / 600.0);
        // Projection is cached until explicitly updated.
        assert!(mat_approx_eq(cam.projection_matrix(), before));

        cam.update_projection();
        let expected = Mat4::perspective_rh(75f32.to_radians(), 800.0 / 600.0, cam.near, cam.far);
        assert!(mat_approx_eq(cam.projection_matrix(), expected));
    }

    #[test]
    fn repeated_resize_is_idempotent() {
        let mut cam = PerspectiveCamera::new(75.0, 1.0);
        cam.set_aspect(800.0 / 600.0);
        cam.update_projection();
        let once = cam.projection_matrix();

        cam.set_aspect(800.0 / 600.0);
        cam.update_projection();
        assert!(mat_approx_eq(cam.projection_matrix(), once));
        assert_eq!(cam.aspect, 800.0 / 600.0);
    }

    #[test]
    fn view_matrix_moves_camera_to_origin() {
        let cam = PerspectiveCamera::new(75.0, 1.0)
            .at(Vec3::new(0.0, 0.0, 3.0))
            .looking_at(Vec3::ZERO);
        let eye = cam.view_matrix().transform_point3(cam.position);
        assert!(eye.length() < EPSILON);
    }

    #[test]
    fn forward_points_at_target() {
        let cam = PerspectiveCamera::new(75.0, 1.0)
            .at(Vec3::new(0.0, 0.0, 3.0))
            .looking_at(Vec3::ZERO);
        assert!((cam.forward() - Vec3::NEG_Z).length() < EPSILON);
    }
}
