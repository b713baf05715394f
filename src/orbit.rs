use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::PerspectiveCamera;
use crate::input::Input;

/// A camera controller that orbits around a target point, with optional
/// motion damping.
///
/// Drag with the left mouse button to rotate, scroll to zoom. With damping
/// enabled, drag input feeds an angular velocity that decays a little each
/// frame, so the camera coasts to a stop instead of halting with the pointer.
///
/// # Example
/// ```ignore
/// let mut controls = OrbitControls::new(&camera);
/// controls.enable_damping = true;
///
/// // In the frame loop:
/// controls.update(&mut camera, frame.input, frame.dt);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Whether drag input coasts with inertia.
    pub enable_damping: bool,
    /// Fraction of the pending rotation applied per frame while damping.
    pub damping_factor: f32,
    /// Radians of rotation per pixel of drag.
    pub rotate_speed: f32,
    /// Distance change per scroll line.
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    distance: f32,
    azimuth: f32,
    elevation: f32,
    // Rotation still owed to the camera; drained instantly without damping,
    // geometrically with it.
    pending_azimuth: f32,
    pending_elevation: f32,
}

/// Keep elevation away from the poles so the view never flips.
const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

impl OrbitControls {
    /// Create controls whose initial orbit state matches the camera's
    /// current position around its target.
    pub fn new(camera: &PerspectiveCamera) -> Self {
        let offset = camera.position - camera.target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            target: camera.target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.5,
            min_distance: 0.5,
            max_distance: 1500.0,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            pending_azimuth: 0.0,
            pending_elevation: 0.0,
        }
    }

    /// Current distance from the target.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Rotation (radians) queued but not yet applied to the camera.
    pub fn pending_rotation(&self) -> (f32, f32) {
        (self.pending_azimuth, self.pending_elevation)
    }

    /// Advance the controls by one frame: fold in new input, drain the
    /// damping state, and write the resulting position into the camera.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, input: &Input, _dt: f32) {
        if input.button_down(MouseButton::Left) {
            let delta = input.cursor_delta();
            self.pending_azimuth -= delta.x * self.rotate_speed;
            self.pending_elevation += delta.y * self.rotate_speed;
        }

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            self.distance = (self.distance - scroll * self.zoom_speed)
                .clamp(self.min_distance, self.max_distance);
        }

        if self.enable_damping {
            self.azimuth += self.pending_azimuth * self.damping_factor;
            self.elevation += self.pending_elevation * self.damping_factor;
            self.pending_azimuth *= 1.0 - self.damping_factor;
            self.pending_elevation *= 1.0 - self.damping_factor;
        } else {
            self.azimuth += self.pending_azimuth;
            self.elevation += self.pending_elevation;
            self.pending_azimuth = 0.0;
            self.pending_elevation = 0.0;
        }
        self.elevation = self.elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);

        camera.position = self.target + self.offset();
        camera.target = self.target;
    }

    /// Spherical-to-Cartesian offset from the target.
    fn offset(&self) -> Vec3 {
        Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn camera_at_z3() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0)
            .at(Vec3::new(0.0, 0.0, 3.0))
            .looking_at(Vec3::ZERO)
    }

    #[test]
    fn initial_state_matches_camera_placement() {
        let camera = camera_at_z3();
        let controls = OrbitControls::new(&camera);
        assert!((controls.distance() - 3.0).abs() < EPSILON);

        // An idle update must not move the camera.
        let mut camera = camera;
        let mut controls = controls;
        controls.update(&mut camera, &Input::new(), 1.0 / 60.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, 3.0)).length() < EPSILON);
    }

    #[test]
    fn camera_stays_on_the_orbit_sphere() {
        let mut camera = camera_at_z3();
        let mut controls = OrbitControls::new(&camera);
        controls.pending_azimuth = 1.3;
        controls.pending_elevation = 0.4;

        for _ in 0..10 {
            controls.update(&mut camera, &Input::new(), 1.0 / 60.0);
            let radius = (camera.position - controls.target).length();
            assert!((radius - 3.0).abs() < EPSILON);
        }
    }

    #[test]
    fn damping_decays_pending_rotation_geometrically() {
        let mut camera = camera_at_z3();
        let mut controls = OrbitControls::new(&camera);
        controls.enable_damping = true;
        controls.pending_azimuth = 1.0;

        controls.update(&mut camera, &Input::new(), 1.0 / 60.0);
        let (pending, _) = controls.pending_rotation();
        assert!((pending - 0.95).abs() < EPSILON);

        // After many frames the motion has died out and the applied angle
        // converges on the full requested rotation.
        for _ in 0..2000 {
            controls.update(&mut camera, &Input::new(), 1.0 / 60.0);
        }
        let (pending, _) = controls.pending_rotation();
        assert!(pending.abs() < 1e-3);
        assert!((controls.azimuth - 1.0).abs() < 1e-2);
    }

    #[test]
    fn without_damping_rotation_applies_in_one_frame() {
        let mut camera = camera_at_z3();
        let mut controls = OrbitControls::new(&camera);
        controls.pending_azimuth = 0.5;

        controls.update(&mut camera, &Input::new(), 1.0 / 60.0);
        let (pending, _) = controls.pending_rotation();
        assert_eq!(pending, 0.0);
        assert!((controls.azimuth - 0.5).abs() < EPSILON);
    }

    #[test]
    fn elevation_clamps_short_of_the_poles() {
        let mut camera = camera_at_z3();
        let mut controls = OrbitControls::new(&camera);
        controls.pending_elevation = 10.0;
        controls.update(&mut camera, &Input::new(), 1.0 / 60.0);
        assert!(controls.elevation <= ELEVATION_LIMIT + EPSILON);
    }
}
