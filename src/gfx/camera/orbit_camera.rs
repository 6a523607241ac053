use super::camera_utils::{Camera, CameraUniform};
use cgmath::*;

use crate::config::ViewerConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Spherical placement of the camera around its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitPose {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub target: Vector3<f32>,
}

impl OrbitPose {
    /// Pose that puts the eye at `eye` while looking at `target`
    pub fn from_eye(eye: Vector3<f32>, target: Vector3<f32>) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude().max(f32::EPSILON);
        Self {
            distance,
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            yaw: offset.x.atan2(offset.z),
            target,
        }
    }
}

/// Orbit camera with damped motion
///
/// Input moves a goal pose; [`OrbitCamera::update`] eases the current pose a
/// fixed fraction of the way toward it each frame, so motion keeps gliding
/// after the mouse is released.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of the remaining motion applied per update, in (0, 1]
    pub damping: f32,
    pub uniform: CameraUniform,
    goal: OrbitPose,
    home: OrbitPose,
    projection: Matrix4<f32>,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        self.projection * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let pose = OrbitPose {
            distance,
            pitch,
            yaw,
            target,
        };
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Derived from the pose below
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad(std::f32::consts::PI / 4.0),
            znear: 0.1,
            zfar: 1000.0,
            damping: 1.0,
            uniform: CameraUniform::default(),
            goal: pose,
            home: pose,
            projection: Matrix4::identity(),
        };
        camera.update_eye();
        camera.update_projection_matrix();
        camera
    }

    /// Camera placed and shaped as the viewer configuration describes
    pub fn from_config(config: &ViewerConfig, aspect: f32) -> Self {
        let pose = OrbitPose::from_eye(
            Vector3::from(config.camera_position),
            Vector3::from(config.camera_target),
        );
        let mut camera = Self::new(pose.distance, pose.pitch, pose.yaw, pose.target, aspect);
        camera.fovy = Deg(config.fov_y_degrees).into();
        camera.znear = config.z_near;
        camera.zfar = config.z_far;
        camera.damping = config.damping_factor.clamp(f32::EPSILON, 1.0);
        camera.update_projection_matrix();
        camera
    }

    pub fn goal(&self) -> OrbitPose {
        self.goal
    }

    /// Heads back to the pose the camera was created with
    pub fn reset_to_default(&mut self) {
        self.goal = self.home;
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.goal.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
    }

    pub fn add_distance(&mut self, delta: f32) {
        let corrected_zoom = f32::log10(self.goal.distance.max(1.0 + f32::EPSILON)) * delta;
        self.set_distance(self.goal.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.goal.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.goal.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.goal.yaw = bounded_yaw;
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.goal.yaw + delta);
    }

    /// Pans the goal target relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Scale by distance for consistent feel at all zoom levels
        let pan_scale = self.distance * 0.1;
        self.goal.target += (right * delta.0 + up * delta.1) * pan_scale;
    }

    /// Advances the damped motion by one frame, returns whether the camera moved
    pub fn update(&mut self) -> bool {
        const SNAP: f32 = 1e-4;

        let before = (self.distance, self.pitch, self.yaw, self.target);
        let step = |current: f32, goal: f32| {
            let next = current + (goal - current) * self.damping;
            if (goal - next).abs() < SNAP {
                goal
            } else {
                next
            }
        };

        self.distance = step(self.distance, self.goal.distance);
        self.pitch = step(self.pitch, self.goal.pitch);
        self.yaw = step(self.yaw, self.goal.yaw);
        self.target = Vector3::new(
            step(self.target.x, self.goal.target.x),
            step(self.target.y, self.goal.target.y),
            step(self.target.z, self.goal.target.z),
        );

        self.update_eye();
        before != (self.distance, self.pitch, self.yaw, self.target)
    }

    fn update_eye(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    /// Rebuilds the cached projection from fov, aspect and clip planes
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection_matrix();
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = self.build_view_projection_matrix().into();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: Some(1.1),
            max_distance: Some(16.0),
            min_pitch: -std::f32::consts::PI / 2.0 + f32::EPSILON,
            max_pitch: std::f32::consts::PI / 2.0 - f32::EPSILON,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn from_config_starts_at_configured_eye() {
        let config = ViewerConfig::default();
        let camera = OrbitCamera::from_config(&config, 800.0 / 500.0);

        assert_close(camera.eye, Vector3::from(config.camera_position));
        assert_close(camera.target, Vector3::zero());
        assert_eq!(camera.fovy, Rad::from(Deg(45.0)));
    }

    #[test]
    fn damping_eases_toward_goal() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.damping = 0.1;
        camera.add_yaw(1.0);

        assert!(camera.update());
        assert!((camera.yaw - 0.1).abs() < 1e-6);
        assert!(camera.update());
        assert!((camera.yaw - 0.19).abs() < 1e-6);

        for _ in 0..500 {
            camera.update();
        }
        assert_eq!(camera.yaw, 1.0);
        assert!(!camera.update());
    }

    #[test]
    fn reset_returns_to_home_pose() {
        let mut camera = OrbitCamera::new(5.0, 0.3, 0.2, Vector3::zero(), 1.0);
        camera.add_yaw(2.0);
        camera.pan((1.0, 0.0));
        camera.update();

        camera.reset_to_default();
        camera.update();
        assert_eq!(camera.yaw, 0.2);
        assert_eq!(camera.pitch, 0.3);
        assert_close(camera.target, Vector3::zero());
    }

    #[test]
    fn distance_respects_bounds() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.set_distance(100.0);
        assert_eq!(camera.goal().distance, 16.0);
        camera.set_distance(0.0);
        assert_eq!(camera.goal().distance, 1.1);
    }

    #[test]
    fn resize_updates_aspect_and_projection() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.resize_projection(1600, 900);
        assert_eq!(camera.aspect, 1600.0 / 900.0);

        let expected = OPENGL_TO_WGPU_MATRIX
            * perspective(camera.fovy, 1600.0 / 900.0, camera.znear, camera.zfar);
        assert_eq!(camera.projection_matrix(), expected);

        camera.resize_projection(0, 900);
        assert_eq!(camera.aspect, 1600.0 / 900.0);
    }
}
