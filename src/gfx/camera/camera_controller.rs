use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Turns raw mouse and keyboard input into orbit camera goals
///
/// Left-drag orbits, Shift+left-drag pans, the wheel zooms and Shift+C
/// heads back to the initial view.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    /// Tracks the left button from window events, which report buttons
    /// consistently across platforms
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_mouse_pressed = state == ElementState::Pressed;
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) {
        match event {
            DeviceEvent::MouseWheel { delta } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                camera.add_distance(scroll_amount * self.zoom_speed);
            }
            DeviceEvent::MouseMotion { delta } => {
                if !self.is_mouse_pressed {
                    return;
                }
                if self.is_shift_held {
                    camera.pan((
                        -delta.0 as f32 * self.pan_speed,
                        delta.1 as f32 * self.pan_speed,
                    ));
                } else {
                    camera.add_yaw(-delta.0 as f32 * self.rotate_speed);
                    camera.add_pitch(delta.1 as f32 * self.rotate_speed);
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        if let PhysicalKey::Code(key) = event.physical_key {
            self.process_key(key, event.state, camera);
        }
    }

    pub fn process_key(&mut self, key: KeyCode, state: ElementState, camera: &mut OrbitCamera) {
        match key {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                let was_shift_held = self.is_shift_held;
                self.is_shift_held = state == ElementState::Pressed;
                if was_shift_held != self.is_shift_held {
                    log::trace!("Shift state changed: {}", self.is_shift_held);
                }
            }
            KeyCode::KeyC if state == ElementState::Pressed && self.is_shift_held => {
                log::info!("Resetting camera to default position");
                camera.reset_to_default();
            }
            _ => (),
        }
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_mouse_pressed && !self.is_shift_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, Zero};

    fn camera() -> OrbitCamera {
        OrbitCamera::new(5.0, 0.2, 0.0, Vector3::zero(), 1.0)
    }

    #[test]
    fn drag_orbits_only_while_pressed() {
        let mut controller = CameraController::new(0.01, 0.1);
        let mut camera = camera();
        let motion = DeviceEvent::MouseMotion { delta: (-10.0, 5.0) };

        controller.process_events(&motion, &mut camera);
        assert_eq!(camera.goal().yaw, 0.0);

        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.is_rotating());
        controller.process_events(&motion, &mut camera);
        assert!((camera.goal().yaw - 0.1).abs() < 1e-6);
        assert!((camera.goal().pitch - 0.25).abs() < 1e-6);
    }

    #[test]
    fn shift_drag_pans_and_shift_c_resets() {
        let mut controller = CameraController::new(0.01, 0.1);
        let mut camera = camera();

        controller.process_key(KeyCode::ShiftLeft, ElementState::Pressed, &mut camera);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.is_panning());

        controller.process_events(&DeviceEvent::MouseMotion { delta: (20.0, 0.0) }, &mut camera);
        assert_ne!(camera.goal().target, Vector3::zero());

        controller.process_key(KeyCode::KeyC, ElementState::Pressed, &mut camera);
        assert_eq!(camera.goal().target, Vector3::zero());
    }

    #[test]
    fn wheel_zooms() {
        let mut controller = CameraController::new(0.01, 0.1);
        let mut camera = camera();
        controller.process_events(
            &DeviceEvent::MouseWheel {
                delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            },
            &mut camera,
        );
        assert!(camera.goal().distance < 5.0);
    }
}
