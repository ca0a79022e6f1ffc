//! Input module - controller state and the desktop capture systems
//!
//! The simulator only ever sees `ControllerInputs`: two plain
//! `{ is_selecting, pose }` records read once per frame. On the desktop they
//! are derived from mouse/keyboard/gamepad and the camera; headless runs fill
//! them from a script.

use bevy::prelude::*;

use crate::constants::*;

/// Number of hand controllers
pub const CONTROLLER_COUNT: usize = 2;

/// Position plus orientation of a controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Direction a throw leaves the controller (local -Z)
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

/// Per-frame state of one controller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerState {
    pub is_selecting: bool,
    pub pose: Pose,
}

/// Both controllers as seen at the start of the current frame
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerInputs(pub [ControllerState; CONTROLLER_COUNT]);

impl ControllerInputs {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn any_selecting(&self) -> bool {
        self.0.iter().any(|c| c.is_selecting)
    }
}

/// Camera that doubles as the head pose for the controller stand-in
#[derive(Component, Default)]
pub struct RoomCamera {
    pub yaw: f32,
    pub pitch: f32,
}

/// Pose of a controller held at `side` (-1 left, +1 right) of the camera
pub fn controller_pose(camera: &Transform, side: f32) -> Pose {
    let offset = Vec3::new(side * CONTROLLER_SIDE, -CONTROLLER_DROP, -CONTROLLER_FORWARD);
    Pose::new(
        camera.translation + camera.rotation * offset,
        camera.rotation,
    )
}

/// Runs in Update before the simulation step.
/// Left mouse / right trigger drive the right-hand controller (index 0),
/// right mouse / left trigger the left-hand one (index 1).
pub fn capture_controllers(
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    camera: Query<&Transform, With<RoomCamera>>,
    mut inputs: ResMut<ControllerInputs>,
) {
    let Ok(camera) = camera.single() else {
        return;
    };

    let right_selecting = mouse.pressed(MouseButton::Left)
        || keyboard.pressed(KeyCode::Space)
        || gamepads
            .iter()
            .any(|gp| gp.pressed(GamepadButton::RightTrigger));
    let left_selecting = mouse.pressed(MouseButton::Right)
        || keyboard.pressed(KeyCode::ShiftLeft)
        || gamepads
            .iter()
            .any(|gp| gp.pressed(GamepadButton::LeftTrigger));

    inputs.0[0] = ControllerState {
        is_selecting: right_selecting,
        pose: controller_pose(camera, 1.0),
    };
    inputs.0[1] = ControllerState {
        is_selecting: left_selecting,
        pose: controller_pose(camera, -1.0),
    };
}

/// Look around with arrow keys / WASD / left stick
pub fn turn_camera(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    time: Res<Time>,
    mut camera: Query<(&mut Transform, &mut RoomCamera)>,
) {
    let mut turn = Vec2::ZERO;

    if keyboard.pressed(KeyCode::ArrowLeft) || keyboard.pressed(KeyCode::KeyA) {
        turn.x += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowRight) || keyboard.pressed(KeyCode::KeyD) {
        turn.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowUp) || keyboard.pressed(KeyCode::KeyW) {
        turn.y += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowDown) || keyboard.pressed(KeyCode::KeyS) {
        turn.y -= 1.0;
    }

    for gamepad in &gamepads {
        if let Some(stick_x) = gamepad.get(GamepadAxis::LeftStickX)
            && stick_x.abs() > STICK_DEADZONE
        {
            turn.x -= stick_x;
        }
        if let Some(stick_y) = gamepad.get(GamepadAxis::LeftStickY)
            && stick_y.abs() > STICK_DEADZONE
        {
            turn.y += stick_y;
        }
    }

    if turn == Vec2::ZERO {
        return;
    }

    let step = CAMERA_TURN_SPEED * time.delta_secs();
    for (mut transform, mut cam) in &mut camera {
        cam.yaw += turn.x.clamp(-1.0, 1.0) * step;
        cam.pitch = (cam.pitch + turn.y.clamp(-1.0, 1.0) * step).clamp(-1.4, 1.4);
        transform.rotation = Quat::from_euler(EulerRot::YXZ, cam.yaw, cam.pitch, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_pose_follows_camera() {
        let camera = Transform::from_translation(CAMERA_EYE);
        let right = controller_pose(&camera, 1.0);
        let left = controller_pose(&camera, -1.0);

        assert!(right.position.x > camera.translation.x);
        assert!(left.position.x < camera.translation.x);
        assert!(right.position.y < camera.translation.y);
        // In front of the camera (cameras look down -Z)
        assert!(right.position.z < camera.translation.z);
        assert_eq!(right.orientation, camera.rotation);
    }

    #[test]
    fn test_pose_forward_rotates() {
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let forward = pose.forward();
        // Quarter turn left maps -Z to -X
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_any_selecting() {
        let mut inputs = ControllerInputs::idle();
        assert!(!inputs.any_selecting());
        inputs.0[1].is_selecting = true;
        assert!(inputs.any_selecting());
    }
}
