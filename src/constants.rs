//! Tunable constants for ballroom
//!
//! Default physics values live here; `tuning.rs` can override most of them
//! from `config/sim_tuning.json` at runtime.

use bevy::prelude::*;

// =============================================================================
// SCENE COLORS
// =============================================================================

pub const BACKGROUND_COLOR: Color = Color::srgb(0.31, 0.31, 0.31);
pub const ROOM_LINE_COLOR: Color = Color::srgb(0.5, 0.5, 0.5);
pub const CONTROLLER_COLOR: Color = Color::srgb(0.9, 0.75, 0.4);
pub const CONTROLLER_ACTIVE_COLOR: Color = Color::srgb(1.0, 0.35, 0.2);

// =============================================================================
// BODIES
// =============================================================================

pub const BODY_COUNT: usize = 200;
pub const BODY_RADIUS: f32 = 0.08;
pub const MAX_BODY_COUNT: usize = 10_000;
pub const BODY_SPAWN_HALF_WIDTH: f32 = 2.0; // x/z spawn in [-2, 2)
pub const BODY_SPAWN_HEIGHT: f32 = 4.0; // y spawn below this
pub const BODY_SPAWN_SPEED: f32 = 0.005; // Each velocity component in [-s, s)

// =============================================================================
// ROOM
// =============================================================================

pub const ROOM_SIDE: f32 = 6.0;
pub const ROOM_HEIGHT: f32 = 6.0;

// =============================================================================
// PHYSICS
// =============================================================================

pub const GRAVITY: f32 = 9.8;
pub const FLOOR_RESTITUTION: f32 = 0.8; // Vertical speed kept after a floor hit
pub const FLOOR_FRICTION: f32 = 0.98; // Horizontal speed kept after a floor hit
pub const TIME_SCALE: f32 = 0.8; // Display clock runs slightly slow
pub const COINCIDENT_EPSILON: f32 = f32::EPSILON;

// =============================================================================
// THROWING
// =============================================================================

pub const THROW_SPREAD: f32 = 3.0; // x/y throw velocity in [-s/2, s/2)
pub const THROW_PUSH: f32 = 9.0; // z throw velocity in [-push, 1 - push)

// =============================================================================
// DESKTOP CONTROLLER STAND-IN
// =============================================================================

pub const CAMERA_EYE: Vec3 = Vec3::new(0.0, 1.6, 3.0);
pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 1.2, 0.0);
pub const CAMERA_TURN_SPEED: f32 = 1.2; // Radians per second
pub const CONTROLLER_FORWARD: f32 = 0.4; // Distance in front of the camera
pub const CONTROLLER_SIDE: f32 = 0.2; // Distance left/right of the camera
pub const CONTROLLER_DROP: f32 = 0.25; // Distance below eye height
pub const CONTROLLER_POINTER_LENGTH: f32 = 0.5;
pub const STICK_DEADZONE: f32 = 0.25;

// =============================================================================
// WINDOW
// =============================================================================

pub const DEFAULT_WINDOW_WIDTH: u32 = 1600;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 900;
