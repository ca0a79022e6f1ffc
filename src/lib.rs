//! Ballroom - a room full of bouncing bodies, thrown from two controllers
//!
//! This crate provides the body simulator, its Bevy systems, and the
//! headless tooling (batch runs, scenario tests) organized into modules.

// Core modules
pub mod body;
pub mod config_watcher;
pub mod constants;
pub mod events;
pub mod input;
pub mod room;
pub mod settings;
pub mod tuning;

// Headless tooling
pub mod simulation;
pub mod testing;

// Re-export commonly used types for convenience
pub use body::{
    Body, BodyIndex, BodySimulator, BodySnapshot, Injection, LastStepReport, StepReport,
    emit_step_events, step_bodies, sync_body_transforms,
};
pub use config_watcher::ConfigWatcher;
pub use constants::*;
pub use events::{
    BusEvent, EventBus, SimConfigSnapshot, SimEvent, parse_event, serialize_event,
    update_event_bus_time,
};
pub use input::{
    CONTROLLER_COUNT, ControllerInputs, ControllerState, Pose, RoomCamera, controller_pose,
};
pub use room::Room;
pub use settings::{CurrentSettings, InitSettings, save_settings_system};
pub use tuning::{SIM_TUNING_FILE, SimTuning, load_global_tuning, load_tuning_from_file};
