//! Event type definitions for the logging system

use serde::{Deserialize, Serialize};

use crate::tuning::SimTuning;

/// Physics configuration snapshot for analytics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfigSnapshot {
    pub body_count: usize,
    pub body_radius: f32,
    pub gravity: f32,
    pub floor_restitution: f32,
    pub floor_friction: f32,
    pub time_scale: f32,
}

impl From<&SimTuning> for SimConfigSnapshot {
    fn from(tuning: &SimTuning) -> Self {
        Self {
            body_count: tuning.body_count,
            body_radius: tuning.body_radius,
            gravity: tuning.gravity,
            floor_restitution: tuning.floor_restitution,
            floor_friction: tuning.floor_friction,
            time_scale: tuning.time_scale,
        }
    }
}

/// All simulation events that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    // === Session Events ===
    /// Session started (generated once per launch or run)
    SessionStart {
        session_id: String, // UUID v4
        timestamp: String,  // ISO 8601
    },
    /// Physics configuration (logged after session start)
    Config(SimConfigSnapshot),

    // === Run Events ===
    /// Headless run started
    RunStart { seed: u64, frames: u64 },
    /// Headless run ended
    RunEnd { frames: u64, duration: f32 },

    // === Body Events ===
    /// A controller grabbed and threw a body
    Injected {
        controller: u8,
        body: usize,
        speed: f32,
    },
    /// Floor/ceiling reflections in one frame
    FloorImpacts { count: u32 },
    /// Overlapping pairs resolved in one frame
    Contacts { count: u32 },

    // === Debug/Tick Events ===
    /// Periodic arena summary
    Tick {
        frame: u64,
        kinetic_energy: f32,
        max_penetration: f32,
    },
}

impl SimEvent {
    /// Get the event type code for compact serialization
    pub fn type_code(&self) -> &'static str {
        match self {
            SimEvent::SessionStart { .. } => "SE",
            SimEvent::Config(_) => "CF",
            SimEvent::RunStart { .. } => "RS",
            SimEvent::RunEnd { .. } => "RE",
            SimEvent::Injected { .. } => "IN",
            SimEvent::FloorImpacts { .. } => "FI",
            SimEvent::Contacts { .. } => "CT",
            SimEvent::Tick { .. } => "T",
        }
    }
}
