//! Physics tuning settings (decoupled from the simulator)

use bevy::log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::room::Room;

/// Path to global physics tuning config
pub const SIM_TUNING_FILE: &str = "config/sim_tuning.json";

/// Serializable physics values stored in config.
/// Missing fields fall back to the defaults in `constants.rs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimTuning {
    pub gravity: f32,
    pub floor_restitution: f32,
    pub floor_friction: f32,
    pub throw_spread: f32,
    pub throw_push: f32,
    pub time_scale: f32,
    // Fixed once the arena exists
    pub body_count: usize,
    pub body_radius: f32,
    pub room_side: f32,
    pub room_height: f32,
}

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            floor_restitution: FLOOR_RESTITUTION,
            floor_friction: FLOOR_FRICTION,
            throw_spread: THROW_SPREAD,
            throw_push: THROW_PUSH,
            time_scale: TIME_SCALE,
            body_count: BODY_COUNT,
            body_radius: BODY_RADIUS,
            room_side: ROOM_SIDE,
            room_height: ROOM_HEIGHT,
        }
    }
}

impl SimTuning {
    /// Room described by this tuning
    pub fn room(&self) -> Room {
        Room::new(self.room_side, self.room_height, self.body_radius)
    }

    /// Copy the values that can change while bodies exist.
    /// Arena shape (count, radius, room) is kept from `self`.
    pub fn merge_live(&mut self, other: &SimTuning) {
        self.gravity = other.gravity;
        self.floor_restitution = other.floor_restitution;
        self.floor_friction = other.floor_friction;
        self.throw_spread = other.throw_spread;
        self.throw_push = other.throw_push;
        self.time_scale = other.time_scale;
    }

    /// Reject values the arena cannot be built from
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("gravity", self.gravity),
            ("floor_restitution", self.floor_restitution),
            ("floor_friction", self.floor_friction),
            ("throw_spread", self.throw_spread),
            ("throw_push", self.throw_push),
            ("time_scale", self.time_scale),
            ("body_radius", self.body_radius),
            ("room_side", self.room_side),
            ("room_height", self.room_height),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be finite, got {}", name, value));
        }
        if self.body_radius <= 0.0 {
            return Err(format!("body_radius must be positive, got {}", self.body_radius));
        }
        if self.room_side <= 2.0 * self.body_radius {
            return Err(format!(
                "room_side {} leaves no room for bodies of radius {}",
                self.room_side, self.body_radius
            ));
        }
        if self.room_height <= self.body_radius {
            return Err(format!(
                "room_height {} must exceed body_radius {}",
                self.room_height, self.body_radius
            ));
        }
        if self.time_scale < 0.0 {
            return Err(format!("time_scale must be non-negative, got {}", self.time_scale));
        }
        if self.body_count > MAX_BODY_COUNT {
            return Err(format!(
                "body_count {} exceeds the limit of {}",
                self.body_count, MAX_BODY_COUNT
            ));
        }
        Ok(())
    }

    /// Apply a named override, as used by scenario files and CLI flags
    pub fn set_value(&mut self, name: &str, value: f32) -> Result<(), String> {
        match name {
            "gravity" => self.gravity = value,
            "floor_restitution" => self.floor_restitution = value,
            "floor_friction" => self.floor_friction = value,
            "throw_spread" => self.throw_spread = value,
            "throw_push" => self.throw_push = value,
            "time_scale" => self.time_scale = value,
            "body_radius" => self.body_radius = value,
            "room_side" => self.room_side = value,
            "room_height" => self.room_height = value,
            "body_count" => {
                if !(0.0..=MAX_BODY_COUNT as f32).contains(&value) {
                    return Err(format!(
                        "body_count must be within 0..={}, got {}",
                        MAX_BODY_COUNT, value
                    ));
                }
                self.body_count = value as usize;
            }
            _ => return Err(format!("Unknown tuning value: {}", name)),
        }
        Ok(())
    }
}

pub fn load_tuning_from_file(path: &str) -> Result<SimTuning, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    let tuning: SimTuning =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))?;
    tuning
        .validate()
        .map_err(|e| format!("Invalid tuning in {}: {}", path, e))?;
    Ok(tuning)
}

/// Load the global tuning file, falling back to defaults with a warning
pub fn load_global_tuning() -> SimTuning {
    match load_tuning_from_file(SIM_TUNING_FILE) {
        Ok(tuning) => tuning,
        Err(err) => {
            warn!("{}, using default tuning", err);
            SimTuning::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning: SimTuning = serde_json::from_str(r#"{ "gravity": 3.5 }"#).unwrap();
        assert_eq!(tuning.gravity, 3.5);
        assert_eq!(tuning.body_count, BODY_COUNT);
        assert_eq!(tuning.floor_restitution, FLOOR_RESTITUTION);
    }

    #[test]
    fn test_merge_live_keeps_arena_shape() {
        let mut live = SimTuning::default();
        let reloaded = SimTuning {
            gravity: 1.0,
            body_count: 5,
            body_radius: 0.5,
            ..SimTuning::default()
        };
        live.merge_live(&reloaded);
        assert_eq!(live.gravity, 1.0);
        assert_eq!(live.body_count, BODY_COUNT);
        assert_eq!(live.body_radius, BODY_RADIUS);
    }

    #[test]
    fn test_set_value() {
        let mut tuning = SimTuning::default();
        assert!(tuning.set_value("gravity", 0.0).is_ok());
        assert_eq!(tuning.gravity, 0.0);
        assert!(tuning.set_value("body_count", 10.0).is_ok());
        assert_eq!(tuning.body_count, 10);
        assert!(tuning.set_value("warp_factor", 9.0).is_err());
        assert!(tuning.set_value("body_count", 1e12).is_err());
        assert!(tuning.set_value("body_count", f32::NAN).is_err());
        assert_eq!(tuning.body_count, 10);
    }

    #[test]
    fn test_validate() {
        assert!(SimTuning::default().validate().is_ok());

        let cramped = SimTuning {
            room_side: 0.1,
            ..SimTuning::default()
        };
        assert!(cramped.validate().is_err());

        let flat = SimTuning {
            body_radius: 0.0,
            ..SimTuning::default()
        };
        assert!(flat.validate().is_err());

        let low = SimTuning {
            room_height: 0.05,
            ..SimTuning::default()
        };
        assert!(low.validate().is_err());

        let crowded = SimTuning {
            body_count: MAX_BODY_COUNT + 1,
            ..SimTuning::default()
        };
        assert!(crowded.validate().is_err());

        let broken = SimTuning {
            gravity: f32::INFINITY,
            ..SimTuning::default()
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = std::env::temp_dir().join("ballroom_tuning_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cramped.json");
        std::fs::write(&path, r#"{ "room_side": 0.1 }"#).unwrap();

        let err = load_tuning_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(err.contains("room_side"));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_tuning_from_file("config/does_not_exist.json").is_err());
    }
}
