//! TOML scenario file parsing

use bevy::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::body::Body;
use crate::input::CONTROLLER_COUNT;
use crate::simulation::{ControllerScript, ScriptedPose, SelectWindow};
use crate::tuning::SimTuning;

/// Complete scenario definition from TOML file
#[derive(Debug, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub description: Option<String>,
    pub setup: TestSetup,
    #[serde(default)]
    pub controllers: Vec<ControllerDef>,
    #[serde(default)]
    pub expect: TestExpectations,
}

/// Scenario setup
#[derive(Debug, Deserialize)]
pub struct TestSetup {
    pub seed: Option<u64>,
    /// Frames per second; each frame advances 1/fps
    #[serde(default = "default_fps")]
    pub fps: f32,
    /// Random bodies to scatter when `bodies` is empty
    pub count: Option<usize>,
    /// Named tuning overrides (`gravity = 0.0`)
    #[serde(default)]
    pub tuning: BTreeMap<String, f32>,
    #[serde(default)]
    pub bodies: Vec<BodyDef>,
}

fn default_fps() -> f32 {
    60.0
}

/// Body placed explicitly by the scenario
#[derive(Debug, Clone, Deserialize)]
pub struct BodyDef {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
    #[serde(default)]
    pub vz: f32,
}

/// One controller's pose and select windows
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerDef {
    pub index: usize,
    pub position: Option<[f32; 3]>,
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default)]
    pub pitch_degrees: f32,
    /// `[start, end)` frame pairs during which select is held
    #[serde(default)]
    pub select: Vec<[u64; 2]>,
}

/// Expected scenario outcomes
#[derive(Debug, Default, Deserialize)]
pub struct TestExpectations {
    #[serde(default)]
    pub sequence: Vec<ExpectedEvent>,
    /// Multiple state assertions at different frames (uses [[expect.state]] TOML syntax)
    #[serde(default)]
    pub state: Vec<StateAssertion>,
}

/// Expected event in sequence
#[derive(Debug, Deserialize)]
pub struct ExpectedEvent {
    /// Injected, FloorImpact, WallImpact or Contact
    pub event: String,
    pub controller: Option<usize>,
    pub body: Option<usize>,
    pub frame_min: Option<u64>,
    pub frame_max: Option<u64>,
}

/// State assertion after a frame
#[derive(Debug, Clone, Deserialize)]
pub struct StateAssertion {
    pub after_frame: u64,
    #[serde(default)]
    pub checks: Vec<String>,
}

impl TestSetup {
    /// Default tuning at real-time speed with the overrides applied
    pub fn tuning(&self) -> Result<SimTuning, String> {
        let mut tuning = SimTuning {
            time_scale: 1.0,
            ..SimTuning::default()
        };
        for (name, value) in &self.tuning {
            tuning.set_value(name, *value)?;
        }
        if let Some(count) = self.count {
            tuning.body_count = count;
        }
        tuning.validate()?;
        Ok(tuning)
    }

    /// Explicit bodies, or None to scatter `count` at random
    pub fn bodies(&self, radius: f32) -> Option<Vec<Body>> {
        if self.bodies.is_empty() {
            return None;
        }
        Some(
            self.bodies
                .iter()
                .map(|b| {
                    Body::new(
                        Vec3::new(b.x, b.y, b.z),
                        Vec3::new(b.vx, b.vy, b.vz),
                        radius,
                    )
                })
                .collect(),
        )
    }
}

impl TestDefinition {
    /// Controller script described by the `[[controllers]]` tables
    pub fn script(&self) -> Result<ControllerScript, String> {
        let mut script = ControllerScript::idle();
        for def in &self.controllers {
            if def.index >= CONTROLLER_COUNT {
                return Err(format!(
                    "Controller index {} out of range (0..{})",
                    def.index, CONTROLLER_COUNT
                ));
            }
            let track = &mut script.controllers[def.index];
            if let Some(position) = def.position {
                track.pose = ScriptedPose {
                    position,
                    yaw_degrees: def.yaw_degrees,
                    pitch_degrees: def.pitch_degrees,
                };
            }
            for [start, end] in &def.select {
                if end <= start {
                    return Err(format!(
                        "Controller {} select window [{}, {}] is empty",
                        def.index, start, end
                    ));
                }
                track.windows.push(SelectWindow {
                    start: *start,
                    end: *end,
                });
            }
        }
        Ok(script)
    }

    /// Frames to run: the latest state check or sequence bound, else one second
    pub fn frames(&self) -> u64 {
        let checks = self.expect.state.iter().map(|s| s.after_frame).max();
        let sequence = self
            .expect
            .sequence
            .iter()
            .filter_map(|e| e.frame_max.map(|f| f + 1))
            .max();
        match checks.max(sequence) {
            Some(frames) => frames,
            None => self.setup.fps.max(1.0) as u64,
        }
    }
}

/// Parse a scenario file from path
pub fn parse_test_file(path: &Path) -> Result<TestDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let toml = r#"
name = "Drop"
[setup]
fps = 10.0
[setup.tuning]
gravity = 0.0
[[setup.bodies]]
x = 0.0
y = 5.0
z = 0.0

[[controllers]]
index = 1
position = [0.0, 1.5, 2.0]
select = [[0, 2]]

[[expect.state]]
after_frame = 3
checks = ["body[0].y >= 4.9"]
"#;
        let def: TestDefinition = toml::from_str(toml).unwrap();
        assert_eq!(def.name, "Drop");
        assert_eq!(def.setup.fps, 10.0);
        assert_eq!(def.setup.tuning().unwrap().gravity, 0.0);
        assert_eq!(def.setup.bodies(0.08).unwrap().len(), 1);
        assert_eq!(def.frames(), 3);

        let script = def.script().unwrap();
        assert!(script.state_at(1).0[1].is_selecting);
        assert!(!script.state_at(2).0[1].is_selecting);
    }

    #[test]
    fn test_unknown_tuning_name() {
        let toml = r#"
name = "Bad"
[setup.tuning]
bounciness = 2.0
"#;
        let def: TestDefinition = toml::from_str(toml).unwrap();
        assert!(def.setup.tuning().is_err());
    }

    #[test]
    fn test_controller_out_of_range() {
        let toml = r#"
name = "Three hands"
[setup]
[[controllers]]
index = 2
"#;
        let def: TestDefinition = toml::from_str(toml).unwrap();
        assert!(def.script().is_err());
    }

    #[test]
    fn test_default_length_is_one_second() {
        let def: TestDefinition = toml::from_str("name = \"Idle\"\n[setup]\n").unwrap();
        assert_eq!(def.frames(), 60);
        assert!(def.setup.bodies(0.08).is_none());
    }
}
