//! Scripted controllers for headless runs
//!
//! Stands in for the input collaborator: each controller has a fixed pose
//! and a list of frame windows during which it is selecting.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::BodySimulator;
use crate::input::{CONTROLLER_COUNT, ControllerInputs, ControllerState, Pose};

/// Frames `[start, end)` during which a controller holds select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectWindow {
    pub start: u64,
    pub end: u64,
}

impl SelectWindow {
    pub fn contains(&self, frame: u64) -> bool {
        frame >= self.start && frame < self.end
    }
}

/// Serializable pose: position plus yaw/pitch in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedPose {
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default)]
    pub pitch_degrees: f32,
}

impl ScriptedPose {
    pub fn to_pose(&self) -> Pose {
        Pose::new(
            Vec3::from_array(self.position),
            Quat::from_euler(
                EulerRot::YXZ,
                self.yaw_degrees.to_radians(),
                self.pitch_degrees.to_radians(),
                0.0,
            ),
        )
    }
}

/// One controller's script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerTrack {
    pub pose: ScriptedPose,
    #[serde(default)]
    pub windows: Vec<SelectWindow>,
}

impl ControllerTrack {
    pub fn idle_at(position: [f32; 3]) -> Self {
        Self {
            pose: ScriptedPose {
                position,
                yaw_degrees: 0.0,
                pitch_degrees: 0.0,
            },
            windows: Vec::new(),
        }
    }

    pub fn state_at(&self, frame: u64) -> ControllerState {
        ControllerState {
            is_selecting: self.windows.iter().any(|w| w.contains(frame)),
            pose: self.pose.to_pose(),
        }
    }

    /// Number of frames in `[0, frames)` this controller selects
    pub fn selecting_frames(&self, frames: u64) -> u64 {
        (0..frames)
            .filter(|f| self.windows.iter().any(|w| w.contains(*f)))
            .count() as u64
    }
}

/// Scripts for both controllers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerScript {
    pub controllers: [ControllerTrack; CONTROLLER_COUNT],
}

impl Default for ControllerScript {
    fn default() -> Self {
        Self::idle()
    }
}

impl ControllerScript {
    /// Both hands at chest height, never selecting
    pub fn idle() -> Self {
        Self {
            controllers: [
                ControllerTrack::idle_at([0.2, 1.35, 2.6]),
                ControllerTrack::idle_at([-0.2, 1.35, 2.6]),
            ],
        }
    }

    /// Hands take turns: a short burst every second, offset by half a second
    pub fn alternating(frames: u64, fps: u64) -> Self {
        let mut script = Self::idle();
        let period = fps.max(1);
        let burst = (period / 6).max(1);
        let mut start = 0;
        while start < frames {
            script.controllers[0].windows.push(SelectWindow {
                start,
                end: start + burst,
            });
            let offset = start + period / 2;
            script.controllers[1].windows.push(SelectWindow {
                start: offset,
                end: offset + burst,
            });
            start += period;
        }
        script
    }

    /// Both hands hold select for the whole run
    pub fn barrage(frames: u64) -> Self {
        let mut script = Self::idle();
        for track in script.controllers.iter_mut() {
            track.windows.push(SelectWindow {
                start: 0,
                end: frames,
            });
        }
        script
    }

    /// Look up a named preset
    pub fn preset(name: &str, frames: u64, fps: u64) -> Result<Self, String> {
        match name {
            "idle" => Ok(Self::idle()),
            "alternating" => Ok(Self::alternating(frames, fps)),
            "barrage" => Ok(Self::barrage(frames)),
            _ => Err(format!(
                "Unknown controller script '{}' (expected idle, alternating or barrage)",
                name
            )),
        }
    }

    pub fn state_at(&self, frame: u64) -> ControllerInputs {
        ControllerInputs([
            self.controllers[0].state_at(frame),
            self.controllers[1].state_at(frame),
        ])
    }

    /// Grabs the script will produce over `frames` frames
    pub fn expected_injections(&self, frames: u64) -> u64 {
        self.controllers
            .iter()
            .map(|t| t.selecting_frames(frames))
            .sum()
    }
}

/// Script driving `ControllerInputs` in a headless app
#[derive(Resource, Debug, Clone)]
pub struct ScriptedControllers(pub ControllerScript);

/// Fill `ControllerInputs` for the frame the simulator is about to run
pub fn apply_controller_script(
    script: Res<ScriptedControllers>,
    sim: Res<BodySimulator>,
    mut inputs: ResMut<ControllerInputs>,
) {
    *inputs = script.0.state_at(sim.frame());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_windows() {
        let script = ControllerScript::alternating(120, 60);
        assert!(script.state_at(0).0[0].is_selecting);
        assert!(!script.state_at(0).0[1].is_selecting);
        assert!(script.state_at(30).0[1].is_selecting);
        assert!(!script.state_at(20).any_selecting());
        assert!(script.state_at(60).0[0].is_selecting);
        // 10-frame bursts, two per hand
        assert_eq!(script.expected_injections(120), 40);
    }

    #[test]
    fn test_barrage_every_frame() {
        let script = ControllerScript::barrage(10);
        assert_eq!(script.expected_injections(10), 20);
        assert!(!script.state_at(10).any_selecting());
    }

    #[test]
    fn test_unknown_preset() {
        assert!(ControllerScript::preset("juggle", 10, 60).is_err());
        assert!(ControllerScript::preset("idle", 10, 60).is_ok());
    }

    #[test]
    fn test_scripted_pose_faces_forward() {
        let pose = ScriptedPose {
            position: [0.0, 1.0, 0.0],
            yaw_degrees: 180.0,
            pitch_degrees: 0.0,
        }
        .to_pose();
        assert!((pose.forward() - Vec3::Z).length() < 1e-5);
    }
}
