//! Assertion checking for scenario expectations

use bevy::prelude::*;

use super::parser::{ExpectedEvent, StateAssertion};
use crate::body::{BodySimulator, StepReport};

/// Error when an assertion fails
#[derive(Debug, Clone)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n    Expected: {}\n    Actual: {}",
            self.message, self.expected, self.actual
        )
    }
}

/// Captured event with timing info
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEvent {
    /// Simulator frame the event happened in (0-based)
    pub frame: u64,
    pub event_type: String,
    pub controller: Option<usize>,
    pub body: Option<usize>,
}

impl CapturedEvent {
    fn new(frame: u64, event_type: &str) -> Self {
        Self {
            frame,
            event_type: event_type.to_string(),
            controller: None,
            body: None,
        }
    }

    /// Events of one frame report, injections first
    pub fn from_report(frame: u64, report: &StepReport) -> Vec<Self> {
        let mut events: Vec<Self> = report
            .injections
            .iter()
            .map(|i| Self {
                controller: Some(i.controller),
                body: Some(i.body),
                ..Self::new(frame, "Injected")
            })
            .collect();
        if report.floor_impacts > 0 {
            events.push(Self::new(frame, "FloorImpact"));
        }
        if report.wall_impacts > 0 {
            events.push(Self::new(frame, "WallImpact"));
        }
        if report.contacts > 0 {
            events.push(Self::new(frame, "Contact"));
        }
        events
    }

    fn matches(&self, expected: &ExpectedEvent) -> bool {
        if self.event_type != expected.event {
            return false;
        }
        if expected.controller.is_some() && expected.controller != self.controller {
            return false;
        }
        if expected.body.is_some() && expected.body != self.body {
            return false;
        }
        true
    }
}

/// Check if captured events match expected sequence
pub fn check_sequence(
    expected: &[ExpectedEvent],
    captured: &[CapturedEvent],
) -> Result<(), AssertionError> {
    let mut captured_idx = 0;

    for (i, exp) in expected.iter().enumerate() {
        let found = captured[captured_idx..]
            .iter()
            .enumerate()
            .find(|(_, cap)| cap.matches(exp));

        match found {
            Some((offset, cap)) => {
                if let Some(min) = exp.frame_min
                    && cap.frame < min
                {
                    return Err(AssertionError {
                        message: format!("Event #{} '{}' occurred too early", i + 1, exp.event),
                        expected: format!("frame >= {}", min),
                        actual: format!("frame {}", cap.frame),
                    });
                }
                if let Some(max) = exp.frame_max
                    && cap.frame > max
                {
                    return Err(AssertionError {
                        message: format!("Event #{} '{}' occurred too late", i + 1, exp.event),
                        expected: format!("frame <= {}", max),
                        actual: format!("frame {}", cap.frame),
                    });
                }
                captured_idx += offset + 1;
            }
            None => {
                return Err(AssertionError {
                    message: format!("Event #{} '{}' not found", i + 1, exp.event),
                    expected: format!("'{}' event in sequence", exp.event),
                    actual: format!(
                        "events after position {}: {:?}",
                        captured_idx,
                        captured[captured_idx..]
                            .iter()
                            .map(|e| &e.event_type)
                            .collect::<Vec<_>>()
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Arena state for assertions
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub frame: u64,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    pub cursor: usize,
    pub injections: u32,
    pub floor_impacts: u32,
    pub wall_impacts: u32,
    pub contacts: u32,
    pub kinetic_energy: f32,
    pub max_penetration: f32,
    pub out_of_bounds: usize,
}

impl WorldState {
    /// Snapshot the simulator plus counters accumulated so far
    pub fn capture(sim: &BodySimulator, totals: &StepReport, injections: u32) -> Self {
        Self {
            frame: sim.frame(),
            positions: sim.bodies().iter().map(|b| b.position).collect(),
            velocities: sim.bodies().iter().map(|b| b.velocity).collect(),
            cursor: sim.cursor(),
            injections,
            floor_impacts: totals.floor_impacts,
            wall_impacts: totals.wall_impacts,
            contacts: totals.contacts,
            kinetic_energy: sim.kinetic_energy(),
            max_penetration: sim.max_penetration(),
            out_of_bounds: sim.out_of_bounds(),
        }
    }

    /// Resolve a check path (`body[2].vy`, `distance[0,1]`, `contacts`) to a number
    fn value(&self, path: &str) -> Result<f32, AssertionError> {
        if let Some(rest) = path.strip_prefix("body[") {
            let (index, field) = split_indexed(rest, path)?;
            let index = parse_index(index, path)?;
            let (p, v) = match (self.positions.get(index), self.velocities.get(index)) {
                (Some(p), Some(v)) => (*p, *v),
                _ => {
                    return Err(AssertionError {
                        message: format!("Body {} not found", index),
                        expected: format!("index < {}", self.positions.len()),
                        actual: path.to_string(),
                    });
                }
            };
            return match field {
                "x" => Ok(p.x),
                "y" => Ok(p.y),
                "z" => Ok(p.z),
                "vx" => Ok(v.x),
                "vy" => Ok(v.y),
                "vz" => Ok(v.z),
                "speed" => Ok(v.length()),
                _ => Err(unknown_path(path)),
            };
        }

        if let Some(rest) = path.strip_prefix("distance[") {
            let inner = rest.strip_suffix(']').ok_or_else(|| unknown_path(path))?;
            let (a, b) = inner.split_once(',').ok_or_else(|| unknown_path(path))?;
            let a = parse_index(a.trim(), path)?;
            let b = parse_index(b.trim(), path)?;
            return match (self.positions.get(a), self.positions.get(b)) {
                (Some(pa), Some(pb)) => Ok(pa.distance(*pb)),
                _ => Err(unknown_path(path)),
            };
        }

        match path {
            "frame" => Ok(self.frame as f32),
            "bodies" => Ok(self.positions.len() as f32),
            "cursor" => Ok(self.cursor as f32),
            "injections" => Ok(self.injections as f32),
            "floor_impacts" => Ok(self.floor_impacts as f32),
            "wall_impacts" => Ok(self.wall_impacts as f32),
            "contacts" => Ok(self.contacts as f32),
            "kinetic_energy" => Ok(self.kinetic_energy),
            "max_penetration" => Ok(self.max_penetration),
            "out_of_bounds" => Ok(self.out_of_bounds as f32),
            "min_y" => Ok(self
                .positions
                .iter()
                .map(|p| p.y)
                .fold(f32::INFINITY, f32::min)),
            "max_abs_x" => Ok(self.positions.iter().map(|p| p.x.abs()).fold(0.0, f32::max)),
            "max_abs_z" => Ok(self.positions.iter().map(|p| p.z.abs()).fold(0.0, f32::max)),
            _ => Err(unknown_path(path)),
        }
    }
}

fn split_indexed<'a>(rest: &'a str, path: &str) -> Result<(&'a str, &'a str), AssertionError> {
    let (index, field) = rest.split_once(']').ok_or_else(|| unknown_path(path))?;
    let field = field.strip_prefix('.').ok_or_else(|| unknown_path(path))?;
    Ok((index.trim(), field.trim()))
}

fn parse_index(s: &str, path: &str) -> Result<usize, AssertionError> {
    s.parse().map_err(|_| AssertionError {
        message: format!("Invalid index in {}", path),
        expected: "non-negative integer".to_string(),
        actual: s.to_string(),
    })
}

fn unknown_path(path: &str) -> AssertionError {
    AssertionError {
        message: format!("Unknown check path '{}'", path),
        expected: "body[i].x|y|z|vx|vy|vz|speed, distance[i,j], or an arena counter".to_string(),
        actual: path.to_string(),
    }
}

/// Parse a check string into (path, operator, value)
fn parse_check(check: &str) -> Option<(&str, &str, &str)> {
    // Two-character operators first
    for op in &[">=", "<=", "!=", "==", "=", ">", "<"] {
        if let Some(idx) = check.find(op) {
            let path = check[..idx].trim();
            let value = check[idx + op.len()..].trim();
            return Some((path, op, value));
        }
    }
    None
}

/// Check state assertions against world state
pub fn check_state(assertion: &StateAssertion, state: &WorldState) -> Result<(), AssertionError> {
    for check in &assertion.checks {
        let (path, operator, expected_value) = parse_check(check).ok_or_else(|| AssertionError {
            message: format!("Invalid check syntax: {}", check),
            expected: "format: 'path >= value', e.g. 'body[0].y >= 0.08'".to_string(),
            actual: check.clone(),
        })?;

        let actual = state.value(path)?;
        check_float_comparison(path, actual, operator, expected_value)?;
    }

    Ok(())
}

/// Equality tolerance for `==` and `!=`
const EQ_TOLERANCE: f32 = 1e-3;

/// Check float comparison with operator
fn check_float_comparison(
    path: &str,
    actual: f32,
    operator: &str,
    expected_str: &str,
) -> Result<(), AssertionError> {
    let value: f32 = expected_str.trim().parse().map_err(|_| AssertionError {
        message: format!("Invalid value for {}", path),
        expected: "number".to_string(),
        actual: expected_str.to_string(),
    })?;

    let pass = match operator {
        ">=" => actual >= value,
        "<=" => actual <= value,
        ">" => actual > value,
        "<" => actual < value,
        "=" | "==" => (actual - value).abs() < EQ_TOLERANCE,
        "!=" => (actual - value).abs() >= EQ_TOLERANCE,
        _ => false,
    };

    if !pass {
        return Err(AssertionError {
            message: format!(
                "Check failed: {} {} {} (actual: {:.4})",
                path, operator, expected_str, actual
            ),
            expected: format!("{} {} {}", path, operator, value),
            actual: format!("{:.4}", actual),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Injection;

    fn state() -> WorldState {
        WorldState {
            frame: 10,
            positions: vec![Vec3::new(0.0, 0.08, 0.0), Vec3::new(0.3, 1.0, -0.4)],
            velocities: vec![Vec3::ZERO, Vec3::new(0.0, -2.0, 0.0)],
            cursor: 1,
            injections: 3,
            ..WorldState::default()
        }
    }

    fn assertion(checks: &[&str]) -> StateAssertion {
        StateAssertion {
            after_frame: 10,
            checks: checks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!(parse_check("injections == 3"), Some(("injections", "==", "3")));
        assert_eq!(parse_check("body[0].y>=0.08"), Some(("body[0].y", ">=", "0.08")));
        assert_eq!(parse_check("cursor"), None);
    }

    #[test]
    fn test_body_and_counter_checks() {
        let s = state();
        assert!(check_state(&assertion(&["body[0].y >= 0.08", "injections == 3"]), &s).is_ok());
        assert!(check_state(&assertion(&["body[1].vy < 0", "body[1].speed = 2"]), &s).is_ok());
        assert!(check_state(&assertion(&["distance[0,1] > 0.9"]), &s).is_ok());
        assert!(check_state(&assertion(&["min_y >= 0.08", "bodies == 2"]), &s).is_ok());
    }

    #[test]
    fn test_failing_check_reports_actual() {
        let err = check_state(&assertion(&["cursor == 2"]), &state()).unwrap_err();
        assert_eq!(err.actual, "1.0000");
    }

    #[test]
    fn test_bad_paths() {
        let s = state();
        assert!(check_state(&assertion(&["body[5].y > 0"]), &s).is_err());
        assert!(check_state(&assertion(&["body[0].w > 0"]), &s).is_err());
        assert!(check_state(&assertion(&["score == 1"]), &s).is_err());
    }

    #[test]
    fn test_sequence_order_and_bounds() {
        let report = StepReport {
            injections: vec![Injection {
                controller: 1,
                body: 0,
                velocity: Vec3::NEG_Z,
            }],
            contacts: 1,
            ..StepReport::default()
        };
        let mut captured = CapturedEvent::from_report(2, &report);
        captured.extend(CapturedEvent::from_report(5, &StepReport {
            floor_impacts: 1,
            ..StepReport::default()
        }));

        let expected = vec![
            ExpectedEvent {
                event: "Injected".to_string(),
                controller: Some(1),
                body: Some(0),
                frame_min: None,
                frame_max: Some(2),
            },
            ExpectedEvent {
                event: "FloorImpact".to_string(),
                controller: None,
                body: None,
                frame_min: Some(4),
                frame_max: None,
            },
        ];
        assert!(check_sequence(&expected, &captured).is_ok());

        let wrong_hand = vec![ExpectedEvent {
            event: "Injected".to_string(),
            controller: Some(0),
            body: None,
            frame_min: None,
            frame_max: None,
        }];
        assert!(check_sequence(&wrong_hand, &captured).is_err());
    }
}
