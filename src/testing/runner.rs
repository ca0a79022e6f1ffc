//! Scenario execution engine

use crate::body::{BodySimulator, LastStepReport, StepReport};
use crate::simulation::HeadlessAppBuilder;

use super::assertions::{AssertionError, CapturedEvent, WorldState, check_sequence, check_state};
use super::parser::{StateAssertion, TestDefinition};

/// Seed used when a scenario scatters bodies without naming one
const DEFAULT_SCENARIO_SEED: u64 = 0;

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    Pass { frames: u64 },
    Fail { error: AssertionError },
    Error { message: String },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }
}

/// Running totals while a scenario steps
#[derive(Default)]
struct Capture {
    events: Vec<CapturedEvent>,
    totals: StepReport,
    injections: u32,
}

impl Capture {
    fn record(&mut self, frame: u64, report: &StepReport) {
        self.events.extend(CapturedEvent::from_report(frame, report));
        self.injections += report.injections.len() as u32;
        self.totals.floor_impacts += report.floor_impacts;
        self.totals.wall_impacts += report.wall_impacts;
        self.totals.contacts += report.contacts;
    }
}

/// Run a single scenario and return the result
pub fn run_test(test: &TestDefinition) -> TestResult {
    let tuning = match test.setup.tuning() {
        Ok(tuning) => tuning,
        Err(message) => return TestResult::Error { message },
    };
    let script = match test.script() {
        Ok(script) => script,
        Err(message) => return TestResult::Error { message },
    };

    let mut builder = HeadlessAppBuilder::new()
        .with_tuning(tuning.clone())
        .with_seed(test.setup.seed.unwrap_or(DEFAULT_SCENARIO_SEED))
        .with_script(script)
        .with_fps(test.setup.fps)
        .with_minimal_threads();
    if let Some(bodies) = test.setup.bodies(tuning.body_radius) {
        builder = builder.with_bodies(bodies);
    }
    let mut app = builder.build();

    // Clock start, no simulator frame
    app.update();

    let mut assertions: Vec<&StateAssertion> = test.expect.state.iter().collect();
    assertions.sort_by_key(|a| a.after_frame);
    let mut next_check = 0;

    let frames = test.frames();
    let mut capture = Capture::default();

    loop {
        let frame = app.world().resource::<BodySimulator>().frame();

        while next_check < assertions.len() && assertions[next_check].after_frame <= frame {
            let state = WorldState::capture(
                app.world().resource::<BodySimulator>(),
                &capture.totals,
                capture.injections,
            );
            if let Err(error) = check_state(assertions[next_check], &state) {
                return TestResult::Fail { error };
            }
            next_check += 1;
        }

        if frame >= frames {
            break;
        }

        app.update();

        if app.world().resource::<BodySimulator>().frame() != frame + 1 {
            return TestResult::Error {
                message: format!("Simulator did not advance past frame {}", frame),
            };
        }
        capture.record(frame, &app.world().resource::<LastStepReport>().0);
    }

    if let Err(error) = check_sequence(&test.expect.sequence, &capture.events) {
        return TestResult::Fail { error };
    }

    TestResult::Pass { frames }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(toml: &str) -> TestResult {
        let def: TestDefinition = toml::from_str(toml).unwrap();
        run_test(&def)
    }

    #[test]
    fn test_integration_order_passes() {
        let result = run(r#"
name = "Integration order"
[setup]
fps = 10.0
[[setup.bodies]]
x = 0.0
y = 5.0
z = 0.0
[[expect.state]]
after_frame = 1
checks = ["body[0].y == 5.0", "body[0].vy == -0.98"]
"#);
        assert!(result.is_pass(), "{:?}", result);
    }

    #[test]
    fn test_round_robin_passes() {
        let result = run(r#"
name = "Round robin"
[setup]
count = 3
seed = 4
[[controllers]]
index = 0
select = [[0, 4]]
[[expect.state]]
after_frame = 4
checks = ["injections == 4", "cursor == 1"]
[[expect.sequence]]
event = "Injected"
controller = 0
body = 0
frame_max = 0
[[expect.sequence]]
event = "Injected"
body = 0
frame_min = 3
"#);
        assert!(result.is_pass(), "{:?}", result);
    }

    #[test]
    fn test_failing_check_is_fail() {
        let result = run(r#"
name = "Wrong"
[setup]
count = 2
[[expect.state]]
after_frame = 2
checks = ["frame == 3"]
"#);
        assert!(matches!(result, TestResult::Fail { .. }));
    }

    #[test]
    fn test_bad_tuning_is_error() {
        let result = run(r#"
name = "Bad"
[setup.tuning]
wobble = 1.0
"#);
        assert!(matches!(result, TestResult::Error { .. }));
    }

    #[test]
    fn test_cramped_room_is_error() {
        let result = run(r#"
name = "Cramped"
[setup]
count = 3
[setup.tuning]
room_side = 0.1
"#);
        match result {
            TestResult::Error { message } => assert!(message.contains("room_side"), "{}", message),
            other => panic!("expected an error, got {:?}", other),
        }
    }

    #[test]
    fn test_frame_zero_checks_initial_state() {
        let result = run(r#"
name = "Initial"
[setup]
[[setup.bodies]]
x = 1.0
y = 2.0
z = 0.5
[[expect.state]]
after_frame = 0
checks = ["body[0].x == 1.0", "frame == 0"]
"#);
        assert!(result.is_pass(), "{:?}", result);
    }
}
