//! Scenario testing system for deterministic arena testing
//!
//! Runs TOML scenarios (bodies, controller windows, expectations)
//! against a headless simulation to verify the physics rules.

pub mod assertions;
pub mod parser;
pub mod runner;

pub use assertions::{AssertionError, CapturedEvent, WorldState, check_sequence, check_state};
pub use parser::{
    BodyDef, ControllerDef, ExpectedEvent, StateAssertion, TestDefinition, TestExpectations,
    TestSetup, parse_test_file,
};
pub use runner::{TestResult, run_test};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";
