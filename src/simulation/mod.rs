//! Simulation module - headless runs of the body arena
//!
//! Runs the same step systems as the windowed app without rendering,
//! collecting metrics on containment, contacts and energy.

pub mod app_builder;
pub mod config;
pub mod db;
pub mod metrics;
pub mod parallel;
pub mod runner;
pub mod script;

pub use app_builder::HeadlessAppBuilder;
pub use config::{SIM_SETTINGS_FILE, SIM_SETTINGS_TEMPLATE, SimConfig};
pub use db::SimDatabase;
pub use metrics::{BatchSummary, EnergySample, RunMetrics, RunResult};
pub use parallel::{init_parallel, run_batch_parallel};
pub use runner::{resolve_tuning, run_once, run_simulation};
pub use script::{ControllerScript, ControllerTrack, ScriptedControllers, ScriptedPose, SelectWindow};
