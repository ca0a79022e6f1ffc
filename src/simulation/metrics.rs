//! Metrics collection for headless runs

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::{BodySimulator, LastStepReport, StepReport};
use crate::events::{EventBus, SimEvent};

/// Kinetic energy sample taken every tick interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergySample {
    pub frame: u64,
    pub kinetic_energy: f32,
}

/// Counters for a single run
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Frames simulated
    pub frames: u64,
    /// Simulated seconds (sum of step deltas)
    pub sim_time: f32,
    pub injections: u32,
    /// Floor and ceiling reflections
    pub floor_impacts: u32,
    /// Overlapping pairs resolved
    pub contacts: u32,
    /// Deepest overlap left after any frame
    pub peak_penetration: f32,
    /// Body-frames found outside the floor/wall bounds after a step
    pub bound_violations: u32,
    pub energy_samples: Vec<EnergySample>,
    pub final_kinetic_energy: f32,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed frame into the counters
    pub fn record_frame(&mut self, dt: f32, report: &StepReport, sim: &BodySimulator) {
        self.frames = sim.frame();
        self.sim_time += dt;
        self.injections += report.injections.len() as u32;
        self.floor_impacts += report.floor_impacts;
        self.contacts += report.contacts;
        self.peak_penetration = self.peak_penetration.max(sim.max_penetration());
        self.bound_violations += sim.out_of_bounds() as u32;
        self.final_kinetic_energy = sim.kinetic_energy();
    }

    pub fn sample(&mut self, frame: u64, kinetic_energy: f32) {
        self.energy_samples.push(EnergySample {
            frame,
            kinetic_energy,
        });
    }
}

/// Interval for `Tick` events and energy samples
#[derive(Resource, Debug, Clone, Copy)]
pub struct TickInterval(pub u64);

/// Record the frame the simulator just ran.
/// Skips updates where the simulator did not advance.
pub fn metrics_update(
    time: Res<Time>,
    sim: Res<BodySimulator>,
    last: Res<LastStepReport>,
    interval: Res<TickInterval>,
    mut metrics: ResMut<RunMetrics>,
    mut bus: ResMut<EventBus>,
) {
    if sim.frame() == metrics.frames {
        return;
    }

    let dt = time.delta_secs() * sim.tuning().time_scale;
    metrics.record_frame(dt, &last.0, &sim);

    if interval.0 > 0 && sim.frame() % interval.0 == 0 {
        let kinetic_energy = sim.kinetic_energy();
        metrics.sample(sim.frame(), kinetic_energy);
        bus.emit(SimEvent::Tick {
            frame: sim.frame(),
            kinetic_energy,
            max_penetration: sim.max_penetration(),
        });
    }
}

/// Result of a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// UUID v4
    pub run_id: String,
    /// ISO 8601 wall-clock start
    pub started_at: String,
    pub seed: u64,
    pub script: String,
    pub body_count: usize,
    pub metrics: RunMetrics,
    /// Wall-clock duration in milliseconds
    pub wall_ms: u64,
    /// Logged events for this run (used for DB persistence)
    #[serde(skip)]
    pub events: Vec<(u32, SimEvent)>,
}

impl RunResult {
    /// True when no body ever left the room
    pub fn contained(&self) -> bool {
        self.metrics.bound_violations == 0
    }
}

/// Aggregate over a batch of runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub runs: usize,
    pub total_frames: u64,
    pub total_injections: u64,
    pub total_contacts: u64,
    pub mean_final_energy: f32,
    pub peak_penetration: f32,
    pub bound_violations: u64,
    pub results: Vec<RunResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<RunResult>) -> Self {
        let mut summary = Self {
            runs: results.len(),
            ..Self::default()
        };

        for result in &results {
            let m = &result.metrics;
            summary.total_frames += m.frames;
            summary.total_injections += m.injections as u64;
            summary.total_contacts += m.contacts as u64;
            summary.peak_penetration = summary.peak_penetration.max(m.peak_penetration);
            summary.bound_violations += m.bound_violations as u64;
            summary.mean_final_energy += m.final_kinetic_energy;
        }
        if !results.is_empty() {
            summary.mean_final_energy /= results.len() as f32;
        }

        summary.results = results;
        summary
    }

    /// Format as ASCII table
    pub fn format_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "\n{:>20} | {:>6} | {:>7} | {:>8} | {:>10} | {:>9}\n",
            "Seed", "Frames", "Grabs", "Contacts", "Energy", "Max pen"
        ));
        output.push_str(&format!(
            "{:-<20}-+-{:-<6}-+-{:-<7}-+-{:-<8}-+-{:-<10}-+-{:-<9}\n",
            "", "", "", "", "", ""
        ));

        for result in &self.results {
            let m = &result.metrics;
            output.push_str(&format!(
                "{:>20} | {:>6} | {:>7} | {:>8} | {:>10.3} | {:>9.5}\n",
                result.seed,
                m.frames,
                m.injections,
                m.contacts,
                m.final_kinetic_energy,
                m.peak_penetration
            ));
        }

        output.push_str(&format!(
            "\n{} runs, {} grabs, mean final energy {:.3}, peak penetration {:.5}, {} bound violations\n",
            self.runs,
            self.total_injections,
            self.mean_final_energy,
            self.peak_penetration,
            self.bound_violations
        ));

        output
    }
}
