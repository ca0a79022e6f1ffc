//! Headless App Builder
//!
//! Provides a reusable builder for creating headless Bevy apps that run the
//! same step systems as the windowed app. Used by the simulation runner, the
//! scenario runner and parallel batches.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use crate::body::{Body, BodySimulator, LastStepReport, step_bodies};
use crate::events::{EventBus, update_event_bus_time};
use crate::input::ControllerInputs;
use crate::tuning::SimTuning;

use super::script::{ControllerScript, ScriptedControllers, apply_controller_script};

/// Builder for creating headless Bevy apps
pub struct HeadlessAppBuilder {
    tuning: SimTuning,
    seed: Option<u64>,
    bodies: Option<Vec<Body>>,
    script: Option<ControllerScript>,
    fps: f32,
    minimal_threads: bool,
    logging: bool,
}

impl Default for HeadlessAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAppBuilder {
    pub fn new() -> Self {
        Self {
            tuning: SimTuning::default(),
            seed: None,
            bodies: None,
            script: None,
            fps: 60.0,
            minimal_threads: false,
            logging: false,
        }
    }

    pub fn with_tuning(mut self, tuning: SimTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start from explicit bodies instead of a random scatter
    pub fn with_bodies(mut self, bodies: Vec<Body>) -> Self {
        self.bodies = Some(bodies);
        self
    }

    /// Drive the controllers from a script
    pub fn with_script(mut self, script: ControllerScript) -> Self {
        self.script = Some(script);
        self
    }

    /// Set the frame rate (default: 60). Every update advances exactly 1/fps.
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Enable minimal thread mode (task pools = 1)
    ///
    /// Use this when running many apps in parallel to avoid hitting OS thread limits.
    pub fn with_minimal_threads(mut self) -> Self {
        self.minimal_threads = true;
        self
    }

    /// Route `info!`/`warn!` output to the console
    pub fn with_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Build the app.
    ///
    /// The first `update()` only starts the clock (zero delta, skipped by
    /// the simulator); every later update runs one simulator frame.
    pub fn build(self) -> App {
        let mut app = App::new();
        let fps = if self.fps > 0.0 { self.fps } else { 60.0 };
        let frame = Duration::from_secs_f32(1.0 / fps);

        if self.minimal_threads {
            app.add_plugins(
                MinimalPlugins
                    .set(ScheduleRunnerPlugin::run_loop(frame))
                    .set(TaskPoolPlugin {
                        task_pool_options: TaskPoolOptions::with_num_threads(1),
                    }),
            );
        } else {
            app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)));
        }

        if self.logging {
            app.add_plugins(bevy::log::LogPlugin::default());
        }

        app.insert_resource(TimeUpdateStrategy::ManualDuration(frame));

        let simulator = match self.bodies {
            Some(bodies) => BodySimulator::with_bodies(bodies, self.tuning, self.seed),
            None => BodySimulator::new(self.tuning, self.seed),
        };
        app.insert_resource(simulator);
        app.init_resource::<ControllerInputs>();
        app.init_resource::<LastStepReport>();
        app.insert_resource(EventBus::new());

        if let Some(script) = self.script {
            app.insert_resource(ScriptedControllers(script));
        }

        app.add_systems(
            Update,
            (
                update_event_bus_time,
                apply_controller_script.run_if(resource_exists::<ScriptedControllers>),
                step_bodies,
            )
                .chain(),
        );

        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BODY_RADIUS;

    #[test]
    fn test_builder_creates_app() {
        let app = HeadlessAppBuilder::new().with_seed(1).build();
        assert!(app.world().contains_resource::<BodySimulator>());
        assert!(app.world().contains_resource::<EventBus>());
        assert!(!app.world().contains_resource::<ScriptedControllers>());
    }

    #[test]
    fn test_minimal_threads_creates_app() {
        let app = HeadlessAppBuilder::new().with_minimal_threads().build();
        assert!(app.world().contains_resource::<BodySimulator>());
    }

    #[test]
    fn test_updates_advance_simulator() {
        let tuning = SimTuning {
            time_scale: 1.0,
            ..SimTuning::default()
        };
        let bodies = vec![Body::at_rest(Vec3::new(0.0, 5.0, 0.0), BODY_RADIUS)];
        let mut app = HeadlessAppBuilder::new()
            .with_tuning(tuning)
            .with_bodies(bodies)
            .with_fps(10.0)
            .build();

        // Clock start
        app.update();
        assert_eq!(app.world().resource::<BodySimulator>().frame(), 0);

        app.update();
        let sim = app.world().resource::<BodySimulator>();
        assert_eq!(sim.frame(), 1);
        let body = sim.body(0).unwrap();
        assert!((body.position.y - 5.0).abs() < 1e-5);
        assert!((body.velocity.y + 0.98).abs() < 1e-3);
    }

    #[test]
    fn test_script_injects_through_systems() {
        let mut app = HeadlessAppBuilder::new()
            .with_seed(11)
            .with_script(ControllerScript::barrage(3))
            .build();

        for _ in 0..4 {
            app.update();
        }

        let sim = app.world().resource::<BodySimulator>();
        assert_eq!(sim.frame(), 3);
        // Two hands, three frames
        assert_eq!(sim.cursor(), 6);
        assert!(app.world().resource::<EventBus>().pending_count() >= 6);
    }
}
