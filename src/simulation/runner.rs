//! Headless simulation runner

use bevy::prelude::*;
use rand::Rng;
use std::io::Write;
use std::time::Instant;

use crate::body::{BodySimulator, step_bodies};
use crate::events::{EventBus, SimConfigSnapshot, SimEvent, serialize_event};
use crate::tuning::{SimTuning, load_global_tuning, load_tuning_from_file};

use super::app_builder::HeadlessAppBuilder;
use super::config::SimConfig;
use super::db::SimDatabase;
use super::metrics::{BatchSummary, RunMetrics, RunResult, TickInterval, metrics_update};
use super::parallel::{init_parallel, run_batch_parallel};
use super::script::ControllerScript;

/// Tuning for a run: `--tuning` file, else the global tuning file, else defaults.
/// Real-time stepping unless the config asks for the time scale.
pub fn resolve_tuning(config: &SimConfig) -> Result<SimTuning, String> {
    let mut tuning = match &config.tuning_file {
        Some(path) => load_tuning_from_file(path)?,
        None => load_global_tuning(),
    };
    if !config.use_time_scale {
        tuning.time_scale = 1.0;
    }
    tuning.validate()?;
    Ok(tuning)
}

/// Run one headless simulation and return the result
pub fn run_once(config: &SimConfig, tuning: &SimTuning, seed: u64) -> Result<RunResult, String> {
    let script = ControllerScript::preset(&config.script, config.frames, config.fps as u64)?;
    let started_at = chrono::Utc::now();
    let wall = Instant::now();

    let mut builder = HeadlessAppBuilder::new()
        .with_tuning(tuning.clone())
        .with_seed(seed)
        .with_script(script)
        .with_fps(config.fps.max(1) as f32);
    if config.parallel > 0 {
        builder = builder.with_minimal_threads();
    }
    let mut app = builder.build();

    app.insert_resource(RunMetrics::new());
    app.insert_resource(TickInterval(config.tick_interval));
    app.add_systems(Update, metrics_update.after(step_bodies));

    {
        let mut bus = app.world_mut().resource_mut::<EventBus>();
        bus.set_enabled(config.log_events);
        bus.emit(SimEvent::SessionStart {
            session_id: uuid::Uuid::new_v4().to_string(),
            timestamp: started_at.to_rfc3339(),
        });
        bus.emit(SimEvent::Config(SimConfigSnapshot::from(tuning)));
        bus.emit(SimEvent::RunStart {
            seed,
            frames: config.frames,
        });
    }

    // Clock start, no simulator frame
    app.update();
    for _ in 0..config.frames {
        app.update();
    }

    let sim_frames = app.world().resource::<BodySimulator>().frame();
    if sim_frames != config.frames {
        warn!(
            "Run {} stopped at frame {} of {}",
            seed, sim_frames, config.frames
        );
    }

    let metrics = app
        .world_mut()
        .remove_resource::<RunMetrics>()
        .unwrap_or_default();

    let mut bus = app.world_mut().resource_mut::<EventBus>();
    bus.emit(SimEvent::RunEnd {
        frames: metrics.frames,
        duration: metrics.sim_time,
    });
    let events = bus.export_events();

    Ok(RunResult {
        run_id: uuid::Uuid::new_v4().to_string(),
        started_at: started_at.to_rfc3339(),
        seed,
        script: config.script.clone(),
        body_count: tuning.body_count,
        metrics,
        wall_ms: wall.elapsed().as_millis() as u64,
        events,
    })
}

/// Run sequentially with a progress line
fn run_batch_sequential(
    config: &SimConfig,
    tuning: &SimTuning,
    seeds: &[u64],
) -> Result<Vec<RunResult>, String> {
    let mut results = Vec::with_capacity(seeds.len());
    for (i, seed) in seeds.iter().enumerate() {
        if !config.quiet && seeds.len() > 1 {
            print!("\rRun {}/{}...", i + 1, seeds.len());
            std::io::stdout().flush().ok();
        }
        results.push(run_once(config, tuning, *seed)?);
    }
    if !config.quiet && seeds.len() > 1 {
        println!("\rCompleted {} runs.", seeds.len());
    }
    Ok(results)
}

/// Entry point for the simulate binary
pub fn run_simulation(config: SimConfig) -> Result<(), String> {
    let tuning = resolve_tuning(&config)?;
    // Fail on a bad script name before any app is built
    ControllerScript::preset(&config.script, config.frames, config.fps as u64)?;

    let base_seed = config.seed.unwrap_or_else(|| rand::thread_rng().r#gen());
    let seeds: Vec<u64> = (0..config.runs.max(1) as u64)
        .map(|i| base_seed.wrapping_add(i))
        .collect();

    if !config.quiet {
        println!(
            "Simulating {} bodies, {} frames at {} fps, script '{}', {} run(s) from seed {}",
            tuning.body_count,
            config.frames,
            config.fps,
            config.script,
            seeds.len(),
            base_seed
        );
    }

    let results = if config.parallel > 0 && seeds.len() > 1 {
        init_parallel(config.parallel);
        run_batch_parallel(&config, &tuning, &seeds)?
    } else {
        run_batch_sequential(&config, &tuning, &seeds)?
    };

    if let Some(db_path) = &config.db_path {
        store_results(db_path, &config, &results)?;
        if !config.quiet {
            println!("Stored {} run(s) in {}", results.len(), db_path);
        }
    }

    if results.len() == 1 {
        let json = serde_json::to_string_pretty(&results[0])
            .map_err(|e| format!("Failed to serialize result: {}", e))?;
        write_output(&json, &config)
    } else {
        let summary = BatchSummary::from_results(results);
        if !config.quiet {
            println!("{}", summary.format_table());
        }
        if config.output_file.is_some() {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| format!("Failed to serialize summary: {}", e))?;
            write_output(&json, &config)?;
        }
        Ok(())
    }
}

fn write_output(json: &str, config: &SimConfig) -> Result<(), String> {
    match &config.output_file {
        Some(output_file) => {
            std::fs::write(output_file, json)
                .map_err(|e| format!("Failed to write {}: {}", output_file, e))?;
            if !config.quiet {
                println!("Results written to {}", output_file);
            }
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn store_results(db_path: &str, config: &SimConfig, results: &[RunResult]) -> Result<(), String> {
    let db = SimDatabase::open(std::path::Path::new(db_path))
        .map_err(|e| format!("Failed to open {}: {}", db_path, e))?;
    let config_json = serde_json::to_string(config).ok();
    let session_id = db
        .create_session("simulate", config_json.as_deref())
        .map_err(|e| format!("Failed to create session: {}", e))?;

    for result in results {
        let run_id = db
            .insert_run(&session_id, result)
            .map_err(|e| format!("Failed to store run {}: {}", result.seed, e))?;
        if result.events.is_empty() {
            continue;
        }
        let lines: Vec<(u32, &str, String)> = result
            .events
            .iter()
            .map(|(time_ms, event)| (*time_ms, event.type_code(), serialize_event(*time_ms, event)))
            .collect();
        db.insert_events(run_id, &lines)
            .map_err(|e| format!("Failed to store events for run {}: {}", result.seed, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(script: &str, frames: u64) -> SimConfig {
        SimConfig {
            frames,
            script: script.to_string(),
            tick_interval: 10,
            quiet: true,
            ..SimConfig::default()
        }
    }

    fn small_tuning() -> SimTuning {
        SimTuning {
            body_count: 20,
            time_scale: 1.0,
            ..SimTuning::default()
        }
    }

    #[test]
    fn test_run_once_counts_frames_and_grabs() {
        let config = quick_config("barrage", 30);
        let result = run_once(&config, &small_tuning(), 5).unwrap();
        assert_eq!(result.metrics.frames, 30);
        assert_eq!(result.metrics.injections, 60);
        assert_eq!(result.metrics.energy_samples.len(), 3);
        assert!(result.contained());
        assert!((result.metrics.sim_time - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let config = quick_config("alternating", 60);
        let a = run_once(&config, &small_tuning(), 42).unwrap();
        let b = run_once(&config, &small_tuning(), 42).unwrap();
        assert_eq!(a.metrics.contacts, b.metrics.contacts);
        assert_eq!(a.metrics.final_kinetic_energy, b.metrics.final_kinetic_energy);
    }

    #[test]
    fn test_unknown_script_is_error() {
        let config = quick_config("juggle", 10);
        assert!(run_once(&config, &small_tuning(), 1).is_err());
    }

    #[test]
    fn test_event_log_brackets_run() {
        let config = SimConfig {
            log_events: true,
            ..quick_config("idle", 20)
        };
        let result = run_once(&config, &small_tuning(), 3).unwrap();
        let codes: Vec<&str> = result.events.iter().map(|(_, e)| e.type_code()).collect();
        assert_eq!(codes.first(), Some(&"SE"));
        assert!(codes.contains(&"RS"));
        assert!(codes.contains(&"T"));
        assert_eq!(codes.last(), Some(&"RE"));
    }

    #[test]
    fn test_events_off_by_default() {
        let result = run_once(&quick_config("barrage", 5), &small_tuning(), 3).unwrap();
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_resolve_tuning_forces_real_time() {
        let config = SimConfig {
            tuning_file: Some("config/does_not_exist.json".to_string()),
            ..SimConfig::default()
        };
        assert!(resolve_tuning(&config).is_err());

        let tuning = resolve_tuning(&SimConfig::default()).unwrap();
        assert_eq!(tuning.time_scale, 1.0);
    }
}
