//! Simulation configuration

use serde::{Deserialize, Serialize};

/// Configuration for a headless run or batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Frames to simulate per run
    pub frames: u64,
    /// Frame rate; every frame advances 1/fps seconds
    pub fps: u32,
    /// RNG seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Number of runs (seeds seed, seed+1, ...)
    pub runs: u32,
    /// Number of parallel threads (0 = sequential, N = N threads)
    pub parallel: usize,
    /// Controller script preset: idle, alternating or barrage
    pub script: String,
    /// Emit a Tick event every N frames (0 = never)
    pub tick_interval: u64,
    /// Use the tuning time scale instead of real time (1.0)
    pub use_time_scale: bool,
    /// Tuning file (None = config/sim_tuning.json or defaults)
    pub tuning_file: Option<String>,
    /// Output file path (None = stdout)
    pub output_file: Option<String>,
    /// Path to SQLite database for storing results
    pub db_path: Option<String>,
    /// Keep the event log for each run (stored with --db)
    pub log_events: bool,
    /// Suppress progress output
    pub quiet: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            fps: 60,
            seed: None,
            runs: 1,
            parallel: 0, // Sequential by default
            script: "alternating".to_string(),
            tick_interval: 30,
            use_time_scale: false,
            tuning_file: None,
            output_file: None,
            db_path: None,
            log_events: false,
            quiet: false,
        }
    }
}

/// Template simulation settings (checked into git)
pub const SIM_SETTINGS_TEMPLATE: &str = "config/simulation_settings.template.json";
/// Local simulation settings (gitignored, user's custom settings)
pub const SIM_SETTINGS_FILE: &str = "config/simulation_settings.json";

impl SimConfig {
    /// Load configuration from a JSON settings file
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Load configuration from default config files
    /// Priority: local settings > template settings > built-in defaults
    pub fn from_config_files() -> Self {
        if let Ok(config) = Self::from_file(SIM_SETTINGS_FILE) {
            return config;
        }
        if let Ok(config) = Self::from_file(SIM_SETTINGS_TEMPLATE) {
            return config;
        }
        Self::default()
    }

    /// Parse configuration from command line arguments
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        match Self::parse_args(Self::from_config_files(), &args) {
            Ok(config) => config,
            Err(ArgsOutcome::Help) => {
                print_help();
                std::process::exit(0);
            }
        }
    }

    /// Apply `--flag value` overrides on top of `base`.
    ///
    /// `--settings FILE` replaces the base before any other flag applies.
    pub fn parse_args(base: Self, args: &[String]) -> Result<Self, ArgsOutcome> {
        let mut config = base;

        if let Some(pos) = args.iter().position(|a| a == "--settings")
            && let Some(path) = args.get(pos + 1)
        {
            match Self::from_file(path) {
                Ok(loaded) => config = loaded,
                Err(e) => eprintln!("Warning: {}", e),
            }
        }

        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match args[i].as_str() {
                "--settings" => i += 1,
                "--frames" => {
                    if let Some(v) = value {
                        config.frames = v.parse().unwrap_or(config.frames);
                        i += 1;
                    }
                }
                "--fps" => {
                    if let Some(v) = value {
                        config.fps = v.parse().unwrap_or(config.fps);
                        i += 1;
                    }
                }
                "--seed" => {
                    if let Some(v) = value {
                        config.seed = v.parse().ok();
                        i += 1;
                    }
                }
                "--runs" => {
                    if let Some(v) = value {
                        config.runs = v.parse().unwrap_or(1);
                        i += 1;
                    }
                }
                "--parallel" => {
                    if let Some(v) = value {
                        config.parallel = v.parse().unwrap_or(0);
                        i += 1;
                    }
                }
                "--script" => {
                    if let Some(v) = value {
                        config.script = v.clone();
                        i += 1;
                    }
                }
                "--tick" => {
                    if let Some(v) = value {
                        config.tick_interval = v.parse().unwrap_or(config.tick_interval);
                        i += 1;
                    }
                }
                "--tuning" => {
                    if let Some(v) = value {
                        config.tuning_file = Some(v.clone());
                        i += 1;
                    }
                }
                "--output" => {
                    if let Some(v) = value {
                        config.output_file = Some(v.clone());
                        i += 1;
                    }
                }
                "--db" => {
                    if let Some(v) = value {
                        config.db_path = Some(v.clone());
                        i += 1;
                    }
                }
                "--time-scale" => config.use_time_scale = true,
                "--log-events" => config.log_events = true,
                "--quiet" | "-q" => config.quiet = true,
                "--help" | "-h" => return Err(ArgsOutcome::Help),
                other => eprintln!("Warning: ignoring unknown argument '{}'", other),
            }
            i += 1;
        }

        Ok(config)
    }

    /// Seconds advanced by one frame
    pub fn frame_secs(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }
}

/// Early exit from argument parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgsOutcome {
    Help,
}

fn print_help() {
    println!(
        r#"Ballroom Simulation Tool - headless runs of the body arena

USAGE:
    cargo run --bin simulate -- [OPTIONS]

OPTIONS:
    --settings <FILE>   Load settings from JSON file (CLI args override file settings)
    --frames <N>        Frames per run (default: 600)
    --fps <N>           Frames per simulated second (default: 60)
    --seed <N>          RNG seed for reproducibility
    --runs <N>          Number of runs, seeds counting up from --seed (default: 1)
    --parallel <N>      Run simulations in parallel with N threads
    --script <NAME>     Controller script: idle, alternating, barrage (default: alternating)
    --tick <N>          Sample kinetic energy every N frames (default: 30)
    --tuning <FILE>     Physics tuning JSON (default: config/sim_tuning.json)
    --time-scale        Apply the tuning time scale like the windowed app
    --output <FILE>     Output JSON to file (default: stdout)
    --db <FILE>         Store results in SQLite database
    --log-events        Keep per-run event logs (stored with --db)
    --quiet, -q         Suppress progress output
    --help, -h          Show this help

EXAMPLES:
    # Ten seconds with both hands throwing
    cargo run --bin simulate -- --frames 600 --script barrage --seed 7

    # 64 runs on 8 threads into a database
    cargo run --bin simulate -- --runs 64 --parallel 8 --db runs.db

SETTINGS FILE FORMAT (JSON):
    {{
      "frames": 1200,
      "runs": 16,
      "parallel": 4,
      "script": "barrage"
    }}
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.frames, 600);
        assert_eq!(config.script, "alternating");
        assert!((config.frame_secs() - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn test_cli_overrides() {
        let config = SimConfig::parse_args(
            SimConfig::default(),
            &args(&["--frames", "120", "--seed", "9", "--script", "barrage", "-q"]),
        )
        .unwrap();
        assert_eq!(config.frames, 120);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.script, "barrage");
        assert!(config.quiet);
    }

    #[test]
    fn test_bad_number_keeps_previous() {
        let config =
            SimConfig::parse_args(SimConfig::default(), &args(&["--frames", "lots"])).unwrap();
        assert_eq!(config.frames, 600);
    }

    #[test]
    fn test_help_short_circuits() {
        let outcome = SimConfig::parse_args(SimConfig::default(), &args(&["--help"]));
        assert_eq!(outcome, Err(ArgsOutcome::Help));
    }

    #[test]
    fn test_partial_settings_json() {
        let config: SimConfig = serde_json::from_str(r#"{ "runs": 4, "parallel": 2 }"#).unwrap();
        assert_eq!(config.runs, 4);
        assert_eq!(config.parallel, 2);
        assert_eq!(config.fps, 60);
    }
}
