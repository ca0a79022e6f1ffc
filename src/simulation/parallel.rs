//! Parallel simulation execution
//!
//! Uses Rayon to run multiple simulations concurrently.
//! Each simulation runs in its own Bevy app with minimal threading
//! to avoid hitting OS thread limits.

use bevy::log::warn;
use rayon::prelude::*;

use crate::tuning::SimTuning;

use super::config::SimConfig;
use super::metrics::RunResult;
use super::runner::run_once;

/// Initialize parallel execution with the given thread count.
/// Call this once at startup before running parallel simulations.
/// With 0 threads Rayon picks the count itself.
pub fn init_parallel(threads: usize) {
    if threads == 0 {
        return;
    }
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!("Rayon pool already initialized ({}), keeping it", e);
    }
}

/// Run one simulation per seed in parallel.
///
/// Returns results in the same order as `seeds`; the first failure wins.
pub fn run_batch_parallel(
    config: &SimConfig,
    tuning: &SimTuning,
    seeds: &[u64],
) -> Result<Vec<RunResult>, String> {
    let mut config = config.clone();
    if config.parallel == 0 {
        // Force single-threaded task pools inside each app
        config.parallel = 1;
    }

    seeds
        .par_iter()
        .map(|seed| run_once(&config, tuning, *seed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_matches_sequential() {
        let config = SimConfig {
            frames: 20,
            script: "barrage".to_string(),
            quiet: true,
            ..SimConfig::default()
        };
        let tuning = SimTuning {
            body_count: 16,
            time_scale: 1.0,
            ..SimTuning::default()
        };
        let seeds = [3, 4, 5];

        let parallel = run_batch_parallel(&config, &tuning, &seeds).unwrap();
        assert_eq!(parallel.len(), 3);
        for (result, seed) in parallel.iter().zip(seeds) {
            assert_eq!(result.seed, seed);
            let single = run_once(&config, &tuning, seed).unwrap();
            assert_eq!(single.metrics.contacts, result.metrics.contacts);
            assert_eq!(single.metrics.injections, 40);
        }
    }

    #[test]
    fn test_bad_script_fails_batch() {
        let config = SimConfig {
            script: "nope".to_string(),
            ..SimConfig::default()
        };
        assert!(run_batch_parallel(&config, &SimTuning::default(), &[1, 2]).is_err());
    }
}
