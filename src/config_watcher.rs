//! Config file auto-reload system
//!
//! Polls the physics tuning file every couple of seconds and pushes new
//! values into the running simulator.

use bevy::prelude::*;
use std::fs;
use std::time::SystemTime;

use crate::body::BodySimulator;
use crate::tuning::{SIM_TUNING_FILE, load_tuning_from_file};

/// How often to check for config changes (seconds)
const CHECK_INTERVAL: f32 = 2.0;

/// Tracks modification time of the tuning file for hot-reload
#[derive(Resource)]
pub struct ConfigWatcher {
    pub path: String,
    /// Time since last check
    pub timer: f32,
    pub tuning_mtime: Option<SystemTime>,
}

impl Default for ConfigWatcher {
    fn default() -> Self {
        Self::for_path(SIM_TUNING_FILE)
    }
}

impl ConfigWatcher {
    pub fn for_path(path: &str) -> Self {
        Self {
            path: path.to_string(),
            timer: 0.0,
            tuning_mtime: get_mtime(path),
        }
    }

    /// Advance the poll timer; true when a check is due
    pub fn tick(&mut self, dt: f32) -> bool {
        self.timer += dt;
        if self.timer < CHECK_INTERVAL {
            return false;
        }
        self.timer = 0.0;
        true
    }

    /// True when the file's modification time moved since the last poll
    pub fn poll_changed(&mut self) -> bool {
        let mtime = get_mtime(&self.path);
        if mtime != self.tuning_mtime {
            self.tuning_mtime = mtime;
            return true;
        }
        false
    }
}

/// Get file modification time, or None if file doesn't exist
fn get_mtime(path: &str) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Reload tuning when the file changes.
/// Body count, radius and room size stay as created.
pub fn check_config_changes(
    time: Res<Time>,
    mut watcher: ResMut<ConfigWatcher>,
    mut sim: ResMut<BodySimulator>,
) {
    if !watcher.tick(time.delta_secs()) || !watcher.poll_changed() {
        return;
    }

    match load_tuning_from_file(&watcher.path) {
        Ok(tuning) => {
            sim.set_tuning(&tuning);
            info!("Auto-reloaded tuning from {}", watcher.path);
        }
        Err(e) => warn!("{}, keeping current tuning", e),
    }
}
