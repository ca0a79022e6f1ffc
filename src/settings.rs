//! Persistent settings for app initialization
//!
//! Saves and loads user preferences (window size, seed, overlays)
//! to/from an init_settings.json file in the config directory.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

/// Path to the settings file
pub const SETTINGS_FILE: &str = "config/init_settings.json";

/// Persistent settings that survive between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitSettings {
    pub window_width: u32,
    pub window_height: u32,
    /// Fixed RNG seed for the initial scatter (None = random every launch)
    pub seed: Option<u64>,
    /// Draw the room outline
    pub show_room: bool,
    /// Draw controller pointers
    pub show_controllers: bool,
}

impl Default for InitSettings {
    fn default() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            seed: None,
            show_room: true,
            show_controllers: true,
        }
    }
}

impl InitSettings {
    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No {} found, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(Path::new(SETTINGS_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, json)?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }
}

/// Resource tracking the current init settings (for change detection)
#[derive(Resource)]
pub struct CurrentSettings {
    pub settings: InitSettings,
    pub dirty: bool,
}

impl Default for CurrentSettings {
    fn default() -> Self {
        Self {
            settings: InitSettings::load(),
            dirty: false,
        }
    }
}

impl CurrentSettings {
    /// Mark settings as changed (will be saved on next update)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn save_if_dirty(&mut self) {
        if self.dirty {
            if let Err(e) = self.settings.save() {
                warn!("Failed to save settings: {}", e);
            }
            self.dirty = false;
        }
    }
}

/// Toggle overlays: F1 room outline, F2 controller pointers
pub fn toggle_overlays(keyboard: Res<ButtonInput<KeyCode>>, mut current: ResMut<CurrentSettings>) {
    if keyboard.just_pressed(KeyCode::F1) {
        current.settings.show_room = !current.settings.show_room;
        current.mark_dirty();
    }
    if keyboard.just_pressed(KeyCode::F2) {
        current.settings.show_controllers = !current.settings.show_controllers;
        current.mark_dirty();
    }
}

/// System to save settings when changed
pub fn save_settings_system(mut settings: ResMut<CurrentSettings>) {
    settings.save_if_dirty();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("ballroom-settings-{}", uuid::Uuid::new_v4()));
        let path = dir.join("init_settings.json");
        let settings = InitSettings {
            window_width: 800,
            seed: Some(99),
            show_room: false,
            ..InitSettings::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = InitSettings::load_from(&path);
        assert_eq!(loaded, settings);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let loaded = InitSettings::load_from(Path::new("config/nowhere/settings.json"));
        assert_eq!(loaded, InitSettings::default());
    }

    #[test]
    fn test_old_file_without_new_fields() {
        let loaded: InitSettings = serde_json::from_str(r#"{ "window_width": 1280 }"#).unwrap();
        assert_eq!(loaded.window_width, 1280);
        assert!(loaded.show_room);
    }
}
