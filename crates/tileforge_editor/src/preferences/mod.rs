//! Persistent editor preferences
//!
//! Stored as JSON in the platform config directory and turned into a
//! `SessionConfig` at startup.

mod file;

pub use file::PreferencesError;

use serde::{Deserialize, Serialize};
use tileforge_core::{DEFAULT_MAP_SIZE, DEFAULT_TILE_SIZE};

use crate::{SessionConfig, DEFAULT_HISTORY_CAPACITY};

/// User-tunable editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    pub show_grid: bool,
    pub show_collision: bool,
    pub autosave: bool,
    pub history_capacity: usize,
    pub default_map_width: u32,
    pub default_map_height: u32,
    pub default_tile_size: u32,
    pub initial_zoom: f32,
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_collision: false,
            autosave: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_map_width: DEFAULT_MAP_SIZE,
            default_map_height: DEFAULT_MAP_SIZE,
            default_tile_size: DEFAULT_TILE_SIZE,
            initial_zoom: 1.0,
        }
    }
}

impl EditorPreferences {
    /// Session settings for a fresh editor
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .with_map_size(self.default_map_width, self.default_map_height)
            .with_tile_size(self.default_tile_size)
            .with_history_capacity(self.history_capacity)
            .with_show_grid(self.show_grid)
            .with_show_collision(self.show_collision)
            .with_initial_zoom(self.initial_zoom)
            .with_autosave(self.autosave)
    }
}
