//! tileforge_editor - Tile map editing engine
//!
//! This crate provides the editing core of a layered tile map painter:
//! - `Session` owning the map, atlas, history and viewport
//! - Brush, erase, bucket fill, rectangle and picker tools
//! - Snapshot-based undo/redo
//! - Pan/zoom viewport with screen to tile mapping
//! - Software rendering of the map, grid and collision overlays
//! - Project save/load, autosave, PNG and Tiled TMX export
//!
//! # Usage
//!
//! ```rust,ignore
//! use tileforge_editor::{EditorTool, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default())?;
//! session.select_tool(EditorTool::Brush);
//! session.set_selected_tile(3);
//! session.pointer_down(10.0, 10.0);
//! session.pointer_up(10.0, 10.0);
//! let png = session.export_raster(2.0)?;
//! ```

pub mod commands;
pub mod export;
pub mod preferences;
pub mod project;
pub mod render;
mod session;
pub mod tileset;
pub mod tools;
pub mod viewport;

// Re-export core types
pub use tileforge_core;

pub use commands::{History, Modifiers, Snapshot, DEFAULT_HISTORY_CAPACITY};
pub use session::{LayerSummary, Session, SessionStatus};
pub use tileset::Atlas;
pub use tools::EditorTool;
pub use viewport::Viewport;

use std::path::PathBuf;
use thiserror::Error;
use tileforge_core::{CoreError, DEFAULT_MAP_SIZE, DEFAULT_TILE_SIZE};

/// Errors surfaced to the code driving a session
#[derive(Debug, Error)]
pub enum EditorError {
    /// Map or tile dimensions out of range on resize or import
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Imported project is missing fields or has inconsistent arrays
    #[error("malformed project: {0}")]
    MalformedProject(String),
    /// Tileset image bytes could not be decoded
    #[error("failed to decode atlas image: {0}")]
    AtlasDecodeFailure(String),
    /// Attempt to remove the last layer
    #[error("a map must keep at least one layer")]
    MinimumLayerViolation,
    #[error("no layer at index {0}")]
    NoSuchLayer(usize),
    /// Autosave location could not be read or written
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("image encode error: {0}")]
    Encode(String),
}

impl From<CoreError> for EditorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidGeometry(msg) => EditorError::InvalidGeometry(msg),
            CoreError::MalformedProject(msg) => EditorError::MalformedProject(msg),
            CoreError::MinimumLayerViolation => EditorError::MinimumLayerViolation,
            CoreError::NoSuchLayer(index) => EditorError::NoSuchLayer(index),
        }
    }
}

/// Configuration for a new editing session
///
/// Use this to customize the starting map and display settings.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Map width in tiles. Default: 32
    pub map_width: u32,
    /// Map height in tiles. Default: 32
    pub map_height: u32,
    /// Tile edge in pixels. Default: 32
    pub tile_size: u32,
    /// Maximum number of undo entries. Default: 120
    pub history_capacity: usize,
    /// Whether to draw the grid overlay. Default: true
    pub show_grid: bool,
    /// Whether to draw collision overlays. Default: false
    pub show_collision: bool,
    /// Initial zoom level (0.25 to 3.0). Default: 1.0
    pub initial_zoom: f32,
    /// Whether to write an autosave after every history entry. Default: false
    pub autosave: bool,
    /// Autosave file. If None, the platform data directory is used.
    pub autosave_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            map_width: DEFAULT_MAP_SIZE,
            map_height: DEFAULT_MAP_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            show_grid: true,
            show_collision: false,
            initial_zoom: 1.0,
            autosave: false,
            autosave_path: None,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting map size in tiles
    pub fn with_map_size(mut self, width: u32, height: u32) -> Self {
        self.map_width = width;
        self.map_height = height;
        self
    }

    /// Set the tile edge in pixels
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the maximum number of undo entries (at least 1)
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    /// Set whether to show the grid (default: true)
    pub fn with_show_grid(mut self, show: bool) -> Self {
        self.show_grid = show;
        self
    }

    /// Set whether to show collision overlays (default: false)
    pub fn with_show_collision(mut self, show: bool) -> Self {
        self.show_collision = show;
        self
    }

    /// Set the initial zoom level
    pub fn with_initial_zoom(mut self, zoom: f32) -> Self {
        self.initial_zoom = viewport::clamp_zoom(zoom);
        self
    }

    /// Enable or disable autosave
    pub fn with_autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }

    /// Write autosaves to a specific file (also enables autosave)
    pub fn with_autosave_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.autosave = true;
        self.autosave_path = Some(path.into());
        self
    }
}
