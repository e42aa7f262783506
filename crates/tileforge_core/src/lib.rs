//! Core data structures for TileForge
//!
//! This crate provides the fundamental types for representing layered tile maps:
//! - `TileMap` - The editable grid with its ordered layers
//! - `Layer` - A single plane of tile indices plus collision flags
//! - `ProjectFile` - The JSON project format used for save/load and autosave
//! - `CoreError` - Geometry and import failures

mod error;
mod layer;
mod map;
pub mod project;

pub use error::CoreError;
pub use layer::{is_empty_tile, Layer, EMPTY_TILE};
pub use map::{
    validate_geometry, TileMap, DEFAULT_MAP_SIZE, DEFAULT_TILE_SIZE, MAX_MAP_DIMENSION,
    MAX_TILE_SIZE,
};
pub use project::{LayerFile, ProjectFile, ProjectMeta};
