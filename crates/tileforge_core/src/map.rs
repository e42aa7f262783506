//! Tile map holding the ordered layer stack

use crate::{is_empty_tile, CoreError, Layer};
use serde::{Deserialize, Serialize};

/// Largest supported map width or height, in tiles
pub const MAX_MAP_DIMENSION: u32 = 256;
/// Largest supported tile edge, in pixels
pub const MAX_TILE_SIZE: u32 = 256;
/// Width and height of a freshly created map
pub const DEFAULT_MAP_SIZE: u32 = 32;
/// Tile edge of a freshly created map
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// Check map and tile dimensions against the supported bounds
pub fn validate_geometry(width: u32, height: u32, tile_size: u32) -> Result<(), CoreError> {
    if width == 0 || height == 0 || width > MAX_MAP_DIMENSION || height > MAX_MAP_DIMENSION {
        return Err(CoreError::InvalidGeometry(format!(
            "map size {}x{} must be within 1..={}",
            width, height, MAX_MAP_DIMENSION
        )));
    }
    if tile_size == 0 || tile_size > MAX_TILE_SIZE {
        return Err(CoreError::InvalidGeometry(format!(
            "tile size {} must be within 1..={}",
            tile_size, MAX_TILE_SIZE
        )));
    }
    Ok(())
}

/// A layered tile grid
///
/// Layer 0 is drawn first (bottom). There is always at least one layer and
/// `active_layer` always points at one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) tile_size: u32,
    pub(crate) layers: Vec<Layer>,
    pub(crate) active_layer: usize,
}

impl Default for TileMap {
    fn default() -> Self {
        Self::build_default_layers(DEFAULT_MAP_SIZE, DEFAULT_MAP_SIZE, DEFAULT_TILE_SIZE)
    }
}

impl TileMap {
    /// Create a map with a single empty layer
    pub fn new(width: u32, height: u32, tile_size: u32) -> Result<Self, CoreError> {
        validate_geometry(width, height, tile_size)?;
        Ok(Self {
            width,
            height,
            tile_size,
            layers: vec![Layer::new("Layer 1", width, height)],
            active_layer: 0,
        })
    }

    /// Create a map with the editor's starting layers: Ground, Objects and Top
    pub fn with_default_layers(width: u32, height: u32, tile_size: u32) -> Result<Self, CoreError> {
        validate_geometry(width, height, tile_size)?;
        Ok(Self::build_default_layers(width, height, tile_size))
    }

    fn build_default_layers(width: u32, height: u32, tile_size: u32) -> Self {
        let layers = ["Ground", "Objects", "Top"]
            .into_iter()
            .map(|name| Layer::new(name, width, height))
            .collect();
        Self {
            width,
            height,
            tile_size,
            layers,
            active_layer: 0,
        }
    }

    /// Assemble a map from already-built layers, checking every invariant
    pub fn from_layers(
        width: u32,
        height: u32,
        tile_size: u32,
        layers: Vec<Layer>,
    ) -> Result<Self, CoreError> {
        let map = Self {
            width,
            height,
            tile_size,
            layers,
            active_layer: 0,
        };
        map.validate()?;
        Ok(map)
    }

    /// Check geometry bounds, layer count and per-layer array lengths
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_geometry(self.width, self.height, self.tile_size)?;
        if self.layers.is_empty() {
            return Err(CoreError::MalformedProject(
                "a map needs at least one layer".to_string(),
            ));
        }
        let expected = self.cell_count();
        for layer in &self.layers {
            if layer.data.len() != expected || layer.collision.len() != expected {
                return Err(CoreError::MalformedProject(format!(
                    "layer '{}' has {} tiles and {} collision flags, expected {}",
                    layer.name,
                    layer.data.len(),
                    layer.collision.len(),
                    expected
                )));
            }
            if let Some(bad) = layer.data.iter().find(|&&t| t < -1) {
                return Err(CoreError::MalformedProject(format!(
                    "layer '{}' holds invalid tile index {}",
                    layer.name, bad
                )));
            }
        }
        if self.active_layer >= self.layers.len() {
            return Err(CoreError::MalformedProject(format!(
                "active layer {} out of range",
                self.active_layer
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Map size in pixels at zoom 1
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width * self.tile_size, self.height * self.tile_size)
    }

    /// Number of cells in every layer
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Get layer by index
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Get mutable layer by index
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn active_layer(&self) -> usize {
        self.active_layer
    }

    /// Select the layer that editing tools paint on. Out-of-range indices are ignored.
    pub fn set_active_layer(&mut self, index: usize) -> bool {
        if index < self.layers.len() {
            self.active_layer = index;
            true
        } else {
            false
        }
    }

    /// Check if a coordinate lies on the grid
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Row-major cell index for an on-grid coordinate
    #[inline]
    pub fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get tile at position for a specific layer
    pub fn get_tile(&self, layer_index: usize, x: i32, y: i32) -> Option<i32> {
        let idx = self.cell_index(x, y)?;
        self.layers.get(layer_index).map(|layer| layer.data[idx])
    }

    /// Set tile at position for a specific layer.
    ///
    /// Returns true if the cell changed; off-grid writes are ignored.
    pub fn set_tile(&mut self, layer_index: usize, x: i32, y: i32, tile: i32) -> bool {
        let Some(idx) = self.cell_index(x, y) else {
            return false;
        };
        let Some(layer) = self.layers.get_mut(layer_index) else {
            return false;
        };
        let tile = tile.max(-1);
        if layer.data[idx] == tile {
            return false;
        }
        layer.data[idx] = tile;
        true
    }

    /// Get the collision flag at position for a specific layer
    pub fn get_collision(&self, layer_index: usize, x: i32, y: i32) -> Option<bool> {
        let idx = self.cell_index(x, y)?;
        self.layers
            .get(layer_index)
            .map(|layer| layer.collision[idx] != 0)
    }

    /// Set the collision flag at position for a specific layer
    pub fn set_collision(&mut self, layer_index: usize, x: i32, y: i32, solid: bool) -> bool {
        let Some(idx) = self.cell_index(x, y) else {
            return false;
        };
        let Some(layer) = self.layers.get_mut(layer_index) else {
            return false;
        };
        let flag = u8::from(solid);
        if layer.collision[idx] == flag {
            return false;
        }
        layer.collision[idx] = flag;
        true
    }

    /// First non-empty tile at a cell, searching from the top layer down.
    ///
    /// Hidden layers are included. Returns None when every layer is empty
    /// there or the coordinate is off the grid.
    pub fn topmost_tile(&self, x: i32, y: i32) -> Option<i32> {
        let idx = self.cell_index(x, y)?;
        self.layers
            .iter()
            .rev()
            .map(|layer| layer.data[idx])
            .find(|&t| !is_empty_tile(t))
    }

    /// Resize every layer, keeping the overlapping top-left region
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CoreError> {
        validate_geometry(width, height, self.tile_size)?;
        let layers = self
            .layers
            .iter()
            .map(|layer| layer.resized(self.width, self.height, width, height))
            .collect();
        self.layers = layers;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Default name for the next added layer
    pub fn next_layer_name(&self) -> String {
        format!("Layer {}", self.layers.len() + 1)
    }

    /// Append an empty layer on top and return its index
    pub fn add_layer(&mut self, name: Option<String>) -> usize {
        let name = name.unwrap_or_else(|| self.next_layer_name());
        self.layers.push(Layer::new(name, self.width, self.height));
        self.layers.len() - 1
    }

    /// Remove a layer by index.
    ///
    /// The last remaining layer is never removed. Removing the active layer
    /// activates the one below it; otherwise the active layer stays selected.
    pub fn remove_layer(&mut self, index: usize) -> Option<Layer> {
        if self.layers.len() <= 1 || index >= self.layers.len() {
            return None;
        }
        let removed = self.layers.remove(index);
        if index < self.active_layer || (index == self.active_layer && self.active_layer > 0) {
            self.active_layer -= 1;
        }
        self.active_layer = self.active_layer.min(self.layers.len() - 1);
        Some(removed)
    }

    /// Like `remove_layer`, but reports why nothing was removed
    pub fn try_remove_layer(&mut self, index: usize) -> Result<Layer, CoreError> {
        if index >= self.layers.len() {
            return Err(CoreError::NoSuchLayer(index));
        }
        self.remove_layer(index)
            .ok_or(CoreError::MinimumLayerViolation)
    }

    /// Rename a layer
    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> bool {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.name = name.into();
            true
        } else {
            false
        }
    }

    /// Show or hide a layer
    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) if layer.visible != visible => {
                layer.visible = visible;
                true
            }
            _ => false,
        }
    }

    /// Toggle layer visibility
    pub fn toggle_layer_visibility(&mut self, index: usize) -> bool {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.visible = !layer.visible;
            true
        } else {
            false
        }
    }

    /// Set layer opacity, clamped to [0, 1]
    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> bool {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.opacity = opacity.clamp(0.0, 1.0);
            true
        } else {
            false
        }
    }

    /// Move a layer up in paint order (toward the top of the stack)
    pub fn move_layer_up(&mut self, index: usize) -> bool {
        if index + 1 < self.layers.len() {
            self.swap_layers(index, index + 1);
            true
        } else {
            false
        }
    }

    /// Move a layer down in paint order (toward index 0)
    pub fn move_layer_down(&mut self, index: usize) -> bool {
        if index > 0 && index < self.layers.len() {
            self.swap_layers(index, index - 1);
            true
        } else {
            false
        }
    }

    fn swap_layers(&mut self, a: usize, b: usize) {
        self.layers.swap(a, b);
        if self.active_layer == a {
            self.active_layer = b;
        } else if self.active_layer == b {
            self.active_layer = a;
        }
    }

    /// Replace geometry and layers wholesale, keeping the active layer in range
    pub fn replace_contents(&mut self, width: u32, height: u32, tile_size: u32, layers: Vec<Layer>) {
        self.width = width;
        self.height = height;
        self.tile_size = tile_size;
        self.layers = layers;
        if self.layers.is_empty() {
            self.layers.push(Layer::new("Layer 1", width, height));
        }
        self.active_layer = self.active_layer.min(self.layers.len() - 1);
    }

    /// Compare grid contents, ignoring which layer is active
    pub fn same_contents(&self, other: &TileMap) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.tile_size == other.tile_size
            && self.layers == other.layers
    }
}
