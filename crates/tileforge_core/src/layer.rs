//! Tile layers

use serde::{Deserialize, Serialize};

/// Tile value for a cell with no tile
pub const EMPTY_TILE: i32 = -1;

/// Check if a tile value denotes an empty cell
#[inline]
pub fn is_empty_tile(tile: i32) -> bool {
    tile < 0
}

/// A single full-grid plane of tile indices and collision flags
///
/// `data` and `collision` are row-major and always hold exactly
/// `width * height` cells of the owning map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub data: Vec<i32>,
    pub collision: Vec<u8>,
}

impl Layer {
    /// Create an empty layer sized for a `width` x `height` grid
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            name: name.into(),
            visible: true,
            opacity: 1.0,
            data: vec![EMPTY_TILE; size],
            collision: vec![0; size],
        }
    }

    /// Number of cells in this layer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if any cell holds a tile
    pub fn has_tiles(&self) -> bool {
        self.data.iter().any(|&t| !is_empty_tile(t))
    }

    /// Copy of this layer resized to `new_width` x `new_height`.
    ///
    /// Builds fresh arrays; the overlapping top-left region keeps its values and
    /// every other cell is empty and uncollidable.
    pub fn resized(&self, old_width: u32, old_height: u32, new_width: u32, new_height: u32) -> Self {
        let mut layer = Layer::new(self.name.clone(), new_width, new_height);
        layer.visible = self.visible;
        layer.opacity = self.opacity;

        let copy_w = old_width.min(new_width) as usize;
        let copy_h = old_height.min(new_height) as usize;
        let (old_w, new_w) = (old_width as usize, new_width as usize);

        for y in 0..copy_h {
            let src = y * old_w..y * old_w + copy_w;
            let dst = y * new_w..y * new_w + copy_w;
            layer.data[dst.clone()].copy_from_slice(&self.data[src.clone()]);
            layer.collision[dst].copy_from_slice(&self.collision[src]);
        }

        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer() {
        let layer = Layer::new("Ground", 10, 10);

        assert_eq!(layer.name, "Ground");
        assert!(layer.visible);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.len(), 100);
        assert_eq!(layer.collision.len(), 100);
        assert!(layer.data.iter().all(|&t| t == EMPTY_TILE));
        assert!(!layer.has_tiles());
    }

    #[test]
    fn test_resized_keeps_overlap() {
        let mut layer = Layer::new("Ground", 3, 2);
        layer.data = vec![0, 1, 2, 3, 4, 5];
        layer.collision = vec![1, 0, 1, 0, 1, 0];
        layer.visible = false;

        let grown = layer.resized(3, 2, 4, 3);
        assert_eq!(grown.data, vec![0, 1, 2, -1, 3, 4, 5, -1, -1, -1, -1, -1]);
        assert_eq!(grown.collision, vec![1, 0, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
        assert!(!grown.visible);

        let shrunk = layer.resized(3, 2, 2, 1);
        assert_eq!(shrunk.data, vec![0, 1]);
        assert_eq!(shrunk.collision, vec![1, 0]);
    }
}
