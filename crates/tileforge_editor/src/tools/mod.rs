//! Editor tools - brush, erase, bucket fill, rectangle and picker
//!
//! Every operation works on the active layer of a `TileMap` and returns the
//! number of cells it changed. Off-grid coordinates are skipped silently since
//! pointer drags routinely leave the map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tileforge_core::{is_empty_tile, TileMap, EMPTY_TILE};

use crate::EditorError;

/// Largest brush edge, in tiles
pub const MAX_BRUSH_SIZE: u32 = 16;

/// The active editing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorTool {
    #[default]
    Brush,
    Erase,
    Bucket,
    Rect,
    Picker,
}

impl EditorTool {
    /// Returns all tools for UI enumeration
    pub fn all() -> &'static [EditorTool] {
        &[
            EditorTool::Brush,
            EditorTool::Erase,
            EditorTool::Bucket,
            EditorTool::Rect,
            EditorTool::Picker,
        ]
    }

    /// Tag used by the UI layer
    pub fn name(&self) -> &'static str {
        match self {
            EditorTool::Brush => "brush",
            EditorTool::Erase => "erase",
            EditorTool::Bucket => "bucket",
            EditorTool::Rect => "rect",
            EditorTool::Picker => "picker",
        }
    }

    /// Get display name for UI
    pub fn label(&self) -> &'static str {
        match self {
            EditorTool::Brush => "Brush",
            EditorTool::Erase => "Erase",
            EditorTool::Bucket => "Bucket Fill",
            EditorTool::Rect => "Rectangle",
            EditorTool::Picker => "Picker",
        }
    }

    /// Single-key shortcut
    pub fn shortcut_key(&self) -> char {
        match self {
            EditorTool::Brush => 'b',
            EditorTool::Erase => 'e',
            EditorTool::Bucket => 'f',
            EditorTool::Rect => 'r',
            EditorTool::Picker => 'p',
        }
    }

    pub fn from_shortcut(key: char) -> Option<EditorTool> {
        let key = key.to_ascii_lowercase();
        Self::all().iter().copied().find(|t| t.shortcut_key() == key)
    }

    /// Returns true if this tool changes tiles
    pub fn mutates_grid(&self) -> bool {
        !matches!(self, EditorTool::Picker)
    }
}

impl fmt::Display for EditorTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EditorTool {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.name() == tag)
            .ok_or_else(|| EditorError::UnknownTool(s.to_string()))
    }
}

/// An in-progress pointer interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintStroke {
    pub tool: EditorTool,
    /// Tile where the pointer went down
    pub start: (i32, i32),
    /// Most recent pointer tile
    pub last: (i32, i32),
    /// Cells changed so far
    pub changed: usize,
}

impl PaintStroke {
    pub fn new(tool: EditorTool, start: (i32, i32)) -> Self {
        Self {
            tool,
            start,
            last: start,
            changed: 0,
        }
    }

    /// Normalized rectangle between the start and the latest pointer tile
    pub fn rect(&self) -> (i32, i32, i32, i32) {
        normalize_rect(self.start.0, self.start.1, self.last.0, self.last.1)
    }
}

/// Order two corners as (min_x, min_y, max_x, max_y)
pub fn normalize_rect(x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32, i32) {
    (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

/// Cells covered by a square brush centered on (`tx`, `ty`), on-grid or not
pub fn brush_footprint(tx: i32, ty: i32, brush_size: u32) -> Vec<(i32, i32)> {
    let half = (brush_size.clamp(1, MAX_BRUSH_SIZE) / 2) as i32;
    let mut cells = Vec::with_capacity(((2 * half + 1) * (2 * half + 1)) as usize);
    for dy in -half..=half {
        for dx in -half..=half {
            cells.push((tx + dx, ty + dy));
        }
    }
    cells
}

/// Paint `tile` over the brush square at (`tx`, `ty`) on the active layer.
///
/// With auto-tiling on, every painted cell spreads into its empty neighbors.
pub fn paint_tiles_at(
    map: &mut TileMap,
    tx: i32,
    ty: i32,
    tile: i32,
    brush_size: u32,
    auto_tile: bool,
) -> usize {
    let layer = map.active_layer();
    let cells: Vec<(i32, i32)> = brush_footprint(tx, ty, brush_size)
        .into_iter()
        .filter(|&(x, y)| map.in_bounds(x, y))
        .collect();

    let mut changed = 0;
    for &(x, y) in &cells {
        if map.set_tile(layer, x, y, tile) {
            changed += 1;
        }
    }
    if auto_tile {
        for &(x, y) in &cells {
            changed += apply_auto_tile_around(map, x, y);
        }
    }
    changed
}

/// Clear the brush square at (`tx`, `ty`) on the active layer
pub fn erase_tiles_at(map: &mut TileMap, tx: i32, ty: i32, brush_size: u32) -> usize {
    paint_tiles_at(map, tx, ty, EMPTY_TILE, brush_size, false)
}

/// Paint every brush position along the line between two drag samples
pub fn paint_line(
    map: &mut TileMap,
    from: (i32, i32),
    to: (i32, i32),
    tile: i32,
    brush_size: u32,
    auto_tile: bool,
) -> usize {
    bresenham_line(from.0, from.1, to.0, to.1)
        .into_iter()
        .map(|(x, y)| paint_tiles_at(map, x, y, tile, brush_size, auto_tile))
        .sum()
}

/// Flood fill the 4-connected region of the seed's value with `tile`.
///
/// Uses an explicit work list; each cell is queued at most once because it is
/// repainted as it is queued.
pub fn bucket_fill(map: &mut TileMap, sx: i32, sy: i32, tile: i32) -> usize {
    let Some(seed) = map.cell_index(sx, sy) else {
        return 0;
    };
    let (width, height) = (map.width() as i32, map.height() as i32);
    let layer_index = map.active_layer();
    let Some(layer) = map.layer_mut(layer_index) else {
        return 0;
    };

    let tile = tile.max(EMPTY_TILE);
    let target = layer.data[seed];
    if target == tile {
        return 0;
    }

    layer.data[seed] = tile;
    let mut filled = 1;
    let mut stack = vec![(sx, sy)];

    while let Some((x, y)) = stack.pop() {
        for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
            if nx < 0 || ny < 0 || nx >= width || ny >= height {
                continue;
            }
            let idx = (ny * width + nx) as usize;
            if layer.data[idx] == target {
                layer.data[idx] = tile;
                filled += 1;
                stack.push((nx, ny));
            }
        }
    }

    filled
}

/// Fill the inclusive rectangle between two corners, clipped to the map
pub fn draw_rect_tiles(
    map: &mut TileMap,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    tile: i32,
    auto_tile: bool,
) -> usize {
    let (min_x, min_y, max_x, max_y) = normalize_rect(x1, y1, x2, y2);
    let min_x = min_x.max(0);
    let min_y = min_y.max(0);
    let max_x = max_x.min(map.width() as i32 - 1);
    let max_y = max_y.min(map.height() as i32 - 1);
    if min_x > max_x || min_y > max_y {
        return 0;
    }

    let layer = map.active_layer();
    let mut changed = 0;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if map.set_tile(layer, x, y, tile) {
                changed += 1;
            }
        }
    }
    if auto_tile {
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                changed += apply_auto_tile_around(map, x, y);
            }
        }
    }
    changed
}

/// Topmost non-empty tile under a cell, for the picker
pub fn pick_tile(map: &TileMap, x: i32, y: i32) -> Option<i32> {
    map.topmost_tile(x, y)
}

/// Copy a painted cell's tile into its empty orthogonal neighbors.
///
/// Existing tiles are never replaced.
pub fn apply_auto_tile_around(map: &mut TileMap, x: i32, y: i32) -> usize {
    let layer = map.active_layer();
    let Some(base) = map.get_tile(layer, x, y) else {
        return 0;
    };
    if is_empty_tile(base) {
        return 0;
    }

    let mut changed = 0;
    for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
        if map.get_tile(layer, nx, ny) == Some(EMPTY_TILE) && map.set_tile(layer, nx, ny, base) {
            changed += 1;
        }
    }
    changed
}

/// Bresenham's line algorithm - generates all tile coordinates along a line
pub fn bresenham_line(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let mut points = Vec::new();

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        points.push((x, y));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }

    points
}
