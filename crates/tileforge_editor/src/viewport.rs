//! Pan/zoom transform between tile space and screen space
//!
//! `screen = tile * tile_size * zoom + pan`

use serde::{Deserialize, Serialize};

/// Smallest zoom factor
pub const MIN_ZOOM: f32 = 0.25;
/// Largest zoom factor
pub const MAX_ZOOM: f32 = 3.0;
/// Padding, in map pixels, kept around the map by `fit_to_view`
pub const FIT_MARGIN: f32 = 40.0;
/// Zoom change per unit of wheel delta
pub const WHEEL_ZOOM_STEP: f32 = 0.0015;

/// Clamp a zoom factor to the supported range
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

/// Viewport camera state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(zoom: f32, pan_x: f32, pan_y: f32) -> Self {
        Self {
            zoom: clamp_zoom(zoom),
            pan_x,
            pan_y,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the zoom factor without moving the pan offset
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Screen position to map pixel position
    pub fn screen_to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.pan_x) / self.zoom, (sy - self.pan_y) / self.zoom)
    }

    /// Map pixel position to screen position
    pub fn world_to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx * self.zoom + self.pan_x, wy * self.zoom + self.pan_y)
    }

    /// Tile under a screen position. May lie outside the map.
    pub fn screen_to_tile(&self, sx: f32, sy: f32, tile_size: u32) -> (i32, i32) {
        let (wx, wy) = self.screen_to_world(sx, sy);
        let ts = tile_size as f32;
        ((wx / ts).floor() as i32, (wy / ts).floor() as i32)
    }

    /// Screen position of a tile's top-left corner
    pub fn tile_to_screen(&self, tx: i32, ty: i32, tile_size: u32) -> (f32, f32) {
        let ts = tile_size as f32;
        self.world_to_screen(tx as f32 * ts, ty as f32 * ts)
    }

    /// Change zoom while keeping the world point under the cursor in place
    pub fn zoom_at(&mut self, cursor_x: f32, cursor_y: f32, new_zoom: f32) {
        let (wx, wy) = self.screen_to_world(cursor_x, cursor_y);
        self.zoom = clamp_zoom(new_zoom);
        self.pan_x = cursor_x - wx * self.zoom;
        self.pan_y = cursor_y - wy * self.zoom;
    }

    /// Apply a mouse wheel step around the cursor (negative delta zooms in)
    pub fn zoom_by_wheel(&mut self, cursor_x: f32, cursor_y: f32, delta_y: f32) {
        let new_zoom = self.zoom - delta_y * WHEEL_ZOOM_STEP;
        self.zoom_at(cursor_x, cursor_y, new_zoom);
    }

    /// Move the view by a screen-space offset
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Center a map of `map_width` x `map_height` pixels at the current zoom
    pub fn center_on(&mut self, viewport_width: f32, viewport_height: f32, map_width: f32, map_height: f32) {
        self.pan_x = (viewport_width - map_width * self.zoom) / 2.0;
        self.pan_y = (viewport_height - map_height * self.zoom) / 2.0;
    }

    /// Zoom out (never in past 1:1) until the map fits with a margin, then center it
    pub fn fit_to_view(&mut self, viewport_width: f32, viewport_height: f32, map_width: f32, map_height: f32) {
        let zx = viewport_width / (map_width + FIT_MARGIN);
        let zy = viewport_height / (map_height + FIT_MARGIN);
        self.zoom = clamp_zoom(zx.min(zy).min(1.0));
        self.center_on(viewport_width, viewport_height, map_width, map_height);
    }
}
