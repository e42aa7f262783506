//! Software rendering of the map into RGBA images
//!
//! Everything here is a pure function of the map, viewport, atlas and options.
//! Sampling is nearest neighbor by pixel center, so tiles stay crisp at any
//! zoom level and adjacent tiles never leave seams.

use image::{Rgba, RgbaImage};
use tileforge_core::{is_empty_tile, Layer, TileMap};

use crate::tileset::Atlas;
use crate::tools::brush_footprint;
use crate::viewport::Viewport;

/// Fill behind the map area in the editor view
pub const MAP_BACKGROUND: Rgba<u8> = Rgba([0x07, 0x15, 0x21, 0xff]);
/// Tile boundary lines
pub const GRID_COLOR: Rgba<u8> = Rgba([255, 255, 255, 10]);
/// Tint over cells flagged as solid
pub const COLLISION_COLOR: Rgba<u8> = Rgba([255, 0, 0, 46]);
/// Overview pixel for cells with no tile on any layer
pub const OVERVIEW_EMPTY: Rgba<u8> = Rgba([0x11, 0x22, 0x33, 0xff]);
/// Outline of the cells the brush would paint
pub const BRUSH_OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 230]);

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Brush outline drawn over the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushPreview {
    pub tile_x: i32,
    pub tile_y: i32,
    pub brush_size: u32,
}

/// What to draw besides the tiles themselves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub show_grid: bool,
    pub show_collision: bool,
    /// Fill behind the map area, None leaves it transparent
    pub background: Option<Rgba<u8>>,
    pub brush_preview: Option<BrushPreview>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_collision: false,
            background: Some(MAP_BACKGROUND),
            brush_preview: None,
        }
    }
}

impl RenderOptions {
    /// Tiles only, on a transparent background
    pub fn export() -> Self {
        Self {
            show_grid: false,
            show_collision: false,
            background: None,
            brush_preview: None,
        }
    }
}

/// Source-over blend of `src` onto `dst`, with `src` alpha scaled by `opacity`
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f32) {
    let sa = (src[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        *dst = Rgba([src[0], src[1], src[2], 255]);
        return;
    }

    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        let value = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}

/// Stable color for a tile index when no atlas pixels are available
pub fn pseudo_color(tile: i32) -> Rgba<u8> {
    let id = tile.max(0) as i64;
    Rgba([
        ((id * 37) % 255) as u8,
        ((id * 59) % 255) as u8,
        ((id * 83) % 255) as u8,
        255,
    ])
}

/// Composite every visible layer at one map pixel.
///
/// `cell` is the row-major cell index, (`lx`, `ly`) the pixel inside the tile.
fn composite_pixel(
    layers: &[Layer],
    atlas: Option<&Atlas>,
    cell: usize,
    lx: u32,
    ly: u32,
    show_collision: bool,
    base: Rgba<u8>,
) -> Rgba<u8> {
    let mut pixel = base;
    for layer in layers.iter().filter(|layer| layer.visible) {
        let tile = layer.data[cell];
        if !is_empty_tile(tile) {
            if let Some(color) = atlas.and_then(|atlas| atlas.tile_pixel(tile, lx, ly)) {
                blend_over(&mut pixel, color, layer.opacity);
            }
        }
        if show_collision && layer.collision[cell] != 0 {
            blend_over(&mut pixel, COLLISION_COLOR, 1.0);
        }
    }
    pixel
}

/// Draw the editor view: the map under pan/zoom plus optional overlays
pub fn render_view(
    map: &TileMap,
    viewport: &Viewport,
    atlas: Option<&Atlas>,
    options: &RenderOptions,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let ts = map.tile_size();
    let (map_px_w, map_px_h) = map.pixel_size();
    let zoom = viewport.zoom();
    let base = options.background.unwrap_or(TRANSPARENT);

    for sy in 0..height {
        let wy = (sy as f32 + 0.5 - viewport.pan_y) / zoom;
        if wy < 0.0 || wy >= map_px_h as f32 {
            continue;
        }
        let wy = (wy as u32).min(map_px_h - 1);
        for sx in 0..width {
            let wx = (sx as f32 + 0.5 - viewport.pan_x) / zoom;
            if wx < 0.0 || wx >= map_px_w as f32 {
                continue;
            }
            let wx = (wx as u32).min(map_px_w - 1);
            let cell = (wy / ts) as usize * map.width() as usize + (wx / ts) as usize;
            let pixel = composite_pixel(
                map.layers(),
                atlas,
                cell,
                wx % ts,
                wy % ts,
                options.show_collision,
                base,
            );
            image.put_pixel(sx, sy, pixel);
        }
    }

    if options.show_grid {
        draw_grid(&mut image, map, viewport);
    }
    if let Some(preview) = options.brush_preview {
        draw_brush_preview(&mut image, map, viewport, preview);
    }
    image
}

/// One screen pixel wide lines on every tile boundary
fn draw_grid(image: &mut RgbaImage, map: &TileMap, viewport: &Viewport) {
    let ts = map.tile_size() as i32;
    let (left, top) = viewport.tile_to_screen(0, 0, ts as u32);
    let (right, bottom) = viewport.tile_to_screen(map.width() as i32, map.height() as i32, ts as u32);
    let (left, top, right, bottom) = (
        left.round() as i64,
        top.round() as i64,
        right.round() as i64,
        bottom.round() as i64,
    );

    for x in 0..=map.width() as i32 {
        let sx = viewport.tile_to_screen(x, 0, ts as u32).0.round() as i64;
        for sy in top..=bottom {
            blend_at(image, sx, sy, GRID_COLOR);
        }
    }
    for y in 0..=map.height() as i32 {
        let sy = viewport.tile_to_screen(0, y, ts as u32).1.round() as i64;
        for sx in left..=right {
            blend_at(image, sx, sy, GRID_COLOR);
        }
    }
}

fn draw_brush_preview(image: &mut RgbaImage, map: &TileMap, viewport: &Viewport, preview: BrushPreview) {
    let ts = map.tile_size();
    for (x, y) in brush_footprint(preview.tile_x, preview.tile_y, preview.brush_size) {
        if !map.in_bounds(x, y) {
            continue;
        }
        let (x0, y0) = viewport.tile_to_screen(x, y, ts);
        let (x1, y1) = viewport.tile_to_screen(x + 1, y + 1, ts);
        let (x0, y0) = (x0.round() as i64, y0.round() as i64);
        let (x1, y1) = (x1.round() as i64 - 1, y1.round() as i64 - 1);
        for sx in x0..=x1 {
            blend_at(image, sx, y0, BRUSH_OUTLINE);
            blend_at(image, sx, y1, BRUSH_OUTLINE);
        }
        for sy in (y0 + 1)..y1 {
            blend_at(image, x0, sy, BRUSH_OUTLINE);
            blend_at(image, x1, sy, BRUSH_OUTLINE);
        }
    }
}

fn blend_at(image: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    blend_over(image.get_pixel_mut(x as u32, y as u32), color, 1.0);
}

/// Composite all visible layers at an integer scale on a transparent background
pub fn render_map(map: &TileMap, atlas: Option<&Atlas>, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    let ts = map.tile_size();
    let (map_px_w, map_px_h) = map.pixel_size();
    let mut image = RgbaImage::from_pixel(map_px_w * scale, map_px_h * scale, TRANSPARENT);

    for (ox, oy, pixel) in image.enumerate_pixels_mut() {
        let (wx, wy) = (ox / scale, oy / scale);
        let cell = (wy / ts) as usize * map.width() as usize + (wx / ts) as usize;
        *pixel = composite_pixel(map.layers(), atlas, cell, wx % ts, wy % ts, false, TRANSPARENT);
    }
    image
}

/// One pixel per cell showing the topmost tile
pub fn render_overview(map: &TileMap, atlas: Option<&Atlas>) -> RgbaImage {
    RgbaImage::from_fn(map.width(), map.height(), |x, y| {
        match map.topmost_tile(x as i32, y as i32) {
            None => OVERVIEW_EMPTY,
            Some(tile) => atlas
                .and_then(|atlas| {
                    let center = atlas.tile_size() / 2;
                    atlas.tile_pixel(tile, center, center)
                })
                .unwrap_or_else(|| pseudo_color(tile)),
        }
    })
}
