//! Map export: PNG raster, Tiled TMX and the generic JSON description

use image::{ImageFormat, RgbaImage};
use std::fmt::Write as _;
use std::io::Cursor;
use tileforge_core::{ProjectFile, TileMap};

use crate::render::render_map;
use crate::tileset::Atlas;
use crate::EditorError;

/// Largest integer scale accepted by the raster export
pub const MAX_EXPORT_SCALE: u32 = 8;

const FALLBACK_TILESET_NAME: &str = "tileset.png";

/// Round a requested scale and clamp it to `1..=8`
pub fn clamp_scale(scale: f32) -> u32 {
    if !scale.is_finite() {
        return 1;
    }
    (scale.round() as i64).clamp(1, MAX_EXPORT_SCALE as i64) as u32
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| EditorError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Render all visible layers at `scale` and encode as PNG.
///
/// The output is `width * tile_size * scale` by `height * tile_size * scale`
/// pixels with a transparent background.
pub fn export_png(map: &TileMap, atlas: Option<&Atlas>, scale: u32) -> Result<Vec<u8>, EditorError> {
    let scale = scale.clamp(1, MAX_EXPORT_SCALE);
    let image = render_map(map, atlas, scale);
    log::info!(
        "Exported {}x{} PNG at {}x scale",
        image.width(),
        image.height(),
        scale
    );
    encode_png(&image)
}

/// Escape a string for use inside an XML attribute value
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build a Tiled TMX 1.2 document with one CSV layer per map layer.
///
/// Tiled global ids start at 1, so stored indices are shifted up by one and
/// empty cells become 0.
pub fn export_tmx(map: &TileMap, atlas: Option<&Atlas>) -> String {
    let ts = map.tile_size();
    let tileset_name = escape_xml(
        &atlas
            .map(Atlas::file_name)
            .unwrap_or_else(|| FALLBACK_TILESET_NAME.to_string()),
    );
    let (cols, rows) = atlas.map(|a| (a.cols(), a.rows())).unwrap_or((0, 0));

    let mut parts = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        format!(
            r#"<map version="1.2" tiledversion="1.3.3" orientation="orthogonal" renderorder="right-down" width="{}" height="{}" tilewidth="{ts}" tileheight="{ts}">"#,
            map.width(),
            map.height()
        ),
        format!(
            r#"<tileset firstgid="1" name="{tileset_name}" tilewidth="{ts}" tileheight="{ts}" tilecount="{}" columns="{cols}">"#,
            cols * rows
        ),
        format!(
            r#"<image source="{tileset_name}" width="{}" height="{}"/>"#,
            cols * ts,
            rows * ts
        ),
        "</tileset>".to_string(),
    ];

    let width = map.width() as usize;
    for (index, layer) in map.layers().iter().enumerate() {
        parts.push(format!(
            r#"<layer id="{}" name="{}" width="{}" height="{}">"#,
            index + 1,
            escape_xml(&layer.name),
            map.width(),
            map.height()
        ));
        parts.push(r#"<data encoding="csv">"#.to_string());

        let rows: Vec<String> = layer
            .data
            .chunks(width)
            .map(|row| {
                let mut line = String::new();
                for (i, &tile) in row.iter().enumerate() {
                    if i > 0 {
                        line.push(',');
                    }
                    let gid = if tile >= 0 { tile as i64 + 1 } else { 0 };
                    let _ = write!(line, "{gid}");
                }
                line
            })
            .collect();
        parts.push(rows.join(",\n"));

        parts.push("</data>".to_string());
        parts.push("</layer>".to_string());
    }
    parts.push("</map>".to_string());

    log::info!("Exported TMX with {} layers", map.layer_count());
    parts.join("\n")
}

/// Describe the map as JSON without embedding atlas pixels.
///
/// The atlas is referenced by file name only.
pub fn export_json(map: &TileMap, atlas: Option<&Atlas>, selected_tile: i32, seed: u64) -> Result<String, EditorError> {
    let mut project = ProjectFile::from_map(map, selected_tile, seed);
    if let Some(atlas) = atlas {
        project.meta.tileset_cols = atlas.cols();
        project.meta.tileset_rows = atlas.rows();
        project.meta.atlas_image_name = Some(atlas.file_name());
    }
    project
        .to_json_pretty()
        .map_err(|e| EditorError::Encode(e.to_string()))
}

/// `tileforge_map_{W}x{H}.png`, or `tileforge_map_{W}x{H}@{s}x.png` above 1x
pub fn png_file_name(map: &TileMap, scale: u32) -> String {
    if scale > 1 {
        format!("tileforge_map_{}x{}@{}x.png", map.width(), map.height(), scale)
    } else {
        format!("tileforge_map_{}x{}.png", map.width(), map.height())
    }
}

pub fn tmx_file_name(map: &TileMap) -> String {
    format!("tileforge_map_{}x{}.tmx", map.width(), map.height())
}

pub fn project_file_name(map: &TileMap) -> String {
    format!("tileforge_project_{}x{}.json", map.width(), map.height())
}
