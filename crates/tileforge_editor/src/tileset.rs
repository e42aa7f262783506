//! Tileset atlas - a source image sliced into a fixed grid of tiles
//!
//! The atlas is immutable. Loading a new image or changing the tile size
//! produces a new slicing; nothing is edited in place.

use crate::EditorError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// A decoded tileset image plus its grid slicing
#[derive(Debug, Clone)]
pub struct Atlas {
    image: RgbaImage,
    /// Encoded bytes exactly as loaded, for re-export
    source: Vec<u8>,
    format: ImageFormat,
    name: Option<String>,
    tile_size: u32,
    cols: u32,
    rows: u32,
}

impl Atlas {
    /// Decode an encoded image (PNG, ...) and slice it into `tile_size` cells
    pub fn decode(bytes: Vec<u8>, tile_size: u32, name: Option<String>) -> Result<Self, EditorError> {
        let format = image::guess_format(&bytes)
            .map_err(|e| EditorError::AtlasDecodeFailure(e.to_string()))?;
        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| EditorError::AtlasDecodeFailure(e.to_string()))?
            .to_rgba8();

        let mut atlas = Self {
            image,
            source: bytes,
            format,
            name,
            tile_size: 1,
            cols: 0,
            rows: 0,
        };
        atlas.reslice(tile_size);
        Ok(atlas)
    }

    /// Build an atlas from pixels already in memory; the source bytes are PNG-encoded
    pub fn from_image(image: RgbaImage, tile_size: u32, name: Option<String>) -> Result<Self, EditorError> {
        let mut source = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut source), ImageFormat::Png)
            .map_err(|e| EditorError::Encode(e.to_string()))?;

        let mut atlas = Self {
            image,
            source,
            format: ImageFormat::Png,
            name,
            tile_size: 1,
            cols: 0,
            rows: 0,
        };
        atlas.reslice(tile_size);
        Ok(atlas)
    }

    /// Decode a `data:<mime>;base64,<payload>` URL or a bare base64 payload
    pub fn from_data_url(data: &str, tile_size: u32, name: Option<String>) -> Result<Self, EditorError> {
        let payload = match data.strip_prefix(DATA_URL_PREFIX) {
            Some(rest) => rest
                .find(BASE64_MARKER)
                .map(|pos| &rest[pos + BASE64_MARKER.len()..])
                .ok_or_else(|| {
                    EditorError::AtlasDecodeFailure("data URL is not base64 encoded".to_string())
                })?,
            None => data,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| EditorError::AtlasDecodeFailure(e.to_string()))?;
        Self::decode(bytes, tile_size, name)
    }

    /// Encode the source bytes as a data URL
    pub fn to_data_url(&self) -> String {
        format!(
            "{}{}{}{}",
            DATA_URL_PREFIX,
            self.format.to_mime_type(),
            BASE64_MARKER,
            STANDARD.encode(&self.source)
        )
    }

    /// Recompute the grid for a new tile size (integer division, remainder ignored)
    pub fn reslice(&mut self, tile_size: u32) {
        self.tile_size = tile_size.max(1);
        self.cols = self.image.width() / self.tile_size;
        self.rows = self.image.height() / self.tile_size;
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The image bytes exactly as they were loaded
    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// File name used when exporting or referencing the atlas
    pub fn file_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| {
                let ext = self.format.extensions_str().first().copied().unwrap_or("png");
                format!("tileset.{}", ext)
            })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_count(&self) -> u32 {
        self.cols * self.rows
    }

    /// Pixel origin of a tile in the atlas image, None for empty or out-of-range indices
    pub fn tile_origin(&self, tile: i32) -> Option<(u32, u32)> {
        if tile < 0 || tile as u32 >= self.tile_count() {
            return None;
        }
        let tile = tile as u32;
        Some((
            (tile % self.cols) * self.tile_size,
            (tile / self.cols) * self.tile_size,
        ))
    }

    /// Pixel at (`px`, `py`) inside a tile
    pub fn tile_pixel(&self, tile: i32, px: u32, py: u32) -> Option<Rgba<u8>> {
        let (ox, oy) = self.tile_origin(tile)?;
        if px >= self.tile_size || py >= self.tile_size {
            return None;
        }
        Some(*self.image.get_pixel(ox + px, oy + py))
    }
}
