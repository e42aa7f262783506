//! Project file format - the JSON document used for save/load and autosave
//!
//! The project bundles map geometry, every layer and a reference to the
//! tileset atlas so a session can be restored exactly.
//!
//! # Example JSON
//! ```json
//! {
//!   "meta": {
//!     "mapW": 32, "mapH": 32, "tileSize": 32,
//!     "selectedTileIndex": 0, "tilesetCols": 8, "tilesetRows": 8,
//!     "atlasImageData": "data:image/png;base64,...", "seed": 1700000000000
//!   },
//!   "layers": [
//!     { "name": "Ground", "visible": true, "data": [-1, 3], "collision": [0, 1] }
//!   ]
//! }
//! ```

use crate::{CoreError, Layer, TileMap};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

/// Map-wide metadata stored alongside the layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub map_w: u32,
    pub map_h: u32,
    pub tile_size: u32,
    #[serde(default)]
    pub selected_tile_index: i32,
    #[serde(default)]
    pub tileset_cols: u32,
    #[serde(default)]
    pub tileset_rows: u32,
    /// Embedded atlas image, usually a `data:image/png;base64,` URL
    #[serde(default, alias = "tilesetImageDataUrl")]
    pub atlas_image_data: Option<String>,
    /// File name of the atlas when the pixels are not embedded
    #[serde(
        default,
        alias = "tilesetImageName",
        skip_serializing_if = "Option::is_none"
    )]
    pub atlas_image_name: Option<String>,
    #[serde(default)]
    pub seed: u64,
}

/// One serialized layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerFile {
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    pub data: Vec<i32>,
    /// Missing collision means every cell is passable
    #[serde(default)]
    pub collision: Vec<u8>,
}

impl From<&Layer> for LayerFile {
    fn from(layer: &Layer) -> Self {
        Self {
            name: layer.name.clone(),
            visible: layer.visible,
            opacity: layer.opacity,
            data: layer.data.clone(),
            collision: layer.collision.clone(),
        }
    }
}

impl LayerFile {
    fn to_layer(&self, cell_count: usize) -> Layer {
        let collision = if self.collision.is_empty() {
            vec![0; cell_count]
        } else {
            self.collision.clone()
        };
        Layer {
            name: self.name.clone(),
            visible: self.visible,
            opacity: self.opacity.clamp(0.0, 1.0),
            data: self.data.clone(),
            collision,
        }
    }
}

/// A complete project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub meta: ProjectMeta,
    pub layers: Vec<LayerFile>,
}

impl ProjectFile {
    /// Capture a map. Atlas fields are left empty for the caller to fill in.
    pub fn from_map(map: &TileMap, selected_tile_index: i32, seed: u64) -> Self {
        Self {
            meta: ProjectMeta {
                map_w: map.width(),
                map_h: map.height(),
                tile_size: map.tile_size(),
                selected_tile_index,
                tileset_cols: 0,
                tileset_rows: 0,
                atlas_image_data: None,
                atlas_image_name: None,
                seed,
            },
            layers: map.layers().iter().map(LayerFile::from).collect(),
        }
    }

    /// Build a validated map from this project.
    ///
    /// Either every layer is valid and a complete map is returned, or an
    /// error describes the first problem found.
    pub fn to_map(&self) -> Result<TileMap, CoreError> {
        crate::validate_geometry(self.meta.map_w, self.meta.map_h, self.meta.tile_size)?;
        let cell_count = self.meta.map_w as usize * self.meta.map_h as usize;
        let layers = self
            .layers
            .iter()
            .map(|layer| layer.to_layer(cell_count))
            .collect();
        TileMap::from_layers(self.meta.map_w, self.meta.map_h, self.meta.tile_size, layers)
    }

    /// Parse a project from JSON text
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::MalformedProject(e.to_string()))
    }

    /// Parse a project from an already decoded JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(|e| CoreError::MalformedProject(e.to_string()))
    }

    /// Serialize as indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
