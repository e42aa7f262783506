//! The editing session: sole owner of the live map and everything around it

use image::RgbaImage;
use serde::Serialize;
use std::path::Path;
use tileforge_core::{ProjectFile, TileMap, EMPTY_TILE};

use crate::commands::{resolve_shortcut, History, Modifiers, ShortcutAction, Snapshot};
use crate::export;
use crate::project::{read_project, write_project, Autosave};
use crate::render::{self, BrushPreview, RenderOptions};
use crate::tileset::Atlas;
use crate::tools::{self, EditorTool, PaintStroke, MAX_BRUSH_SIZE};
use crate::viewport::Viewport;
use crate::{EditorError, SessionConfig};

/// Name, visibility and opacity of one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
}

/// Public state handed back to the UI after every operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub map_width: u32,
    pub map_height: u32,
    pub tile_size: u32,
    pub layers: Vec<LayerSummary>,
    pub active_layer: usize,
    pub tool: EditorTool,
    pub selected_tile: i32,
    pub brush_size: u32,
    pub auto_tile: bool,
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    pub show_grid: bool,
    pub show_collision: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Atlas grid as (cols, rows), None when no atlas is loaded
    pub atlas_grid: Option<(u32, u32)>,
    pub seed: u64,
}

/// An editing session.
///
/// Holds exactly one map at all times. Every mutation goes through `&mut self`,
/// and each committed edit records one history entry.
pub struct Session {
    map: TileMap,
    atlas: Option<Atlas>,
    history: History,
    viewport: Viewport,

    // Tools
    tool: EditorTool,
    selected_tile: i32,
    brush_size: u32,
    auto_tile: bool,
    stroke: Option<PaintStroke>,
    hover_tile: Option<(i32, i32)>,

    // Display
    show_grid: bool,
    show_collision: bool,

    seed: u64,
    autosave: Option<Autosave>,
}

impl Session {
    /// Start a session on a fresh map with the default Ground/Objects/Top layers
    pub fn new(config: SessionConfig) -> Result<Self, EditorError> {
        let map = TileMap::with_default_layers(config.map_width, config.map_height, config.tile_size)?;

        let autosave = if config.autosave {
            let autosave = config.autosave_path.map(Autosave::new).or_else(Autosave::default_location);
            if autosave.is_none() {
                log::warn!("No data directory available, autosave disabled");
            }
            autosave
        } else {
            None
        };

        let mut history = History::new(config.history_capacity);
        history.reset(Snapshot::capture(&map, 0));

        log::info!(
            "New session: {}x{} map, {}px tiles",
            map.width(),
            map.height(),
            map.tile_size()
        );

        Ok(Self {
            map,
            atlas: None,
            history,
            viewport: Viewport::new(config.initial_zoom, 0.0, 0.0),
            tool: EditorTool::default(),
            selected_tile: 0,
            brush_size: 1,
            auto_tile: false,
            stroke: None,
            hover_tile: None,
            show_grid: config.show_grid,
            show_collision: config.show_collision,
            seed: fastrand::u64(..),
            autosave,
        })
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn atlas(&self) -> Option<&Atlas> {
        self.atlas.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tool(&self) -> EditorTool {
        self.tool
    }

    pub fn selected_tile(&self) -> i32 {
        self.selected_tile
    }

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    pub fn auto_tile(&self) -> bool {
        self.auto_tile
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Autosave file, if autosave is enabled
    pub fn autosave_path(&self) -> Option<&Path> {
        self.autosave.as_ref().map(Autosave::path)
    }

    /// Whether a pointer stroke is in progress
    pub fn stroke_active(&self) -> bool {
        self.stroke.is_some()
    }

    /// Snapshot of the public state
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            map_width: self.map.width(),
            map_height: self.map.height(),
            tile_size: self.map.tile_size(),
            layers: self
                .map
                .layers()
                .iter()
                .map(|layer| LayerSummary {
                    name: layer.name.clone(),
                    visible: layer.visible,
                    opacity: layer.opacity,
                })
                .collect(),
            active_layer: self.map.active_layer(),
            tool: self.tool,
            selected_tile: self.selected_tile,
            brush_size: self.brush_size,
            auto_tile: self.auto_tile,
            zoom: self.viewport.zoom(),
            pan_x: self.viewport.pan_x,
            pan_y: self.viewport.pan_y,
            show_grid: self.show_grid,
            show_collision: self.show_collision,
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            atlas_grid: self.atlas.as_ref().map(|a| (a.cols(), a.rows())),
            seed: self.seed,
        }
    }

    // Tool state

    /// Switch tools. An unfinished stroke is closed first.
    pub fn select_tool(&mut self, tool: EditorTool) -> SessionStatus {
        self.finish_stroke();
        self.tool = tool;
        self.status()
    }

    /// Switch tools by UI tag (`"brush"`, `"bucket"`, ...)
    pub fn select_tool_by_name(&mut self, name: &str) -> Result<SessionStatus, EditorError> {
        let tool = name.parse()?;
        Ok(self.select_tool(tool))
    }

    pub fn set_selected_tile(&mut self, tile: i32) -> SessionStatus {
        self.selected_tile = tile.max(EMPTY_TILE);
        self.status()
    }

    /// Brush edge in tiles, clamped to `1..=16`
    pub fn set_brush_size(&mut self, size: u32) -> SessionStatus {
        self.brush_size = size.clamp(1, MAX_BRUSH_SIZE);
        self.status()
    }

    pub fn toggle_auto_tile(&mut self, enabled: bool) -> SessionStatus {
        self.auto_tile = enabled;
        self.status()
    }

    /// Apply a keyboard shortcut; unknown keys are ignored
    pub fn handle_shortcut(&mut self, key: char, modifiers: Modifiers) -> SessionStatus {
        match resolve_shortcut(key, modifiers) {
            Some(ShortcutAction::Undo) => self.undo(),
            Some(ShortcutAction::Redo) => self.redo(),
            Some(ShortcutAction::SelectTool(tool)) => self.select_tool(tool),
            None => self.status(),
        }
    }

    // Structural edits

    /// Resize every layer, keeping the overlapping region
    pub fn resize_map(&mut self, width: u32, height: u32) -> Result<SessionStatus, EditorError> {
        self.map.resize(width, height)?;
        log::info!("Resized map to {}x{}", width, height);
        self.commit();
        Ok(self.status())
    }

    /// Append an empty layer named `Layer N`
    pub fn add_layer(&mut self) -> SessionStatus {
        let index = self.map.add_layer(None);
        log::debug!("Added layer {}", index);
        self.commit();
        self.status()
    }

    /// Remove a layer. Removing the last layer does nothing.
    pub fn remove_layer(&mut self, index: usize) -> SessionStatus {
        match self.map.remove_layer(index) {
            Some(layer) => {
                log::debug!("Removed layer {} ({})", index, layer.name);
                self.commit();
            }
            None => log::debug!(
                "Refused to remove layer {} of {}",
                index,
                self.map.layer_count()
            ),
        }
        self.status()
    }

    /// Choose the layer that tools paint on; out-of-range indices are ignored
    pub fn set_active_layer(&mut self, index: usize) -> SessionStatus {
        self.map.set_active_layer(index);
        self.status()
    }

    pub fn rename_layer(&mut self, index: usize, name: &str) -> SessionStatus {
        if self.map.rename_layer(index, name) {
            self.commit();
        }
        self.status()
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> SessionStatus {
        if self.map.set_layer_visible(index, visible) {
            self.commit();
        }
        self.status()
    }

    pub fn toggle_layer_visibility(&mut self, index: usize) -> SessionStatus {
        if self.map.toggle_layer_visibility(index) {
            self.commit();
        }
        self.status()
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> SessionStatus {
        if self.map.set_layer_opacity(index, opacity) {
            self.commit();
        }
        self.status()
    }

    pub fn move_layer_up(&mut self, index: usize) -> SessionStatus {
        if self.map.move_layer_up(index) {
            self.commit();
        }
        self.status()
    }

    pub fn move_layer_down(&mut self, index: usize) -> SessionStatus {
        if self.map.move_layer_down(index) {
            self.commit();
        }
        self.status()
    }

    /// Flag or clear a collision cell on the active layer
    pub fn set_collision(&mut self, x: i32, y: i32, solid: bool) -> SessionStatus {
        let layer = self.map.active_layer();
        if self.map.set_collision(layer, x, y, solid) {
            self.commit();
        }
        self.status()
    }

    /// Replace the map with a fresh one using the default layers
    pub fn new_map(&mut self, width: u32, height: u32, tile_size: u32) -> Result<SessionStatus, EditorError> {
        let map = TileMap::with_default_layers(width, height, tile_size)?;
        self.map = map;
        self.stroke = None;
        self.sync_atlas();
        self.history.reset(Snapshot::capture(&self.map, self.selected_tile));
        self.write_autosave();
        log::info!("New {}x{} map with {}px tiles", width, height, tile_size);
        Ok(self.status())
    }

    // History

    /// Step back one committed edit; at the floor this does nothing.
    ///
    /// A stroke still in progress is committed first, so it is the edit undone.
    pub fn undo(&mut self) -> SessionStatus {
        self.finish_stroke();
        if let Some(snapshot) = self.history.undo() {
            self.selected_tile = snapshot.restore_into(&mut self.map);
            self.sync_atlas();
            log::debug!("Undo ({} entries left)", self.history.undo_len());
        }
        self.status()
    }

    pub fn redo(&mut self) -> SessionStatus {
        self.finish_stroke();
        if let Some(snapshot) = self.history.redo() {
            self.selected_tile = snapshot.restore_into(&mut self.map);
            self.sync_atlas();
            log::debug!("Redo ({} entries left)", self.history.redo_len());
        }
        self.status()
    }

    // Pointer input

    /// Pointer pressed at a screen position.
    ///
    /// Brush and erase start painting immediately, bucket fills and commits,
    /// rect starts a drag, picker copies the topmost tile into the selection.
    pub fn pointer_down(&mut self, sx: f32, sy: f32) -> SessionStatus {
        self.finish_stroke();

        let tile = self.screen_to_tile(sx, sy);
        self.hover_tile = Some(tile);
        let (tx, ty) = tile;

        match self.tool {
            EditorTool::Brush => {
                let mut stroke = PaintStroke::new(self.tool, tile);
                stroke.changed = tools::paint_tiles_at(
                    &mut self.map,
                    tx,
                    ty,
                    self.selected_tile,
                    self.brush_size,
                    self.auto_tile,
                );
                self.stroke = Some(stroke);
            }
            EditorTool::Erase => {
                let mut stroke = PaintStroke::new(self.tool, tile);
                stroke.changed = tools::erase_tiles_at(&mut self.map, tx, ty, self.brush_size);
                self.stroke = Some(stroke);
            }
            EditorTool::Bucket => {
                let filled = tools::bucket_fill(&mut self.map, tx, ty, self.selected_tile);
                log::debug!("Bucket fill at ({}, {}) changed {} cells", tx, ty, filled);
                self.commit();
            }
            EditorTool::Rect => {
                self.stroke = Some(PaintStroke::new(self.tool, tile));
            }
            EditorTool::Picker => {
                if let Some(picked) = tools::pick_tile(&self.map, tx, ty) {
                    self.selected_tile = picked;
                    log::debug!("Picked tile {}", picked);
                }
            }
        }
        self.status()
    }

    /// Pointer moved. Paints along the drag for brush and erase.
    pub fn pointer_move(&mut self, sx: f32, sy: f32) -> SessionStatus {
        let tile = self.screen_to_tile(sx, sy);
        self.hover_tile = Some(tile);
        self.extend_stroke(tile);
        self.status()
    }

    /// Pointer released. Finishes the stroke as one history entry.
    pub fn pointer_up(&mut self, sx: f32, sy: f32) -> SessionStatus {
        let tile = self.screen_to_tile(sx, sy);
        self.hover_tile = Some(tile);
        self.extend_stroke(tile);

        if let Some(stroke) = self.stroke.take() {
            if stroke.tool == EditorTool::Rect {
                let (x1, y1, x2, y2) = stroke.rect();
                let changed =
                    tools::draw_rect_tiles(&mut self.map, x1, y1, x2, y2, self.selected_tile, self.auto_tile);
                log::debug!("Rectangle ({}, {})-({}, {}) changed {} cells", x1, y1, x2, y2, changed);
            } else {
                log::debug!("{} stroke changed {} cells", stroke.tool, stroke.changed);
            }
            self.commit();
        }
        self.status()
    }

    /// Rectangle being dragged, as normalized (min_x, min_y, max_x, max_y) tiles
    pub fn rect_preview(&self) -> Option<(i32, i32, i32, i32)> {
        self.stroke
            .as_ref()
            .filter(|stroke| stroke.tool == EditorTool::Rect)
            .map(PaintStroke::rect)
    }

    /// Close an unfinished stroke, recording what it painted so far
    fn finish_stroke(&mut self) {
        if self.stroke.take().is_some() {
            self.commit();
        }
    }

    fn extend_stroke(&mut self, tile: (i32, i32)) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        if stroke.last == tile {
            return;
        }
        match stroke.tool {
            EditorTool::Brush => {
                stroke.changed += tools::paint_line(
                    &mut self.map,
                    stroke.last,
                    tile,
                    self.selected_tile,
                    self.brush_size,
                    self.auto_tile,
                );
            }
            EditorTool::Erase => {
                stroke.changed += tools::paint_line(
                    &mut self.map,
                    stroke.last,
                    tile,
                    EMPTY_TILE,
                    self.brush_size,
                    false,
                );
            }
            _ => {}
        }
        stroke.last = tile;
    }

    fn screen_to_tile(&self, sx: f32, sy: f32) -> (i32, i32) {
        self.viewport.screen_to_tile(sx, sy, self.map.tile_size())
    }

    // View

    /// Mouse wheel zoom around the cursor
    pub fn wheel(&mut self, cursor_x: f32, cursor_y: f32, delta_y: f32) -> SessionStatus {
        self.viewport.zoom_by_wheel(cursor_x, cursor_y, delta_y);
        self.status()
    }

    /// Zoom to `zoom` keeping the screen point (`cursor_x`, `cursor_y`) in place
    pub fn zoom_at(&mut self, cursor_x: f32, cursor_y: f32, zoom: f32) -> SessionStatus {
        self.viewport.zoom_at(cursor_x, cursor_y, zoom);
        self.status()
    }

    pub fn set_zoom(&mut self, zoom: f32) -> SessionStatus {
        self.viewport.set_zoom(zoom);
        self.status()
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) -> SessionStatus {
        self.viewport.pan_by(dx, dy);
        self.status()
    }

    /// Fit the whole map into a viewport of the given size
    pub fn fit_to_view(&mut self, viewport_width: f32, viewport_height: f32) -> SessionStatus {
        let (mw, mh) = self.map.pixel_size();
        self.viewport
            .fit_to_view(viewport_width, viewport_height, mw as f32, mh as f32);
        self.status()
    }

    /// Center the map at the current zoom
    pub fn center_view(&mut self, viewport_width: f32, viewport_height: f32) -> SessionStatus {
        let (mw, mh) = self.map.pixel_size();
        self.viewport
            .center_on(viewport_width, viewport_height, mw as f32, mh as f32);
        self.status()
    }

    pub fn set_show_grid(&mut self, show: bool) -> SessionStatus {
        self.show_grid = show;
        self.status()
    }

    pub fn set_show_collision(&mut self, show: bool) -> SessionStatus {
        self.show_collision = show;
        self.status()
    }

    /// Draw the editor view into a `width` x `height` image
    pub fn render(&self, width: u32, height: u32) -> RgbaImage {
        let brush_preview = match self.tool {
            EditorTool::Brush | EditorTool::Erase => self.hover_tile.map(|(tile_x, tile_y)| BrushPreview {
                tile_x,
                tile_y,
                brush_size: self.brush_size,
            }),
            _ => None,
        };
        let options = RenderOptions {
            show_grid: self.show_grid,
            show_collision: self.show_collision,
            brush_preview,
            ..RenderOptions::default()
        };
        render::render_view(&self.map, &self.viewport, self.atlas.as_ref(), &options, width, height)
    }

    /// One pixel per tile overview of the map
    pub fn render_overview(&self) -> RgbaImage {
        render::render_overview(&self.map, self.atlas.as_ref())
    }

    // Atlas

    /// Decode an image and use it as the tileset, sliced at the map tile size.
    ///
    /// On failure the current atlas is kept.
    pub fn load_atlas(&mut self, bytes: Vec<u8>, name: Option<String>) -> Result<SessionStatus, EditorError> {
        let atlas = Atlas::decode(bytes, self.map.tile_size(), name)?;
        log::info!("Tileset loaded: {}x{} tiles", atlas.cols(), atlas.rows());
        self.atlas = Some(atlas);
        self.write_autosave();
        Ok(self.status())
    }

    /// Drop the tileset; tiles keep their indices
    pub fn clear_atlas(&mut self) -> SessionStatus {
        if self.atlas.take().is_some() {
            log::info!("Tileset cleared");
            self.write_autosave();
        }
        self.status()
    }

    /// File name and original bytes of the loaded tileset
    pub fn export_atlas(&self) -> Option<(String, &[u8])> {
        self.atlas
            .as_ref()
            .map(|atlas| (atlas.file_name(), atlas.source_bytes()))
    }

    // Export and import

    /// PNG of all visible layers; `scale` is rounded and clamped to `1..=8`
    pub fn export_raster(&self, scale: f32) -> Result<Vec<u8>, EditorError> {
        export::export_png(&self.map, self.atlas.as_ref(), export::clamp_scale(scale))
    }

    /// Default file name for a raster export at `scale`
    pub fn raster_file_name(&self, scale: f32) -> String {
        export::png_file_name(&self.map, export::clamp_scale(scale))
    }

    /// Complete project document, atlas pixels included
    pub fn project_file(&self) -> ProjectFile {
        let mut project = ProjectFile::from_map(&self.map, self.selected_tile, self.seed);
        if let Some(atlas) = &self.atlas {
            project.meta.tileset_cols = atlas.cols();
            project.meta.tileset_rows = atlas.rows();
            project.meta.atlas_image_data = Some(atlas.to_data_url());
            project.meta.atlas_image_name = atlas.name().map(str::to_string);
        }
        project
    }

    /// Project document as pretty JSON
    pub fn export_project(&self) -> Result<String, EditorError> {
        self.project_file()
            .to_json_pretty()
            .map_err(|e| EditorError::Encode(e.to_string()))
    }

    /// Map description that references the atlas by name only
    pub fn export_json(&self) -> Result<String, EditorError> {
        export::export_json(&self.map, self.atlas.as_ref(), self.selected_tile, self.seed)
    }

    /// Tiled TMX document
    pub fn export_xml(&self) -> String {
        export::export_tmx(&self.map, self.atlas.as_ref())
    }

    /// Replace the session contents with a project.
    ///
    /// All or nothing: the map and any embedded atlas are fully decoded before
    /// anything is replaced. History restarts with the loaded state as its floor.
    pub fn load_project(&mut self, project: &ProjectFile) -> Result<SessionStatus, EditorError> {
        let map = project.to_map()?;
        let atlas = match project.meta.atlas_image_data.as_deref() {
            Some(data) if !data.trim().is_empty() => Some(Atlas::from_data_url(
                data,
                map.tile_size(),
                project.meta.atlas_image_name.clone(),
            )?),
            _ => None,
        };

        self.map = map;
        if atlas.is_some() {
            self.atlas = atlas;
        }
        self.sync_atlas();
        self.selected_tile = project.meta.selected_tile_index.max(EMPTY_TILE);
        if project.meta.seed != 0 {
            self.seed = project.meta.seed;
        }
        self.stroke = None;
        self.history.reset(Snapshot::capture(&self.map, self.selected_tile));
        self.write_autosave();

        log::info!(
            "Loaded project: {}x{} map, {} layers",
            self.map.width(),
            self.map.height(),
            self.map.layer_count()
        );
        Ok(self.status())
    }

    /// Parse and load a project JSON document
    pub fn load_project_json(&mut self, json: &str) -> Result<SessionStatus, EditorError> {
        let project = ProjectFile::from_json(json)?;
        self.load_project(&project)
    }

    /// Write the project document to a file
    pub fn save_project(&self, path: &Path) -> Result<(), EditorError> {
        write_project(path, &self.project_file())
    }

    /// Load a project document from a file
    pub fn open_project(&mut self, path: &Path) -> Result<SessionStatus, EditorError> {
        let project = read_project(path)?;
        self.load_project(&project)
    }

    /// Load the autosave slot, if any. Returns true when a project was restored.
    ///
    /// An unreadable or corrupt slot is logged and leaves the session untouched.
    pub fn restore_autosave(&mut self) -> bool {
        let Some(autosave) = &self.autosave else {
            return false;
        };
        let project = match autosave.load() {
            Ok(Some(project)) => project,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("Could not read autosave: {}", e);
                return false;
            }
        };
        match self.load_project(&project) {
            Ok(_) => {
                log::info!("Loaded autosave");
                true
            }
            Err(e) => {
                log::warn!("Ignoring unusable autosave: {}", e);
                false
            }
        }
    }

    // Internals

    /// Record the current state if it differs from the top of history
    fn commit(&mut self) {
        let changed = self
            .history
            .top()
            .map_or(true, |top| !top.matches(&self.map));
        if !changed {
            log::debug!("Edit left the map unchanged, nothing recorded");
            return;
        }
        self.history
            .push_snapshot(Snapshot::capture(&self.map, self.selected_tile));
        self.write_autosave();
    }

    /// Write the autosave slot; failures never interrupt editing
    fn write_autosave(&self) {
        if let Some(autosave) = &self.autosave {
            if let Err(e) = autosave.save(&self.project_file()) {
                log::warn!("Autosave failed: {}", e);
            }
        }
    }

    /// Keep the atlas sliced at the map tile size
    fn sync_atlas(&mut self) {
        let tile_size = self.map.tile_size();
        if let Some(atlas) = self.atlas.as_mut() {
            if atlas.tile_size() != tile_size {
                atlas.reslice(tile_size);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn session(width: u32, height: u32, tile_size: u32) -> Session {
        Session::new(SessionConfig::new().with_map_size(width, height).with_tile_size(tile_size)).unwrap()
    }

    /// Screen point at the center of a tile with the default viewport
    fn at(tile_size: u32, tx: i32, ty: i32) -> (f32, f32) {
        let ts = tile_size as f32;
        (tx as f32 * ts + ts / 2.0, ty as f32 * ts + ts / 2.0)
    }

    fn click(session: &mut Session, tx: i32, ty: i32) {
        let (sx, sy) = at(session.map().tile_size(), tx, ty);
        session.pointer_down(sx, sy);
        session.pointer_up(sx, sy);
    }

    #[test]
    fn test_new_session() {
        let session = session(32, 32, 32);
        let status = session.status();
        assert_eq!((status.map_width, status.map_height, status.tile_size), (32, 32, 32));
        assert_eq!(status.layers.len(), 3);
        assert_eq!(status.layers[0].name, "Ground");
        assert_eq!(status.tool, EditorTool::Brush);
        assert!(!status.can_undo);
        assert_eq!(session.history().undo_len(), 1);
        assert!(session.autosave_path().is_none());
    }

    #[test]
    fn test_invalid_geometry() {
        let result = Session::new(SessionConfig::new().with_map_size(0, 10));
        assert!(matches!(result, Err(EditorError::InvalidGeometry(_))));
    }

    #[test]
    fn test_brush_click_and_undo() {
        let mut session = session(32, 32, 32);
        session.set_selected_tile(3);
        click(&mut session, 0, 0);
        assert_eq!(session.map().get_tile(0, 0, 0), Some(3));
        assert!(session.status().can_undo);

        session.undo();
        assert_eq!(session.map().get_tile(0, 0, 0), Some(EMPTY_TILE));
        session.redo();
        assert_eq!(session.map().get_tile(0, 0, 0), Some(3));
    }

    #[test]
    fn test_drag_is_one_undo_step() {
        let mut session = session(8, 8, 16);
        session.set_selected_tile(1);
        let (x0, y0) = at(16, 0, 0);
        let (x1, y1) = at(16, 5, 0);
        session.pointer_down(x0, y0);
        session.pointer_move(x1, y1);
        session.pointer_up(x1, y1);

        for x in 0..=5 {
            assert_eq!(session.map().get_tile(0, x, 0), Some(1));
        }
        assert_eq!(session.history().undo_len(), 2);
        session.undo();
        assert!(!session.map().layer(0).unwrap().has_tiles());
    }

    #[test]
    fn test_erase_drag() {
        let mut session = session(8, 8, 16);
        session.set_selected_tile(2);
        session.select_tool(EditorTool::Bucket);
        click(&mut session, 0, 0);
        session.select_tool(EditorTool::Erase);
        let (x0, y0) = at(16, 0, 3);
        let (x1, y1) = at(16, 7, 3);
        session.pointer_down(x0, y0);
        session.pointer_up(x1, y1);
        for x in 0..8 {
            assert_eq!(session.map().get_tile(0, x, 3), Some(EMPTY_TILE));
        }
        assert_eq!(session.map().get_tile(0, 0, 2), Some(2));
    }

    #[test]
    fn test_rect_commits_on_release() {
        let mut session = session(8, 8, 16);
        session.select_tool(EditorTool::Rect);
        session.set_selected_tile(4);
        let (x0, y0) = at(16, 1, 1);
        let (x1, y1) = at(16, 3, 2);
        session.pointer_down(x0, y0);
        session.pointer_move(x1, y1);
        assert_eq!(session.rect_preview(), Some((1, 1, 3, 2)));
        assert_eq!(session.map().get_tile(0, 1, 1), Some(EMPTY_TILE));

        session.pointer_up(x1, y1);
        assert_eq!(session.rect_preview(), None);
        assert_eq!(session.map().get_tile(0, 3, 2), Some(4));
        assert_eq!(session.history().undo_len(), 2);
    }

    #[test]
    fn test_picker_does_not_record_history() {
        let mut session = session(4, 4, 16);
        session.set_selected_tile(7);
        click(&mut session, 2, 2);
        session.select_tool(EditorTool::Picker);
        session.set_selected_tile(0);
        click(&mut session, 2, 2);
        assert_eq!(session.selected_tile(), 7);
        click(&mut session, 0, 0);
        assert_eq!(session.selected_tile(), 7);
        assert_eq!(session.history().undo_len(), 2);
    }

    #[test]
    fn test_noop_edit_records_nothing() {
        let mut session = session(4, 4, 16);
        click(&mut session, -3, -3);
        session.remove_layer(99);
        session.set_layer_visible(0, true);
        assert_eq!(session.history().undo_len(), 1);
    }

    #[test]
    fn test_layer_operations() {
        let mut session = session(4, 4, 16);
        let status = session.add_layer();
        assert_eq!(status.layers[3].name, "Layer 4");

        session.set_active_layer(3);
        session.move_layer_down(3);
        assert_eq!(session.status().active_layer, 2);

        session.rename_layer(0, "Floor");
        session.set_layer_opacity(0, 2.0);
        let status = session.status();
        assert_eq!(status.layers[0].name, "Floor");
        assert_eq!(status.layers[0].opacity, 1.0);

        // The clamped opacity changed nothing, so the rename is the latest entry
        session.undo();
        let status = session.status();
        assert_eq!(status.layers[0].name, "Ground");
        assert_eq!(status.layers[2].name, "Layer 4");
        session.undo();
        assert_eq!(session.status().layers[3].name, "Layer 4");
    }

    #[test]
    fn test_remove_last_layer_is_noop() {
        let mut session = session(4, 4, 16);
        session.remove_layer(0);
        session.remove_layer(0);
        let before = session.history().undo_len();
        let status = session.remove_layer(0);
        assert_eq!(status.layers.len(), 1);
        assert_eq!(session.history().undo_len(), before);
    }

    #[test]
    fn test_removing_upper_layer_keeps_painting_target() {
        let mut session = session(4, 4, 16);
        session.set_active_layer(1);
        let status = session.remove_layer(2);
        assert_eq!(status.active_layer, 1);

        session.set_selected_tile(6);
        click(&mut session, 2, 2);
        assert_eq!(session.map().get_tile(1, 2, 2), Some(6));
        assert_eq!(session.map().get_tile(0, 2, 2), Some(EMPTY_TILE));
    }

    #[test]
    fn test_resize_and_undo() {
        let mut session = session(4, 4, 16);
        click(&mut session, 3, 3);
        click(&mut session, 0, 0);
        session.resize_map(2, 6).unwrap();
        assert_eq!(session.map().get_tile(0, 0, 0), Some(0));
        assert_eq!(session.map().cell_count(), 12);

        assert!(matches!(
            session.resize_map(0, 6),
            Err(EditorError::InvalidGeometry(_))
        ));
        assert_eq!(session.map().width(), 2);

        session.undo();
        assert_eq!(session.map().width(), 4);
        assert_eq!(session.map().get_tile(0, 3, 3), Some(0));
    }

    #[test]
    fn test_collision_edit() {
        let mut session = session(4, 4, 16);
        session.set_collision(1, 1, true);
        assert_eq!(session.map().get_collision(0, 1, 1), Some(true));
        session.undo();
        assert_eq!(session.map().get_collision(0, 1, 1), Some(false));
    }

    #[test]
    fn test_tool_selection() {
        let mut session = session(4, 4, 16);
        let status = session.select_tool_by_name("bucket").unwrap();
        assert_eq!(status.tool, EditorTool::Bucket);
        assert!(matches!(
            session.select_tool_by_name("spray"),
            Err(EditorError::UnknownTool(_))
        ));
        assert_eq!(session.set_brush_size(0).brush_size, 1);
        assert_eq!(session.set_brush_size(100).brush_size, MAX_BRUSH_SIZE);
        assert!(session.toggle_auto_tile(true).auto_tile);
    }

    #[test]
    fn test_shortcuts() {
        let mut session = session(4, 4, 16);
        click(&mut session, 1, 1);
        session.handle_shortcut('e', Modifiers::default());
        assert_eq!(session.tool(), EditorTool::Erase);

        let ctrl = Modifiers {
            ctrl: true,
            shift: false,
        };
        session.handle_shortcut('z', ctrl);
        assert_eq!(session.map().get_tile(0, 1, 1), Some(EMPTY_TILE));
        session.handle_shortcut('y', ctrl);
        assert_eq!(session.map().get_tile(0, 1, 1), Some(0));
    }

    #[test]
    fn test_switching_tools_closes_stroke() {
        let mut session = session(4, 4, 16);
        let (sx, sy) = at(16, 1, 1);
        session.pointer_down(sx, sy);
        assert!(session.stroke_active());
        session.select_tool(EditorTool::Rect);
        assert!(!session.stroke_active());
        assert_eq!(session.history().undo_len(), 2);
    }

    #[test]
    fn test_undo_during_stroke_reverts_only_that_stroke() {
        let mut session = session(8, 8, 16);
        session.set_selected_tile(1);
        click(&mut session, 0, 0);

        session.set_selected_tile(2);
        let (sx, sy) = at(16, 5, 5);
        session.pointer_down(sx, sy);
        assert_eq!(session.map().get_tile(0, 5, 5), Some(2));

        session.undo();
        assert!(!session.stroke_active());
        assert_eq!(session.map().get_tile(0, 0, 0), Some(1));
        assert_eq!(session.map().get_tile(0, 5, 5), Some(EMPTY_TILE));

        session.redo();
        assert_eq!(session.map().get_tile(0, 0, 0), Some(1));
        assert_eq!(session.map().get_tile(0, 5, 5), Some(2));

        // Releasing the pointer afterwards records nothing further
        let entries = session.history().undo_len();
        session.pointer_up(sx, sy);
        assert_eq!(session.history().undo_len(), entries);
    }

    #[test]
    fn test_view_operations() {
        let mut session = session(32, 32, 32);
        let status = session.pan_by(10.0, -5.0);
        assert_eq!((status.pan_x, status.pan_y), (10.0, -5.0));

        session.wheel(100.0, 100.0, -200.0);
        assert!((session.viewport().zoom() - 1.3).abs() < 1e-3);
        assert_eq!(session.set_zoom(2.0).zoom, 2.0);

        let status = session.fit_to_view(800.0, 600.0);
        assert!(status.zoom <= 1.0);
        session.center_view(2048.0, 2048.0);
        assert_eq!(session.viewport().pan_x, (2048.0 - 1024.0 * session.viewport().zoom()) / 2.0);
    }

    #[test]
    fn test_atlas_load_failure_keeps_state() {
        let mut session = session(4, 4, 16);
        let result = session.load_atlas(b"nope".to_vec(), None);
        assert!(matches!(result, Err(EditorError::AtlasDecodeFailure(_))));
        assert!(session.atlas().is_none());
        assert!(session.export_atlas().is_none());
    }

    #[test]
    fn test_atlas_follows_tile_size() {
        let mut session = session(4, 4, 16);
        let atlas = Atlas::from_image(RgbaImage::from_pixel(64, 32, Rgba([1, 2, 3, 255])), 16, None).unwrap();
        let bytes = atlas.source_bytes().to_vec();
        let status = session.load_atlas(bytes.clone(), Some("tiles.png".into())).unwrap();
        assert_eq!(status.atlas_grid, Some((4, 2)));

        session.new_map(4, 4, 32).unwrap();
        assert_eq!(session.status().atlas_grid, Some((2, 1)));

        let (name, exported) = session.export_atlas().unwrap();
        assert_eq!(name, "tiles.png");
        assert_eq!(exported, bytes.as_slice());

        assert_eq!(session.clear_atlas().atlas_grid, None);
    }

    #[test]
    fn test_project_round_trip() {
        let mut session = session(6, 5, 16);
        session.set_selected_tile(9);
        click(&mut session, 2, 3);
        session.set_collision(4, 4, true);
        session.set_layer_visible(2, false);
        let json = session.export_project().unwrap();

        let mut other = Session::new(SessionConfig::default()).unwrap();
        let status = other.load_project_json(&json).unwrap();
        assert!(other.map().same_contents(session.map()));
        assert_eq!(status.selected_tile, 9);
        assert_eq!(other.seed(), session.seed());
        assert!(!status.can_undo);
    }

    #[test]
    fn test_failed_load_changes_nothing() {
        let mut session = session(4, 4, 16);
        click(&mut session, 1, 1);
        let before = session.map().clone();
        let bad = r#"{"meta": {"mapW": 4, "mapH": 4, "tileSize": 16}, "layers": [{"name": "x", "visible": true, "data": [1, 2]}]}"#;
        assert!(matches!(
            session.load_project_json(bad),
            Err(EditorError::MalformedProject(_))
        ));
        assert_eq!(session.map(), &before);
        assert!(session.status().can_undo);
    }

    #[test]
    fn test_render_sizes() {
        let session = session(4, 3, 8);
        assert_eq!(session.render(100, 50).dimensions(), (100, 50));
        assert_eq!(session.render_overview().dimensions(), (4, 3));
        let png = session.export_raster(2.0).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
        assert_eq!(session.raster_file_name(2.0), "tileforge_map_4x3@2x.png");
    }
}
