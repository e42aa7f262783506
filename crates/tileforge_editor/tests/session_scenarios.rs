//! End-to-end editing scenarios driven through the public `Session` API

use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tileforge_editor::tileforge_core::{ProjectFile, EMPTY_TILE};
use tileforge_editor::{Atlas, EditorTool, Session, SessionConfig, Viewport};

fn temp_dir(test: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tileforge_it_{}_{}", test, std::process::id()))
}

/// 8x8 atlas of 32px tiles, each tile a distinct solid color
fn atlas_png() -> Vec<u8> {
    let image = RgbaImage::from_fn(256, 256, |x, y| {
        let index = (y / 32) * 8 + x / 32;
        Rgba([(index * 4) as u8, 255 - (index * 4) as u8, 128, 255])
    });
    Atlas::from_image(image, 32, None)
        .unwrap()
        .source_bytes()
        .to_vec()
}

/// Screen point at the center of a tile for the session's current viewport
fn tile_center(session: &Session, tx: i32, ty: i32) -> (f32, f32) {
    let ts = session.map().tile_size();
    let (sx, sy) = session.viewport().tile_to_screen(tx, ty, ts);
    let half = ts as f32 * session.viewport().zoom() / 2.0;
    (sx + half, sy + half)
}

fn click(session: &mut Session, tx: i32, ty: i32) {
    let (sx, sy) = tile_center(session, tx, ty);
    session.pointer_down(sx, sy);
    session.pointer_up(sx, sy);
}

#[test]
fn brush_on_32x32_map_then_undo() {
    let mut session = Session::new(SessionConfig::default()).unwrap();
    session.load_atlas(atlas_png(), Some("atlas.png".into())).unwrap();
    assert_eq!(session.status().atlas_grid, Some((8, 8)));

    session.select_tool(EditorTool::Brush);
    session.set_brush_size(1);
    session.set_selected_tile(3);
    click(&mut session, 0, 0);

    let layer = session.map().active_layer();
    assert_eq!(session.map().get_tile(layer, 0, 0), Some(3));
    session.undo();
    assert_eq!(session.map().get_tile(layer, 0, 0), Some(EMPTY_TILE));
}

#[test]
fn flood_fill_10x10_touches_only_active_layer() {
    let mut session = Session::new(SessionConfig::new().with_map_size(10, 10)).unwrap();
    session.set_active_layer(1);
    session.select_tool(EditorTool::Bucket);
    session.set_selected_tile(2);
    click(&mut session, 5, 5);

    let map = session.map();
    assert!(map.layer(1).unwrap().data.iter().all(|&t| t == 2));
    assert!(!map.layer(0).unwrap().has_tiles());
    assert!(!map.layer(2).unwrap().has_tiles());

    // A second identical fill changes nothing and records nothing
    let entries = session.history().undo_len();
    click(&mut session, 0, 0);
    assert_eq!(session.history().undo_len(), entries);
}

#[test]
fn undo_and_redo_are_exact() {
    let mut session = Session::new(SessionConfig::new().with_map_size(12, 9).with_tile_size(16)).unwrap();
    session.set_selected_tile(5);
    click(&mut session, 1, 1);

    let edits: Vec<Box<dyn Fn(&mut Session)>> = vec![
        Box::new(|s: &mut Session| {
            s.set_brush_size(3);
            click(s, 4, 4);
        }),
        Box::new(|s: &mut Session| {
            s.select_tool(EditorTool::Rect);
            let (x0, y0) = tile_center(s, 0, 5);
            let (x1, y1) = tile_center(s, 11, 8);
            s.pointer_down(x0, y0);
            s.pointer_move(x1, y1);
            s.pointer_up(x1, y1);
        }),
        Box::new(|s: &mut Session| {
            s.select_tool(EditorTool::Bucket);
            s.set_selected_tile(1);
            click(s, 10, 0);
        }),
        Box::new(|s: &mut Session| {
            s.resize_map(6, 20).unwrap();
        }),
        Box::new(|s: &mut Session| {
            s.add_layer();
        }),
        Box::new(|s: &mut Session| {
            s.remove_layer(0);
        }),
        Box::new(|s: &mut Session| {
            s.set_collision(2, 2, true);
        }),
    ];

    for edit in edits {
        let before = session.map().clone();
        edit(&mut session);
        let after = session.map().clone();
        assert!(!before.same_contents(&after));

        session.undo();
        assert!(session.map().same_contents(&before));
        session.redo();
        assert!(session.map().same_contents(&after));
    }
}

#[test]
fn undo_stack_never_empties() {
    let mut session = Session::new(SessionConfig::new().with_history_capacity(4)).unwrap();
    for tile in 0..10 {
        session.set_selected_tile(tile);
        click(&mut session, tile, 0);
    }
    assert_eq!(session.history().undo_len(), 4);

    for _ in 0..20 {
        session.undo();
    }
    assert_eq!(session.history().undo_len(), 1);
    assert!(!session.status().can_undo);
    // Oldest surviving state: tiles 0..=6 painted
    assert_eq!(session.map().get_tile(0, 6, 0), Some(6));
    assert_eq!(session.map().get_tile(0, 7, 0), Some(EMPTY_TILE));
}

#[test]
fn remove_layer_keeps_at_least_one() {
    let mut session = Session::new(SessionConfig::default()).unwrap();
    for _ in 0..5 {
        session.remove_layer(0);
    }
    assert_eq!(session.map().layer_count(), 1);
    assert_eq!(session.map().layers()[0].name, "Top");
}

#[test]
fn resize_preserves_overlap() {
    let mut session = Session::new(SessionConfig::new().with_map_size(8, 8).with_tile_size(8)).unwrap();
    session.select_tool(EditorTool::Bucket);
    session.set_selected_tile(9);
    click(&mut session, 0, 0);
    session.set_collision(7, 7, true);

    session.resize_map(5, 12).unwrap();
    let map = session.map();
    for y in 0..12 {
        for x in 0..5 {
            let expected = if y < 8 { 9 } else { EMPTY_TILE };
            assert_eq!(map.get_tile(0, x, y), Some(expected), "cell ({x}, {y})");
            assert_eq!(map.get_collision(0, x, y), Some(false));
        }
    }
}

#[test]
fn project_round_trip_with_atlas() {
    let mut session = Session::new(SessionConfig::new().with_map_size(16, 12)).unwrap();
    session.load_atlas(atlas_png(), Some("atlas.png".into())).unwrap();
    session.set_selected_tile(17);
    click(&mut session, 3, 4);
    session.set_active_layer(2);
    session.set_selected_tile(63);
    click(&mut session, 15, 11);
    session.rename_layer(1, "Props");
    session.set_layer_visible(0, false);
    session.set_collision(15, 11, true);

    let json = session.export_project().unwrap();
    let mut restored = Session::new(SessionConfig::default()).unwrap();
    restored.load_project_json(&json).unwrap();

    assert_eq!(restored.map().layers(), session.map().layers());
    assert_eq!(restored.atlas().unwrap().source_bytes(), session.atlas().unwrap().source_bytes());
    assert_eq!(restored.export_project().unwrap(), json);
    assert_eq!(
        restored.export_raster(1.0).unwrap(),
        session.export_raster(1.0).unwrap()
    );
}

#[test]
fn legacy_project_keys_are_accepted() {
    let json = r#"{
        "meta": {"mapW": 2, "mapH": 1, "tileSize": 32, "tilesetImageDataUrl": null},
        "layers": [{"name": "Ground", "visible": true, "data": [4, -1], "collision": [0, 1]}]
    }"#;
    let mut session = Session::new(SessionConfig::default()).unwrap();
    session.load_project_json(json).unwrap();
    assert_eq!(session.map().get_tile(0, 0, 0), Some(4));
    assert_eq!(session.map().get_collision(0, 1, 0), Some(true));
}

#[test]
fn xml_export_shifts_tile_ids() {
    let mut session = Session::new(SessionConfig::new().with_map_size(3, 1)).unwrap();
    session.set_selected_tile(5);
    click(&mut session, 1, 0);
    let xml = session.export_xml();
    assert!(xml.contains("0,6,0"));
}

#[test]
fn raster_dimensions_follow_scale() {
    let session = Session::new(SessionConfig::new().with_map_size(5, 3).with_tile_size(16)).unwrap();
    for (scale, expected) in [(1.0, (80, 48)), (4.0, (320, 192)), (12.0, (640, 384))] {
        let png = session.export_raster(scale).unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!((image.width(), image.height()), expected);
    }
}

#[test]
fn zoom_keeps_point_under_cursor() {
    let mut viewport = Viewport::default();
    viewport.zoom_at(100.0, 100.0, 2.0);
    let (sx, sy) = viewport.world_to_screen(100.0, 100.0);
    assert!((sx - 100.0).abs() < 1e-3);
    assert!((sy - 100.0).abs() < 1e-3);

    let mut session = Session::new(SessionConfig::default()).unwrap();
    session.zoom_at(100.0, 100.0, 2.0);
    assert_eq!(session.viewport().world_to_screen(100.0, 100.0), (100.0, 100.0));
}

#[test]
fn painting_works_under_pan_and_zoom() {
    let mut session = Session::new(SessionConfig::new().with_map_size(10, 10).with_tile_size(16)).unwrap();
    session.fit_to_view(300.0, 200.0);
    session.pan_by(13.0, -7.0);
    session.set_selected_tile(8);
    click(&mut session, 6, 2);
    assert_eq!(session.map().get_tile(0, 6, 2), Some(8));
}

#[test]
fn autosave_round_trip() {
    let dir = temp_dir("autosave");
    let path = dir.join("tileforge_autosave.json");
    let config = SessionConfig::new().with_map_size(6, 6).with_autosave_path(&path);

    let mut session = Session::new(config.clone()).unwrap();
    session.set_selected_tile(11);
    click(&mut session, 2, 2);
    assert!(path.exists());

    let mut restored = Session::new(config).unwrap();
    assert!(restored.restore_autosave());
    assert!(restored.map().same_contents(session.map()));
    assert_eq!(restored.selected_tile(), 11);

    let saved = ProjectFile::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved.to_map().unwrap().get_tile(0, 2, 2), Some(11));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn autosave_failure_never_blocks_editing() {
    let dir = temp_dir("blocked");
    std::fs::create_dir_all(&dir).unwrap();
    // A directory where the autosave file should be makes every write fail
    let path = dir.join("slot.json");
    std::fs::create_dir_all(&path).unwrap();

    let mut session = Session::new(SessionConfig::new().with_autosave_path(&path)).unwrap();
    click(&mut session, 0, 0);
    assert_eq!(session.map().get_tile(0, 0, 0), Some(0));
    assert!(session.status().can_undo);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn corrupt_autosave_is_ignored() {
    let dir = temp_dir("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tileforge_autosave.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut session = Session::new(SessionConfig::new().with_map_size(5, 4).with_autosave_path(&path)).unwrap();
    let before = session.map().clone();
    assert!(!session.restore_autosave());
    assert!(session.map().same_contents(&before));
    assert!(!session.status().can_undo);

    // A readable slot holding an invalid map is skipped the same way
    std::fs::write(
        &path,
        r#"{"meta": {"mapW": 0, "mapH": 1, "tileSize": 32}, "layers": []}"#,
    )
    .unwrap();
    assert!(!session.restore_autosave());
    assert_eq!(session.map().width(), 5);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn save_and_open_project_file() {
    let dir = temp_dir("files");
    let path = dir.join("maps").join("level.json");

    let mut session = Session::new(SessionConfig::new().with_map_size(4, 4)).unwrap();
    session.set_selected_tile(2);
    click(&mut session, 3, 3);
    session.save_project(&path).unwrap();

    let mut other = Session::new(SessionConfig::default()).unwrap();
    other.open_project(&path).unwrap();
    assert!(other.map().same_contents(session.map()));
    assert_eq!(other.map().get_tile(0, 3, 3), Some(2));

    let _ = std::fs::remove_dir_all(dir);
}
