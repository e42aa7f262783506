//! Command line front-end for TileForge projects
//!
//! Run with: tileforge info map.json

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tileforge_core::{DEFAULT_MAP_SIZE, DEFAULT_TILE_SIZE};
use tileforge_editor::export::{png_file_name, tmx_file_name};
use tileforge_editor::preferences::EditorPreferences;
use tileforge_editor::project::write_bytes;
use tileforge_editor::{EditorError, Session, SessionConfig};

#[derive(Parser)]
#[command(name = "tileforge", version, about = "Inspect, create and export TileForge tile maps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print map size, layers and tileset information")]
    Info { project: PathBuf },

    #[command(about = "Export a project to PNG, TMX, JSON or its tileset image")]
    Export {
        project: PathBuf,

        #[arg(help = "Write a PNG render of all visible layers", long)]
        png: Option<PathBuf>,

        #[arg(help = "Integer PNG scale factor (1 to 8)", long, default_value_t = 1.0)]
        scale: f32,

        #[arg(help = "Write a Tiled TMX document", long)]
        tmx: Option<PathBuf>,

        #[arg(help = "Write the JSON map description (atlas referenced by name)", long)]
        json: Option<PathBuf>,

        #[arg(help = "Write the embedded tileset image", long)]
        atlas: Option<PathBuf>,

        #[arg(help = "Write a one pixel per tile overview PNG", long)]
        overview: Option<PathBuf>,

        #[arg(help = "Directory for default PNG and TMX output when no target is given", long, default_value = ".")]
        out_dir: PathBuf,
    },

    #[command(about = "Create an empty project")]
    New {
        out: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAP_SIZE)]
        width: u32,

        #[arg(long, default_value_t = DEFAULT_MAP_SIZE)]
        height: u32,

        #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
        tile_size: u32,

        #[arg(help = "Tileset image to embed", long)]
        atlas: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), EditorError> {
    match command {
        Commands::Info { project } => {
            let session = open(&project)?;
            print_info(&session);
            Ok(())
        }
        Commands::Export {
            project,
            png,
            scale,
            tmx,
            json,
            atlas,
            overview,
            out_dir,
        } => {
            let session = open(&project)?;
            let nothing_requested =
                png.is_none() && tmx.is_none() && json.is_none() && atlas.is_none() && overview.is_none();

            let (png, tmx) = if nothing_requested {
                (
                    Some(out_dir.join(session.raster_file_name(scale))),
                    Some(out_dir.join(tmx_file_name(session.map()))),
                )
            } else {
                (png, tmx)
            };

            if let Some(path) = png {
                write_bytes(&path, &session.export_raster(scale)?)?;
                log::info!("Wrote {:?}", path);
            }
            if let Some(path) = tmx {
                write_bytes(&path, session.export_xml().as_bytes())?;
                log::info!("Wrote {:?}", path);
            }
            if let Some(path) = json {
                write_bytes(&path, session.export_json()?.as_bytes())?;
                log::info!("Wrote {:?}", path);
            }
            if let Some(path) = atlas {
                match session.export_atlas() {
                    Some((_, bytes)) => {
                        write_bytes(&path, bytes)?;
                        log::info!("Wrote {:?}", path);
                    }
                    None => log::warn!("Project has no tileset, skipping {:?}", path),
                }
            }
            if let Some(path) = overview {
                let bytes = tileforge_editor::export::encode_png(&session.render_overview())?;
                write_bytes(&path, &bytes)?;
                log::info!("Wrote {:?}", path);
            }
            Ok(())
        }
        Commands::New {
            out,
            width,
            height,
            tile_size,
            atlas,
        } => {
            let config = EditorPreferences::load()
                .to_session_config()
                .with_map_size(width, height)
                .with_tile_size(tile_size)
                .with_autosave(false);
            let mut session = Session::new(config)?;
            if let Some(path) = atlas {
                let bytes = std::fs::read(&path).map_err(|e| EditorError::Io(e.to_string()))?;
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                session.load_atlas(bytes, name)?;
            }
            session.save_project(&out)?;
            log::info!(
                "Created {}x{} project {:?} (PNG export name {})",
                width,
                height,
                out,
                png_file_name(session.map(), 1)
            );
            Ok(())
        }
    }
}

/// Load a project into a session that never touches the autosave slot
fn open(path: &Path) -> Result<Session, EditorError> {
    let mut session = Session::new(SessionConfig::new().with_autosave(false))?;
    session.open_project(path)?;
    Ok(session)
}

fn print_info(session: &Session) {
    let status = session.status();
    println!(
        "Map: {}x{} tiles of {}px",
        status.map_width, status.map_height, status.tile_size
    );
    match session.atlas() {
        Some(atlas) => println!(
            "Tileset: {} ({}x{} tiles)",
            atlas.file_name(),
            atlas.cols(),
            atlas.rows()
        ),
        None => println!("Tileset: none"),
    }
    println!("Selected tile: {}", status.selected_tile);
    println!("Layers:");
    for (index, layer) in session.map().layers().iter().enumerate() {
        let painted = layer.data.iter().filter(|&&t| t >= 0).count();
        let solid = layer.collision.iter().filter(|&&c| c != 0).count();
        println!(
            "  {}: {}{} opacity {:.2}, {} tiles, {} solid",
            index,
            layer.name,
            if layer.visible { "" } else { " (hidden)" },
            layer.opacity,
            painted,
            solid
        );
    }
}
