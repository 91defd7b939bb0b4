//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed arguments
//! and returns an `anyhow::Result<()>`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config;
use crate::metadata;
use crate::tiles::TileMapManager;

/// TeeVee CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the metadata extracted from audio files
    Probe {
        /// Audio files to probe (.m4a, .mp3, .wav)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Fetch a map composite for a coordinate and write it to a PNG
    Map {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Zoom level (clamped to the configured range)
        #[arg(short, long)]
        zoom: Option<u8>,
        /// Output width in pixels (scales the tile mosaic when set)
        #[arg(long)]
        width: Option<u32>,
        /// Output height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Output file
        #[arg(short, long, default_value = "map.png")]
        out: PathBuf,
    },
}

/// Run the parsed CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Probe { files } => cmd_probe(files),
        Commands::Map {
            lat,
            lon,
            zoom,
            width,
            height,
            out,
        } => cmd_map(*lat, *lon, *zoom, *width, *height, out),
    }
}

// ============================================================================
// Individual command implementations
// ============================================================================

fn cmd_probe(files: &[PathBuf]) -> anyhow::Result<()> {
    for path in files {
        let meta = metadata::extract(path);

        println!("{}", path.display());
        println!("  Artist: {}", meta.artist);
        println!("  Album:  {}", meta.album);
        println!("  Title:  {}", meta.title);
        match &meta.art {
            Some(art) => println!("  Art:    {} bytes", art.len()),
            None => println!("  Art:    none"),
        }
        if let Some(notice) = &meta.notice {
            println!("  Note:   {}", notice);
        }
        println!();
    }
    Ok(())
}

fn cmd_map(
    lat: f64,
    lon: f64,
    zoom: Option<u8>,
    width: Option<u32>,
    height: Option<u32>,
    out: &PathBuf,
) -> anyhow::Result<()> {
    let config = config::load();
    let mut map_config = config.map;
    if let Some(zoom) = zoom {
        map_config.initial_zoom = zoom.clamp(map_config.min_zoom, map_config.max_zoom);
    }

    let manager = TileMapManager::with_http(map_config).context("starting map manager")?;
    if let (Some(w), Some(h)) = (width, height) {
        manager.set_content_area(w, h);
    }

    println!(
        "Fetching map for ({:.4}, {:.4}) at zoom {}...",
        lat,
        lon,
        manager.current_zoom()
    );

    // First call kicks off the background load; wait for it to settle.
    manager.get_static_map(lat, lon);
    if !manager.wait_until_idle(Duration::from_secs(60)) {
        anyhow::bail!("map load did not finish within 60 seconds");
    }

    let (surface, label) = manager.get_static_map(lat, lon);
    let surface = surface.context("no composite was published")?;
    surface
        .save(out)
        .with_context(|| format!("writing {}", out.display()))?;

    println!("{} -> {}", label, out.display());
    Ok(())
}
