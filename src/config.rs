//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\teevee\config.toml
//! - macOS: ~/Library/Application Support/teevee/config.toml
//! - Linux: ~/.config/teevee/config.toml
//!
//! The config file is human-readable and editable. Settings are
//! loaded at startup; `load()` never fails, it falls back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Map panel settings
    pub map: MapConfig,
}

/// Slippy-map tile settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Minimum zoom level
    pub min_zoom: u8,

    /// Maximum zoom level
    pub max_zoom: u8,

    /// Zoom level at startup
    pub initial_zoom: u8,

    /// Mosaic grid width in tiles
    pub tiles_wide: u32,

    /// Mosaic grid height in tiles
    pub tiles_high: u32,

    /// Tile server URL templates, tried in order ({z}/{x}/{y} placeholders)
    pub tile_servers: Vec<String>,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// Location delta (degrees) below which the composite is reused
    pub staleness_epsilon_deg: f64,

    /// RGBA tint blended over every fetched tile
    pub tile_tint: [u8; 4],

    /// Mosaic fill color behind missing tiles
    pub fill_color: [u8; 4],
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_zoom: 2,
            max_zoom: 18,
            initial_zoom: 12,
            tiles_wide: 3,
            tiles_high: 3,
            tile_servers: vec![
                "https://a.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
                "https://b.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
                "https://c.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            ],
            request_timeout_secs: 3,
            staleness_epsilon_deg: 0.0001,
            tile_tint: [255, 255, 255, 80],
            fill_color: [0, 15, 0, 255],
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("teevee"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the standard config directory.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &dir)
}

/// Write `config.toml` into `dir`, creating the directory if needed. The
/// file is staged next to its final name and renamed into place, so a
/// crash mid-write never leaves a half-written config behind.
fn save_to(config: &Config, dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    let path = dir.join("config.toml");
    let staging = dir.join("config.toml.tmp");
    std::fs::write(&staging, &contents).map_err(|e| ConfigError::Write(staging.clone(), e))?;
    std::fs::rename(&staging, &path).map_err(|e| ConfigError::Rename(staging, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
