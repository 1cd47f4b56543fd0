//! Configuration resolution for inmo-api
//!
//! Resolution priority per value: environment variable, then TOML config
//! file, then compiled default. The uploads directory resolved here is
//! injected into the media store at construction; nothing else in the crate
//! reads it from ambient state.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default listen port
pub const DEFAULT_PORT: u16 = 5800;

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Directory holding persistent media files (served as /uploads)
    pub uploads_dir: PathBuf,
}

/// On-disk TOML shape; every field optional so partial files work
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
}

impl Config {
    /// Resolve configuration from ENV, TOML and defaults
    pub fn resolve() -> Result<Self> {
        let toml_config = load_toml_config()?;
        let root = default_data_root();

        let port = match std::env::var("INMO_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("Invalid INMO_PORT: {}", raw)))?,
            Err(_) => toml_config.port.unwrap_or(DEFAULT_PORT),
        };

        let database_path = std::env::var("INMO_DATABASE_PATH")
            .map(PathBuf::from)
            .ok()
            .or(toml_config.database_path)
            .unwrap_or_else(|| root.join("inmo.db"));

        let uploads_dir = std::env::var("INMO_UPLOADS_DIR")
            .map(PathBuf::from)
            .ok()
            .or(toml_config.uploads_dir)
            .unwrap_or_else(|| root.join("uploads"));

        Ok(Config {
            port,
            database_path,
            uploads_dir,
        })
    }
}

/// Load the TOML config file, if one exists
///
/// Looks at INMO_CONFIG first, then the platform config directory
/// (`~/.config/inmo/config.toml` on Linux). A missing file is not an error;
/// a present-but-malformed file is.
fn load_toml_config() -> Result<TomlConfig> {
    let path = match std::env::var("INMO_CONFIG") {
        Ok(p) => PathBuf::from(p),
        Err(_) => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed: {}", e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("inmo").join("config.toml"))
}

/// OS-dependent default data root
fn default_data_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("inmo"))
        .unwrap_or_else(|| PathBuf::from("./inmo_data"))
}

/// Create the data directories a fresh install needs
pub fn ensure_directories(config: &Config) -> Result<()> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&config.uploads_dir)?;
    std::fs::create_dir_all(tmp_upload_dir(&config.uploads_dir))?;
    Ok(())
}

/// Temp-file staging area for in-flight uploads
pub fn tmp_upload_dir(uploads_dir: &Path) -> PathBuf {
    uploads_dir.join("tmp")
}
