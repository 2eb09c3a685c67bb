//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "GCAT_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "genre_catalog.db";

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub log_level: Option<String>,
    #[serde(default)]
    pub inference: InferenceToml,
}

/// `[inference]` table of the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InferenceToml {
    pub max_lock_wait_ms: Option<u64>,
    pub membership_batch_size: Option<usize>,
}

/// OS-dependent compiled defaults, the lowest priority tier
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub max_lock_wait_ms: u64,
    pub membership_batch_size: usize,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            max_lock_wait_ms: 5000,
            // Same chunk size the playlist bulk insert has always used
            membership_batch_size: 100,
        }
    }
}

/// Parse a TOML config file
pub fn parse_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Locate and parse the TOML config file
///
/// An explicit path wins over the platform config location and must exist.
/// Returns `Ok(None)` when no explicit path is given and the platform file
/// is absent. Callers treat `Err` as a warning and fall back to defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<Option<TomlConfig>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    parse_toml_config(&path).map(Some)
}

/// Platform config file location (`<config_dir>/gcat/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gcat").join("config.toml"))
}

/// Root folder resolution, in priority order:
/// 1. Command-line argument
/// 2. `GCAT_ROOT_FOLDER` environment variable
/// 3. TOML config file `root_folder`
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: Option<&TomlConfig>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml.and_then(|c| c.root_folder.clone()) {
        return path;
    }

    default_root_folder()
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gcat"))
        .unwrap_or_else(|| PathBuf::from("./gcat_data"))
}
