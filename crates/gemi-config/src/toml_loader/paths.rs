//! Where the config file lives, and writing the commented default.

use std::io::Write;
use std::path::{Path, PathBuf};

use gemi_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "GEMI_CONFIG";

/// Config path for this process: `$GEMI_CONFIG`, else the platform default.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    config_path_from(|key| std::env::var(key).ok())
}

/// Resolve the config path with `lookup` standing in for the environment.
pub fn config_path_from<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(explicit) = lookup(CONFIG_PATH_ENV).filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(explicit.trim()));
    }
    dirs::config_dir()
        .map(|dir| dir.join("gemi").join("config.toml"))
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))
}

/// Write the default config to `path`. An existing file is left untouched.
///
/// Returns whether a file was created.
pub fn create_default_config(path: &Path) -> Result<bool, ConfigError> {
    let write_error = |e: std::io::Error| {
        ConfigError::ParseError(format!("failed to write {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(write_error(e)),
    };
    file.write_all(default_config_toml().as_bytes())
        .map_err(write_error)?;

    info!(path = %path.display(), "Wrote default config");
    Ok(true)
}
