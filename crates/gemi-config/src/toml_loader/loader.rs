//! Reading and parsing `config.toml`.
//!
//! Loading only parses. Range checks run later in [`crate::load_config`],
//! after environment overrides have been applied.

use std::path::Path;

use gemi_common::ConfigError;
use tracing::info;

use super::paths::{create_default_config, default_config_path};
use crate::schema::GemiConfig;

/// Parse config text. `origin` names the source in error messages.
pub fn parse_config(content: &str, origin: &str) -> Result<GemiConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("{origin}: {e}")))
}

/// Load config from a TOML file. Missing fields take their defaults.
pub fn load_from_path(path: &Path) -> Result<GemiConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;
    let config = parse_config(&content, &path.display().to_string())?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load the config from [`default_config_path`], writing the commented
/// default there first if nothing exists yet.
pub fn load_default() -> Result<GemiConfig, ConfigError> {
    let path = default_config_path()?;
    if create_default_config(&path)? {
        return Ok(GemiConfig::default());
    }
    load_from_path(&path)
}
