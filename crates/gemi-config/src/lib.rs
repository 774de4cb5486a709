//! Gemi configuration system.
//!
//! Provides TOML-based configuration with environment overrides for
//! secrets and full validation. All config sections use sensible defaults
//! so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gemi_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("model: {}", config.model.model);
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_from};
pub use schema::{GemiConfig, CONFIG_SCHEMA_VERSION};
pub use validation::{require_secrets, validate};

use std::path::Path;

use gemi_common::ConfigError;

/// Load config from `path`, or from the platform default path when `None`.
///
/// Environment overrides are applied on top of the file, then the result
/// is validated. Unlike [`toml_loader::load_from_path`], invalid values
/// are a hard error here.
pub fn load_config(path: Option<&Path>) -> Result<GemiConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            toml_loader::load_from_path(path)?
        }
        None => toml_loader::load_default()?,
    };

    apply_env_overrides(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn load_config_missing_explicit_path_is_file_not_found() {
        let result = load_config(Some(Path::new("/tmp/definitely_missing_gemi.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model]\ntemperature = 7.5\n").unwrap();

        let result = load_config(Some(&path));
        match result {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("model.temperature")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = GemiConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: GemiConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.model.model, config.model.model);
        assert_eq!(parsed.prompt.max_file_bytes, 20_000_000);
        assert_eq!(parsed.session.max_tool_rounds, 5);
    }
}
