//! Full configuration validation.
//!
//! Validates numeric ranges and value formats section by section and
//! collects every error into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::GemiConfig;
use gemi_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &GemiConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_bot(&mut errors, config);
    sections::validate_model(&mut errors, config);
    sections::validate_search(&mut errors, config);
    sections::validate_image(&mut errors, config);
    sections::validate_voice(&mut errors, config);
    sections::validate_prompt(&mut errors, config);
    sections::validate_session(&mut errors, config);
    sections::validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Check the secrets the bot cannot start without.
pub fn require_secrets(config: &GemiConfig) -> Result<(), ConfigError> {
    let mut missing = Vec::new();
    if config.bot.token.trim().is_empty() {
        missing.push("bot.token (BOT_TOKEN)");
    }
    if config.model.api_key.trim().is_empty() {
        missing.push("model.api_key (GOOGLE_API_KEY)");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "missing required secrets: {}",
            missing.join(", ")
        )))
    }
}
