//! Environment overrides for secrets and deployment-specific values.
//!
//! Secrets are normally supplied through the environment (or a `.env`
//! file loaded by the binary) rather than written into `config.toml`.

use tracing::debug;

use crate::schema::{GemiConfig, ImageProviderConfig};

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut GemiConfig) {
    apply_env_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` to resolve variable names.
///
/// Empty values are ignored so an exported-but-blank variable does not
/// wipe a value from the config file.
pub fn apply_env_overrides_from<F>(config: &mut GemiConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .inspect(|_| debug!(var = key, "config override from environment"))
    };

    if let Some(token) = get("BOT_TOKEN") {
        config.bot.token = token;
    }
    if let Some(key) = get("GOOGLE_API_KEY") {
        config.model.api_key = key;
    }
    if let Some(model) = get("GEMINI_MODEL") {
        config.model.model = model;
    }
    if let Some(key) = get("TAVILY_API_KEY") {
        config.search.api_key = Some(key);
    }
    if let Some(url) = get("VOICE_API_URL") {
        config.voice.api_url = Some(url);
    }
    if let Some(voice) = get("TTS_VOICE") {
        config.voice.tts_voice = voice;
    }

    // IMAGE_API_KEY configures (or re-keys) the first image provider.
    if let Some(key) = get("IMAGE_API_KEY") {
        match config.image.providers.first_mut() {
            Some(provider) => provider.api_key = key,
            None => config.image.providers.push(ImageProviderConfig {
                api_key: key,
                ..Default::default()
            }),
        }
    }
    if let Some(url) = get("IMAGE_API_URL") {
        if let Some(provider) = config.image.providers.first_mut() {
            provider.base_url = url;
        }
    }
}
