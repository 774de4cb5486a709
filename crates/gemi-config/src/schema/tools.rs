//! Tool provider configuration: web search, image generation, voice.
//!
//! A tool whose provider is not configured stays declared to the model
//! but fails with a "feature disabled" error when called.

use serde::{Deserialize, Serialize};

/// Web search provider (Tavily-compatible).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Result count used when the model omits `max_results` (valid range: 1-10).
    pub default_max_results: u32,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("default_max_results", &self.default_max_results)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.tavily.com".into(),
            default_max_results: 1,
        }
    }
}

impl SearchConfig {
    pub fn enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// One OpenAI-compatible image generation endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProviderConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for ImageProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            name: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "dall-e-3".into(),
        }
    }
}

/// Image generation providers, tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub providers: Vec<ImageProviderConfig>,
    /// Images requested per tool call (valid range: 1-4).
    pub count: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            count: 1,
        }
    }
}

impl ImageConfig {
    pub fn enabled(&self) -> bool {
        !self.providers.is_empty()
    }
}

/// Self-hosted text-to-speech engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Base URL of the voice engine; voice output is disabled when unset.
    pub api_url: Option<String>,
    /// `engine:voice` pair, e.g. `piper:en_US-lessac-medium`.
    pub tts_voice: String,
    /// Delay between readiness probes while the engine warms up.
    pub probe_interval_secs: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            tts_voice: "piper:en_US-lessac-medium".into(),
            probe_interval_secs: 10,
        }
    }
}

impl VoiceConfig {
    pub fn enabled(&self) -> bool {
        self.api_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    /// Split `tts_voice` into its engine and voice halves.
    pub fn engine_and_voice(&self) -> Option<(&str, &str)> {
        let (engine, voice) = self.tts_voice.split_once(':')?;
        if engine.is_empty() || voice.is_empty() {
            return None;
        }
        Some((engine, voice))
    }
}
