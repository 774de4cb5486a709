//! Gemini API client configuration.

use gemi_config::schema::ModelConfig;

use crate::prompts::system_instruction;

/// Gemini API client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub system_instruction: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = ModelConfig::default();
        Self {
            api_key: api_key.into(),
            api_base: defaults.api_base,
            model: defaults.model,
            max_tokens: defaults.max_output_tokens,
            temperature: defaults.temperature,
            system_instruction: system_instruction(None),
        }
    }

    /// Build from the `[model]` config section.
    pub fn from_model_config(config: &ModelConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_api_base(config.api_base.clone())
            .with_model(config.model.clone())
            .with_max_tokens(config.max_output_tokens)
            .with_temperature(config.temperature)
            .with_system_instruction(system_instruction(config.system_prompt.as_deref()))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = text.into();
        self
    }
}
