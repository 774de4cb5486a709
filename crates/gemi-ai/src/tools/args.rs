//! Typed tool arguments and their validation.

use serde::{Deserialize, Serialize};

/// Output quality tier requested by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    /// Edge length of generated images, in pixels.
    pub fn pixels(self) -> u32 {
        match self {
            Quality::Low => 512,
            Quality::Medium => 1024,
            Quality::High => 2048,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTopic {
    #[default]
    General,
    News,
}

impl SearchTopic {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchTopic::General => "general",
            SearchTopic::News => "news",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    /// Function-call arguments arrive as JSON numbers, which may be floats.
    #[serde(default)]
    pub max_results: Option<f64>,
    #[serde(default)]
    pub topic: SearchTopic,
}

impl SearchArgs {
    /// Validated result count, falling back to `default` when omitted.
    pub fn result_count(&self, default: u32) -> Result<u32, String> {
        if self.query.trim().is_empty() {
            return Err("query must not be empty".into());
        }
        match self.max_results {
            None => Ok(default),
            Some(n) if n.fract() == 0.0 && (1.0..=10.0).contains(&n) => Ok(n as u32),
            Some(n) => Err(format!("max_results = {n} must be an integer in [1, 10]")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageArgs {
    pub prompt: String,
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub quality: Quality,
}

impl ImageArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".into());
        }
        Ok(())
    }

    /// File name stem for the generated images.
    pub fn name(&self) -> &str {
        let name = self.image_name.trim();
        if name.is_empty() {
            "image"
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceArgs {
    pub text: String,
    #[serde(default)]
    pub quality: Quality,
}

impl VoiceArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("text must not be empty".into());
        }
        Ok(())
    }
}
