//! Tools the model can call: web search, image generation and voice.
//!
//! The [`ToolInvoker`] resolves a call's name, validates its arguments,
//! runs the configured provider and normalizes every provider failure
//! into [`ToolError::ExecutionFailed`].

mod args;
mod definitions;
mod image;
mod search;
mod voice;


use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::{OutputEvent, ProviderError, ToolCall, ToolDefinition, ToolError};

pub use args::{ImageArgs, Quality, SearchArgs, SearchTopic, VoiceArgs};
pub use definitions::{builtin_tools, to_gemini_tool};
pub use image::ImageChain;
pub use search::TavilyClient;
pub use voice::VoiceEngine;

/// The fixed set of declared tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    Search,
    Image,
    Voice,
}

impl ToolName {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::Search => "search",
            ToolName::Image => "image",
            ToolName::Voice => "voice",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(ToolName::Search),
            "image" => Ok(ToolName::Image),
            "voice" => Ok(ToolName::Voice),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// Search provider answer, in the shape Tavily returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(rename = "results", default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceClip {
    pub url: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Successful outcome of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Image(Vec<GeneratedImage>),
    Voice(VoiceClip),
    Search(SearchResults),
}

impl ToolResult {
    /// The function-response payload fed back to the model.
    pub fn function_response(&self) -> serde_json::Value {
        match self {
            ToolResult::Search(results) => json!({
                "query": results.query,
                "answer": results.answer,
                "results": results
                    .hits
                    .iter()
                    .map(|hit| json!({ "title": hit.title, "url": hit.url, "content": hit.content }))
                    .collect::<Vec<_>>(),
            }),
            ToolResult::Image(images) => json!({
                "status": "images sent to the user",
                "images": images
                    .iter()
                    .map(|image| json!({ "name": image.name, "url": image.url }))
                    .collect::<Vec<_>>(),
            }),
            ToolResult::Voice(clip) => json!({
                "status": "voice message sent to the user",
                "url": clip.url,
            }),
        }
    }

    pub fn into_output(self) -> OutputEvent {
        match self {
            ToolResult::Image(images) => OutputEvent::Image(images),
            ToolResult::Voice(clip) => OutputEvent::Audio(clip),
            ToolResult::Search(results) => OutputEvent::SearchResults(results),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        topic: SearchTopic,
    ) -> Result<SearchResults, ProviderError>;
}

/// Parameters of one image generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub name: String,
    pub quality: Quality,
    pub count: u32,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>, ProviderError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, quality: Quality) -> Result<VoiceClip, ProviderError>;
}

/// Executes tool calls against the configured providers.
///
/// A tool without a provider stays declared to the model and fails with
/// [`ToolError::FeatureDisabled`] when called.
pub struct ToolInvoker {
    search: Option<Arc<dyn SearchProvider>>,
    image: Option<Arc<dyn ImageGenerator>>,
    voice: Option<Arc<dyn SpeechSynthesizer>>,
    default_max_results: u32,
    image_count: u32,
}

impl ToolInvoker {
    pub fn new() -> Self {
        Self {
            search: None,
            image: None,
            voice: None,
            default_max_results: 1,
            image_count: 1,
        }
    }

    pub fn with_search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    pub fn with_image(mut self, provider: Arc<dyn ImageGenerator>) -> Self {
        self.image = Some(provider);
        self
    }

    pub fn with_voice(mut self, provider: Arc<dyn SpeechSynthesizer>) -> Self {
        self.voice = Some(provider);
        self
    }

    pub fn with_default_max_results(mut self, n: u32) -> Self {
        self.default_max_results = n;
        self
    }

    pub fn with_image_count(mut self, n: u32) -> Self {
        self.image_count = n;
        self
    }

    /// Declarations sent to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        builtin_tools()
    }

    /// Run one tool call to completion.
    pub async fn invoke(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool: ToolName = call.name.parse()?;
        debug!(tool = %tool, call_id = %call.id, "Executing tool");

        let result = match tool {
            ToolName::Search => {
                let provider = self.search.as_ref().ok_or(ToolError::FeatureDisabled(tool))?;
                let args: SearchArgs = parse_args(tool, &call.arguments)?;
                let max_results = args
                    .result_count(self.default_max_results)
                    .map_err(|reason| ToolError::InvalidArguments { tool, reason })?;
                provider
                    .search(args.query.trim(), max_results, args.topic)
                    .await
                    .map(ToolResult::Search)
            }
            ToolName::Image => {
                let provider = self.image.as_ref().ok_or(ToolError::FeatureDisabled(tool))?;
                let args: ImageArgs = parse_args(tool, &call.arguments)?;
                args.validate()
                    .map_err(|reason| ToolError::InvalidArguments { tool, reason })?;
                let request = ImageRequest {
                    prompt: args.prompt.clone(),
                    name: args.name().to_string(),
                    quality: args.quality,
                    count: self.image_count,
                };
                provider.generate(&request).await.and_then(|images| {
                    if images.is_empty() {
                        Err(ProviderError::NoImagesGenerated)
                    } else {
                        Ok(ToolResult::Image(images))
                    }
                })
            }
            ToolName::Voice => {
                let provider = self.voice.as_ref().ok_or(ToolError::FeatureDisabled(tool))?;
                let args: VoiceArgs = parse_args(tool, &call.arguments)?;
                args.validate()
                    .map_err(|reason| ToolError::InvalidArguments { tool, reason })?;
                provider
                    .synthesize(args.text.trim(), args.quality)
                    .await
                    .map(ToolResult::Voice)
            }
        };

        result.map_err(|cause| {
            warn!(tool = %tool, error = %cause, "Tool execution failed");
            ToolError::ExecutionFailed { tool, cause }
        })
    }
}

impl Default for ToolInvoker {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(
    tool: ToolName,
    arguments: &serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|e| ToolError::InvalidArguments {
        tool,
        reason: e.to_string(),
    })
}
