//! Conversation core for Gemi.
//!
//! Provides the pieces between the chat transport and the model backend:
//! - Gemini client with SSE streaming and function calling
//! - Tool invoker with search, image and voice providers
//! - Response stream interpreter running the tool-call loop
//! - Per-conversation sessions and the session registry
//! - Prompt assembly from inbound chat messages

pub mod assembler;
pub mod errors;
pub mod gemini;
pub mod history;
pub mod interpreter;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod store;
pub mod streaming;
pub mod tools;

#[cfg(test)]
mod test_support;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub use assembler::{MediaSource, PromptAssembler};
pub use errors::{AiError, PromptError, ProviderError, StoreError, ToolError, TurnError};
pub use gemini::{GeminiClient, GeminiConfig};
pub use history::ChatHistory;
pub use interpreter::Interpreter;
pub use registry::SessionRegistry;
pub use session::Session;
pub use store::{ConversationStore, MemoryStore, MessageRecord, RecordRole};
pub use tools::{
    GeneratedImage, SearchHit, SearchResults, ToolInvoker, ToolName, ToolResult, VoiceClip,
};

/// Stream of events for one model reply.
pub type ModelEventStream = BoxStream<'static, Result<ModelEvent, AiError>>;

/// Backend that keeps a chat and streams replies to it.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Open a chat primed with `seed`.
    async fn start_chat(&self, seed: &[Content]) -> Result<ChatHistory, AiError>;

    /// Stream the model's reply to the full `history`.
    ///
    /// A reply ends either when the stream ends or with a single
    /// [`ModelEvent::ToolCall`], which is always the last event.
    async fn stream(&self, history: &[Content]) -> Result<ModelEventStream, AiError>;
}

/// One input part of a user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
    Blob { mime_type: String, data: Vec<u8> },
    /// Message metadata; always the last part of a message.
    Metadata(String),
}

impl From<PromptPart> for ContentPart {
    fn from(part: PromptPart) -> Self {
        match part {
            PromptPart::Text(text) | PromptPart::Metadata(text) => ContentPart::Text(text),
            PromptPart::Image { mime_type, data } | PromptPart::Blob { mime_type, data } => {
                ContentPart::InlineData { mime_type, data }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry of the model-visible history.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![ContentPart::Text(text.into())],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    InlineData {
        mime_type: String,
        data: Vec<u8>,
    },
    FunctionCall {
        id: String,
        name: String,
        args: serde_json::Value,
    },
    FunctionResponse {
        id: String,
        name: String,
        response: serde_json::Value,
    },
}

/// Event produced by the model client while a reply streams.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    TextDelta(String),
    ToolCall(ToolCall),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Normalized output of a turn, consumed by the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    TextChunk(String),
    Image(Vec<GeneratedImage>),
    Audio(VoiceClip),
    SearchResults(SearchResults),
}
