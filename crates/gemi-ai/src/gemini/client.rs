//! Gemini API client struct, request building, and response chunk parsing.

use base64::Engine;
use serde_json::{json, Value};

use gemi_common::new_call_id;

use crate::tools::to_gemini_tool;
use crate::{AiError, Content, ContentPart, ModelEvent, Role, ToolCall, ToolDefinition};

use super::config::GeminiConfig;

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) tools: Vec<ToolDefinition>,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            tools: Vec::new(),
            http,
        })
    }

    /// Declare the functions the model may call.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub(crate) fn stream_url(&self) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.config.api_base, self.config.model
        )
    }

    /// Build the JSON request body for the Gemini API.
    pub(crate) fn build_request_body(&self, history: &[Content]) -> Value {
        let contents: Vec<Value> = history.iter().map(content_to_json).collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if !self.config.system_instruction.is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{ "text": self.config.system_instruction }]
            });
        }

        if !self.tools.is_empty() {
            let tool_defs: Vec<_> = self.tools.iter().map(to_gemini_tool).collect();
            body["tools"] = json!([{
                "functionDeclarations": tool_defs
            }]);
        }

        body
    }
}

fn content_to_json(content: &Content) -> Value {
    let role = match content.role {
        Role::User => "user",
        Role::Model => "model",
    };
    let parts: Vec<Value> = content.parts.iter().map(part_to_json).collect();
    json!({ "role": role, "parts": parts })
}

fn part_to_json(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text(text) => json!({ "text": text }),
        ContentPart::InlineData { mime_type, data } => json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": base64::engine::general_purpose::STANDARD.encode(data),
            }
        }),
        ContentPart::FunctionCall { id, name, args } => json!({
            "functionCall": { "id": id, "name": name, "args": args }
        }),
        ContentPart::FunctionResponse { id, name, response } => json!({
            "functionResponse": { "id": id, "name": name, "response": response }
        }),
    }
}

/// Translate one streamed response chunk into model events.
///
/// Parts after the first `functionCall` are dropped; the call is always
/// the last event returned.
pub(crate) fn parse_chunk(chunk: &Value) -> Result<Vec<ModelEvent>, AiError> {
    if let Some(error) = chunk.get("error") {
        let message = error["message"].as_str().unwrap_or("unknown error");
        return Err(AiError::ApiError(message.to_string()));
    }
    if let Some(reason) = chunk["promptFeedback"]["blockReason"].as_str() {
        return Err(AiError::ApiError(format!("prompt blocked: {reason}")));
    }

    let mut events = Vec::new();
    let Some(parts) = chunk["candidates"][0]["content"]["parts"].as_array() else {
        return Ok(events);
    };

    for part in parts {
        if let Some(text) = part["text"].as_str() {
            if !text.is_empty() {
                events.push(ModelEvent::TextDelta(text.to_string()));
            }
        }
        if let Some(fc) = part.get("functionCall") {
            let name = fc["name"]
                .as_str()
                .ok_or_else(|| AiError::ParseError("functionCall without name".to_string()))?;
            let id = fc["id"]
                .as_str()
                .filter(|id| !id.is_empty())
                .map(String::from)
                .unwrap_or_else(new_call_id);
            let arguments = match &fc["args"] {
                Value::Null => json!({}),
                args => args.clone(),
            };
            events.push(ModelEvent::ToolCall(ToolCall {
                id,
                name: name.to_string(),
                arguments,
            }));
            break;
        }
    }

    Ok(events)
}
