//! Error types for the model backend, tool providers, prompt assembly and turns.

use gemi_common::{GemiError, TransportError};

use crate::tools::ToolName;

/// Model backend errors.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
}

/// Errors from the search, image and voice providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rate limited")]
    RateLimited,
    #[error("provider API error: {0}")]
    Api(String),
    #[error("provider parse error: {0}")]
    Parse(String),
    #[error("no images generated")]
    NoImagesGenerated,
    #[error("voice engine is not ready")]
    EngineNotReady,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<AiError> for GemiError {
    fn from(err: AiError) -> Self {
        GemiError::Ai(Box::new(err))
    }
}

impl From<ProviderError> for GemiError {
    fn from(err: ProviderError) -> Self {
        GemiError::Ai(Box::new(err))
    }
}

/// Failure of a single tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool call: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: ToolName, reason: String },
    #[error("{0} is not enabled")]
    FeatureDisabled(ToolName),
    #[error("{tool} failed: {cause}")]
    ExecutionFailed {
        tool: ToolName,
        #[source]
        cause: ProviderError,
    },
}

/// Why an inbound message could not be turned into prompt parts.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("unsupported content kind: {0}")]
    UnsupportedContentKind(String),
    #[error("content too large: {size} bytes exceeds {limit}")]
    ContentTooLarge { size: u64, limit: u64 },
    #[error("media download failed: {0}")]
    Download(#[from] TransportError),
}

impl PromptError {
    /// Short status text shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            PromptError::UnsupportedContentKind(_) => "Unsupported document type.",
            PromptError::ContentTooLarge { .. } => "File size too big.",
            PromptError::Download(_) => "Error while downloading message.",
        }
    }
}

/// A turn that ended early.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Model(#[from] AiError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("tool round limit of {0} exceeded")]
    ToolRoundsExceeded(u32),
}

impl TurnError {
    /// Short status text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            TurnError::Tool(ToolError::FeatureDisabled(tool)) => {
                format!("Oops! {tool} is not available right now.")
            }
            TurnError::Model(AiError::RateLimited) => {
                "Oops! Too many requests, try again in a minute.".to_string()
            }
            other => format!("Oops! Failed to respond: {other}"),
        }
    }
}

/// Storage collaborator failures. Always logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_error_user_messages() {
        assert_eq!(
            PromptError::UnsupportedContentKind("application/zip".into()).user_message(),
            "Unsupported document type."
        );
        assert_eq!(
            PromptError::ContentTooLarge {
                size: 30_000_000,
                limit: 20_000_000
            }
            .user_message(),
            "File size too big."
        );
        let err: PromptError = TransportError::Network("reset".into()).into();
        assert_eq!(err.user_message(), "Error while downloading message.");
    }

    #[test]
    fn tool_error_display() {
        let err = ToolError::ExecutionFailed {
            tool: ToolName::Image,
            cause: ProviderError::NoImagesGenerated,
        };
        assert_eq!(err.to_string(), "image failed: no images generated");

        let err = ToolError::UnknownTool("weather".into());
        assert_eq!(err.to_string(), "unknown tool call: weather");
    }

    #[test]
    fn turn_error_user_messages() {
        let err = TurnError::Tool(ToolError::FeatureDisabled(ToolName::Voice));
        assert_eq!(err.user_message(), "Oops! voice is not available right now.");

        let err = TurnError::ToolRoundsExceeded(5);
        assert_eq!(
            err.user_message(),
            "Oops! Failed to respond: tool round limit of 5 exceeded"
        );

        let err: TurnError = AiError::ApiError("HTTP 500".into()).into();
        assert!(err.user_message().contains("API error: HTTP 500"));
    }

    #[test]
    fn gemi_error_keeps_the_ai_source() {
        use std::error::Error;

        let err: GemiError = AiError::RateLimited.into();
        assert_eq!(err.to_string(), "ai error: Rate limited");
        let source = err.source().and_then(|s| s.downcast_ref::<AiError>());
        assert!(matches!(source, Some(AiError::RateLimited)));

        let err: GemiError = ProviderError::EngineNotReady.into();
        let source = err.source().and_then(|s| s.downcast_ref::<ProviderError>());
        assert!(matches!(source, Some(ProviderError::EngineNotReady)));
    }
}
