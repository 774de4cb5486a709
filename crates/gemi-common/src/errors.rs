use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Errors raised by the chat transport (delivery, edits, downloads).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport refused the request, e.g. the target message was deleted.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("transport api error: {0}")]
    Api(String),

    #[error("transport parse error: {0}")]
    Parse(String),
}

impl TransportError {
    /// Whether the rejection means the target message no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Rejected(msg) if msg.contains("not found"))
    }

    /// Whether the transport could not parse the text's formatting.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, TransportError::Rejected(msg) if msg.contains("can't parse entities"))
    }

    /// Whether the rejection is Telegram's "nothing changed" answer to an edit.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, TransportError::Rejected(msg) if msg.contains("not modified"))
    }
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum GemiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Model or tool provider failure, kept as the error source.
    #[error("ai error: {0}")]
    Ai(#[source] BoxError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("model.temperature = 3".into());
        assert_eq!(
            err.to_string(),
            "config validation error: model.temperature = 3"
        );
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Rejected("Bad Request: message to edit not found".into());
        assert_eq!(
            err.to_string(),
            "request rejected: Bad Request: message to edit not found"
        );

        let err = TransportError::Network("connection reset".into());
        assert_eq!(err.to_string(), "network error: connection reset");
    }

    #[test]
    fn transport_rejection_classification() {
        let gone = TransportError::Rejected("Bad Request: message to edit not found".into());
        assert!(gone.is_not_found());
        assert!(!gone.is_not_modified());

        let same = TransportError::Rejected(
            "Bad Request: message is not modified: specified new message content".into(),
        );
        assert!(same.is_not_modified());
        assert!(!same.is_not_found());

        let net = TransportError::Network("not found".into());
        assert!(!net.is_not_found());

        let markup = TransportError::Rejected(
            "Bad Request: can't parse entities: Character '.' is reserved".into(),
        );
        assert!(markup.is_parse_failure());
        assert!(!gone.is_parse_failure());
    }

    #[test]
    fn gemi_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: GemiError = config_err.into();
        assert!(matches!(err, GemiError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn gemi_error_from_transport() {
        let err: GemiError = TransportError::Api("HTTP 502".into()).into();
        assert!(matches!(err, GemiError::Transport(_)));
        assert_eq!(err.to_string(), "transport api error: HTTP 502");
    }

    #[test]
    fn gemi_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: GemiError = io_err.into();
        assert!(matches!(err, GemiError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn gemi_error_other_variants() {
        let err = GemiError::Ai("model unavailable".into());
        assert_eq!(err.to_string(), "ai error: model unavailable");

        let err = GemiError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
