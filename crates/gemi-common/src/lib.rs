pub mod errors;
pub mod id;
pub mod message;

pub use errors::{BoxError, ConfigError, GemiError, TransportError};
pub use id::{new_call_id, new_correlation_id, ConversationId};
pub use message::{
    AudioRef, DocumentRef, IncomingMessage, MediaRef, MessageContent, Participant,
};

pub type Result<T> = std::result::Result<T, GemiError>;
