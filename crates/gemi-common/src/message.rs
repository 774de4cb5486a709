//! Transport-neutral model of an inbound chat message.
//!
//! The transport adapter converts its own wire types into these; the
//! prompt assembler and the session registry only ever see this shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ConversationId;

/// A user taking part in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// Reference to a downloadable image (photo size, thumbnail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub file_id: String,
    pub file_size: Option<u64>,
}

/// Reference to a voice note or audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRef {
    pub file_id: String,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

/// Reference to an arbitrary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub thumbnail: Option<MediaRef>,
}

/// The payload of an inbound message, one variant per content kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    Text(String),
    /// All size variants of one photo, in any order.
    Photo(Vec<MediaRef>),
    Voice(AudioRef),
    Audio(AudioRef),
    Sticker {
        thumbnail: Option<MediaRef>,
        emoji: Option<String>,
    },
    Animation {
        thumbnail: Option<MediaRef>,
    },
    Document(DocumentRef),
    /// A content kind the transport knows but the bot does not handle
    /// (location, poll, contact, ...).
    Unsupported(String),
}

impl MessageContent {
    /// Content-kind label used in prompt metadata and logs.
    pub fn kind(&self) -> &str {
        match self {
            MessageContent::Text(_) => "text",
            MessageContent::Photo(_) => "photo",
            MessageContent::Voice(_) => "voice",
            MessageContent::Audio(_) => "audio",
            MessageContent::Sticker { .. } => "sticker",
            MessageContent::Animation { .. } => "animation",
            MessageContent::Document(_) => "document",
            MessageContent::Unsupported(kind) => kind.as_str(),
        }
    }
}

/// An inbound message with its optional replied-to context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub conversation: ConversationId,
    pub conversation_title: Option<String>,
    pub sender: Option<Participant>,
    pub date: DateTime<Utc>,
    pub content: MessageContent,
    pub caption: Option<String>,
    pub reply_to: Option<Box<IncomingMessage>>,
}

impl IncomingMessage {
    /// Plain text of the message, or its caption for media messages.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text.as_str()),
            _ => self.caption.as_deref(),
        }
    }

    /// The bot command this message carries, e.g. `start` for `/start@gemibot`.
    pub fn command(&self) -> Option<&str> {
        let MessageContent::Text(text) = &self.content else {
            return None;
        };
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        (!name.is_empty()).then_some(name)
    }
}
