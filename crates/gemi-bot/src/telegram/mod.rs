//! Telegram Bot API transport.
//!
//! `ChatTransport` is the outbound surface the message handler renders a
//! turn through; `TelegramClient` implements it, the long-poll update
//! feed, and media downloads for the prompt assembler.

mod client;
pub mod types;

use async_trait::async_trait;

use gemi_ai::{GeneratedImage, VoiceClip};
use gemi_common::TransportError;

pub use client::TelegramClient;

/// How the text of a message is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    MarkdownV2,
}

impl TextFormat {
    /// Value of the Bot API `parse_mode` field, if any.
    pub fn parse_mode(self) -> Option<&'static str> {
        match self {
            TextFormat::Plain => None,
            TextFormat::MarkdownV2 => Some("MarkdownV2"),
        }
    }
}

/// Outbound chat operations. Message ids are the transport's own.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message, optionally as a reply. Returns the new message id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
        reply_to: Option<i64>,
    ) -> Result<i64, TransportError>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        format: TextFormat,
    ) -> Result<(), TransportError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError>;

    async fn send_media_group(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        images: &[GeneratedImage],
    ) -> Result<(), TransportError>;

    async fn send_voice(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        clip: &VoiceClip,
    ) -> Result<(), TransportError>;
}
