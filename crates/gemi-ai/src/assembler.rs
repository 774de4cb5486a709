//! Prompt assembly: inbound chat messages to model prompt parts.
//!
//! Each content kind maps to one media part, preceded by the caption when
//! there is one and followed by a metadata block. A replied-to message is
//! assembled alongside the live one, without caption or metadata.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use gemi_common::{DocumentRef, IncomingMessage, MediaRef, MessageContent, TransportError};
use gemi_config::schema::{PromptConfig, ReplyOrder};

use crate::prompts::metadata_block;
use crate::{PromptError, PromptPart};

/// Where media referenced by a message is downloaded from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError>;
}

/// Which optional parts to emit for one message.
#[derive(Debug, Clone, Copy)]
struct PartOptions {
    caption: bool,
    metadata: bool,
}

const LIVE: PartOptions = PartOptions {
    caption: true,
    metadata: true,
};

const CONTEXT: PartOptions = PartOptions {
    caption: false,
    metadata: false,
};

pub struct PromptAssembler {
    media: Arc<dyn MediaSource>,
    photo_byte_ceiling: u64,
    max_file_bytes: u64,
    reply_order: ReplyOrder,
}

impl PromptAssembler {
    pub fn new(media: Arc<dyn MediaSource>, config: &PromptConfig) -> Self {
        Self {
            media,
            photo_byte_ceiling: config.photo_byte_ceiling,
            max_file_bytes: config.max_file_bytes,
            reply_order: config.reply_order,
        }
    }

    /// Build the parts for `message`, including its replied-to message.
    pub async fn build(&self, message: &IncomingMessage) -> Result<Vec<PromptPart>, PromptError> {
        let Some(context) = message.reply_to.as_deref() else {
            return self.build_message(message, LIVE).await;
        };

        let (live, context) = tokio::try_join!(
            self.build_message(message, LIVE),
            self.build_message(context, CONTEXT),
        )?;
        let parts = match self.reply_order {
            ReplyOrder::MessageFirst => [live, context].concat(),
            ReplyOrder::ContextFirst => [context, live].concat(),
        };
        Ok(parts)
    }

    /// Build the parts of a single message.
    pub async fn build_single(
        &self,
        message: &IncomingMessage,
        include_metadata: bool,
    ) -> Result<Vec<PromptPart>, PromptError> {
        self.build_message(
            message,
            PartOptions {
                caption: true,
                metadata: include_metadata,
            },
        )
        .await
    }

    async fn build_message(
        &self,
        message: &IncomingMessage,
        options: PartOptions,
    ) -> Result<Vec<PromptPart>, PromptError> {
        let mut parts = Vec::new();
        if options.caption {
            if let Some(caption) = message.caption.as_deref().filter(|c| !c.is_empty()) {
                parts.push(PromptPart::Text(caption.to_string()));
            }
        }

        let mut mime_type = None;
        match &message.content {
            MessageContent::Text(text) => parts.push(PromptPart::Text(text.clone())),
            MessageContent::Photo(sizes) => {
                let photo = select_photo(sizes, self.photo_byte_ceiling)
                    .ok_or_else(|| PromptError::UnsupportedContentKind("empty photo".into()))?;
                parts.push(self.image_part(photo).await?);
            }
            MessageContent::Voice(audio) | MessageContent::Audio(audio) => {
                let mime = audio
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| default_audio_mime(&message.content).to_string());
                let data = self.fetch(&audio.file_id, audio.file_size).await?;
                mime_type = Some(mime.clone());
                parts.push(PromptPart::Blob {
                    mime_type: mime,
                    data,
                });
            }
            MessageContent::Sticker { thumbnail, emoji } => match (thumbnail, emoji) {
                (Some(thumbnail), _) => parts.push(self.image_part(thumbnail).await?),
                (None, Some(emoji)) => parts.push(PromptPart::Text(emoji.clone())),
                (None, None) => {
                    return Err(PromptError::UnsupportedContentKind("sticker".into()));
                }
            },
            MessageContent::Animation { thumbnail } => {
                let thumbnail = thumbnail
                    .as_ref()
                    .ok_or_else(|| PromptError::UnsupportedContentKind("animation".into()))?;
                parts.push(self.image_part(thumbnail).await?);
            }
            MessageContent::Document(document) => {
                let mime = document
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                parts.push(self.document_part(document, &mime).await?);
                mime_type = Some(mime);
            }
            MessageContent::Unsupported(kind) => {
                return Err(PromptError::UnsupportedContentKind(kind.clone()));
            }
        }

        if options.metadata {
            parts.push(PromptPart::Metadata(metadata_block(
                message.date,
                message.content.kind(),
                mime_type.as_deref(),
            )));
        }

        debug!(
            conversation = %message.conversation,
            kind = message.content.kind(),
            parts = parts.len(),
            "Prompt assembled"
        );
        Ok(parts)
    }

    async fn document_part(
        &self,
        document: &DocumentRef,
        mime: &str,
    ) -> Result<PromptPart, PromptError> {
        if mime.starts_with("image/") {
            return match &document.thumbnail {
                Some(thumbnail) => self.image_part(thumbnail).await,
                None => {
                    let data = self.fetch(&document.file_id, document.file_size).await?;
                    Ok(PromptPart::Image {
                        mime_type: mime.to_string(),
                        data,
                    })
                }
            };
        }

        if mime == "application/pdf" {
            let data = self.fetch(&document.file_id, document.file_size).await?;
            return Ok(PromptPart::Blob {
                mime_type: mime.to_string(),
                data,
            });
        }

        if mime.starts_with("text/") {
            let data = self.fetch(&document.file_id, document.file_size).await?;
            let name = document.file_name.as_deref().unwrap_or("document.txt");
            return Ok(PromptPart::Text(format!(
                "FileName: {name}\n\n{}",
                String::from_utf8_lossy(&data)
            )));
        }

        Err(PromptError::UnsupportedContentKind(mime.to_string()))
    }

    async fn image_part(&self, media: &MediaRef) -> Result<PromptPart, PromptError> {
        let data = self.fetch(&media.file_id, media.file_size).await?;
        Ok(PromptPart::Image {
            mime_type: sniff_image_mime(&data).to_string(),
            data,
        })
    }

    /// Download a file, enforcing the size ceiling before and after.
    async fn fetch(&self, file_id: &str, declared_size: Option<u64>) -> Result<Vec<u8>, PromptError> {
        let limit = self.max_file_bytes;
        if let Some(size) = declared_size.filter(|size| *size > limit) {
            return Err(PromptError::ContentTooLarge { size, limit });
        }
        let data = self.media.download(file_id).await?;
        let size = data.len() as u64;
        if size > limit {
            return Err(PromptError::ContentTooLarge { size, limit });
        }
        Ok(data)
    }
}

/// Pick the largest photo variant at or under `ceiling`, else the smallest.
pub fn select_photo(sizes: &[MediaRef], ceiling: u64) -> Option<&MediaRef> {
    sizes
        .iter()
        .filter(|p| p.file_size.is_some_and(|size| size <= ceiling))
        .max_by_key(|p| p.file_size)
        .or_else(|| sizes.iter().min_by_key(|p| p.file_size.unwrap_or(u64::MAX)))
}

fn default_audio_mime(content: &MessageContent) -> &'static str {
    match content {
        MessageContent::Voice(_) => "audio/ogg",
        _ => "audio/mpeg",
    }
}

fn sniff_image_mime(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG") {
        "image/png"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
