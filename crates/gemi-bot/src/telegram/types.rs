//! Bot API wire types, limited to the fields the bot reads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use gemi_common::{
    AudioRef, ConversationId, DocumentRef, IncomingMessage, MediaRef, MessageContent, Participant,
};

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Participant {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_size: Option<u64>,
}

impl From<&PhotoSize> for MediaRef {
    fn from(photo: &PhotoSize) -> Self {
        MediaRef {
            file_id: photo.file_id.clone(),
            file_size: photo.file_size,
        }
    }
}

/// Voice notes and audio files share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

impl From<&Audio> for AudioRef {
    fn from(audio: &Audio) -> Self {
        AudioRef {
            file_id: audio.file_id.clone(),
            mime_type: audio.mime_type.clone(),
            file_size: audio.file_size,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sticker {
    pub emoji: Option<String>,
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Animation {
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub date: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub voice: Option<Audio>,
    pub audio: Option<Audio>,
    pub sticker: Option<Sticker>,
    pub animation: Option<Animation>,
    pub document: Option<Document>,
    pub reply_to_message: Option<Box<Message>>,

    // Kinds that are recognised but not handled.
    pub video: Option<serde_json::Value>,
    pub video_note: Option<serde_json::Value>,
    pub location: Option<serde_json::Value>,
    pub contact: Option<serde_json::Value>,
    pub poll: Option<serde_json::Value>,
    pub dice: Option<serde_json::Value>,
}

impl Message {
    fn content(&self) -> MessageContent {
        if let Some(text) = &self.text {
            return MessageContent::Text(text.clone());
        }
        if let Some(photo) = &self.photo {
            return MessageContent::Photo(photo.iter().map(MediaRef::from).collect());
        }
        if let Some(voice) = &self.voice {
            return MessageContent::Voice(voice.into());
        }
        if let Some(audio) = &self.audio {
            return MessageContent::Audio(audio.into());
        }
        if let Some(sticker) = &self.sticker {
            return MessageContent::Sticker {
                thumbnail: sticker.thumbnail.as_ref().map(MediaRef::from),
                emoji: sticker.emoji.clone(),
            };
        }
        // Animations also carry a `document` field, so they go first.
        if let Some(animation) = &self.animation {
            return MessageContent::Animation {
                thumbnail: animation.thumbnail.as_ref().map(MediaRef::from),
            };
        }
        if let Some(document) = &self.document {
            return MessageContent::Document(DocumentRef {
                file_id: document.file_id.clone(),
                file_name: document.file_name.clone(),
                mime_type: document.mime_type.clone(),
                file_size: document.file_size,
                thumbnail: document.thumbnail.as_ref().map(MediaRef::from),
            });
        }

        let kind = [
            ("video", self.video.is_some()),
            ("video_note", self.video_note.is_some()),
            ("location", self.location.is_some()),
            ("contact", self.contact.is_some()),
            ("poll", self.poll.is_some()),
            ("dice", self.dice.is_some()),
        ]
        .into_iter()
        .find_map(|(kind, present)| present.then_some(kind))
        .unwrap_or("unknown");
        MessageContent::Unsupported(kind.to_string())
    }

    /// Convert into the transport-neutral message the core works with.
    pub fn to_incoming(&self) -> IncomingMessage {
        IncomingMessage {
            message_id: self.message_id,
            conversation: ConversationId::new(self.chat.id),
            conversation_title: self.chat.title.clone(),
            sender: self.from.as_ref().map(Participant::from),
            date: DateTime::<Utc>::from_timestamp(self.date, 0).unwrap_or_default(),
            content: self.content(),
            caption: self.caption.clone(),
            reply_to: self
                .reply_to_message
                .as_ref()
                .map(|reply| Box::new(reply.to_incoming())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    fn base() -> serde_json::Value {
        json!({
            "message_id": 11,
            "date": 1_700_000_000,
            "chat": {"id": -100, "type": "group", "title": "Friends"},
            "from": {"id": 7, "is_bot": false, "first_name": "Ada", "last_name": "Lovelace"}
        })
    }

    #[test]
    fn text_message_converts() {
        let mut value = base();
        value["text"] = json!("hello");
        let incoming = parse(value).to_incoming();

        assert_eq!(incoming.conversation, ConversationId::new(-100));
        assert_eq!(incoming.conversation_title.as_deref(), Some("Friends"));
        assert_eq!(incoming.content, MessageContent::Text("hello".into()));
        assert_eq!(incoming.sender.unwrap().full_name(), "Ada Lovelace");
        assert_eq!(incoming.date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn photo_with_caption_and_reply() {
        let mut value = base();
        value["photo"] = json!([
            {"file_id": "small", "width": 90, "height": 90, "file_size": 1200},
            {"file_id": "big", "width": 1280, "height": 1280, "file_size": 180000}
        ]);
        value["caption"] = json!("look");
        let mut reply = base();
        reply["message_id"] = json!(10);
        reply["text"] = json!("earlier");
        value["reply_to_message"] = reply;

        let incoming = parse(value).to_incoming();
        let MessageContent::Photo(sizes) = &incoming.content else {
            panic!("expected photo, got {:?}", incoming.content);
        };
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[1].file_size, Some(180000));
        assert_eq!(incoming.caption.as_deref(), Some("look"));
        assert_eq!(incoming.reply_to.unwrap().message_id, 10);
    }

    #[test]
    fn animation_wins_over_document() {
        let mut value = base();
        value["animation"] = json!({"file_id": "anim", "thumbnail": {"file_id": "t", "width": 1, "height": 1}});
        value["document"] = json!({"file_id": "anim", "mime_type": "video/mp4"});

        let incoming = parse(value).to_incoming();
        assert_eq!(
            incoming.content,
            MessageContent::Animation {
                thumbnail: Some(MediaRef {
                    file_id: "t".into(),
                    file_size: None
                })
            }
        );
    }

    #[test]
    fn unknown_kinds_are_labelled() {
        let mut value = base();
        value["location"] = json!({"latitude": 1.0, "longitude": 2.0});
        assert_eq!(
            parse(value).to_incoming().content,
            MessageContent::Unsupported("location".into())
        );

        assert_eq!(
            parse(base()).to_incoming().content,
            MessageContent::Unsupported("unknown".into())
        );
    }

    #[test]
    fn error_envelope_parses() {
        let response: ApiResponse<Message> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message to edit not found"
        }))
        .unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(400));
        assert!(response.result.is_none());
    }
}
