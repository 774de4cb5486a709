//! Fakes shared by the bot's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use gemi_ai::{
    AiError, ChatHistory, Content, GeneratedImage, MediaSource, ModelClient, ModelEvent,
    ModelEventStream, VoiceClip,
};
use gemi_common::TransportError;

use crate::telegram::{ChatTransport, TextFormat};

/// One outbound call seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Message { text: String, reply_to: Option<i64> },
    Edit(String),
    Delete(i64),
    Media(usize),
    Voice,
}

pub struct FakeTransport {
    actions: Mutex<Vec<Sent>>,
    edit_failures: Mutex<VecDeque<String>>,
    edit_formats: Mutex<Vec<TextFormat>>,
    next_id: AtomicI64,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            edit_failures: Mutex::new(VecDeque::new()),
            edit_formats: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
        }
    }

    /// Reject the next edit attempt with `description`.
    pub fn fail_edit(self, description: &str) -> Self {
        self.edit_failures
            .lock()
            .unwrap()
            .push_back(description.to_string());
        self
    }

    pub fn actions(&self) -> Vec<Sent> {
        self.actions.lock().unwrap().clone()
    }

    /// Texts of every edit attempt, in order.
    pub fn edits(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Sent::Edit(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Format of every edit attempt, in order.
    pub fn edit_formats(&self) -> Vec<TextFormat> {
        self.edit_formats.lock().unwrap().clone()
    }

    /// Texts of every sent message, in order.
    pub fn messages(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Sent::Message { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Sent) {
        self.actions.lock().unwrap().push(action);
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_message(
        &self,
        _chat_id: i64,
        text: &str,
        _format: TextFormat,
        reply_to: Option<i64>,
    ) -> Result<i64, TransportError> {
        self.record(Sent::Message {
            text: text.to_string(),
            reply_to,
        });
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_message_text(
        &self,
        _chat_id: i64,
        _message_id: i64,
        text: &str,
        format: TextFormat,
    ) -> Result<(), TransportError> {
        self.record(Sent::Edit(text.to_string()));
        self.edit_formats.lock().unwrap().push(format);
        match self.edit_failures.lock().unwrap().pop_front() {
            Some(description) => Err(TransportError::Rejected(description)),
            None => Ok(()),
        }
    }

    async fn delete_message(&self, _chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        self.record(Sent::Delete(message_id));
        Ok(())
    }

    async fn send_media_group(
        &self,
        _chat_id: i64,
        _reply_to: Option<i64>,
        images: &[GeneratedImage],
    ) -> Result<(), TransportError> {
        self.record(Sent::Media(images.len()));
        Ok(())
    }

    async fn send_voice(
        &self,
        _chat_id: i64,
        _reply_to: Option<i64>,
        _clip: &VoiceClip,
    ) -> Result<(), TransportError> {
        self.record(Sent::Voice);
        Ok(())
    }
}

/// Model that answers each request with the next scripted reply.
pub struct ScriptModel {
    replies: Mutex<VecDeque<Vec<Result<ModelEvent, AiError>>>>,
}

impl ScriptModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn reply(self, events: Vec<Result<ModelEvent, AiError>>) -> Self {
        self.replies.lock().unwrap().push_back(events);
        self
    }
}

#[async_trait]
impl ModelClient for ScriptModel {
    async fn start_chat(&self, seed: &[Content]) -> Result<ChatHistory, AiError> {
        Ok(ChatHistory::new(seed.to_vec()))
    }

    async fn stream(&self, _history: &[Content]) -> Result<ModelEventStream, AiError> {
        let events = self.replies.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::pin(stream::iter(events)))
    }
}

pub fn text(delta: &str) -> Result<ModelEvent, AiError> {
    Ok(ModelEvent::TextDelta(delta.to_string()))
}

/// Media source with nothing to download.
pub struct NoMedia;

#[async_trait]
impl MediaSource for NoMedia {
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Rejected(format!("Bad Request: file {file_id} not found")))
    }
}
