//! Storage collaborator for conversation and message records.
//!
//! Writes are best effort: callers log failures and carry on.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use gemi_common::{ConversationId, Participant};

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordRole {
    User,
    Bot,
}

/// One stored message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub conversation: ConversationId,
    pub message_id: Option<i64>,
    pub sender: Option<i64>,
    pub role: RecordRole,
    pub text: String,
    pub date: DateTime<Utc>,
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn upsert_conversation(
        &self,
        id: ConversationId,
        participants: &[Participant],
    ) -> Result<(), StoreError>;

    async fn append_message_record(&self, record: MessageRecord) -> Result<(), StoreError>;
}

/// Write conversation metadata, logging instead of failing.
pub async fn remember_conversation(
    store: &dyn ConversationStore,
    id: ConversationId,
    participants: &[Participant],
) {
    if let Err(e) = store.upsert_conversation(id, participants).await {
        warn!(conversation = %id, error = %e, "Failed to store conversation");
    }
}

/// Append a message record, logging instead of failing.
pub async fn remember_message(store: &dyn ConversationStore, record: MessageRecord) {
    let conversation = record.conversation;
    if let Err(e) = store.append_message_record(record).await {
        warn!(conversation = %conversation, error = %e, "Failed to store message");
    }
}

/// In-process store, lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    conversations: RwLock<HashMap<ConversationId, Vec<Participant>>>,
    messages: RwLock<Vec<MessageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn participants(&self, id: ConversationId) -> Option<Vec<Participant>> {
        self.conversations.read().await.get(&id).cloned()
    }

    pub async fn messages(&self, id: ConversationId) -> Vec<MessageRecord> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|record| record.conversation == id)
            .cloned()
            .collect()
    }

    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn upsert_conversation(
        &self,
        id: ConversationId,
        participants: &[Participant],
    ) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let known = conversations.entry(id).or_default();
        for participant in participants {
            match known.iter_mut().find(|p| p.id == participant.id) {
                Some(existing) => *existing = participant.clone(),
                None => known.push(participant.clone()),
            }
        }
        Ok(())
    }

    async fn append_message_record(&self, record: MessageRecord) -> Result<(), StoreError> {
        self.messages.write().await.push(record);
        Ok(())
    }
}
