//! One conversation's state and turn serialization.
//!
//! A `Session` owns the chat history behind an async mutex. Every turn
//! holds the lock for as long as its output stream is being consumed, so
//! turns of one conversation run strictly one after another while other
//! conversations proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use gemi_common::{ConversationId, Participant};

use crate::history::ChatHistory;
use crate::interpreter::Interpreter;
use crate::{Content, OutputEvent, PromptPart, TurnError};

/// Output of one turn.
pub type TurnStream = BoxStream<'static, Result<OutputEvent, TurnError>>;

pub struct Session {
    id: ConversationId,
    history: Arc<Mutex<ChatHistory>>,
    interpreter: Arc<Interpreter>,
    participants: RwLock<HashMap<i64, Participant>>,
    created_at: Instant,
    last_activity: std::sync::Mutex<Instant>,
}

impl Session {
    pub fn new(
        id: ConversationId,
        history: ChatHistory,
        interpreter: Arc<Interpreter>,
        participants: &[Participant],
    ) -> Self {
        let now = Instant::now();
        Self {
            id,
            history: Arc::new(Mutex::new(history)),
            interpreter,
            participants: RwLock::new(participants.iter().map(|p| (p.id, p.clone())).collect()),
            created_at: now,
            last_activity: std::sync::Mutex::new(now),
        }
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Send a turn. The returned stream is lazy: the session lock is
    /// taken on first poll and released when the stream ends or is dropped.
    pub fn send(self: &Arc<Self>, parts: Vec<PromptPart>) -> TurnStream {
        let session = Arc::clone(self);
        Box::pin(async_stream::stream! {
            let mut history = Arc::clone(&session.history).lock_owned().await;
            debug!(conversation = %session.id, "Turn started");
            session.touch();

            let turn = session.interpreter.process(&mut history, parts);
            futures_util::pin_mut!(turn);
            while let Some(event) = turn.next().await {
                yield event;
            }

            session.touch();
            debug!(conversation = %session.id, "Turn finished");
        })
    }

    /// Clear the history back to the seed. Waits for an in-flight turn.
    pub async fn reset(&self) {
        let mut history = self.history.lock().await;
        history.reset_to_seed();
        self.touch();
        info!(conversation = %self.id, "Session reset");
    }

    /// Snapshot of the model-visible history.
    pub async fn history(&self) -> Vec<Content> {
        self.history.lock().await.contents().to_vec()
    }

    /// Whether a turn currently holds the session.
    pub fn is_busy(&self) -> bool {
        self.history.try_lock().is_err()
    }

    /// Record participants, returning those not seen before.
    pub async fn observe_participants(&self, participants: &[Participant]) -> Vec<Participant> {
        let mut known = self.participants.write().await;
        let mut added = Vec::new();
        for participant in participants {
            if known.get(&participant.id) != Some(participant) {
                known.insert(participant.id, participant.clone());
                added.push(participant.clone());
            }
        }
        added
    }

    pub async fn participants(&self) -> Vec<Participant> {
        let mut list: Vec<_> = self.participants.read().await.values().cloned().collect();
        list.sort_by_key(|p| p.id);
        list
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|at| at.elapsed())
            .unwrap_or_default()
    }

    /// Mark the session as just used.
    pub(crate) fn touch(&self) {
        if let Ok(mut at) = self.last_activity.lock() {
            *at = Instant::now();
        }
    }
}
