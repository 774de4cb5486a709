//! Session registry: maps conversation ids to live sessions.
//!
//! Lookups take a shared read lock. Creation is serialized by a single
//! registry-wide lock so the model handshake for a conversation happens
//! at most once, even when its first messages arrive together.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use gemi_common::{ConversationId, Participant};

use crate::interpreter::Interpreter;
use crate::session::Session;
use crate::store::{remember_conversation, ConversationStore};
use crate::{AiError, Content};

pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConversationId, Arc<Session>>>,
    create_lock: Mutex<()>,
    interpreter: Arc<Interpreter>,
    store: Arc<dyn ConversationStore>,
    seed: Vec<Content>,
}

impl SessionRegistry {
    pub fn new(
        interpreter: Arc<Interpreter>,
        store: Arc<dyn ConversationStore>,
        seed: Vec<Content>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            create_lock: Mutex::new(()),
            interpreter,
            store,
            seed,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Existing session for `id`, if any.
    pub async fn get(&self, id: ConversationId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Resolve the session for `id`, creating it on first use.
    pub async fn get_or_create(
        &self,
        id: ConversationId,
        participants: &[Participant],
    ) -> Result<Arc<Session>, AiError> {
        if let Some(session) = self.get(id).await {
            self.observe(&session, participants).await;
            return Ok(session);
        }

        let _creating = self.create_lock.lock().await;
        if let Some(session) = self.get(id).await {
            self.observe(&session, participants).await;
            return Ok(session);
        }

        let history = self.interpreter.model().start_chat(&self.seed).await?;
        let session = Arc::new(Session::new(
            id,
            history,
            Arc::clone(&self.interpreter),
            participants,
        ));
        remember_conversation(self.store.as_ref(), id, participants).await;

        self.sessions.write().await.insert(id, Arc::clone(&session));
        info!(conversation = %id, "Session created");
        Ok(session)
    }

    async fn observe(&self, session: &Session, participants: &[Participant]) {
        session.touch();
        let added = session.observe_participants(participants).await;
        if !added.is_empty() {
            debug!(conversation = %session.id(), added = added.len(), "New participants");
            remember_conversation(self.store.as_ref(), session.id(), &added).await;
        }
    }

    /// Drop sessions idle for longer than `max_idle`. A session is kept
    /// while a turn holds it or anyone besides the registry still has a
    /// handle to it. Returns the number removed.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.sessions.write().await;
        let before = map.len();
        map.retain(|id, session| {
            let stale = Arc::strong_count(session) == 1
                && !session.is_busy()
                && session.idle_for() > max_idle;
            if stale {
                info!(conversation = %id, "Reaping idle session");
            }
            !stale
        });
        before - map.len()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
