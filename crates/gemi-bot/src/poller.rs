//! Long-polling update loop.
//!
//! Each message is handled on its own task. A semaphore bounds the number
//! of messages in flight across all chats; when it is exhausted the loop
//! stops fetching until a handler finishes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use gemi_common::TransportError;
use gemi_config::schema::BotConfig;

use crate::handler::Handler;
use crate::telegram::types::Message;
use crate::telegram::TelegramClient;

const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Poller {
    client: Arc<TelegramClient>,
    handler: Arc<Handler>,
    timeout_secs: u32,
    permits: Arc<Semaphore>,
}

impl Poller {
    pub fn new(client: Arc<TelegramClient>, handler: Arc<Handler>, config: &BotConfig) -> Self {
        Self {
            client,
            handler,
            timeout_secs: config.poll_timeout_secs,
            permits: Arc::new(Semaphore::new(config.max_concurrent_updates as usize)),
        }
    }

    /// Poll forever.
    pub async fn run(self) {
        let mut offset = None;
        loop {
            match self.poll_once(offset).await {
                Ok(next) => offset = next,
                Err(e) => {
                    warn!(error = %e, "Failed to fetch updates");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// Fetch one batch of updates and dispatch its messages. Returns the
    /// offset for the next request.
    async fn poll_once(&self, offset: Option<i64>) -> Result<Option<i64>, TransportError> {
        let updates = self.client.get_updates(offset, self.timeout_secs).await?;
        let mut next = offset;
        for update in updates {
            next = Some(update.update_id + 1);
            match update.message {
                Some(message) => self.dispatch(message).await,
                None => debug!(update_id = update.update_id, "Skipping non-message update"),
            }
        }
        Ok(next)
    }

    async fn dispatch(&self, message: Message) {
        if message.from.as_ref().is_some_and(|user| user.is_bot) {
            debug!(chat = message.chat.id, "Ignoring message from a bot");
            return;
        }
        debug!(chat = message.chat.id, chat_type = %message.chat.kind, "Dispatching message");

        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return;
        };
        let handler = Arc::clone(&self.handler);
        let incoming = message.to_incoming();
        tokio::spawn(async move {
            handler.handle(incoming).await;
            drop(permit);
        });
    }
}
