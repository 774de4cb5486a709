//! Turns one inbound message into one rendered turn.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tracing::{error, info, info_span, warn, Instrument};

use gemi_ai::store::remember_message;
use gemi_ai::{MessageRecord, PromptAssembler, PromptError, RecordRole, SessionRegistry, TurnError};
use gemi_common::{new_correlation_id, IncomingMessage, Participant, TransportError};
use gemi_config::schema::BotConfig;

use crate::commands;
use crate::markdown::{italic, MAX_MESSAGE_CHARS};
use crate::reply::{Flow, Reply};
use crate::telegram::{ChatTransport, TextFormat};

const THINKING: &str = "Thinking...";
const DELIVERY_FAILED: &str = "Failed to reply, try again...";

/// Why a message got no proper answer.
#[derive(Debug, thiserror::Error)]
enum HandleError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error("delivery failed: {0}")]
    Delivery(#[from] TransportError),
}

impl HandleError {
    fn user_message(&self) -> String {
        match self {
            HandleError::Prompt(e) => e.user_message().to_string(),
            HandleError::Turn(e) => e.user_message(),
            HandleError::Delivery(_) => DELIVERY_FAILED.to_string(),
        }
    }
}

pub struct Handler {
    transport: Arc<dyn ChatTransport>,
    registry: Arc<SessionRegistry>,
    assembler: PromptAssembler,
    edit_interval: Duration,
    max_chars: usize,
}

impl Handler {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        registry: Arc<SessionRegistry>,
        assembler: PromptAssembler,
    ) -> Self {
        Self {
            transport,
            registry,
            assembler,
            edit_interval: Duration::from_millis(700),
            max_chars: MAX_MESSAGE_CHARS,
        }
    }

    pub fn from_config(
        transport: Arc<dyn ChatTransport>,
        registry: Arc<SessionRegistry>,
        assembler: PromptAssembler,
        config: &BotConfig,
    ) -> Self {
        Self::new(transport, registry, assembler)
            .with_edit_interval(Duration::from_millis(u64::from(config.edit_interval_ms)))
            .with_max_chars(config.max_message_chars as usize)
    }

    pub fn with_edit_interval(mut self, interval: Duration) -> Self {
        self.edit_interval = interval;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Handle one inbound message. Never fails; problems are reported in chat.
    pub async fn handle(&self, message: IncomingMessage) {
        info!(
            conversation = %message.conversation,
            message_id = message.message_id,
            kind = message.content.kind(),
            "Message received"
        );

        if message.command() == Some("start") {
            if let Err(e) = commands::start(&self.registry, self.transport.as_ref(), &message).await
            {
                warn!(conversation = %message.conversation, error = %e, "Failed to greet");
            }
            return;
        }
        let span = info_span!("turn", id = %new_correlation_id());
        self.respond(&message).instrument(span).await;
    }

    async fn respond(&self, message: &IncomingMessage) {
        let chat = message.conversation.get();
        let status = match self
            .transport
            .send_message(
                chat,
                &italic(THINKING),
                TextFormat::MarkdownV2,
                Some(message.message_id),
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(conversation = %message.conversation, error = %e, "Failed to send status message");
                return;
            }
        };

        let mut reply = Reply::new(
            self.transport.as_ref(),
            chat,
            message.message_id,
            status,
            self.edit_interval,
            self.max_chars,
        );
        match self.run_turn(message, &mut reply).await {
            Ok(()) => self.remember(message, status, reply.transcript()).await,
            Err(e) => {
                match &e {
                    HandleError::Delivery(_) => {
                        warn!(conversation = %message.conversation, error = %e, "Failed to reply")
                    }
                    _ => error!(conversation = %message.conversation, error = %e, "Turn failed"),
                }
                reply.report(&e.user_message()).await;
            }
        }
    }

    async fn run_turn(
        &self,
        message: &IncomingMessage,
        reply: &mut Reply<'_>,
    ) -> Result<(), HandleError> {
        let participants: Vec<Participant> = message.sender.iter().cloned().collect();
        let session = self
            .registry
            .get_or_create(message.conversation, &participants)
            .await
            .map_err(TurnError::from)?;
        let parts = self.assembler.build(message).await?;

        let mut turn = session.send(parts);
        while let Some(event) = turn.next().await {
            if reply.render(event?).await? == Flow::Stop {
                return Ok(());
            }
        }
        reply.finish().await?;
        Ok(())
    }

    async fn remember(&self, message: &IncomingMessage, status: i64, answer: &str) {
        let store = self.registry.store().as_ref();
        remember_message(
            store,
            MessageRecord {
                conversation: message.conversation,
                message_id: Some(message.message_id),
                sender: message.sender.as_ref().map(|p| p.id),
                role: RecordRole::User,
                text: message
                    .text()
                    .unwrap_or_else(|| message.content.kind())
                    .to_string(),
                date: message.date,
            },
        )
        .await;

        if !answer.trim().is_empty() {
            remember_message(
                store,
                MessageRecord {
                    conversation: message.conversation,
                    message_id: Some(status),
                    sender: None,
                    role: RecordRole::Bot,
                    text: answer.to_string(),
                    date: Utc::now(),
                },
            )
            .await;
        }
    }
}
