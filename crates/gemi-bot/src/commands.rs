//! Bot commands.

use tracing::info;

use gemi_ai::SessionRegistry;
use gemi_common::{IncomingMessage, Participant, TransportError};

use crate::telegram::{ChatTransport, TextFormat};

/// `/start`: reset the conversation if one is running, then greet.
pub async fn start(
    registry: &SessionRegistry,
    transport: &dyn ChatTransport,
    message: &IncomingMessage,
) -> Result<(), TransportError> {
    if let Some(session) = registry.get(message.conversation).await {
        session.reset().await;
        info!(conversation = %message.conversation, "Conversation restarted");
    }
    transport
        .send_message(
            message.conversation.get(),
            &greeting(message.sender.as_ref()),
            TextFormat::Plain,
            None,
        )
        .await?;
    Ok(())
}

pub fn greeting(sender: Option<&Participant>) -> String {
    match sender {
        Some(sender) => format!("Hello, {}!", sender.full_name()),
        None => "Hello!".to_string(),
    }
}
