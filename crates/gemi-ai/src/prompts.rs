//! Built-in system instruction, seed history and message metadata template.

use chrono::{DateTime, Utc};

use crate::Content;

/// Key of the metadata block appended to every live user message.
pub const MESSAGE_METADATA: &str = "message_metadata";

/// Format of the metadata timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SYSTEM_INSTRUCTION: &str = "\
You are Gemi, an intelligent chat bot. Have a conversation with the user to \
figure out their needs and give them solutions to their problems. You can \
answer directly or search the internet for relevant, up to date information \
before answering.

You can hold text, image and audio based conversations, understand images, \
text and PDF documents, search the web and generate images and voice.";

const GREETING: &str = "Hi! Let's get started.";

/// The system instruction sent with every request, unless overridden.
pub fn system_instruction(custom: Option<&str>) -> String {
    custom
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(SYSTEM_INSTRUCTION)
        .to_string()
}

fn rules() -> String {
    format!(
        "Rules:
- A response can be text, an image or audio.
- Prefer text responses. Respond with an image or audio only when you need to.
- Use the image or voice tool only when the answer has to be an image or audio.
- Use the search tool only when the answer needs information you do not have.
- Ask clarifying questions until you understand what the conversation is about.
- Every user message ends with a {MESSAGE_METADATA} block in the format \
\"{MESSAGE_METADATA}:\\n  timestamp: <yyyy-MM-dd HH:mm:ss>\\n  message_type: <content type>\\n  mime_type: <document type>\\n\". \
Never treat the metadata as part of the message.
- When you need the current date or time, read it from the timestamp of the latest {MESSAGE_METADATA} instead of searching.
- Keep responses short unless asked for details."
    )
}

/// Priming exchange every new chat starts with and every reset returns to.
pub fn seed_history() -> Vec<Content> {
    vec![Content::user_text(rules()), Content::model_text(GREETING)]
}

/// Metadata block appended as the last part of a live message.
pub fn metadata_block(timestamp: DateTime<Utc>, kind: &str, mime_type: Option<&str>) -> String {
    let mut block = format!(
        "\n{MESSAGE_METADATA}:\n  timestamp: {}\n  message_type: {kind}\n",
        timestamp.format(TIMESTAMP_FORMAT)
    );
    if let Some(mime_type) = mime_type {
        block.push_str(&format!("  mime_type: {mime_type}\n"));
    }
    block
}
