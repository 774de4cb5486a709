use serde::{Deserialize, Serialize};

/// Where the replied-to message goes relative to the live message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOrder {
    #[default]
    MessageFirst,
    ContextFirst,
}

/// Prompt assembly limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Largest photo variant (bytes) preferred when downsizing.
    pub photo_byte_ceiling: u64,
    /// Hard ceiling (bytes) for any downloaded media.
    pub max_file_bytes: u64,
    pub reply_order: ReplyOrder,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            photo_byte_ceiling: 150_000,
            max_file_bytes: 20_000_000,
            reply_order: ReplyOrder::MessageFirst,
        }
    }
}
