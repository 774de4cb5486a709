use serde::{Deserialize, Serialize};

/// Telegram transport settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot API token from @BotFather.
    pub token: String,
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates` (valid range: 0-50).
    pub poll_timeout_secs: u32,
    /// Minimum delay between two edits of a streaming reply.
    pub edit_interval_ms: u32,
    /// Updates handled concurrently across all chats.
    pub max_concurrent_updates: u32,
    /// Longest text sent in one message before splitting.
    pub max_message_chars: u32,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("edit_interval_ms", &self.edit_interval_ms)
            .field("max_concurrent_updates", &self.max_concurrent_updates)
            .field("max_message_chars", &self.max_message_chars)
            .finish()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://api.telegram.org".into(),
            poll_timeout_secs: 30,
            edit_interval_ms: 700,
            max_concurrent_updates: 20,
            max_message_chars: 4000,
        }
    }
}
