use serde::{Deserialize, Serialize};

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Tool calls allowed within one turn (valid range: 1-16).
    pub max_tool_rounds: u32,
    /// Idle sessions older than this are dropped; 0 keeps them forever.
    pub idle_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            idle_ttl_secs: 0,
        }
    }
}
