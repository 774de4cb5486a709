use serde::{Deserialize, Serialize};
use std::fmt;

/// Fresh identifier for a tool call the backend did not label itself.
pub fn new_call_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Short id used to tie the log lines of one turn together.
pub fn new_correlation_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// External chat identifier; the key of the session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(i64);

impl ConversationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_id_is_valid_uuid() {
        let id = new_call_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn call_id_is_unique() {
        assert_ne!(new_call_id(), new_call_id());
    }

    #[test]
    fn correlation_id_is_short_hex() {
        let cid = new_correlation_id();
        assert_eq!(cid.len(), 8);
        assert!(cid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn conversation_id_display_matches_raw() {
        let id = ConversationId::new(-100123456);
        assert_eq!(id.to_string(), "-100123456");
        assert_eq!(id.get(), -100123456);
    }

    #[test]
    fn conversation_id_serializes_transparently() {
        let id = ConversationId::from(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: ConversationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn conversation_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ConversationId::new(7));
        set.insert(ConversationId::new(7));
        set.insert(ConversationId::new(8));
        assert_eq!(set.len(), 2);
    }
}
