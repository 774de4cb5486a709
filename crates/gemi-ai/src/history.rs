//! Model-visible chat history.
//!
//! A `ChatHistory` is the handle a [`ModelClient`](crate::ModelClient)
//! hands out from `start_chat`. It starts as a copy of the seed history
//! and grows by one user entry per turn plus the model's replies. A tool
//! call is recorded as a model `functionCall` followed by a user
//! `functionResponse` placeholder that is later spliced with the result.

use serde_json::json;

use crate::{Content, ContentPart, Role, ToolCall};

#[derive(Debug, Clone)]
pub struct ChatHistory {
    seed: Vec<Content>,
    contents: Vec<Content>,
}

/// Position in the history to rewind to when a turn fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl ChatHistory {
    pub fn new(seed: Vec<Content>) -> Self {
        Self {
            contents: seed.clone(),
            seed,
        }
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn seed(&self) -> &[Content] {
        &self.seed
    }

    /// Entries added since the seed.
    pub fn turns(&self) -> &[Content] {
        &self.contents[self.seed.len().min(self.contents.len())..]
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn push_user(&mut self, parts: Vec<ContentPart>) {
        self.contents.push(Content {
            role: Role::User,
            parts,
        });
    }

    /// Record the model's final text for the current reply.
    pub fn push_model_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.contents.push(Content {
            role: Role::Model,
            parts: vec![ContentPart::Text(text)],
        });
    }

    /// Record a model reply that ended in `call`, preceded by any text the
    /// model streamed first, and reserve the function-response slot.
    pub fn record_tool_call(&mut self, text: String, call: &ToolCall) {
        let mut parts = Vec::with_capacity(2);
        if !text.is_empty() {
            parts.push(ContentPart::Text(text));
        }
        parts.push(ContentPart::FunctionCall {
            id: call.id.clone(),
            name: call.name.clone(),
            args: call.arguments.clone(),
        });
        self.contents.push(Content {
            role: Role::Model,
            parts,
        });
        self.contents.push(Content {
            role: Role::User,
            parts: vec![ContentPart::FunctionResponse {
                id: call.id.clone(),
                name: call.name.clone(),
                response: json!({ "status": "pending" }),
            }],
        });
    }

    /// Replace the placeholder response for `call_id`. Returns `false` when
    /// no such call was recorded.
    pub fn splice_result(&mut self, call_id: &str, result: serde_json::Value) -> bool {
        for content in self.contents.iter_mut().rev() {
            for part in content.parts.iter_mut() {
                if let ContentPart::FunctionResponse { id, response, .. } = part {
                    if id == call_id {
                        *response = result;
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.contents.len())
    }

    /// Drop everything added after `checkpoint`.
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.contents.truncate(checkpoint.0.max(self.seed.len()));
    }

    pub fn reset_to_seed(&mut self) {
        self.contents.clone_from(&self.seed);
    }
}
