//! Conversation message record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stagehand_core::{ChatMessage, ChatRole};
use tracing::warn;

/// Hard cap on stored message content. Enforced at creation; truncation is
/// irreversible and logged.
pub const MAX_CONTENT_LEN: usize = 16_384;

/// A single message owned by the conversation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        let mut content = content.into();
        if content.len() > MAX_CONTENT_LEN {
            warn!(
                "message content truncated from {} to {} bytes",
                content.len(),
                MAX_CONTENT_LEN
            );
            // Truncate on a char boundary so multi-byte text stays valid.
            let mut cut = MAX_CONTENT_LEN;
            while !content.is_char_boundary(cut) {
                cut -= 1;
            }
            content.truncate(cut);
        }
        Self {
            role,
            content,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(
        role: ChatRole,
        content: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        let mut message = Self::new(role, content);
        message.metadata = Some(metadata);
        message
    }

    /// Project down to the `{role, content}` pair sent on the wire.
    pub fn to_chat(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}
