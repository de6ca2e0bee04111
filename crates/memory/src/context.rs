//! Bounded conversation history with a token-budget trimmer.

use crate::personas::{system_prompt, Persona};
use crate::types::Message;
use chrono::{DateTime, Utc};
use stagehand_core::{ChatMessage, ChatRole};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Tuning knobs for a conversation context.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Hard cap on retained history messages.
    pub max_messages: usize,
    /// Rough token budget for system + history (4 chars ≈ 1 token).
    pub max_tokens_estimate: usize,
    pub persona: Persona,
    pub web_search: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: 50,
            max_tokens_estimate: 8000,
            persona: Persona::Assistant,
            web_search: true,
        }
    }
}

/// Rolling conversation history plus the system message.
///
/// The history is bounded two ways: a message-count cap and an estimated
/// token budget. Trimming always leaves the last exchange in place, even
/// when that exchange alone is over budget.
pub struct ConversationContext {
    system_message: Message,
    history: VecDeque<Message>,
    config: ContextConfig,
    total_appended: u64,
    session_start: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(config: ContextConfig) -> Self {
        let system_message = Message::new(
            ChatRole::System,
            system_prompt(config.persona, config.web_search),
        );
        info!(
            "conversation context initialized: max_messages={}, persona={}",
            config.max_messages,
            config.persona.name()
        );
        Self {
            system_message,
            history: VecDeque::new(),
            config,
            total_appended: 0,
            session_start: Utc::now(),
        }
    }

    /// Append a user message. Empty content is a silent no-op so callers
    /// can append unconditionally after any exchange.
    pub fn add_user_message(&mut self, content: &str) {
        self.append(ChatRole::User, content);
    }

    /// Append an assistant message. Empty content is a silent no-op.
    pub fn add_assistant_message(&mut self, content: &str) {
        self.append(ChatRole::Assistant, content);
    }

    fn append(&mut self, role: ChatRole, content: &str) {
        if content.is_empty() {
            return;
        }
        self.history.push_back(Message::new(role, content));
        self.total_appended += 1;
        while self.history.len() > self.config.max_messages {
            self.history.pop_front();
        }
        self.trim_to_token_budget();
    }

    fn trim_to_token_budget(&mut self) {
        // Keep at least the last exchange no matter what.
        while self.history.len() > 2 && self.estimated_tokens() > self.config.max_tokens_estimate {
            self.history.pop_front();
            debug!("trimmed oldest message to stay within token budget");
        }
    }

    /// Estimated token count of system + history, at 4 chars per token.
    pub fn estimated_tokens(&self) -> usize {
        let total_chars: usize = self.system_message.content.len()
            + self
                .history
                .iter()
                .map(|msg| msg.content.len())
                .sum::<usize>();
        total_chars / 4
    }

    /// History in wire form, optionally prefixed by the system message.
    pub fn get_messages(&self, include_system: bool) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        if include_system {
            messages.push(self.system_message.to_chat());
        }
        messages.extend(self.history.iter().map(Message::to_chat));
        messages
    }

    /// Full message list for one gateway request: system + trimmed history
    /// + the new user message. Does NOT persist the new message; call
    /// `add_user_message`/`add_assistant_message` after a successful
    /// exchange to keep it.
    pub fn get_context_for_request(&self, user_message: &str) -> Vec<ChatMessage> {
        let mut messages = self.get_messages(true);
        messages.push(ChatMessage::user(user_message));
        messages
    }

    /// Drop all history; the system message survives.
    pub fn clear(&mut self) {
        self.history.clear();
        self.session_start = Utc::now();
        info!("conversation context cleared");
    }

    /// Switch persona by name, rebuilding the system message. Unknown
    /// names are rejected with no mutation.
    pub fn set_personality(&mut self, name: &str) -> bool {
        let Some(persona) = Persona::from_name(name) else {
            debug!("unknown persona rejected: {}", name);
            return false;
        };
        self.config.persona = persona;
        self.system_message = Message::new(
            ChatRole::System,
            system_prompt(persona, self.config.web_search),
        );
        info!("persona set to {}", persona.name());
        true
    }

    pub fn persona(&self) -> Persona {
        self.config.persona
    }

    /// The most recent user/assistant pair, if one exists.
    pub fn last_exchange(&self) -> Option<(String, String)> {
        let messages: Vec<&Message> = self.history.iter().collect();
        for i in (1..messages.len()).rev() {
            if messages[i].role == ChatRole::Assistant && messages[i - 1].role == ChatRole::User {
                return Some((messages[i - 1].content.clone(), messages[i].content.clone()));
            }
        }
        None
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            message_count: self.history.len(),
            total_appended: self.total_appended,
            estimated_tokens: self.estimated_tokens(),
            max_messages: self.config.max_messages,
            max_tokens_estimate: self.config.max_tokens_estimate,
            session_seconds: (Utc::now() - self.session_start).num_seconds().max(0),
        }
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

/// Introspection snapshot of a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    pub message_count: usize,
    pub total_appended: u64,
    pub estimated_tokens: usize,
    pub max_messages: usize,
    pub max_tokens_estimate: usize,
    pub session_seconds: i64,
}
