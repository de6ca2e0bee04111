pub mod context;
pub mod personas;
pub mod types;

pub use context::{ContextConfig, ContextSummary, ConversationContext};
pub use personas::Persona;
pub use types::{Message, MAX_CONTENT_LEN};
