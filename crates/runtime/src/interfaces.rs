//! Trait seams the pipeline depends on.

use async_trait::async_trait;
use stagehand_core::ChatMessage;
use stagehand_providers::{ChatReply, GatewayError, InferenceGateway};

/// Chat completion source. Implemented by the real gateway and by mocks.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        use_fallback_model: bool,
    ) -> Result<ChatReply, GatewayError>;
}

#[async_trait]
impl InferenceBackend for InferenceGateway {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        use_fallback_model: bool,
    ) -> Result<ChatReply, GatewayError> {
        InferenceGateway::chat(self, messages, use_fallback_model).await
    }
}

/// Answer from the system/utility resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemAnswer {
    pub description: String,
}

/// External collaborator for system and utility queries (time, system
/// info, web search). `None` means "not a system query, keep going".
#[async_trait]
pub trait SystemQueryResolver: Send + Sync {
    async fn handle_query(&self, query: &str) -> Option<SystemAnswer>;
}
