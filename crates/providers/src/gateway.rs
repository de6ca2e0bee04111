//! Inference gateway: ordered cascade over providers, models and keys.
//!
//! For every call the gateway walks a strict cascade: each provider in
//! configured order, primary model first, then that provider's distinct
//! fallback model, trying every key for the stage before moving on. A
//! rate-limited or failing key never aborts the cascade; only a malformed
//! success body does. Success costs exactly one HTTP round trip.

use crate::transport::{ChatRequest, ChatTransport, ReqwestTransport, TransportResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stagehand_core::ChatMessage;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One inference provider: endpoint, model pair, credential pool.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    /// Full chat-completions URL.
    pub base_url: String,
    pub primary_model: String,
    pub fallback_model: Option<String>,
    pub keys: Vec<String>,
    /// Expected key prefix; keys that don't match are dropped at
    /// construction.
    pub key_prefix: Option<String>,
}

/// Generation parameters shared across providers.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Successful chat completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub provider: String,
    pub model: String,
    /// 1-based index of the key that answered.
    pub key_index: usize,
}

/// Classification of one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    RateLimit,
    Timeout,
    Http { status: u16, body: String },
    Network(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimit => write!(f, "rate_limit"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Http { status, body } => write!(f, "http {}: {}", status, body),
            FailureKind::Network(e) => write!(f, "network: {}", e),
        }
    }
}

/// One failed attempt in the cascade, kept for the aggregate error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub provider: String,
    pub model: String,
    /// 1-based key index, matching operator-facing logs.
    pub key_index: usize,
    pub failure: FailureKind,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} key {}: {}",
            self.provider, self.model, self.key_index, self.failure
        )
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no messages provided")]
    NoMessages,

    #[error("no usable API keys configured for any provider")]
    NoKeys,

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("all providers and keys exhausted ({} attempts)", .attempts.len())]
    Exhausted { attempts: Vec<Attempt> },
}

/// Introspection snapshot, one row per provider plus last-used info.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub providers: Vec<ProviderStatus>,
    pub last_provider: Option<String>,
    pub last_model: Option<String>,
    pub last_key_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub keys_available: usize,
    pub primary_model: String,
    pub fallback_model: Option<String>,
}

#[derive(Debug, Clone)]
struct LastUsed {
    provider: String,
    model: String,
    key_index: usize,
}

struct ProviderState {
    config: ProviderConfig,
    /// Round-robin cursor into the key pool. Advances past the winning key
    /// on success only; a failing key never moves it.
    cursor: AtomicUsize,
}

/// OpenAI-compatible response shape.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

pub struct InferenceGateway {
    providers: Vec<ProviderState>,
    config: GatewayConfig,
    transport: Arc<dyn ChatTransport>,
    last_used: Mutex<Option<LastUsed>>,
}

impl InferenceGateway {
    /// Build a gateway over the given providers. Keys are validated and
    /// filtered here; a gateway with zero usable keys is an error so the
    /// caller can degrade to rule-based-only mode.
    pub fn new(
        providers: Vec<ProviderConfig>,
        config: GatewayConfig,
    ) -> Result<Self, GatewayError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout));
        Self::with_transport(providers, config, transport)
    }

    pub fn with_transport(
        providers: Vec<ProviderConfig>,
        config: GatewayConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self, GatewayError> {
        let mut states = Vec::new();
        for mut provider in providers {
            provider.keys = filter_keys(&provider.name, provider.keys, provider.key_prefix.as_deref());
            if provider.keys.is_empty() {
                warn!("provider {} has no usable keys, skipping", provider.name);
                continue;
            }
            debug!(
                "provider {}: {} keys, model {} (fallback {:?})",
                provider.name,
                provider.keys.len(),
                provider.primary_model,
                provider.fallback_model
            );
            states.push(ProviderState {
                config: provider,
                cursor: AtomicUsize::new(0),
            });
        }

        if states.is_empty() {
            return Err(GatewayError::NoKeys);
        }

        Ok(Self {
            providers: states,
            config,
            transport,
            last_used: Mutex::new(None),
        })
    }

    /// Send a chat completion through the cascade.
    ///
    /// # Arguments
    /// * `messages` - Conversation in wire form; must be non-empty
    /// * `use_fallback_model` - Start from each provider's fallback model
    ///   instead of its primary
    ///
    /// # Errors
    /// `NoMessages` for an empty message list, `MalformedResponse` when a
    /// provider answers 200 with an unusable body, `Exhausted` (carrying
    /// every per-attempt failure) when every provider/model/key failed.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        use_fallback_model: bool,
    ) -> Result<ChatReply, GatewayError> {
        if messages.is_empty() {
            return Err(GatewayError::NoMessages);
        }

        let mut attempts = Vec::new();

        for provider in &self.providers {
            for model in model_chain(&provider.config, use_fallback_model) {
                if let Some(reply) = self
                    .try_provider_model(provider, &model, messages, &mut attempts)
                    .await?
                {
                    return Ok(reply);
                }
            }
        }

        warn!("gateway exhausted after {} attempts", attempts.len());
        Err(GatewayError::Exhausted { attempts })
    }

    /// Try every key of one provider with one model, starting at the
    /// round-robin cursor. `Ok(None)` means this stage is exhausted and the
    /// cascade should continue.
    async fn try_provider_model(
        &self,
        provider: &ProviderState,
        model: &str,
        messages: &[ChatMessage],
        attempts: &mut Vec<Attempt>,
    ) -> Result<Option<ChatReply>, GatewayError> {
        let keys = &provider.config.keys;
        let start = provider.cursor.load(Ordering::Relaxed);

        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        for i in 0..keys.len() {
            let key_index = (start + i) % keys.len();
            info!(
                "→ {} {}: key {}",
                provider.config.name,
                model,
                key_index + 1
            );

            let result = self
                .transport
                .post_chat(&provider.config.base_url, &keys[key_index], &request)
                .await;

            let failure = match result {
                TransportResult::Status { status: 200, body } => {
                    let content = extract_content(&body)?;
                    // Advance past the winning key so the next call spreads
                    // load instead of hammering the same credential.
                    provider
                        .cursor
                        .store((key_index + 1) % keys.len(), Ordering::Relaxed);
                    *self.last_used.lock() = Some(LastUsed {
                        provider: provider.config.name.clone(),
                        model: model.to_string(),
                        key_index: key_index + 1,
                    });
                    info!("✓ {} responded via key {}", provider.config.name, key_index + 1);
                    return Ok(Some(ChatReply {
                        content,
                        provider: provider.config.name.clone(),
                        model: model.to_string(),
                        key_index: key_index + 1,
                    }));
                }
                TransportResult::Status { status: 429, .. } => {
                    warn!(
                        "{} rate limit (key {})",
                        provider.config.name,
                        key_index + 1
                    );
                    FailureKind::RateLimit
                }
                TransportResult::Status { status, body } => {
                    warn!(
                        "{} error {} (key {})",
                        provider.config.name,
                        status,
                        key_index + 1
                    );
                    FailureKind::Http {
                        status,
                        body: truncate_body(&body),
                    }
                }
                TransportResult::TimedOut => {
                    warn!("{} timeout (key {})", provider.config.name, key_index + 1);
                    FailureKind::Timeout
                }
                TransportResult::NetworkError(e) => {
                    warn!("{} request failed: {}", provider.config.name, e);
                    FailureKind::Network(e)
                }
            };

            attempts.push(Attempt {
                provider: provider.config.name.clone(),
                model: model.to_string(),
                key_index: key_index + 1,
                failure,
            });
        }

        Ok(None)
    }

    pub fn status(&self) -> GatewayStatus {
        let last = self.last_used.lock().clone();
        GatewayStatus {
            providers: self
                .providers
                .iter()
                .map(|p| ProviderStatus {
                    name: p.config.name.clone(),
                    keys_available: p.config.keys.len(),
                    primary_model: p.config.primary_model.clone(),
                    fallback_model: p.config.fallback_model.clone(),
                })
                .collect(),
            last_provider: last.as_ref().map(|l| l.provider.clone()),
            last_model: last.as_ref().map(|l| l.model.clone()),
            last_key_index: last.as_ref().map(|l| l.key_index),
        }
    }
}

/// Models to try for one provider, in order.
fn model_chain(config: &ProviderConfig, use_fallback_model: bool) -> Vec<String> {
    if use_fallback_model {
        return vec![config
            .fallback_model
            .clone()
            .unwrap_or_else(|| config.primary_model.clone())];
    }

    let mut chain = vec![config.primary_model.clone()];
    if let Some(fallback) = &config.fallback_model {
        if fallback != &config.primary_model {
            chain.push(fallback.clone());
        }
    }
    chain
}

fn filter_keys(provider: &str, keys: Vec<String>, prefix: Option<&str>) -> Vec<String> {
    let mut valid = Vec::new();
    for (i, key) in keys.into_iter().enumerate() {
        let key = key.trim().to_string();
        if key.is_empty() {
            warn!("{} key {} is empty", provider, i + 1);
            continue;
        }
        if let Some(prefix) = prefix {
            if !key.starts_with(prefix) {
                warn!(
                    "{} key {} has invalid format (should start with '{}')",
                    provider,
                    i + 1,
                    prefix
                );
                continue;
            }
        }
        valid.push(key);
    }
    valid
}

fn extract_content(body: &str) -> Result<String, GatewayError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| GatewayError::MalformedResponse("no content in choices".to_string()))
}

fn truncate_body(body: &str) -> String {
    let mut cut = body.len().min(200);
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    body[..cut].to_string()
}
