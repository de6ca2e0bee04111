//! HTTP dispatch seam for the gateway.
//!
//! The cascade only needs "what came back for one attempt": an HTTP status
//! plus body, a timeout, or a network failure. Putting that behind a trait
//! keeps the cascade testable without a live server.

use async_trait::async_trait;
use serde::Serialize;
use stagehand_core::ChatMessage;
use std::time::Duration;

/// Request body for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Outcome of a single HTTP attempt, before classification.
#[derive(Debug, Clone)]
pub enum TransportResult {
    /// The server answered with this status and body.
    Status { status: u16, body: String },
    /// The request hit the per-attempt timeout.
    TimedOut,
    /// Connection-level failure.
    NetworkError(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_chat(&self, url: &str, api_key: &str, request: &ChatRequest) -> TransportResult;
}

/// Production transport backed by a shared reqwest client with a
/// per-attempt timeout.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for ReqwestTransport {
    async fn post_chat(&self, url: &str, api_key: &str, request: &ChatRequest) -> TransportResult {
        let response = match self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return TransportResult::TimedOut,
            Err(e) => return TransportResult::NetworkError(e.to_string()),
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        TransportResult::Status { status, body }
    }
}
