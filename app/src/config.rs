//! Application configuration: YAML file plus environment keys.
//!
//! API keys never live in the config file. Each provider entry names an
//! environment prefix and the loader reads `<PREFIX>_1 .. <PREFIX>_N`,
//! so a typical setup is `STAGEHAND_GROQ_KEY_1=gsk_...`.

use serde::{Deserialize, Serialize};
use stagehand_providers::ProviderConfig;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub executor: ExecutorSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            cache: CacheSettings::default(),
            context: ContextSettings::default(),
            gateway: GatewaySettings::default(),
            executor: ExecutorSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    pub base_url: String,
    pub primary_model: String,
    #[serde(default)]
    pub fallback_model: Option<String>,
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// Environment prefix for keys (`<key_env>_1 .. <key_env>_N`).
    pub key_env: String,
    #[serde(default = "default_max_keys")]
    pub max_keys: usize,
}

impl ProviderEntry {
    /// Read this provider's keys from the environment.
    pub fn resolve_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for i in 1..=self.max_keys {
            if let Ok(key) = std::env::var(format!("{}_{}", self.key_env, i)) {
                keys.push(key);
            }
        }
        debug!("{}: {} keys found in environment", self.name, keys.len());
        keys
    }

    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            primary_model: self.primary_model.clone(),
            fallback_model: self.fallback_model.clone(),
            keys: self.resolve_keys(),
            key_prefix: self.key_prefix.clone(),
        }
    }
}

fn default_max_keys() -> usize {
    3
}

fn default_providers() -> Vec<ProviderEntry> {
    vec![
        ProviderEntry {
            name: "groq".to_string(),
            base_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            primary_model: "llama-3.3-70b-versatile".to_string(),
            fallback_model: Some("llama-3.1-8b-instant".to_string()),
            key_prefix: Some("gsk_".to_string()),
            key_env: "STAGEHAND_GROQ_KEY".to_string(),
            max_keys: 3,
        },
        ProviderEntry {
            name: "openrouter".to_string(),
            base_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            primary_model: "meta-llama/llama-3.2-3b-instruct:free".to_string(),
            fallback_model: Some("qwen/qwen-2.5-72b-instruct:free".to_string()),
            key_prefix: Some("sk-or-v1-".to_string()),
            key_env: "STAGEHAND_OPENROUTER_KEY".to_string(),
            max_keys: 3,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub max_size: usize,
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: 200,
            ttl_seconds: 7200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSettings {
    pub max_messages: usize,
    pub max_tokens_estimate: usize,
    pub persona: String,
    pub web_search: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_messages: 50,
            max_tokens_estimate: 8000,
            persona: "assistant".to_string(),
            web_search: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// External input-injection binary, invoked once per plan step.
    pub injector_bin: String,
    pub step_timeout_seconds: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            injector_bin: "stagehand-inject".to_string(),
            step_timeout_seconds: 30,
        }
    }
}
