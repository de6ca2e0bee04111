//! Wires configuration into one dependency-injected service.

use crate::config::AppConfig;
use crate::driver::ProcessDriver;
use crate::resolver::DesktopQueryResolver;
use stagehand_cache::ResponseCache;
use stagehand_executor::Executor;
use stagehand_memory::{ContextConfig, Persona};
use stagehand_policy::CommandValidator;
use stagehand_providers::{GatewayConfig, InferenceGateway};
use stagehand_runtime::{AgentService, InferenceBackend, RequestPipeline, SystemQueryResolver};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the full service from config. A gateway with no usable keys is
/// not fatal: the pipeline runs in rule-based-only mode until keys appear.
pub fn build_service(config: &AppConfig) -> AgentService {
    let provider_configs = config
        .providers
        .iter()
        .map(|entry| entry.to_provider_config())
        .collect();

    let gateway_config = GatewayConfig {
        temperature: config.gateway.temperature,
        max_tokens: config.gateway.max_tokens,
        timeout: Duration::from_secs(config.gateway.timeout_seconds),
    };

    let gateway: Option<Arc<dyn InferenceBackend>> =
        match InferenceGateway::new(provider_configs, gateway_config) {
            Ok(gateway) => {
                info!("inference gateway ready");
                Some(Arc::new(gateway))
            }
            Err(e) => {
                warn!("{}; running in rule-based-only mode", e);
                None
            }
        };

    let cache = Arc::new(ResponseCache::new(
        config.cache.max_size,
        Duration::from_secs(config.cache.ttl_seconds),
    ));

    let persona = Persona::from_name(&config.context.persona).unwrap_or_else(|| {
        warn!(
            "unknown persona '{}' in config, using default",
            config.context.persona
        );
        Persona::default()
    });

    let context_config = ContextConfig {
        max_messages: config.context.max_messages,
        max_tokens_estimate: config.context.max_tokens_estimate,
        persona,
        web_search: config.context.web_search,
    };

    let resolver: Option<Arc<dyn SystemQueryResolver>> =
        Some(Arc::new(DesktopQueryResolver::new()));

    let pipeline = RequestPipeline::new(cache, context_config, gateway, resolver);

    let driver = Arc::new(ProcessDriver::new(config.executor.injector_bin.clone()));
    let executor = Executor::with_step_timeout(
        driver,
        Duration::from_secs(config.executor.step_timeout_seconds),
    );

    AgentService::new(pipeline, CommandValidator::heuristic_only(), executor)
}
