//! The request pipeline: one string in, one plan-shaped result out.
//!
//! Stage order is fixed and terminal on first match: cache, system
//! resolver, simple-query heuristics, then the gateway with the rule-based
//! planner behind it. Nothing in here returns an error to the caller;
//! every failure becomes a plan.

use crate::fallback;
use crate::interfaces::{InferenceBackend, SystemQueryResolver};
use crate::simple_query;
use crate::{extract, metrics};
use parking_lot::Mutex;
use stagehand_cache::ResponseCache;
use stagehand_core::Plan;
use stagehand_memory::{ContextConfig, ConversationContext};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RequestPipeline {
    cache: Arc<ResponseCache>,
    context: Mutex<ConversationContext>,
    context_config: ContextConfig,
    gateway: Option<Arc<dyn InferenceBackend>>,
    resolver: Option<Arc<dyn SystemQueryResolver>>,
}

impl RequestPipeline {
    pub fn new(
        cache: Arc<ResponseCache>,
        context_config: ContextConfig,
        gateway: Option<Arc<dyn InferenceBackend>>,
        resolver: Option<Arc<dyn SystemQueryResolver>>,
    ) -> Self {
        Self {
            cache,
            context: Mutex::new(ConversationContext::new(context_config.clone())),
            context_config,
            gateway,
            resolver,
        }
    }

    /// Generate a result for one request. Never fails: gateway problems
    /// degrade to the rule-based planner, malformed model output becomes
    /// conversational text.
    pub async fn generate(&self, input: &str) -> Plan {
        let _timer = metrics::MetricTimer::new("pipeline_request_latency");
        let input = input.trim();

        if input.is_empty() {
            return Plan::system_answer("Tell me what you'd like me to do.");
        }

        // Stage 1: cache.
        if let Some(value) = self.cache.get(input) {
            metrics::increment_cache_hit();
            match serde_json::from_value::<Plan>(value) {
                Ok(plan) => return plan,
                Err(e) => warn!("discarding undeserializable cache entry: {}", e),
            }
        }
        metrics::increment_cache_miss();

        // Stage 2: system/utility resolver.
        if let Some(resolver) = &self.resolver {
            if let Some(answer) = resolver.handle_query(input).await {
                debug!("system resolver claimed the query");
                let plan = Plan::system_answer(answer.description);
                self.cache_plan(input, &plan);
                return plan;
            }
        }

        // Stage 3: greetings and whitelisted arithmetic.
        if let Some(plan) = simple_query::handle_simple_query(input) {
            self.cache_plan(input, &plan);
            return plan;
        }

        // Stage 4: compound-task annotation. Augments the request, never
        // blocks it.
        let request_text = if simple_query::needs_step_decomposition(input) {
            debug!("request flagged for multi-step decomposition");
            format!(
                "{}\n\nBreak this task into explicit ordered steps before answering.",
                input
            )
        } else {
            input.to_string()
        };

        // Stage 5: gateway, with the rule-based planner behind it.
        let Some(gateway) = &self.gateway else {
            metrics::increment_fallback_plan();
            return fallback::rule_based_plan(input);
        };

        let messages = self.context.lock().get_context_for_request(&request_text);
        let reply = {
            let _gateway_timer = metrics::MetricTimer::new("gateway_request_latency");
            gateway.chat(&messages, false).await
        };

        match reply {
            Ok(reply) => {
                debug!(
                    "gateway answered via {} ({})",
                    reply.provider, reply.model
                );
                // Stage 6: extraction, cache write, context append.
                let plan = extract::extract_plan(&reply.content);
                self.cache_plan(input, &plan);
                let mut context = self.context.lock();
                context.add_user_message(input);
                context.add_assistant_message(&reply.content);
                plan
            }
            Err(e) => {
                warn!("gateway failed, using rule-based planner: {}", e);
                metrics::increment_gateway_error();
                metrics::increment_fallback_plan();
                fallback::rule_based_plan(input)
            }
        }
    }

    fn cache_plan(&self, key: &str, plan: &Plan) {
        match serde_json::to_value(plan) {
            Ok(value) => self.cache.set(key, value),
            Err(e) => warn!("failed to serialize plan for caching: {}", e),
        }
    }

    /// Reset conversation and cache state. Exposed for test isolation and
    /// the transport's session-reset command.
    pub fn reset(&self) {
        self.cache.clear();
        *self.context.lock() = ConversationContext::new(self.context_config.clone());
    }

    pub fn clear_context(&self) {
        self.context.lock().clear();
    }

    /// Switch persona; false for unknown names, with no mutation.
    pub fn set_personality(&self, name: &str) -> bool {
        self.context.lock().set_personality(name)
    }

    /// Peek at the cache without running any pipeline stage.
    pub fn cached(&self, key: &str) -> Option<serde_json::Value> {
        self.cache.get(key)
    }

    pub fn context_summary(&self) -> stagehand_memory::ContextSummary {
        self.context.lock().summary()
    }

    pub fn cache_stats(&self) -> stagehand_cache::CacheStats {
        self.cache.stats()
    }
}
