#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end pipeline tests with scripted collaborators.

use async_trait::async_trait;
use parking_lot::Mutex;
use stagehand_cache::ResponseCache;
use stagehand_core::{ChatMessage, Plan, PlanSource, StepOp};
use stagehand_executor::{Executor, NullDriver};
use stagehand_memory::ContextConfig;
use stagehand_policy::CommandValidator;
use stagehand_providers::{Attempt, ChatReply, FailureKind, GatewayError};
use stagehand_runtime::{
    AgentService, InferenceBackend, RequestPipeline, SystemAnswer, SystemQueryResolver,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Backend that pops one scripted reply per call and counts invocations.
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<String, GatewayError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn last_messages(&self) -> Vec<ChatMessage> {
        self.calls.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _use_fallback_model: bool,
    ) -> Result<ChatReply, GatewayError> {
        self.calls.lock().push(messages.to_vec());
        match self.replies.lock().pop_front() {
            Some(Ok(content)) => Ok(ChatReply {
                content,
                provider: "scripted".to_string(),
                model: "scripted-model".to_string(),
                key_index: 1,
            }),
            Some(Err(e)) => Err(e),
            None => Err(GatewayError::Exhausted {
                attempts: vec![Attempt {
                    provider: "scripted".to_string(),
                    model: "scripted-model".to_string(),
                    key_index: 1,
                    failure: FailureKind::Timeout,
                }],
            }),
        }
    }
}

struct ClockResolver;

#[async_trait]
impl SystemQueryResolver for ClockResolver {
    async fn handle_query(&self, query: &str) -> Option<SystemAnswer> {
        if query.to_lowercase().contains("time") {
            return Some(SystemAnswer {
                description: "The current time is 12:00:00".to_string(),
            });
        }
        None
    }
}

fn pipeline_with(
    gateway: Option<Arc<dyn InferenceBackend>>,
    resolver: Option<Arc<dyn SystemQueryResolver>>,
) -> RequestPipeline {
    RequestPipeline::new(
        Arc::new(ResponseCache::new(50, Duration::from_secs(300))),
        ContextConfig::default(),
        gateway,
        resolver,
    )
}

fn service_with(gateway: Option<Arc<dyn InferenceBackend>>) -> (AgentService, Arc<NullDriver>) {
    let driver = Arc::new(NullDriver::new());
    let service = AgentService::new(
        pipeline_with(gateway, None),
        CommandValidator::heuristic_only(),
        Executor::new(driver.clone()),
    );
    (service, driver)
}

#[tokio::test]
async fn test_arithmetic_never_reaches_the_gateway() {
    let backend = ScriptedBackend::new(vec![Ok("should not be called".to_string())]);
    let pipeline = pipeline_with(Some(backend.clone()), None);

    let plan = pipeline.generate("5*5").await;

    assert_eq!(plan.description, "5*5 = 25");
    assert_eq!(plan.source, PlanSource::SystemQuery);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_cache_hit_skips_every_downstream_stage() {
    let backend = ScriptedBackend::new(vec![
        Ok(r#"{"description": "first answer"}"#.to_string()),
        Ok(r#"{"description": "second answer"}"#.to_string()),
    ]);
    let pipeline = pipeline_with(Some(backend.clone()), None);

    let first = pipeline.generate("what is rust").await;
    let second = pipeline.generate("  What Is RUST  ").await;

    assert_eq!(first.description, "first answer");
    assert_eq!(second.description, "first answer");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_system_resolver_claims_query_before_gateway() {
    let backend = ScriptedBackend::new(vec![Ok("unused".to_string())]);
    let pipeline = pipeline_with(Some(backend.clone()), Some(Arc::new(ClockResolver)));

    let plan = pipeline.generate("what time is it").await;

    assert_eq!(plan.source, PlanSource::SystemQuery);
    assert!(plan.description.contains("12:00:00"));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_no_gateway_degrades_to_rule_based_planner() {
    let pipeline = pipeline_with(None, None);

    let plan = pipeline.generate("open firefox").await;

    assert_eq!(plan.source, PlanSource::Fallback);
    assert!(matches!(&plan.steps[0].op, StepOp::Key { key } if key == "Super_L"));
    assert!(matches!(&plan.steps[1].op, StepOp::Type { text } if text == "firefox"));
}

#[tokio::test]
async fn test_gateway_failure_degrades_to_rule_based_planner() {
    let backend = ScriptedBackend::new(vec![Err(GatewayError::Exhausted { attempts: vec![] })]);
    let pipeline = pipeline_with(Some(backend.clone()), None);

    let plan = pipeline.generate("open terminal").await;

    assert_eq!(plan.source, PlanSource::Fallback);
    assert_eq!(plan.description, "Opening terminal");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_model_plan_parsed_and_conversation_persisted() {
    let backend = ScriptedBackend::new(vec![Ok(
        r#"{"plan": [{"action": "key", "key": "Super_L"}, {"action": "type", "text": "files"}], "description": "Opening the file manager", "estimated_time": 3}"#
            .to_string(),
    )]);
    let pipeline = pipeline_with(Some(backend.clone()), None);

    let plan = pipeline.generate("show me my files").await;

    assert_eq!(plan.source, PlanSource::Model);
    assert_eq!(plan.steps.len(), 2);
    assert_eq!(plan.estimated_time, 3.0);
    // The exchange was appended to the conversation.
    assert_eq!(pipeline.context_summary().message_count, 2);
}

#[tokio::test]
async fn test_fenced_model_output_is_recovered() {
    let backend = ScriptedBackend::new(vec![Ok(
        "```json\n{\"description\": \"fenced answer\"}\n```".to_string()
    )]);
    let pipeline = pipeline_with(Some(backend), None);

    let plan = pipeline.generate("describe yourself").await;
    assert_eq!(plan.description, "fenced answer");
}

#[tokio::test]
async fn test_prose_model_output_becomes_conversational_answer() {
    let backend = ScriptedBackend::new(vec![Ok("Just plain words, no JSON.".to_string())]);
    let pipeline = pipeline_with(Some(backend), None);

    let plan = pipeline.generate("tell me something").await;
    assert_eq!(plan.description, "Just plain words, no JSON.");
    assert!(plan.steps.is_empty());
    assert!(!plan.is_error());
}

#[tokio::test]
async fn test_compound_request_is_annotated_for_decomposition() {
    let backend = ScriptedBackend::new(vec![Ok(r#"{"description": "ok"}"#.to_string())]);
    let pipeline = pipeline_with(Some(backend.clone()), None);

    pipeline.generate("download and install zoom").await;

    let last = backend.last_messages();
    let user_message = &last.last().unwrap().content;
    assert!(user_message.contains("download and install zoom"));
    assert!(user_message.contains("explicit ordered steps"));
}

#[tokio::test]
async fn test_simple_request_is_not_annotated() {
    let backend = ScriptedBackend::new(vec![Ok(r#"{"description": "ok"}"#.to_string())]);
    let pipeline = pipeline_with(Some(backend.clone()), None);

    pipeline.generate("summarize my day").await;

    let user_message = backend.last_messages().last().unwrap().content.clone();
    assert_eq!(user_message, "summarize my day");
}

#[tokio::test]
async fn test_fallback_results_are_not_cached() {
    // First call fails over to the rule planner; once the gateway
    // recovers, the same request must reach it.
    let backend = ScriptedBackend::new(vec![
        Err(GatewayError::Exhausted { attempts: vec![] }),
        Ok(r#"{"description": "model is back"}"#.to_string()),
    ]);
    let pipeline = pipeline_with(Some(backend.clone()), None);

    let first = pipeline.generate("open files").await;
    let second = pipeline.generate("open files").await;

    assert_eq!(first.source, PlanSource::Fallback);
    assert_eq!(second.description, "model is back");
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_dangerous_plan_is_rejected_and_never_executed() {
    let backend = ScriptedBackend::new(vec![Ok(
        r#"{"plan": [{"action": "key", "key": "Super_L"}, {"action": "type", "text": "xterm -e 'rm -rf /'"}], "description": "Wiping the disk", "estimated_time": 2}"#
            .to_string(),
    )]);
    let (service, driver) = service_with(Some(backend));

    let result = service.process_request("wipe my disk").await;

    assert_eq!(result["success"], false);
    assert_eq!(result["error"], "Plan rejected by validators");
    assert!(driver.invocations().is_empty());
}

#[tokio::test]
async fn test_rejected_plan_cannot_be_executed_directly() {
    let (service, driver) = service_with(None);
    let plan = Plan::with_steps(
        "nasty",
        vec![StepOp::Type {
            text: "rm -rf /home".to_string(),
        }
        .into()],
        1.0,
    );

    let report = service.execute_plan(&plan).await;

    assert!(!report.success);
    assert!(driver.invocations().is_empty());
}

#[tokio::test]
async fn test_approved_plan_executes_through_the_driver() {
    let (service, driver) = service_with(None);
    let plan = Plan::with_steps(
        "type a word",
        vec![StepOp::Type {
            text: "hello".to_string(),
        }
        .into()],
        1.0,
    );

    let report = service.execute_plan(&plan).await;

    assert!(report.success);
    assert_eq!(driver.invocations().len(), 1);
}

#[tokio::test]
async fn test_error_plan_surfaces_as_structured_error() {
    let (service, driver) = service_with(None);
    let report = service.execute_plan(&Plan::from_error("bad upstream")).await;
    assert!(!report.success);
    assert!(driver.invocations().is_empty());
}

#[tokio::test]
async fn test_reset_gives_a_clean_slate() {
    let backend = ScriptedBackend::new(vec![
        Ok(r#"{"description": "answer one"}"#.to_string()),
        Ok(r#"{"description": "answer two"}"#.to_string()),
    ]);
    let (service, _driver) = service_with(Some(backend.clone()));

    service.process_request("remember this").await;
    assert_eq!(service.pipeline().context_summary().message_count, 2);

    service.reset();

    assert_eq!(service.pipeline().context_summary().message_count, 0);
    // The cache was dropped too: the same request hits the gateway again.
    let result = service.process_request("remember this").await;
    assert_eq!(result["description"], "answer two");
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_persona_switch_rejects_unknown_names() {
    let pipeline = pipeline_with(None, None);
    assert!(pipeline.set_personality("concise"));
    assert!(!pipeline.set_personality("pirate"));
}

#[tokio::test]
async fn test_empty_input_gets_a_text_answer() {
    let pipeline = pipeline_with(None, None);
    let plan = pipeline.generate("   ").await;
    assert!(plan.steps.is_empty());
    assert!(!plan.description.is_empty());
}

#[tokio::test]
async fn test_greeting_is_cached_for_instant_repeat() {
    let pipeline = pipeline_with(None, None);
    pipeline.generate("hello").await;
    assert_eq!(pipeline.cache_stats().size, 1);
}
