//! Service facade: generation, validation and execution behind one
//! dependency-injected object.

use crate::metrics;
use crate::pipeline::RequestPipeline;
use serde_json::json;
use stagehand_core::Plan;
use stagehand_executor::{ExecutionReport, Executor};
use stagehand_policy::CommandValidator;
use tracing::info;

/// One constructed instance serves every request; there are no module
/// globals. `reset` gives tests and the transport a clean slate.
pub struct AgentService {
    pipeline: RequestPipeline,
    validator: CommandValidator,
    executor: Executor,
}

impl AgentService {
    pub fn new(pipeline: RequestPipeline, validator: CommandValidator, executor: Executor) -> Self {
        Self {
            pipeline,
            validator,
            executor,
        }
    }

    /// Generate and validate a plan for one request. The result is always
    /// a JSON-serializable object: the plan itself, or a structured
    /// rejection carrying the reasons and the offending plan.
    pub async fn process_request(&self, input: &str) -> serde_json::Value {
        info!("processing request: {}", input.trim());
        let plan = self.pipeline.generate(input).await;

        if plan.is_error() {
            return plan_to_value(&plan);
        }

        let report = self.validator.review(&plan);
        if !report.approved {
            metrics::increment_validation_rejected();
            return json!({
                "success": false,
                "error": "Plan rejected by validators",
                "rejections": report.rejections,
                "plan": plan_to_value(&plan),
            });
        }

        plan_to_value(&plan)
    }

    /// Execute a previously approved plan. The validator runs again here:
    /// execution may be requested out-of-band, and an error-marked or
    /// unsafe plan must never reach the driver.
    pub async fn execute_plan(&self, plan: &Plan) -> ExecutionReport {
        if !self.validator.approve_all(plan) {
            metrics::increment_validation_rejected();
            return ExecutionReport {
                success: false,
                error: Some("Plan rejected by validators".to_string()),
                failed_step: None,
                completed: 0,
            };
        }
        self.executor.execute(plan).await
    }

    /// Generate a plan without validation, for callers that present plans
    /// for user approval before execution.
    pub async fn generate_plan(&self, input: &str) -> Plan {
        self.pipeline.generate(input).await
    }

    /// Drop all conversation and cache state.
    pub fn reset(&self) {
        self.pipeline.reset();
        info!("agent service reset");
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }
}

fn plan_to_value(plan: &Plan) -> serde_json::Value {
    serde_json::to_value(plan)
        .unwrap_or_else(|e| json!({"error": format!("failed to serialize plan: {}", e)}))
}
