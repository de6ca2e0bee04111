//! Plan executor: strict order, halt on first failure, never panics.

use crate::driver::{DriverError, InputDriver};
use serde::Serialize;
use stagehand_core::{Plan, PlanStep, StepOp};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Outcome of one plan execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<PlanStep>,
    /// Steps that ran to completion before the run ended.
    pub completed: usize,
}

impl ExecutionReport {
    fn success(completed: usize) -> Self {
        Self {
            success: true,
            error: None,
            failed_step: None,
            completed,
        }
    }

    fn failure(error: String, failed_step: PlanStep, completed: usize) -> Self {
        Self {
            success: false,
            error: Some(error),
            failed_step: Some(failed_step),
            completed,
        }
    }
}

pub struct Executor {
    driver: Arc<dyn InputDriver>,
    /// Bound on a single driver call. `wait` steps are exempt: their
    /// duration is the point.
    step_timeout: Duration,
}

impl Executor {
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        Self {
            driver,
            step_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_step_timeout(driver: Arc<dyn InputDriver>, step_timeout: Duration) -> Self {
        Self {
            driver,
            step_timeout,
        }
    }

    /// Execute a plan's steps strictly in order.
    ///
    /// An error-marked plan is rejected without side effects. An empty
    /// step sequence succeeds trivially. The first failing step stops the
    /// run and is attached to the report; no rollback, no retry. Steps
    /// with no injection mapping are logged and skipped.
    pub async fn execute(&self, plan: &Plan) -> ExecutionReport {
        if let Some(plan_error) = &plan.error {
            return ExecutionReport {
                success: false,
                error: Some(plan_error.clone()),
                failed_step: None,
                completed: 0,
            };
        }

        if plan.steps.is_empty() {
            return ExecutionReport::success(0);
        }

        info!("executing plan: {}", plan.description);
        let mut completed = 0;

        for (i, step) in plan.steps.iter().enumerate() {
            match self.execute_step(step).await {
                Ok(ran) => {
                    if ran {
                        completed += 1;
                    }
                }
                Err(e) => {
                    error!(
                        "step {}/{} ({}) failed: {}",
                        i + 1,
                        plan.steps.len(),
                        step.verb(),
                        e
                    );
                    return ExecutionReport::failure(e.to_string(), step.clone(), completed);
                }
            }
        }

        ExecutionReport::success(completed)
    }

    /// Run one step. `Ok(false)` means the step had no injection mapping
    /// and was skipped.
    async fn execute_step(&self, step: &PlanStep) -> Result<bool, DriverError> {
        match &step.op {
            StepOp::Wait { seconds } => {
                if *seconds > 0.0 {
                    tokio::time::sleep(Duration::from_secs_f64(*seconds)).await;
                }
                return Ok(true);
            }
            StepOp::IfExists { .. } | StepOp::Loop { .. } | StepOp::Var { .. } => {
                warn!("step '{}' has no direct execution mapping, skipping", step.verb());
                return Ok(false);
            }
            _ => {}
        }

        let call = async {
            match &step.op {
                StepOp::Pointer { x, y } => self.driver.move_pointer(*x, *y).await,
                StepOp::Click {
                    button,
                    mode,
                    location,
                } => self.driver.click(*button, *mode, *location).await,
                StepOp::Type { text } => self.driver.type_text(text).await,
                StepOp::Key { key } => self.driver.press_key(key).await,
                StepOp::KeyCombo { combo } => self.driver.key_combo(combo).await,
                StepOp::Drag {
                    start,
                    end,
                    duration,
                } => self.driver.drag(*start, *end, *duration).await,
                StepOp::Scroll { x, y, amount } => self.driver.scroll(*x, *y, *amount).await,
                StepOp::Swipe {
                    start,
                    end,
                    duration,
                } => self.driver.swipe(*start, *end, *duration).await,
                StepOp::MultiClick { x, y, count, delay } => {
                    self.driver.multi_click(*x, *y, *count, *delay).await
                }
                StepOp::WaitFor { window, timeout } => {
                    self.driver.wait_for_window(window, *timeout).await
                }
                StepOp::Screenshot { filename } => self.driver.screenshot(filename).await,
                // Handled above.
                StepOp::Wait { .. }
                | StepOp::IfExists { .. }
                | StepOp::Loop { .. }
                | StepOp::Var { .. } => Ok(()),
            }
        };

        match timeout(self.step_timeout, call).await {
            Ok(result) => result.map(|_| true),
            Err(_) => Err(DriverError::Injection(format!(
                "step '{}' timed out after {:?}",
                step.verb(),
                self.step_timeout
            ))),
        }
    }
}
