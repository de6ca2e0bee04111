//! Plan validator: two hard gates and one soft gate in fixed order.

use crate::efficiency::EfficiencyAdvisor;
use crate::judge::{Judge, JudgeBackend, ModelJudge, Verdict};
use crate::logic::LogicJudge;
use crate::safety::SafetyJudge;
use stagehand_core::Plan;
use std::sync::Arc;
use tracing::warn;

/// Result of a full validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub approved: bool,
    pub rejections: Vec<String>,
    pub advisories: Vec<String>,
}

/// Runs safety then logic (hard gates, each a judge list with heuristics
/// first), then the efficiency advisor (soft). Within a gate the first
/// rejection short-circuits the remaining judges, so a heuristic rejection
/// never invokes the model.
pub struct CommandValidator {
    safety: Vec<Box<dyn Judge>>,
    logic: Vec<Box<dyn Judge>>,
    efficiency: EfficiencyAdvisor,
}

impl CommandValidator {
    /// Heuristics only; the configuration every install starts from.
    pub fn heuristic_only() -> Self {
        Self {
            safety: vec![Box::new(SafetyJudge::default())],
            logic: vec![Box::new(LogicJudge)],
            efficiency: EfficiencyAdvisor::default(),
        }
    }

    /// Heuristics plus a model consulted after they pass.
    pub fn with_model(backend: Arc<dyn JudgeBackend>) -> Self {
        Self {
            safety: vec![
                Box::new(SafetyJudge::default()),
                Box::new(ModelJudge::new("safety", backend.clone())),
            ],
            logic: vec![
                Box::new(LogicJudge),
                Box::new(ModelJudge::new("logic", backend)),
            ],
            efficiency: EfficiencyAdvisor::default(),
        }
    }

    /// True when every hard gate approves. The efficiency gate is consulted
    /// for its log output but cannot change the answer.
    pub fn approve_all(&self, plan: &Plan) -> bool {
        self.review(plan).approved
    }

    pub fn review(&self, plan: &Plan) -> ValidationReport {
        if let Some(error) = &plan.error {
            warn!("rejecting plan carrying an error marker: {}", error);
            return ValidationReport {
                approved: false,
                rejections: vec![format!("plan carries an error marker: {}", error)],
                advisories: Vec::new(),
            };
        }

        for gate in [&self.safety, &self.logic] {
            for judge in gate {
                if let Verdict::Rejected { reason } = judge.evaluate(plan) {
                    warn!("{} validation failed: {}", judge.name(), reason);
                    return ValidationReport {
                        approved: false,
                        rejections: vec![format!("{}: {}", judge.name(), reason)],
                        advisories: Vec::new(),
                    };
                }
            }
        }

        ValidationReport {
            approved: true,
            rejections: Vec::new(),
            advisories: self.efficiency.advisories(plan),
        }
    }
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::heuristic_only()
    }
}
