//! Judge abstraction for plan validation.
//!
//! Each hard gate is a list of judges. The first judge is always a
//! heuristic; an optional model-backed judge runs only when the heuristics
//! passed.

use stagehand_core::Plan;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("judge backend error: {0}")]
    Backend(String),
}

/// Outcome of one judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected { reason: String },
}

impl Verdict {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Verdict::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }
}

pub trait Judge: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, plan: &Plan) -> Verdict;
}

/// A model a judge can consult: prompt in, free-text assessment out.
pub trait JudgeBackend: Send + Sync {
    fn assess(&self, prompt: &str) -> Result<String, PolicyError>;
}

/// Words in a model assessment that count as a refusal.
const REFUSAL_KEYWORDS: &[&str] = &["reject", "unsafe", "denied", "refuse", "not allowed"];

/// Model-backed judge for one gate. Any response containing a refusal
/// keyword rejects; a failed backend never blocks (the heuristics already
/// passed by the time this judge runs).
pub struct ModelJudge {
    gate: &'static str,
    backend: Arc<dyn JudgeBackend>,
}

impl ModelJudge {
    pub fn new(gate: &'static str, backend: Arc<dyn JudgeBackend>) -> Self {
        Self { gate, backend }
    }

    fn prompt_for(&self, plan: &Plan) -> String {
        let plan_json =
            serde_json::to_string(plan).unwrap_or_else(|_| plan.description.clone());
        format!(
            "Review this GUI automation plan for {} problems. \
             Respond with APPROVE if it is acceptable, or REJECT with a short reason.\n\nPlan: {}",
            self.gate, plan_json
        )
    }
}

impl Judge for ModelJudge {
    fn name(&self) -> &str {
        self.gate
    }

    fn evaluate(&self, plan: &Plan) -> Verdict {
        let response = match self.backend.assess(&self.prompt_for(plan)) {
            Ok(response) => response,
            Err(e) => {
                warn!("{} model judge unavailable: {}", self.gate, e);
                return Verdict::Approved;
            }
        };

        let lowered = response.to_lowercase();
        for keyword in REFUSAL_KEYWORDS {
            if lowered.contains(keyword) {
                return Verdict::rejected(format!(
                    "{} model flagged the plan: {}",
                    self.gate,
                    response.trim()
                ));
            }
        }
        Verdict::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBackend(&'static str);

    impl JudgeBackend for FixedBackend {
        fn assess(&self, _prompt: &str) -> Result<String, PolicyError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingBackend;

    impl JudgeBackend for FailingBackend {
        fn assess(&self, _prompt: &str) -> Result<String, PolicyError> {
            Err(PolicyError::Backend("model not loaded".to_string()))
        }
    }

    #[test]
    fn test_refusal_keyword_rejects() {
        let judge = ModelJudge::new("safety", Arc::new(FixedBackend("REJECT: wipes the disk")));
        let verdict = judge.evaluate(&Plan::answer("test"));
        assert!(!verdict.is_approved());
    }

    #[test]
    fn test_approval_passes() {
        let judge = ModelJudge::new("safety", Arc::new(FixedBackend("APPROVE, looks fine")));
        assert!(judge.evaluate(&Plan::answer("test")).is_approved());
    }

    #[test]
    fn test_backend_failure_does_not_block() {
        let judge = ModelJudge::new("logic", Arc::new(FailingBackend));
        assert!(judge.evaluate(&Plan::answer("test")).is_approved());
    }

    #[test]
    fn test_refusal_is_case_insensitive() {
        let judge = ModelJudge::new("safety", Arc::new(FixedBackend("this is UNSAFE")));
        assert!(!judge.evaluate(&Plan::answer("test")).is_approved());
    }
}
