//! Structural sanity gate.

use crate::judge::{Judge, Verdict};
use stagehand_core::{Plan, StepOp};

/// Per-step structural checks: waits are non-negative and finite, typed
/// text is non-empty, clicks have somewhere to land, multiclicks click at
/// least once.
pub struct LogicJudge;

impl Judge for LogicJudge {
    fn name(&self) -> &str {
        "logic"
    }

    fn evaluate(&self, plan: &Plan) -> Verdict {
        let mut pointer_seen = false;

        for (i, step) in plan.steps.iter().enumerate() {
            match &step.op {
                StepOp::Pointer { .. } => pointer_seen = true,
                StepOp::Wait { seconds } => {
                    if !seconds.is_finite() || *seconds < 0.0 {
                        return Verdict::rejected(format!(
                            "step {}: wait of {} seconds is invalid",
                            i + 1,
                            seconds
                        ));
                    }
                }
                StepOp::Type { text } => {
                    if text.is_empty() {
                        return Verdict::rejected(format!("step {}: type step has no text", i + 1));
                    }
                }
                StepOp::Click { location, .. } => {
                    // A click needs an explicit location or a preceding
                    // pointer move to land on.
                    if location.is_none() && !pointer_seen {
                        return Verdict::rejected(format!(
                            "step {}: click has no location and no prior pointer step",
                            i + 1
                        ));
                    }
                }
                StepOp::MultiClick { count, .. } => {
                    if *count == 0 {
                        return Verdict::rejected(format!(
                            "step {}: multiclick with count 0",
                            i + 1
                        ));
                    }
                }
                _ => {}
            }
        }

        Verdict::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::PlanStep;

    fn plan(steps: Vec<StepOp>) -> Plan {
        Plan::with_steps("test", steps.into_iter().map(PlanStep::new).collect(), 1.0)
    }

    #[test]
    fn test_negative_wait_rejected() {
        let judge = LogicJudge;
        assert!(!judge.evaluate(&plan(vec![StepOp::Wait { seconds: -1.0 }])).is_approved());
    }

    #[test]
    fn test_nan_wait_rejected() {
        let judge = LogicJudge;
        assert!(!judge
            .evaluate(&plan(vec![StepOp::Wait { seconds: f64::NAN }]))
            .is_approved());
    }

    #[test]
    fn test_zero_wait_allowed() {
        let judge = LogicJudge;
        assert!(judge.evaluate(&plan(vec![StepOp::Wait { seconds: 0.0 }])).is_approved());
    }

    #[test]
    fn test_empty_type_text_rejected() {
        let judge = LogicJudge;
        assert!(!judge
            .evaluate(&plan(vec![StepOp::Type {
                text: String::new()
            }]))
            .is_approved());
    }

    #[test]
    fn test_click_with_location_approved() {
        let judge = LogicJudge;
        assert!(judge
            .evaluate(&plan(vec![StepOp::Click {
                button: Default::default(),
                mode: Default::default(),
                location: Some([10, 10]),
            }]))
            .is_approved());
    }

    #[test]
    fn test_bare_click_without_pointer_rejected() {
        let judge = LogicJudge;
        assert!(!judge
            .evaluate(&plan(vec![StepOp::Click {
                button: Default::default(),
                mode: Default::default(),
                location: None,
            }]))
            .is_approved());
    }

    #[test]
    fn test_click_after_pointer_approved() {
        let judge = LogicJudge;
        assert!(judge
            .evaluate(&plan(vec![
                StepOp::Pointer { x: 100, y: 100 },
                StepOp::Click {
                    button: Default::default(),
                    mode: Default::default(),
                    location: None,
                },
            ]))
            .is_approved());
    }

    #[test]
    fn test_zero_count_multiclick_rejected() {
        let judge = LogicJudge;
        assert!(!judge
            .evaluate(&plan(vec![StepOp::MultiClick {
                x: 1,
                y: 1,
                count: 0,
                delay: 0.1,
            }]))
            .is_approved());
    }
}
