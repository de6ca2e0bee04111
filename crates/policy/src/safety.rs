//! Heuristic safety gate: substring blacklist over typed text and key
//! combos.

use crate::judge::{Judge, Verdict};
use stagehand_core::{Plan, StepOp};

/// Known-destructive fragments. Matching is case-insensitive substring
/// search over every `type` step's text and every key/combo name.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "rm -rf",
    "mkfs",
    "dd if=",
    ":(){ :|:& };:",
    "chmod 777 /",
    "> /dev/sda",
];

pub struct SafetyJudge {
    blacklist: Vec<String>,
}

impl SafetyJudge {
    pub fn new(blacklist: Vec<String>) -> Self {
        Self {
            blacklist: blacklist.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    pub fn add_pattern(&mut self, pattern: &str) {
        self.blacklist.push(pattern.to_lowercase());
    }

    fn blocked_in(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.blacklist
            .iter()
            .find(|pattern| lowered.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

impl Default for SafetyJudge {
    fn default() -> Self {
        Self::new(DEFAULT_BLACKLIST.iter().map(|p| p.to_string()).collect())
    }
}

impl Judge for SafetyJudge {
    fn name(&self) -> &str {
        "safety"
    }

    fn evaluate(&self, plan: &Plan) -> Verdict {
        for (i, step) in plan.steps.iter().enumerate() {
            let candidate = match &step.op {
                StepOp::Type { text } => Some(text.as_str()),
                StepOp::Key { key } => Some(key.as_str()),
                StepOp::KeyCombo { combo } => Some(combo.as_str()),
                _ => None,
            };
            if let Some(text) = candidate {
                if let Some(pattern) = self.blocked_in(text) {
                    return Verdict::rejected(format!(
                        "step {} ({}) contains blocked pattern '{}'",
                        i + 1,
                        step.verb(),
                        pattern
                    ));
                }
            }
        }
        Verdict::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::PlanStep;

    fn type_plan(text: &str) -> Plan {
        Plan::with_steps(
            "test",
            vec![PlanStep::new(StepOp::Type {
                text: text.to_string(),
            })],
            1.0,
        )
    }

    #[test]
    fn test_blocked_type_text_rejected() {
        let judge = SafetyJudge::default();
        assert!(!judge.evaluate(&type_plan("rm -rf /")).is_approved());
        assert!(!judge.evaluate(&type_plan("dd if=/dev/zero of=/dev/sda")).is_approved());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let judge = SafetyJudge::default();
        assert!(!judge.evaluate(&type_plan("RM -RF /home")).is_approved());
    }

    #[test]
    fn test_benign_text_approved() {
        let judge = SafetyJudge::default();
        assert!(judge.evaluate(&type_plan("hello world")).is_approved());
    }

    #[test]
    fn test_keycombo_is_screened() {
        let judge = SafetyJudge::default();
        let plan = Plan::with_steps(
            "test",
            vec![PlanStep::new(StepOp::KeyCombo {
                combo: "rm -rf".to_string(),
            })],
            1.0,
        );
        assert!(!judge.evaluate(&plan).is_approved());
    }

    #[test]
    fn test_fork_bomb_rejected() {
        let judge = SafetyJudge::default();
        assert!(!judge.evaluate(&type_plan(":(){ :|:& };:")).is_approved());
    }

    #[test]
    fn test_custom_pattern() {
        let mut judge = SafetyJudge::default();
        judge.add_pattern("shutdown now");
        assert!(!judge.evaluate(&type_plan("sudo Shutdown NOW")).is_approved());
    }

    #[test]
    fn test_empty_plan_approved() {
        let judge = SafetyJudge::default();
        assert!(judge.evaluate(&Plan::answer("just text")).is_approved());
    }
}
