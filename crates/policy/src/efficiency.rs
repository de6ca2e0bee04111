//! Soft efficiency gate: observes, never rejects.

use stagehand_core::{Plan, StepOp};
use tracing::info;

pub struct EfficiencyAdvisor {
    /// Advisory threshold on summed wait time.
    pub max_total_wait: f64,
    /// Advisory threshold on step count.
    pub max_steps: usize,
}

impl Default for EfficiencyAdvisor {
    fn default() -> Self {
        Self {
            max_total_wait: 30.0,
            max_steps: 25,
        }
    }
}

impl EfficiencyAdvisor {
    /// Collect advisory observations for a plan. This gate cannot cause
    /// rejection; callers log and move on.
    pub fn advisories(&self, plan: &Plan) -> Vec<String> {
        let mut notes = Vec::new();

        let total_wait: f64 = plan
            .steps
            .iter()
            .map(|step| match step.op {
                StepOp::Wait { seconds } if seconds > 0.0 => seconds,
                _ => 0.0,
            })
            .sum();

        if total_wait > self.max_total_wait {
            notes.push(format!(
                "plan spends {:.1}s waiting (advisory threshold {:.1}s)",
                total_wait, self.max_total_wait
            ));
        }

        if plan.steps.len() > self.max_steps {
            notes.push(format!(
                "plan has {} steps (advisory threshold {})",
                plan.steps.len(),
                self.max_steps
            ));
        }

        for note in &notes {
            info!("efficiency: {}", note);
        }
        notes
    }
}
