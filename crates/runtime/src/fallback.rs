//! Deterministic rule-based planner, used when no gateway is available or
//! every provider failed.

use stagehand_core::{Plan, PlanStep, StepOp};
use tracing::info;

const LAUNCHER_KEY: &str = "Super_L";
const BROWSER: &str = "firefox";

/// Synthesize a plan from verb prefixes alone. Unrecognized free text gets
/// a text-only help response, never an empty plan.
pub fn rule_based_plan(input: &str) -> Plan {
    let trimmed = input.trim();
    let lowered = trimmed.to_lowercase();

    if let Some(app) = strip_prefix_ci(trimmed, "open ") {
        info!("fallback planner: open '{}'", app);
        return Plan::fallback(
            format!("Opening {}", app),
            launcher_steps(app),
            4.0,
        );
    }

    if let Some(query) = strip_prefix_ci(trimmed, "search ") {
        info!("fallback planner: search '{}'", query);
        let url = format!(
            "https://duckduckgo.com/?q={}",
            query.trim().replace(' ', "+")
        );
        return Plan::fallback(
            format!("Searching the web for {}", query),
            browse_steps(&url),
            9.0,
        );
    }

    if let Some(target) = strip_prefix_ci(trimmed, "go to ") {
        info!("fallback planner: go to '{}'", target);
        let target = target.trim();
        let url = if target.contains("://") {
            target.to_string()
        } else {
            format!("https://{}", target)
        };
        return Plan::fallback(format!("Navigating to {}", target), browse_steps(&url), 9.0);
    }

    if lowered.starts_with("close") {
        info!("fallback planner: close active window");
        return Plan::fallback(
            "Closing the active window",
            vec![PlanStep::new(StepOp::KeyCombo {
                combo: "alt+F4".to_string(),
            })],
            1.0,
        );
    }

    if lowered.starts_with("screenshot") {
        info!("fallback planner: screenshot");
        return Plan::fallback(
            "Taking a screenshot",
            vec![PlanStep::new(StepOp::Screenshot {
                filename: "screenshot.png".to_string(),
            })],
            1.0,
        );
    }

    if let Some(text) = strip_prefix_ci(trimmed, "type ") {
        info!("fallback planner: type text");
        return Plan::fallback(
            "Typing the requested text",
            vec![PlanStep::new(StepOp::Type {
                text: text.to_string(),
            })],
            1.0,
        );
    }

    info!("fallback planner: no rule matched, returning help text");
    Plan::fallback(
        "I couldn't reach the language model. I can still handle simple commands: \
         open <app>, search <query>, go to <url>, close, screenshot, type <text>.",
        Vec::new(),
        0.0,
    )
}

/// Launcher-driven app start: launcher key, app name, Return.
fn launcher_steps(app: &str) -> Vec<PlanStep> {
    vec![
        PlanStep::new(StepOp::Key {
            key: LAUNCHER_KEY.to_string(),
        }),
        PlanStep::new(StepOp::Type {
            text: app.trim().to_string(),
        }),
        PlanStep::new(StepOp::Key {
            key: "Return".to_string(),
        }),
        PlanStep::new(StepOp::Wait { seconds: 2.0 }),
    ]
}

/// Open the browser, focus the address bar, navigate.
fn browse_steps(url: &str) -> Vec<PlanStep> {
    let mut steps = launcher_steps(BROWSER);
    steps.extend([
        PlanStep::new(StepOp::KeyCombo {
            combo: "ctrl+l".to_string(),
        }),
        PlanStep::new(StepOp::Type {
            text: url.to_string(),
        }),
        PlanStep::new(StepOp::Key {
            key: "Return".to_string(),
        }),
    ]);
    steps
}

fn strip_prefix_ci<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    if input.len() >= prefix.len() && input[..prefix.len()].eq_ignore_ascii_case(prefix) {
        let rest = input[prefix.len()..].trim();
        if !rest.is_empty() {
            return Some(rest);
        }
    }
    None
}
