//! Local answers for queries that never need a model round trip.

use crate::eval;
use stagehand_core::Plan;
use tracing::debug;

/// Canned responses for greetings and small talk, matched on the
/// normalized query.
const GREETINGS: &[(&str, &str)] = &[
    ("hello", "Hello! What would you like me to do?"),
    ("hi", "Hi! What would you like me to do?"),
    ("hey", "Hey! What can I do for you?"),
    ("good morning", "Good morning! What can I do for you?"),
    ("good evening", "Good evening! What can I do for you?"),
    ("how are you", "Running smoothly. What can I do for you?"),
    ("thanks", "You're welcome!"),
    ("thank you", "You're welcome!"),
    (
        "who are you",
        "I'm Stagehand. Describe what you want done on this computer and I'll plan the steps.",
    ),
    (
        "what can you do",
        "I can open applications, search the web, type for you, and automate other desktop tasks. Just describe what you need.",
    ),
];

/// True when the input is handled entirely locally.
pub fn is_simple_query(input: &str) -> bool {
    let normalized = normalize(input);
    GREETINGS.iter().any(|(key, _)| *key == normalized)
        || eval::looks_like_arithmetic(input)
}

/// Answer a greeting or arithmetic query without touching the gateway.
/// Returns `None` when the query needs the rest of the pipeline.
pub fn handle_simple_query(input: &str) -> Option<Plan> {
    let normalized = normalize(input);

    if let Some((_, reply)) = GREETINGS.iter().find(|(key, _)| *key == normalized) {
        debug!("simple query matched greeting: {}", normalized);
        return Some(Plan::system_answer(*reply));
    }

    if eval::looks_like_arithmetic(input) {
        // Whitelist passed; if the expression still fails to parse, let
        // the model have a go instead of surfacing a local error.
        let trimmed = input.trim();
        match eval::evaluate(trimmed) {
            Ok(value) => {
                let answer = format!("{} = {}", trimmed, eval::format_number(value));
                debug!("simple query evaluated arithmetic: {}", answer);
                return Some(Plan::system_answer(answer));
            }
            Err(e) => {
                debug!("arithmetic candidate failed to evaluate: {}", e);
                return None;
            }
        }
    }

    None
}

/// Compound-task detector: phrases that signal a request needing explicit
/// multi-step decomposition. The flag only augments the model request; it
/// never blocks it.
pub fn needs_step_decomposition(input: &str) -> bool {
    const COMPOUND_MARKERS: &[&str] = &[
        "and then",
        " then ",
        "after that",
        "download and",
        "install and",
        "and install",
        "and run",
        "and open",
        "followed by",
        "step by step",
    ];

    let lowered = input.to_lowercase();
    COMPOUND_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn normalize(input: &str) -> String {
    input
        .trim()
        .trim_end_matches(['!', '?', '.'])
        .to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use stagehand_core::PlanSource;

    #[test]
    fn test_arithmetic_is_simple() {
        assert!(is_simple_query("5*5"));
        assert!(is_simple_query("(2+3)/4"));
    }

    #[test]
    fn test_greeting_is_simple() {
        assert!(is_simple_query("hello"));
        assert!(is_simple_query("Hello!"));
        assert!(is_simple_query("  thanks  "));
    }

    #[test]
    fn test_tasks_are_not_simple() {
        assert!(!is_simple_query("open firefox"));
        assert!(!is_simple_query("search for rust tutorials"));
    }

    #[test]
    fn test_arithmetic_answer_shape() {
        let plan = handle_simple_query("5*5").unwrap();
        assert_eq!(plan.description, "5*5 = 25");
        assert_eq!(plan.source, PlanSource::SystemQuery);
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn test_division_result_keeps_fraction() {
        let plan = handle_simple_query("10/4").unwrap();
        assert_eq!(plan.description, "10/4 = 2.5");
    }

    #[test]
    fn test_greeting_answer() {
        let plan = handle_simple_query("hello").unwrap();
        assert_eq!(plan.source, PlanSource::SystemQuery);
        assert!(plan.description.contains("What would you like"));
    }

    #[test]
    fn test_unevaluable_candidate_falls_through() {
        assert!(handle_simple_query("((( ").is_none());
        assert!(handle_simple_query("1/0").is_none());
    }

    #[test]
    fn test_non_simple_returns_none() {
        assert!(handle_simple_query("open a terminal").is_none());
    }

    #[test]
    fn test_step_decomposition_detection() {
        assert!(needs_step_decomposition("download and run a program"));
        assert!(needs_step_decomposition("open firefox and then check my mail"));
        assert!(needs_step_decomposition("install and configure docker"));
        assert!(!needs_step_decomposition("open firefox"));
        assert!(!needs_step_decomposition("5*5"));
    }
}
