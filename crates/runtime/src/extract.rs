//! Model output → plan extraction ladder.
//!
//! Strip markdown fences, try a direct parse, then a brace-matched
//! substring, and finally wrap the raw text as a conversational answer.
//! Malformed output is recovered here; it never crosses the pipeline
//! boundary as an error.

use stagehand_core::Plan;
use tracing::debug;

/// Turn raw model output into a plan, no matter what came back.
pub fn extract_plan(raw: &str) -> Plan {
    let cleaned = strip_fences(raw.trim());

    if let Some(plan) = parse_object(cleaned) {
        return plan;
    }

    if let Some(block) = balanced_object(cleaned) {
        if let Some(plan) = parse_object(block) {
            debug!("plan recovered from embedded JSON block");
            return plan;
        }
    }

    debug!("model output was not a plan, wrapping as conversational text");
    Plan::answer(raw.trim())
}

fn parse_object(text: &str) -> Option<Plan> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Remove a surrounding markdown code fence, with or without a language
/// tag.
fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the fence line itself ("```json" or bare "```").
    let body = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };
    body.rsplit_once("```").map(|(body, _)| body).unwrap_or(body).trim()
}

/// First balanced `{...}` block, honoring strings and escapes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use stagehand_core::{PlanSource, StepOp};

    #[test]
    fn test_direct_json_plan() {
        let raw = r#"{"plan": [{"action": "type", "text": "hi"}], "description": "Typing", "estimated_time": 1}"#;
        let plan = extract_plan(raw);
        assert_eq!(plan.description, "Typing");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.source, PlanSource::Model);
    }

    #[test]
    fn test_description_only_answer() {
        let plan = extract_plan(r#"{"description": "The capital of France is Paris."}"#);
        assert_eq!(plan.description, "The capital of France is Paris.");
        assert!(plan.steps.is_empty());
    }

    #[test]
    fn test_fenced_json_with_language_tag() {
        let raw = "```json\n{\"description\": \"fenced\"}\n```";
        assert_eq!(extract_plan(raw).description, "fenced");
    }

    #[test]
    fn test_fenced_json_without_language_tag() {
        let raw = "```\n{\"description\": \"fenced\"}\n```";
        assert_eq!(extract_plan(raw).description, "fenced");
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let raw = "Sure! Here's the plan you asked for:\n{\"description\": \"embedded\", \"plan\": [{\"action\": \"key\", \"key\": \"Return\"}]}\nLet me know how it goes.";
        let plan = extract_plan(raw);
        assert_eq!(plan.description, "embedded");
        assert!(matches!(&plan.steps[0].op, StepOp::Key { key } if key == "Return"));
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_matcher() {
        let raw = r#"note: {"description": "use {braces} and \"quotes\" freely"}"#;
        let plan = extract_plan(raw);
        assert!(plan.description.contains("{braces}"));
    }

    #[test]
    fn test_plain_text_wrapped_as_answer() {
        let plan = extract_plan("I can't produce a plan for that, sorry.");
        assert_eq!(plan.description, "I can't produce a plan for that, sorry.");
        assert!(plan.steps.is_empty());
        assert!(!plan.is_error());
    }

    #[test]
    fn test_non_object_json_wrapped_as_answer() {
        let plan = extract_plan("42");
        assert_eq!(plan.description, "42");
    }

    #[test]
    fn test_malformed_json_wrapped_as_answer() {
        let raw = r#"{"description": "unterminated"#;
        let plan = extract_plan(raw);
        assert!(plan.description.contains("unterminated"));
        assert!(!plan.is_error());
    }

    #[test]
    fn test_unknown_action_in_plan_wraps_as_text() {
        // A structurally valid object whose steps fail to deserialize is
        // still recovered as conversation, never an error.
        let raw = r#"{"plan": [{"action": "teleport"}], "description": "nope"}"#;
        let plan = extract_plan(raw);
        assert!(plan.steps.is_empty());
        assert_eq!(plan.description, raw);
    }
}
