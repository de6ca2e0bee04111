//! Line-oriented automation script parser and emitter.
//!
//! The script language is one verb per line (`pointer 200 200`,
//! `type "hello"`, `wait 1.5`). Empty lines and `#` comments are skipped.
//! Lines that match no verb are logged and dropped; a bad line never aborts
//! the rest of the parse.

use crate::types::{ClickMode, MouseButton, PlanStep, StepOp};
use tracing::warn;

/// Lazily scan script text, yielding one step per recognized line.
/// Recognized lines retain their source text so [`to_gcode`] can
/// reproduce them exactly.
pub fn parse_iter(text: &str) -> impl Iterator<Item = PlanStep> + '_ {
    text.lines().enumerate().filter_map(|(line_num, raw)| {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        match parse_line(line) {
            Some(op) => Some(PlanStep::with_source(op, line)),
            None => {
                warn!("could not parse line {}: {}", line_num + 1, line);
                None
            }
        }
    })
}

/// Parse script text into plan steps.
pub fn parse(text: &str) -> Vec<PlanStep> {
    parse_iter(text).collect()
}

/// Emit script text for a step sequence. Steps parsed from text reproduce
/// their original line; synthesized steps get canonical text.
pub fn to_gcode(steps: &[PlanStep]) -> String {
    steps
        .iter()
        .map(|step| match &step.source {
            Some(line) => line.clone(),
            None => canonical_line(&step.op),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_line(line: &str) -> Option<StepOp> {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    // Verb keyed through an exhaustive match; the extension opcodes
    // (ifexists / loop / var) sit behind the main verb table.
    match verb.to_ascii_lowercase().as_str() {
        "pointer" => parse_pointer(rest),
        "click" => parse_click(rest),
        "type" => quoted(rest).map(|(text, _)| StepOp::Type {
            text: text.to_string(),
        }),
        // Key names stay case-sensitive: the injection tool distinguishes
        // `Return` from `return`.
        "key" => rest.split_whitespace().next().map(|key| StepOp::Key {
            key: key.to_string(),
        }),
        "wait" => rest.parse::<f64>().ok().map(|seconds| StepOp::Wait { seconds }),
        "drag" => parse_drag(rest),
        "scroll" => parse_scroll(rest),
        "swipe" => parse_swipe(rest),
        "multiclick" => parse_multiclick(rest),
        "keycombo" => quoted(rest).map(|(combo, _)| StepOp::KeyCombo {
            combo: combo.to_string(),
        }),
        "waitfor" => parse_waitfor(rest),
        "screenshot" => quoted(rest).map(|(filename, _)| StepOp::Screenshot {
            filename: filename.to_string(),
        }),
        "ifexists" => parse_ifexists(rest),
        "loop" => parse_loop(rest),
        "var" => parse_var(rest),
        _ => None,
    }
}

fn parse_pointer(rest: &str) -> Option<StepOp> {
    let mut parts = rest.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some(StepOp::Pointer { x, y })
}

fn parse_click(rest: &str) -> Option<StepOp> {
    let mut parts = rest.split_whitespace();
    let button: u8 = parts.next()?.parse().ok()?;
    let button = MouseButton::try_from(button).ok()?;
    let mode = match parts.next()? {
        "s" | "S" => ClickMode::Single,
        "d" | "D" => ClickMode::Double,
        _ => return None,
    };
    Some(StepOp::Click {
        button,
        mode,
        location: None,
    })
}

fn parse_drag(rest: &str) -> Option<StepOp> {
    let mut parts = rest.split_whitespace();
    let x1 = parts.next()?.parse().ok()?;
    let y1 = parts.next()?.parse().ok()?;
    let x2 = parts.next()?.parse().ok()?;
    let y2 = parts.next()?.parse().ok()?;
    let duration = parts.next()?.parse().ok()?;
    Some(StepOp::Drag {
        start: [x1, y1],
        end: [x2, y2],
        duration,
    })
}

fn parse_scroll(rest: &str) -> Option<StepOp> {
    let mut parts = rest.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let amount = parts.next()?.parse().ok()?;
    Some(StepOp::Scroll { x, y, amount })
}

fn parse_swipe(rest: &str) -> Option<StepOp> {
    let mut parts = rest.split_whitespace();
    let x1 = parts.next()?.parse().ok()?;
    let y1 = parts.next()?.parse().ok()?;
    let x2 = parts.next()?.parse().ok()?;
    let y2 = parts.next()?.parse().ok()?;
    let duration = parts.next()?.parse().ok()?;
    Some(StepOp::Swipe {
        start: [x1, y1],
        end: [x2, y2],
        duration,
    })
}

fn parse_multiclick(rest: &str) -> Option<StepOp> {
    let mut parts = rest.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let count = parts.next()?.parse().ok()?;
    let delay = parts.next()?.parse().ok()?;
    Some(StepOp::MultiClick { x, y, count, delay })
}

fn parse_waitfor(rest: &str) -> Option<StepOp> {
    // waitfor window "Firefox" 10
    let rest = rest.strip_prefix("window")?.trim_start();
    let (window, after) = quoted(rest)?;
    let timeout = after.trim().split_whitespace().next()?.parse().ok()?;
    Some(StepOp::WaitFor {
        window: window.to_string(),
        timeout,
    })
}

fn parse_ifexists(rest: &str) -> Option<StepOp> {
    // ifexists "text" then action
    let (text, after) = quoted(rest)?;
    let then_action = after.trim_start().strip_prefix("then")?.trim();
    if then_action.is_empty() {
        return None;
    }
    Some(StepOp::IfExists {
        text: text.to_string(),
        then_action: then_action.to_string(),
    })
}

fn parse_loop(rest: &str) -> Option<StepOp> {
    // loop 3 { commands }
    let (count_str, after) = rest.split_once('{')?;
    let count = count_str.trim().parse().ok()?;
    let commands = after.rsplit_once('}')?.0.trim();
    Some(StepOp::Loop {
        count,
        commands: commands.to_string(),
    })
}

fn parse_var(rest: &str) -> Option<StepOp> {
    // var name = value
    let (name, value) = rest.split_once('=')?;
    let name = name.trim();
    let value = value.trim();
    if name.is_empty() || value.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }
    Some(StepOp::Var {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Extract the first double-quoted span, returning its contents and the
/// remainder of the line after the closing quote. No escape handling, same
/// as the script grammar.
fn quoted(rest: &str) -> Option<(&str, &str)> {
    let open = rest.find('"')?;
    let inner = &rest[open + 1..];
    let close = inner.find('"')?;
    Some((&inner[..close], &inner[close + 1..]))
}

fn canonical_line(op: &StepOp) -> String {
    match op {
        StepOp::Pointer { x, y } => format!("pointer {} {}", x, y),
        StepOp::Click { button, mode, .. } => {
            let mode = match mode {
                ClickMode::Single => 's',
                ClickMode::Double => 'd',
            };
            format!("click {} {}", u8::from(*button), mode)
        }
        StepOp::Type { text } => format!("type \"{}\"", text),
        StepOp::Key { key } => format!("key {}", key),
        StepOp::Wait { seconds } => format!("wait {}", seconds),
        StepOp::Drag {
            start,
            end,
            duration,
        } => format!(
            "drag {} {} {} {} {}",
            start[0], start[1], end[0], end[1], duration
        ),
        StepOp::Scroll { x, y, amount } => format!("scroll {} {} {}", x, y, amount),
        StepOp::Swipe {
            start,
            end,
            duration,
        } => format!(
            "swipe {} {} {} {} {}",
            start[0], start[1], end[0], end[1], duration
        ),
        StepOp::MultiClick { x, y, count, delay } => {
            format!("multiclick {} {} {} {}", x, y, count, delay)
        }
        StepOp::KeyCombo { combo } => format!("keycombo \"{}\"", combo),
        StepOp::WaitFor { window, timeout } => {
            format!("waitfor window \"{}\" {}", window, timeout)
        }
        StepOp::Screenshot { filename } => format!("screenshot \"{}\"", filename),
        StepOp::IfExists { text, then_action } => {
            format!("ifexists \"{}\" then {}", text, then_action)
        }
        StepOp::Loop { count, commands } => format!("loop {} {{ {} }}", count, commands),
        StepOp::Var { name, value } => format!("var {} = {}", name, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pointer_and_click() {
        let steps = parse("pointer 200 200\nclick 1 s");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].op, StepOp::Pointer { x: 200, y: 200 });
        assert_eq!(
            steps[1].op,
            StepOp::Click {
                button: MouseButton::Left,
                mode: ClickMode::Single,
                location: None,
            }
        );
    }

    #[test]
    fn test_parse_double_click_button_three() {
        let steps = parse("click 3 d");
        assert_eq!(
            steps[0].op,
            StepOp::Click {
                button: MouseButton::Right,
                mode: ClickMode::Double,
                location: None,
            }
        );
    }

    #[test]
    fn test_parse_type_preserves_case() {
        let steps = parse(r#"type "Hello World""#);
        assert_eq!(
            steps[0].op,
            StepOp::Type {
                text: "Hello World".to_string()
            }
        );
    }

    #[test]
    fn test_parse_key_preserves_case() {
        let steps = parse("key Return");
        assert_eq!(
            steps[0].op,
            StepOp::Key {
                key: "Return".to_string()
            }
        );
    }

    #[test]
    fn test_verb_is_case_insensitive() {
        let steps = parse("KEY Return\nWait 1.5");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].op, StepOp::Wait { seconds: 1.5 });
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let steps = parse("# setup\n\npointer 10 10\n   \n# done");
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_unknown_lines_skipped_not_fatal() {
        let steps = parse("frobnicate 1 2\npointer 10 10\nclick nine s");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].op, StepOp::Pointer { x: 10, y: 10 });
    }

    #[test]
    fn test_parse_drag_scroll_swipe() {
        let steps = parse("drag 0 0 100 100 0.5\nscroll 400 300 -3\nswipe 0 0 50 50 0.2");
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[1].op,
            StepOp::Scroll {
                x: 400,
                y: 300,
                amount: -3
            }
        );
    }

    #[test]
    fn test_parse_multiclick_and_keycombo() {
        let steps = parse("multiclick 50 60 3 0.1\nkeycombo \"Ctrl+Shift+T\"");
        assert_eq!(
            steps[0].op,
            StepOp::MultiClick {
                x: 50,
                y: 60,
                count: 3,
                delay: 0.1
            }
        );
        assert_eq!(
            steps[1].op,
            StepOp::KeyCombo {
                combo: "Ctrl+Shift+T".to_string()
            }
        );
    }

    #[test]
    fn test_parse_waitfor_and_screenshot() {
        let steps = parse("waitfor window \"Firefox\" 10\nscreenshot \"shot.png\"");
        assert_eq!(
            steps[0].op,
            StepOp::WaitFor {
                window: "Firefox".to_string(),
                timeout: 10
            }
        );
        assert_eq!(
            steps[1].op,
            StepOp::Screenshot {
                filename: "shot.png".to_string()
            }
        );
    }

    #[test]
    fn test_parse_extension_opcodes() {
        let steps = parse(
            "ifexists \"Save\" then click 1 s\nloop 3 { key Tab }\nvar target = firefox",
        );
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[0].op,
            StepOp::IfExists {
                text: "Save".to_string(),
                then_action: "click 1 s".to_string()
            }
        );
        assert_eq!(
            steps[1].op,
            StepOp::Loop {
                count: 3,
                commands: "key Tab".to_string()
            }
        );
        assert_eq!(
            steps[2].op,
            StepOp::Var {
                name: "target".to_string(),
                value: "firefox".to_string()
            }
        );
    }

    #[test]
    fn test_round_trip_is_lossless_for_recognized_input() {
        let text = "pointer 200 200\nclick 1 s\ntype \"hello\"\nkey Return\nwait 1.5\ndrag 0 0 100 100 0.5\nscroll 400 300 -3\nkeycombo \"Ctrl+L\"\nwaitfor window \"Firefox\" 10\nscreenshot \"out.png\"";
        let steps = parse(text);
        assert_eq!(to_gcode(&steps), text);
    }

    #[test]
    fn test_synthesized_steps_emit_canonical_text() {
        let steps = vec![
            PlanStep::new(StepOp::Pointer { x: 5, y: 9 }),
            PlanStep::new(StepOp::Type {
                text: "abc".to_string(),
            }),
        ];
        assert_eq!(to_gcode(&steps), "pointer 5 9\ntype \"abc\"");
    }
}
