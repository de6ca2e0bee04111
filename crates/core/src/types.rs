//! Shared data model: plan steps, plans, and the chat wire pair.

use serde::{Deserialize, Serialize};

/// Mouse button. Serialized as its numeric button index; accepted from
/// the wire as either an index or a name, since models write
/// `"button": "left"` while script text uses `click 1 s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ButtonRepr", into = "u8")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl Default for MouseButton {
    fn default() -> Self {
        MouseButton::Left
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ButtonRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<ButtonRepr> for MouseButton {
    type Error = String;

    fn try_from(repr: ButtonRepr) -> Result<Self, Self::Error> {
        match repr {
            ButtonRepr::Index(index) => MouseButton::try_from(index),
            ButtonRepr::Name(name) => match name.to_lowercase().as_str() {
                "left" => Ok(MouseButton::Left),
                "middle" => Ok(MouseButton::Middle),
                "right" => Ok(MouseButton::Right),
                other => Err(format!("invalid mouse button name: {}", other)),
            },
        }
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MouseButton::Left),
            2 => Ok(MouseButton::Middle),
            3 => Ok(MouseButton::Right),
            other => Err(format!("invalid mouse button index: {}", other)),
        }
    }
}

impl From<MouseButton> for u8 {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
        }
    }
}

/// Single vs. double click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickMode {
    Single,
    Double,
}

impl Default for ClickMode {
    fn default() -> Self {
        ClickMode::Single
    }
}

fn default_drag_duration() -> f64 {
    1.0
}

/// A single automation primitive. Every variant is self-describing: no step
/// depends on hidden cursor state carried between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum StepOp {
    Pointer {
        x: i32,
        y: i32,
    },
    Click {
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        mode: ClickMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<[i32; 2]>,
    },
    Type {
        text: String,
    },
    Key {
        key: String,
    },
    Wait {
        seconds: f64,
    },
    Drag {
        start: [i32; 2],
        end: [i32; 2],
        #[serde(default = "default_drag_duration")]
        duration: f64,
    },
    Scroll {
        x: i32,
        y: i32,
        amount: i32,
    },
    Swipe {
        start: [i32; 2],
        end: [i32; 2],
        duration: f64,
    },
    #[serde(rename = "multiclick")]
    MultiClick {
        x: i32,
        y: i32,
        count: u32,
        delay: f64,
    },
    #[serde(rename = "keycombo")]
    KeyCombo {
        combo: String,
    },
    #[serde(rename = "waitfor")]
    WaitFor {
        window: String,
        timeout: u64,
    },
    Screenshot {
        filename: String,
    },
    #[serde(rename = "ifexists")]
    IfExists {
        text: String,
        then_action: String,
    },
    Loop {
        count: u32,
        commands: String,
    },
    Var {
        name: String,
        value: String,
    },
}

impl StepOp {
    /// Verb name as it appears in the script language.
    pub fn verb(&self) -> &'static str {
        match self {
            StepOp::Pointer { .. } => "pointer",
            StepOp::Click { .. } => "click",
            StepOp::Type { .. } => "type",
            StepOp::Key { .. } => "key",
            StepOp::Wait { .. } => "wait",
            StepOp::Drag { .. } => "drag",
            StepOp::Scroll { .. } => "scroll",
            StepOp::Swipe { .. } => "swipe",
            StepOp::MultiClick { .. } => "multiclick",
            StepOp::KeyCombo { .. } => "keycombo",
            StepOp::WaitFor { .. } => "waitfor",
            StepOp::Screenshot { .. } => "screenshot",
            StepOp::IfExists { .. } => "ifexists",
            StepOp::Loop { .. } => "loop",
            StepOp::Var { .. } => "var",
        }
    }
}

/// A parsed step together with the source line it came from, when it came
/// from script text. The source is kept so emitting a plan back to script
/// form is lossless; it never travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(flatten)]
    pub op: StepOp,
    #[serde(skip)]
    pub source: Option<String>,
}

impl PlanStep {
    pub fn new(op: StepOp) -> Self {
        Self { op, source: None }
    }

    pub fn with_source(op: StepOp, source: impl Into<String>) -> Self {
        Self {
            op,
            source: Some(source.into()),
        }
    }

    pub fn verb(&self) -> &'static str {
        self.op.verb()
    }
}

impl From<StepOp> for PlanStep {
    fn from(op: StepOp) -> Self {
        PlanStep::new(op)
    }
}

/// Where a plan came from. At most one provenance applies by construction;
/// the error marker is tracked separately because it is terminal regardless
/// of origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    /// Produced by the inference gateway.
    Model,
    /// Answered locally: system/utility resolver or simple-query heuristics.
    SystemQuery,
    /// Produced by the deterministic rule-based planner.
    Fallback,
}

/// A direct answer or an ordered action sequence. Created once per request,
/// consumed by the validator and then the executor, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlanWire", into = "PlanWire")]
pub struct Plan {
    pub description: String,
    pub steps: Vec<PlanStep>,
    pub estimated_time: f64,
    pub source: PlanSource,
    pub error: Option<String>,
}

impl Plan {
    /// Text-only model answer with no actions.
    pub fn answer(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            steps: Vec::new(),
            estimated_time: 0.0,
            source: PlanSource::Model,
            error: None,
        }
    }

    /// Model-produced action plan.
    pub fn with_steps(
        description: impl Into<String>,
        steps: Vec<PlanStep>,
        estimated_time: f64,
    ) -> Self {
        Self {
            description: description.into(),
            steps,
            estimated_time,
            source: PlanSource::Model,
            error: None,
        }
    }

    /// Locally-resolved answer (system query or simple-query heuristics).
    pub fn system_answer(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            steps: Vec::new(),
            estimated_time: 0.0,
            source: PlanSource::SystemQuery,
            error: None,
        }
    }

    /// Rule-based fallback plan.
    pub fn fallback(
        description: impl Into<String>,
        steps: Vec<PlanStep>,
        estimated_time: f64,
    ) -> Self {
        Self {
            description: description.into(),
            steps,
            estimated_time,
            source: PlanSource::Fallback,
            error: None,
        }
    }

    /// Terminal error result. Never validated as approved, never executed.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            steps: Vec::new(),
            estimated_time: 0.0,
            source: PlanSource::Model,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Wire shape of a plan: the original flag-based format, with the
/// provenance enum folded back out into `system_query`/`fallback_mode`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PlanWire {
    #[serde(default)]
    description: String,
    #[serde(default, rename = "plan", skip_serializing_if = "Vec::is_empty")]
    steps: Vec<PlanStep>,
    #[serde(default)]
    estimated_time: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    system_query: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    fallback_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<PlanWire> for Plan {
    fn from(wire: PlanWire) -> Self {
        let source = if wire.system_query {
            PlanSource::SystemQuery
        } else if wire.fallback_mode {
            PlanSource::Fallback
        } else {
            PlanSource::Model
        };
        Plan {
            description: wire.description,
            steps: wire.steps,
            estimated_time: wire.estimated_time,
            source,
            error: wire.error,
        }
    }
}

impl From<Plan> for PlanWire {
    fn from(plan: Plan) -> Self {
        PlanWire {
            description: plan.description,
            steps: plan.steps,
            estimated_time: plan.estimated_time,
            system_query: plan.source == PlanSource::SystemQuery,
            fallback_mode: plan.source == PlanSource::Fallback,
            error: plan.error,
        }
    }
}

/// Message role on the gateway wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// The `{role, content}` pair sent to inference providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
