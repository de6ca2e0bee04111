pub mod script;
pub mod types;

pub use script::{parse, parse_iter, to_gcode};
pub use types::{ChatMessage, ChatRole, ClickMode, MouseButton, Plan, PlanSource, PlanStep, StepOp};
