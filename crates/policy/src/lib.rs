pub mod efficiency;
pub mod judge;
pub mod logic;
pub mod safety;
pub mod validator;

pub use efficiency::EfficiencyAdvisor;
pub use judge::{Judge, JudgeBackend, ModelJudge, PolicyError, Verdict};
pub use logic::LogicJudge;
pub use safety::SafetyJudge;
pub use validator::{CommandValidator, ValidationReport};
