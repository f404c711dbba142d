//! Manager 的两项职责：规划（DelegationPlanner）与汇总（ResultSynthesizer）

pub mod planner;
pub mod synthesizer;

pub use planner::{parse_plan, planning_prompt, DelegationPlanner};
pub use synthesizer::ResultSynthesizer;
