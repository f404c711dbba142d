//! 计划与调度：子任务 / 计划类型、依赖图、构建器、SharedContext、事件流与调度引擎

pub mod builder;
pub mod context;
pub mod engine;
pub mod events;
pub mod graph;
pub mod types;

pub use builder::PlanBuilder;
pub use context::{ContextEntry, SharedContext};
pub use engine::{CancelPolicy, Scheduler, DISPATCHER, META_SUBTASK_ID};
pub use events::{EventSender, EventSink, OrchestrationEvent};
pub use graph::{validate_plan, PlanGraph};
pub use types::*;
