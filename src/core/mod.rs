//! 核心编排层：错误类型、Orchestrator 及其构建器

pub mod builder;
pub mod error;
pub mod orchestrator;

pub use builder::OrchestratorBuilder;
pub use error::{ErrorKind, HiveError, Result};
pub use orchestrator::{create_llm_from_config, Orchestrator, RunReport};
