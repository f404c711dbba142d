//! 编排错误类型
//!
//! HiveError 覆盖工具调用、规划、调度与决策函数四个阶段；ErrorKind 为其稳定标签，
//! 子任务执行期的错误以 ErrorKind 写入 Message 元数据（失败即数据），规划期错误直接中止 Run。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmError;

/// 错误种类标签（可序列化，写入 Message.metadata["error_kind"]）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ToolNotFound,
    InvalidArgument,
    ToolExecutionFailed,
    UnknownWorker,
    CyclicPlan,
    UnparsablePlan,
    SubtaskFailed,
    DecisionUnavailable,
    Cancelled,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ToolNotFound => "tool_not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::ToolExecutionFailed => "tool_execution_failed",
            ErrorKind::UnknownWorker => "unknown_worker",
            ErrorKind::CyclicPlan => "cyclic_plan",
            ErrorKind::UnparsablePlan => "unparsable_plan",
            ErrorKind::SubtaskFailed => "subtask_failed",
            ErrorKind::DecisionUnavailable => "decision_unavailable",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let kind = match s {
            "tool_not_found" => ErrorKind::ToolNotFound,
            "invalid_argument" => ErrorKind::InvalidArgument,
            "tool_execution_failed" => ErrorKind::ToolExecutionFailed,
            "unknown_worker" => ErrorKind::UnknownWorker,
            "cyclic_plan" => ErrorKind::CyclicPlan,
            "unparsable_plan" => ErrorKind::UnparsablePlan,
            "subtask_failed" => ErrorKind::SubtaskFailed,
            "decision_unavailable" => ErrorKind::DecisionUnavailable,
            "cancelled" => ErrorKind::Cancelled,
            "config" => ErrorKind::Config,
            _ => return None,
        };
        Some(kind)
    }

    /// 规划期结构性错误：必须在任何派发之前中止 Run
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnknownWorker | ErrorKind::CyclicPlan | ErrorKind::UnparsablePlan
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 编排过程中可能出现的错误
#[derive(Error, Debug)]
pub enum HiveError {
    #[error("Tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArgument { tool: String, reason: String },

    #[error("Tool '{tool}' failed: {cause}")]
    ToolExecutionFailed { tool: String, cause: String },

    #[error("Unknown worker: {worker}")]
    UnknownWorker { worker: String },

    #[error("Cyclic plan: subtasks {} never become ready", involved.join(", "))]
    CyclicPlan { involved: Vec<String> },

    #[error("Unparsable plan: {0}")]
    UnparsablePlan(String),

    /// 某个子任务失败导致整个 Run 中止；completed 为已写入 SharedContext 的子任务，
    /// skipped 为因依赖失败而未派发的子任务
    #[error(
        "Subtask '{subtask}' ({worker}) failed [{cause}]: {reason}; completed: [{}], skipped: [{}]",
        completed.join(", "),
        skipped.join(", ")
    )]
    SubtaskFailed {
        subtask: String,
        worker: String,
        cause: ErrorKind,
        reason: String,
        completed: Vec<String>,
        skipped: Vec<String>,
    },

    #[error("Decision function unavailable: {0}")]
    DecisionUnavailable(#[from] LlmError),

    #[error("Run cancelled; completed: [{}]", completed.join(", "))]
    Cancelled { completed: Vec<String> },

    #[error("Config error: {0}")]
    Config(String),
}

impl HiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HiveError::ToolNotFound { .. } => ErrorKind::ToolNotFound,
            HiveError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            HiveError::ToolExecutionFailed { .. } => ErrorKind::ToolExecutionFailed,
            HiveError::UnknownWorker { .. } => ErrorKind::UnknownWorker,
            HiveError::CyclicPlan { .. } => ErrorKind::CyclicPlan,
            HiveError::UnparsablePlan(_) => ErrorKind::UnparsablePlan,
            HiveError::SubtaskFailed { .. } => ErrorKind::SubtaskFailed,
            HiveError::DecisionUnavailable(_) => ErrorKind::DecisionUnavailable,
            HiveError::Cancelled { .. } => ErrorKind::Cancelled,
            HiveError::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<config::ConfigError> for HiveError {
    fn from(e: config::ConfigError) -> Self {
        HiveError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HiveError>;
