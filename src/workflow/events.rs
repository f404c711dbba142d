//! 编排事件流，供 UI / 日志订阅
//!
//! 订阅方通过 `mpsc::unbounded_channel` 取得接收端；发送失败（接收端已关闭）直接忽略。

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::core::ErrorKind;
use crate::workflow::types::{Plan, SubtaskId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    PlanCreated { task: String, plan: Plan },
    WaveStarted { index: usize, subtasks: Vec<SubtaskId> },
    SubtaskDispatched { id: SubtaskId, worker: String },
    SubtaskCompleted { id: SubtaskId, worker: String, chars: usize },
    SubtaskFailed { id: SubtaskId, worker: String, kind: ErrorKind, reason: String },
    /// 依赖失败、未派发
    SubtaskSkipped { id: SubtaskId, blocked_by: SubtaskId },
    Synthesizing { entries: usize },
    Finished { elapsed_ms: u64 },
    Cancelled { completed: Vec<SubtaskId> },
}

pub type EventSender = mpsc::UnboundedSender<OrchestrationEvent>;

/// 可选的事件发送端
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<EventSender>,
}

impl EventSink {
    pub fn new(tx: Option<EventSender>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: OrchestrationEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
