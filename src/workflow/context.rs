//! SharedContext：一次 Run 内已完成子任务的结果
//!
//! 以子任务 id 为键、只追加；由 Scheduler 独占写入（每个波次结束后按计划顺序写入），
//! 依赖方 Worker 与 ResultSynthesizer 只读。

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::PriorResult;
use crate::workflow::types::SubtaskId;

/// 一个已完成子任务的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub subtask_id: SubtaskId,
    pub worker: String,
    pub output: String,
    /// Worker 回复消息携带的元数据（工具调用记录等）
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub completed_at: DateTime<Utc>,
}

impl ContextEntry {
    pub fn to_prior_result(&self) -> PriorResult {
        PriorResult {
            subtask_id: self.subtask_id.clone(),
            worker: self.worker.clone(),
            output: self.output.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedContext {
    entries: Vec<ContextEntry>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条结果；该子任务已有结果时不覆盖，返回 false
    pub(crate) fn record(&mut self, entry: ContextEntry) -> bool {
        if self.contains(&entry.subtask_id) {
            tracing::warn!(subtask = %entry.subtask_id, "context already holds a result, ignoring");
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn get(&self, subtask_id: &str) -> Option<&ContextEntry> {
        self.entries.iter().find(|e| e.subtask_id == subtask_id)
    }

    /// 按 Worker 名查找；同一 Worker 有多条结果时取最后写入的
    pub fn get_by_worker(&self, worker: &str) -> Option<&ContextEntry> {
        self.entries.iter().rev().find(|e| e.worker == worker)
    }

    pub fn contains(&self, subtask_id: &str) -> bool {
        self.get(subtask_id).is_some()
    }

    /// 写入顺序的全部结果
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<SubtaskId> {
        self.entries.iter().map(|e| e.subtask_id.clone()).collect()
    }

    /// 子任务 id -> 输出文本（与写入顺序无关的内容视图）
    pub fn outputs(&self) -> BTreeMap<SubtaskId, String> {
        self.entries
            .iter()
            .map(|e| (e.subtask_id.clone(), e.output.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
