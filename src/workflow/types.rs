//! 计划类型定义
//!
//! 定义子任务、子任务状态与计划（有序子任务序列）

use serde::{Deserialize, Serialize};

pub type SubtaskId = String;

/// 子任务状态：Pending -> Ready -> Running -> {Done | Failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtaskStatus {
    /// 等待依赖满足
    Pending,
    /// 依赖已全部 Done，等待派发
    Ready,
    /// 已派发给 Worker
    Running,
    /// 已完成，结果写入 SharedContext
    Done,
    /// 失败（自身失败，或依赖失败而未派发）
    Failed,
}

impl SubtaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubtaskStatus::Done | SubtaskStatus::Failed)
    }
}

/// 计划中的一个子任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// 计划内唯一
    pub id: SubtaskId,
    /// 负责的 Worker 注册名
    pub worker: String,
    /// 交给 Worker 的指令
    pub description: String,
    /// 依赖的子任务 id
    pub depends_on: Vec<SubtaskId>,
    /// 执行状态，只由 Scheduler 修改
    pub status: SubtaskStatus,
}

impl Subtask {
    pub fn new(
        id: impl Into<SubtaskId>,
        worker: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            worker: worker.into(),
            description: description.into(),
            depends_on: Vec::new(),
            status: SubtaskStatus::Pending,
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SubtaskId>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }
}

/// 为一个任务生成的有序子任务序列
///
/// 一般通过 [`PlanBuilder`](crate::workflow::PlanBuilder) 或 DelegationPlanner 构造，二者都会校验
/// id 唯一、依赖存在且无环。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    subtasks: Vec<Subtask>,
}

impl Plan {
    /// 不做校验的构造；执行前 Scheduler 仍会重新检查依赖图
    pub fn from_subtasks(subtasks: Vec<Subtask>) -> Self {
        Self { subtasks }
    }

    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    pub fn get(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.subtasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtasks.is_empty()
    }

    pub fn ids(&self) -> Vec<SubtaskId> {
        self.subtasks.iter().map(|s| s.id.clone()).collect()
    }

    pub fn status_of(&self, id: &str) -> Option<SubtaskStatus> {
        self.get(id).map(|s| s.status)
    }

    pub(crate) fn set_status(&mut self, id: &str, status: SubtaskStatus) {
        if let Some(s) = self.subtasks.iter_mut().find(|s| s.id == id) {
            s.status = status;
        }
    }

    /// 所有子任务回到 Pending（同一计划再次执行前调用）
    pub fn reset(&mut self) {
        for s in &mut self.subtasks {
            s.status = SubtaskStatus::Pending;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_lookup_and_status() {
        let mut plan = Plan::from_subtasks(vec![
            Subtask::new("1", "researcher", "look it up"),
            Subtask::new("2", "coder", "write it").with_deps(["1"]),
        ]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.ids(), vec!["1", "2"]);
        assert_eq!(plan.get("2").unwrap().depends_on, vec!["1"]);
        assert_eq!(plan.status_of("1"), Some(SubtaskStatus::Pending));

        plan.set_status("1", SubtaskStatus::Done);
        assert!(plan.status_of("1").unwrap().is_terminal());
        plan.reset();
        assert_eq!(plan.status_of("1"), Some(SubtaskStatus::Pending));
        assert_eq!(plan.status_of("9"), None);
    }
}
