//! 计划构建器
//!
//! 提供流畅的 API 来构建计划，build 时校验 id、依赖与环

use crate::core::HiveError;
use crate::workflow::graph::validate_plan;
use crate::workflow::types::*;

/// 计划构建器
#[derive(Debug, Default)]
pub struct PlanBuilder {
    subtasks: Vec<Subtask>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加子任务（无依赖）
    pub fn subtask(
        mut self,
        id: impl Into<SubtaskId>,
        worker: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.subtasks.push(Subtask::new(id, worker, description));
        self
    }

    /// 设置顺序依赖：to 在 from 完成后执行
    pub fn sequential(self, from: impl Into<SubtaskId>, to: impl Into<SubtaskId>) -> Self {
        let from = from.into();
        self.depends_on(to, [from])
    }

    /// 追加依赖（所有前置子任务都 Done 才就绪）
    pub fn depends_on<I, S>(mut self, id: impl Into<SubtaskId>, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SubtaskId>,
    {
        let id = id.into();
        if let Some(subtask) = self.subtasks.iter_mut().find(|s| s.id == id) {
            subtask.depends_on.extend(deps.into_iter().map(Into::into));
        }
        self
    }

    /// 添加已构造好的子任务
    pub fn push(mut self, subtask: Subtask) -> Self {
        self.subtasks.push(subtask);
        self
    }

    /// 构建计划
    pub fn build(self) -> Result<Plan, HiveError> {
        if self.subtasks.is_empty() {
            return Err(HiveError::UnparsablePlan("plan has no subtasks".to_string()));
        }
        if let Some(s) = self.subtasks.iter().find(|s| s.id.trim().is_empty()) {
            return Err(HiveError::UnparsablePlan(format!(
                "subtask for '{}' has an empty id",
                s.worker
            )));
        }
        if let Some(s) = self.subtasks.iter().find(|s| s.description.trim().is_empty()) {
            return Err(HiveError::UnparsablePlan(format!(
                "subtask '{}' has an empty description",
                s.id
            )));
        }
        let plan = Plan::from_subtasks(self.subtasks);
        validate_plan(&plan)?;
        Ok(plan)
    }
}
