//! 计划依赖图
//!
//! 使用邻接表和入度表实现 DAG 拓扑排序，并按「波次」分层：同一波次内的子任务彼此独立。

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::HiveError;
use crate::workflow::types::*;

/// 计划依赖图
#[derive(Debug)]
pub struct PlanGraph {
    /// 计划顺序
    order: Vec<SubtaskId>,
    /// 邻接表：子任务 id -> 依赖它的子任务（计划顺序）
    adjacency: HashMap<SubtaskId, Vec<SubtaskId>>,
    /// 入度表：子任务 id -> 依赖数
    in_degree: HashMap<SubtaskId, usize>,
}

impl PlanGraph {
    /// 创建依赖图；依赖了计划中不存在的 id 返回 UnparsablePlan
    pub fn new(plan: &Plan) -> Result<Self, HiveError> {
        let order = plan.ids();
        let mut adjacency: HashMap<SubtaskId, Vec<SubtaskId>> = HashMap::new();
        let mut in_degree: HashMap<SubtaskId, usize> = HashMap::new();

        for id in &order {
            if in_degree.insert(id.clone(), 0).is_some() {
                return Err(HiveError::UnparsablePlan(format!("duplicate subtask id '{id}'")));
            }
            adjacency.insert(id.clone(), Vec::new());
        }

        for subtask in plan.subtasks() {
            let mut seen = HashSet::new();
            for dep in &subtask.depends_on {
                if !seen.insert(dep) {
                    continue;
                }
                let Some(dependents) = adjacency.get_mut(dep) else {
                    return Err(HiveError::UnparsablePlan(format!(
                        "subtask '{}' depends on unknown subtask '{dep}'",
                        subtask.id
                    )));
                };
                dependents.push(subtask.id.clone());
                *in_degree.entry(subtask.id.clone()).or_insert(0) += 1;
            }
        }

        Ok(Self {
            order,
            adjacency,
            in_degree,
        })
    }

    /// 按波次分层（Kahn）；每层内保持计划顺序。剩余无法就绪的子任务报 CyclicPlan
    pub fn waves(&self) -> Result<Vec<Vec<SubtaskId>>, HiveError> {
        let mut degree = self.in_degree.clone();
        let mut current: Vec<SubtaskId> = self
            .order
            .iter()
            .filter(|id| degree.get(*id) == Some(&0))
            .cloned()
            .collect();
        let mut waves = Vec::new();
        let mut placed = 0;

        while !current.is_empty() {
            placed += current.len();
            let mut next = HashSet::new();
            for id in &current {
                for dependent in self.dependents(id) {
                    if let Some(d) = degree.get_mut(dependent) {
                        *d -= 1;
                        if *d == 0 {
                            next.insert(dependent.clone());
                        }
                    }
                }
            }
            waves.push(current);
            current = self
                .order
                .iter()
                .filter(|id| next.contains(*id))
                .cloned()
                .collect();
        }

        if placed < self.order.len() {
            let involved = self
                .order
                .iter()
                .filter(|id| degree.get(*id).is_some_and(|d| *d > 0))
                .cloned()
                .collect();
            return Err(HiveError::CyclicPlan { involved });
        }
        Ok(waves)
    }

    /// 直接依赖 id 的子任务
    pub fn dependents(&self, id: &str) -> &[SubtaskId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 传递依赖 id 的全部子任务（计划顺序，不含自身）
    pub fn transitive_dependents(&self, id: &str) -> Vec<SubtaskId> {
        let mut reached = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents(current) {
                if reached.insert(dependent.as_str()) {
                    queue.push_back(dependent);
                }
            }
        }
        self.order
            .iter()
            .filter(|o| o.as_str() != id && reached.contains(o.as_str()))
            .cloned()
            .collect()
    }
}

/// 校验计划：依赖存在、id 唯一、无环
pub fn validate_plan(plan: &Plan) -> Result<(), HiveError> {
    PlanGraph::new(plan)?.waves().map(|_| ())
}
