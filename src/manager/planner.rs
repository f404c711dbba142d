//! DelegationPlanner：请决策函数给出委派计划，并把回复当作不可信输入严格解析
//!
//! 接受的回复：一个 JSON 数组（整条回复，或唯一的 ``` 代码块内）。每个元素：
//! `{"id"?: string|int, "agent"|"worker": string, "subtask": string, "depends_on"?: [string|int]}`，
//! 不允许其他字段。depends_on 中的引用先按子任务 id 解析，否则按「计划中恰好一个子任务的 Worker 名」解析。
//!
//! 错误：Worker 未注册 -> UnknownWorker；自依赖或环 -> CyclicPlan；其余结构问题 -> UnparsablePlan。

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;

use crate::core::HiveError;
use crate::llm::{decide, LlmClient};
use crate::tools::schema::strip_code_fence;
use crate::workflow::{Plan, PlanBuilder, Subtask};

const SYSTEM_PROMPT: &str = "You are a manager coordinating a team of specialist workers. \
You never do the work yourself; you decide who does what and in which order.";

static FENCED_BLOCK: OnceLock<Option<Regex>> = OnceLock::new();

fn fenced_block() -> Option<&'static Regex> {
    FENCED_BLOCK
        .get_or_init(|| Regex::new(r"(?s)```[a-zA-Z]*[ \t]*\n(.*?)```").ok())
        .as_ref()
}

/// 计划元素中的 id 引用：字符串或整数
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepRef {
    Text(String),
    Number(u64),
}

impl StepRef {
    fn into_string(self) -> String {
        match self {
            StepRef::Text(s) => s.trim().to_string(),
            StepRef::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    #[serde(default)]
    id: Option<StepRef>,
    #[serde(alias = "worker")]
    agent: String,
    subtask: String,
    #[serde(default)]
    depends_on: Vec<StepRef>,
}

pub struct DelegationPlanner {
    llm: Arc<dyn LlmClient>,
}

impl DelegationPlanner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 为任务生成计划；workers 为 (名字, 角色描述)，按此顺序列入 prompt
    pub async fn plan(&self, task: &str, workers: &[(String, String)]) -> Result<Plan, HiveError> {
        let prompt = planning_prompt(task, workers);
        let response = decide(self.llm.as_ref(), SYSTEM_PROMPT, &prompt).await?;
        tracing::debug!(chars = response.len(), "planner response received");

        let available: Vec<&str> = workers.iter().map(|(name, _)| name.as_str()).collect();
        let plan = parse_plan(&response, &available)?;
        for (i, s) in plan.subtasks().iter().enumerate() {
            tracing::info!(
                step = i + 1,
                id = %s.id,
                worker = %s.worker,
                depends_on = ?s.depends_on,
                "planned subtask: {}",
                s.description
            );
        }
        Ok(plan)
    }
}

/// 规划 prompt；Worker 列表单独成段（"Available workers:" 后每行 "- name: role"）
pub fn planning_prompt(task: &str, workers: &[(String, String)]) -> String {
    let workers_list = workers
        .iter()
        .map(|(name, role)| format!("- {name}: {role}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Available workers:
{workers_list}

Task: {task}

Create a delegation plan: which workers should work on this and in what order?
Consider which workers have relevant expertise, whether one worker needs another's output, and the best sequence for collaboration.

Respond with ONLY a JSON array in this format:
[
  {{"id": "1", "agent": "worker_name", "subtask": "specific task for this worker", "depends_on": []}}
]

Give every step a unique id. If a step needs the results of another step, list that step's id in depends_on.
A task that needs only one worker is a plan with one step.

Plan:"#
    )
}

/// 取出计划 JSON 文本：整条回复本身，或回复中唯一的代码块
fn plan_body(response: &str) -> Result<&str, HiveError> {
    let stripped = strip_code_fence(response);
    if stripped.starts_with('[') {
        return Ok(stripped);
    }

    let blocks: Vec<&str> = fenced_block()
        .map(|re| {
            re.captures_iter(response)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().trim())
                .collect()
        })
        .unwrap_or_default();
    match blocks.as_slice() {
        [body] if body.starts_with('[') => Ok(body),
        [] => Err(HiveError::UnparsablePlan(
            "response is not a JSON array".to_string(),
        )),
        [_] => Err(HiveError::UnparsablePlan(
            "code block does not contain a JSON array".to_string(),
        )),
        _ => Err(HiveError::UnparsablePlan(format!(
            "expected one code block, found {}",
            blocks.len()
        ))),
    }
}

/// 严格解析决策函数给出的计划
pub fn parse_plan(response: &str, available: &[&str]) -> Result<Plan, HiveError> {
    let body = plan_body(response)?;
    let steps: Vec<RawStep> = serde_json::from_str(body)
        .map_err(|e| HiveError::UnparsablePlan(format!("invalid plan JSON: {e}")))?;
    if steps.is_empty() {
        return Err(HiveError::UnparsablePlan("plan has no subtasks".to_string()));
    }

    if let Some(step) = steps.iter().find(|s| !available.contains(&s.agent.trim())) {
        return Err(HiveError::UnknownWorker {
            worker: step.agent.trim().to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let id = match &step.id {
            Some(StepRef::Text(s)) => s.trim().to_string(),
            Some(StepRef::Number(n)) => n.to_string(),
            None => (i + 1).to_string(),
        };
        if !seen.insert(id.clone()) {
            return Err(HiveError::UnparsablePlan(format!("duplicate subtask id '{id}'")));
        }
        ids.push(id);
    }
    let workers: Vec<String> = steps.iter().map(|s| s.agent.trim().to_string()).collect();

    let mut builder = PlanBuilder::new();
    for ((id, worker), step) in ids.iter().zip(&workers).zip(steps) {
        let deps = step
            .depends_on
            .into_iter()
            .map(|r| resolve_dependency(&r.into_string(), id, &ids, &workers))
            .collect::<Result<Vec<_>, _>>()?;
        builder = builder.push(
            Subtask::new(id.clone(), worker.clone(), step.subtask.trim()).with_deps(deps),
        );
    }
    builder.build()
}

/// 依赖引用 -> 子任务 id：先按 id，再按唯一 Worker 名
fn resolve_dependency(
    reference: &str,
    owner: &str,
    ids: &[String],
    workers: &[String],
) -> Result<String, HiveError> {
    if ids.iter().any(|id| id == reference) {
        return Ok(reference.to_string());
    }
    let matches: Vec<&String> = ids
        .iter()
        .zip(workers)
        .filter(|(_, w)| w.as_str() == reference)
        .map(|(id, _)| id)
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => Err(HiveError::UnparsablePlan(format!(
            "subtask '{owner}' depends on '{reference}', which is neither a subtask id nor a planned worker"
        ))),
        _ => Err(HiveError::UnparsablePlan(format!(
            "subtask '{owner}' depends on '{reference}', which names {} subtasks",
            matches.len()
        ))),
    }
}
