//! Mock 决策函数（用于测试与无 API Key 的本地演示）
//!
//! - MockLlmClient：按 prompt 类型给出确定性回复，能跑通 规划 -> 执行 -> 汇总 全流程
//! - ScriptedLlmClient：按子串匹配脚本化回复，记录每次调用的 prompt，测试用

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{ChatMessage, LlmClient, LlmError, Role};

/// 规划 prompt 的标记行（与 DelegationPlanner 的模板一致）
const PLAN_MARKER: &str = "Create a delegation plan";
/// 汇总 prompt 的标记行（与 ResultSynthesizer 的模板一致）
const SYNTHESIS_MARKER: &str = "Team Contributions:";
/// 规划 prompt 中 worker 列表的标题行，其后每行 "- name: role"，空行结束
const WORKERS_HEADER: &str = "Available workers:";

fn last_user(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("(no input)")
}

/// Mock 客户端：规划时把列出的 worker 串成「第一个先做，其余依赖它」的计划
#[derive(Debug, Default)]
pub struct MockLlmClient;

impl MockLlmClient {
    fn mock_plan(prompt: &str) -> String {
        let workers: Vec<&str> = prompt
            .lines()
            .skip_while(|line| line.trim() != WORKERS_HEADER)
            .skip(1)
            .take_while(|line| !line.trim().is_empty())
            .filter_map(|line| line.strip_prefix("- "))
            .filter_map(|line| line.split(':').next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        let task = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Task: "))
            .unwrap_or("the task");

        let steps: Vec<serde_json::Value> = workers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let deps: Vec<String> = if i == 0 {
                    vec![]
                } else {
                    vec!["1".to_string()]
                };
                serde_json::json!({
                    "id": (i + 1).to_string(),
                    "agent": name,
                    "subtask": format!("{name}: handle your part of '{task}'"),
                    "depends_on": deps,
                })
            })
            .collect();
        serde_json::Value::Array(steps).to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let prompt = last_user(messages);
        if prompt.contains(PLAN_MARKER) {
            return Ok(Self::mock_plan(prompt));
        }
        if prompt.contains(SYNTHESIS_MARKER) {
            return Ok(format!(
                "Final answer (mock) combining {} chars of team output.",
                prompt.len()
            ));
        }
        let first_line = prompt.lines().next().unwrap_or_default();
        Ok(format!("Mock result for: {first_line}"))
    }
}

struct ScriptRule {
    needle: String,
    response: Result<String, LlmError>,
    delay: Option<Duration>,
}

/// 脚本化客户端：prompt 包含 needle 时返回对应回复；否则依次弹出队列；都没有则返回默认回复
pub struct ScriptedLlmClient {
    rules: Vec<ScriptRule>,
    queue: Mutex<VecDeque<Result<String, LlmError>>>,
    default_response: Result<String, LlmError>,
    calls: Mutex<Vec<String>>,
}

impl Default for ScriptedLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            default_response: Ok("ok".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// prompt（system + user 拼接）包含 needle 时回复 response；先注册的规则优先
    pub fn on(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push(ScriptRule {
            needle: needle.into(),
            response: Ok(response.into()),
            delay: None,
        });
        self
    }

    /// 同 on，但在回复前等待 delay（模拟慢 I/O）
    pub fn on_delayed(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.rules.push(ScriptRule {
            needle: needle.into(),
            response: Ok(response.into()),
            delay: Some(delay),
        });
        self
    }

    /// prompt 包含 needle 时返回错误
    pub fn fail_on(mut self, needle: impl Into<String>, error: LlmError) -> Self {
        self.rules.push(ScriptRule {
            needle: needle.into(),
            response: Err(error),
            delay: None,
        });
        self
    }

    pub fn then(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    pub fn then_fail(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn with_default(mut self, response: impl Into<String>) -> Self {
        self.default_response = Ok(response.into());
        self
    }

    fn push(&self, item: Result<String, LlmError>) {
        if let Ok(mut q) = self.queue.lock() {
            q.push_back(item);
        }
    }

    /// 已收到的调用（每次调用的 system + user 拼接文本）
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.clone());
        }

        if let Some(rule) = self.rules.iter().find(|r| prompt.contains(&r.needle)) {
            if let Some(delay) = rule.delay {
                tokio::time::sleep(delay).await;
            }
            return rule.response.clone();
        }

        let queued = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        queued.unwrap_or_else(|| self.default_response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_plan_lists_all_workers() {
        let prompt = "Create a delegation plan\nAvailable workers:\n- researcher: Research\n- coder: Code\n\nTask: build it";
        let out = MockLlmClient
            .complete(&[ChatMessage::user(prompt)])
            .await
            .unwrap();
        let plan: serde_json::Value = serde_json::from_str(&out).unwrap();
        let steps = plan.as_array().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0]["agent"], "researcher");
        assert_eq!(steps[1]["depends_on"][0], "1");
    }

    #[tokio::test]
    async fn test_scripted_rules_then_queue_then_default() {
        let llm = ScriptedLlmClient::new()
            .on("alpha", "A")
            .fail_on("boom", LlmError::Timeout)
            .then("Q1")
            .with_default("D");

        assert_eq!(llm.complete(&[ChatMessage::user("alpha!")]).await.unwrap(), "A");
        assert_eq!(
            llm.complete(&[ChatMessage::user("boom")]).await,
            Err(LlmError::Timeout)
        );
        assert_eq!(llm.complete(&[ChatMessage::user("x")]).await.unwrap(), "Q1");
        assert_eq!(llm.complete(&[ChatMessage::user("y")]).await.unwrap(), "D");
        assert_eq!(llm.call_count(), 4);
    }
}
