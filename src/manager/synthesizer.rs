//! ResultSynthesizer：把原始任务与各子任务结果交给决策函数，汇总成最终回答
//!
//! Orchestrator 只在全部子任务 Done 时调用；若 SharedContext 缺少某个子任务的结果，
//! 汇总 prompt 中会注明该缺口，而不是悄悄忽略。

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::HiveError;
use crate::llm::{decide, LlmClient, LlmError};
use crate::workflow::{Plan, SharedContext};

const SYSTEM_PROMPT: &str = "You are a manager synthesizing your team's work into one final answer.";

pub struct ResultSynthesizer {
    llm: Arc<dyn LlmClient>,
    /// Worker 名 -> 角色描述，用于标注每段贡献
    roles: HashMap<String, String>,
}

impl ResultSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            roles: HashMap::new(),
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = (String, String)>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub async fn synthesize(
        &self,
        task: &str,
        plan: &Plan,
        context: &SharedContext,
    ) -> Result<String, HiveError> {
        let prompt = self.synthesis_prompt(task, plan, context);
        let answer = decide(self.llm.as_ref(), SYSTEM_PROMPT, &prompt).await?;
        if answer.trim().is_empty() {
            return Err(HiveError::DecisionUnavailable(LlmError::EmptyResponse));
        }
        Ok(answer)
    }

    /// 按计划顺序列出每个子任务的贡献
    pub fn synthesis_prompt(&self, task: &str, plan: &Plan, context: &SharedContext) -> String {
        let mut contributions = Vec::with_capacity(plan.len());
        for subtask in plan.subtasks() {
            let role = self
                .roles
                .get(&subtask.worker)
                .map(String::as_str)
                .unwrap_or("Worker");
            let body = match context.get(&subtask.id) {
                Some(entry) => entry.output.clone(),
                None => "(no result: this subtask did not complete)".to_string(),
            };
            contributions.push(format!(
                "\n{} ({role}), subtask {}:\n{body}\n",
                subtask.worker, subtask.id
            ));
        }

        format!(
            "Original Task: {task}\n\n\
             Team Contributions:\n{}\n\n\
             Please create a cohesive final answer that:\n\
             1. Directly addresses the original task\n\
             2. Integrates all relevant contributions\n\
             3. Is well-structured and clear\n\
             4. Highlights key findings and results\n\n\
             Final Answer:",
            contributions.join("\n")
        )
    }
}
