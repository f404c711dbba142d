//! Researcher：先用检索类工具取资料，再由决策函数整理成研究结论

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::HiveError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::ToolInvoker;
use crate::workers::{Worker, WorkerCore};

const NAME: &str = "researcher";
const ROLE: &str = "Research Specialist - Gathers information and analyzes data";
const SYSTEM_PROMPT: &str = "You are a research specialist worker in a multi-worker team.
Your role is to gather information and provide comprehensive research findings.
Be thorough, accurate, and cite sources when possible.";

/// 派发前自动查询的检索工具（已注册才查）
const LOOKUP_TOOLS: &[(&str, &str)] = &[
    ("web_search", "Search results"),
    ("search_database", "Database results"),
];

pub struct ResearchWorker {
    core: WorkerCore,
}

impl ResearchWorker {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolInvoker) -> Self {
        Self {
            core: WorkerCore::new(NAME, ROLE, SYSTEM_PROMPT, llm, tools),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.core.set_name(name);
        self
    }

    async fn research(&self, msg: &Message) -> Result<(String, Vec<String>), HiveError> {
        let query = msg.content();
        let mut tool_results = Vec::new();
        for (tool, label) in LOOKUP_TOOLS {
            match self.core.follow_up(tool, json!({ "query": query })).await {
                Some(Ok(out)) => tool_results.push(format!("{label}: {out}")),
                Some(Err(e)) => tool_results.push(format!("{label} failed: {e}")),
                None => {}
            }
        }

        let mut prompt = format!(
            "Research Task: {query}{}\n\n\
             Please:\n1. Use available information to answer the task\n\
             2. Synthesize findings into a clear summary\n3. Highlight key facts and insights\n\n\
             Provide your research findings:",
            self.core.prior_context(msg)
        );
        if !tool_results.is_empty() {
            prompt.push_str("\n\nTool Results:\n");
            prompt.push_str(&tool_results.join("\n"));
        }

        let decision = self.core.decide(&prompt).await?;
        Ok((decision.text, tool_results))
    }
}

#[async_trait]
impl Worker for ResearchWorker {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn role(&self) -> &str {
        self.core.role()
    }

    async fn process(&self, msg: &Message) -> Message {
        tracing::info!(worker = %self.name(), "processing research request");
        match self.research(msg).await {
            Ok((findings, tool_results)) => {
                let meta = [(
                    "tool_results".to_string(),
                    Value::from(tool_results),
                )]
                .into_iter()
                .collect();
                self.core.reply(msg, findings, meta)
            }
            Err(e) => self.core.fail(msg, &e),
        }
    }
}
