//! Coder：生成代码，若注册了 code_executor 则对草稿做一次检查并附上结果

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::HiveError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::ToolInvoker;
use crate::workers::{Worker, WorkerCore};

const NAME: &str = "coder";
const ROLE: &str = "Coding Specialist - Writes and analyzes code";
const SYSTEM_PROMPT: &str = "You are a coding specialist worker in a multi-worker team.
Your role is to write clean, efficient, well-documented code.
Write clear, readable code, comment the key parts and handle errors appropriately.";

pub struct CodingWorker {
    core: WorkerCore,
}

impl CodingWorker {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolInvoker) -> Self {
        Self {
            core: WorkerCore::new(NAME, ROLE, SYSTEM_PROMPT, llm, tools),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.core.set_name(name);
        self
    }

    async fn code(&self, msg: &Message) -> Result<(String, Value), HiveError> {
        let prompt = format!(
            "Coding Task: {}{}\n\n\
             Please provide:\n1. Complete, working code\n\
             2. Inline comments explaining key parts\n3. Brief usage example if applicable\n\n\
             Your code:",
            msg.content(),
            self.core.prior_context(msg)
        );
        let decision = self.core.decide(&prompt).await?;
        let mut content = decision.text;

        let test_result = match self
            .core
            .follow_up("code_executor", json!({ "code": content }))
            .await
        {
            Some(Ok(out)) => Some(out),
            Some(Err(e)) => Some(format!("Test failed: {e}")),
            None => None,
        };
        if let Some(result) = &test_result {
            content.push_str(&format!("\n\n# Test Results:\n# {result}"));
        }
        Ok((content, Value::from(test_result)))
    }
}

#[async_trait]
impl Worker for CodingWorker {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn role(&self) -> &str {
        self.core.role()
    }

    async fn process(&self, msg: &Message) -> Message {
        tracing::info!(worker = %self.name(), "processing coding request");
        match self.code(msg).await {
            Ok((content, test_result)) => {
                let meta = [("test_result".to_string(), test_result)].into_iter().collect();
                self.core.reply(msg, content, meta)
            }
            Err(e) => self.core.fail(msg, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use crate::llm::ScriptedLlmClient;
    use crate::tools::{CodeExecutorTool, ToolRegistry};

    #[tokio::test]
    async fn test_code_is_checked() {
        let llm = Arc::new(ScriptedLlmClient::new().then("def hello(): return 'world'"));
        let tools = ToolRegistry::new().with(CodeExecutorTool);
        let worker = CodingWorker::new(llm, ToolInvoker::new(tools, 5));

        let reply = worker
            .process(&Message::new("manager", "coder", "Write a function"))
            .await;
        assert_eq!(reply.sender(), "coder");
        assert!(reply.content().starts_with("def hello()"));
        assert!(reply.content().contains("# Test Results:"));
        assert!(!reply.is_error());
    }

    #[tokio::test]
    async fn test_without_executor_returns_draft() {
        let llm = Arc::new(ScriptedLlmClient::new().then("fn main() {}"));
        let worker = CodingWorker::new(llm, ToolInvoker::new(ToolRegistry::new(), 5));
        let reply = worker.process(&Message::new("manager", "coder", "x")).await;
        assert_eq!(reply.content(), "fn main() {}");
        assert_eq!(reply.get_metadata("test_result"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_unregistered_tool_request_fails_the_message() {
        let llm = Arc::new(ScriptedLlmClient::new().then(r#"{"tool": "compile", "args": {}}"#));
        let tools = ToolRegistry::new().with(CodeExecutorTool);
        let worker = CodingWorker::new(llm, ToolInvoker::new(tools, 5));
        let reply = worker.process(&Message::new("manager", "coder", "x")).await;
        assert!(reply.is_error());
        assert_eq!(reply.error_kind(), Some(ErrorKind::ToolNotFound));
        assert_eq!(reply.receiver(), "manager");
    }
}
