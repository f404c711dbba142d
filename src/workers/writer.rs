//! Writer：撰写文档，若注册了 format_document 则统一格式

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::HiveError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::ToolInvoker;
use crate::workers::{Worker, WorkerCore};

const NAME: &str = "writer";
const ROLE: &str = "Writing Specialist - Creates documentation and reports";
const SYSTEM_PROMPT: &str = "You are a writing specialist worker in a multi-worker team.
Your role is to create clear, well-structured documentation and reports.
Use headings, proper markdown formatting and an appropriate tone for the audience.";

pub struct WritingWorker {
    core: WorkerCore,
}

impl WritingWorker {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolInvoker) -> Self {
        Self {
            core: WorkerCore::new(NAME, ROLE, SYSTEM_PROMPT, llm, tools),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.core.set_name(name);
        self
    }

    async fn write(&self, msg: &Message) -> Result<(String, Option<String>), HiveError> {
        let prompt = format!(
            "Writing Task: {}{}\n\n\
             Create well-formatted content that is easy to read, properly structured and complete.\n\n\
             Your content:",
            msg.content(),
            self.core.prior_context(msg)
        );
        let content = self.core.decide(&prompt).await?.text;

        match self
            .core
            .follow_up("format_document", json!({ "content": content }))
            .await
        {
            Some(Ok(formatted)) => Ok((formatted, None)),
            Some(Err(e)) => {
                tracing::warn!(worker = %self.name(), error = %e, "formatting failed, keeping draft");
                Ok((content, Some(e.to_string())))
            }
            None => Ok((content, None)),
        }
    }
}

#[async_trait]
impl Worker for WritingWorker {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn role(&self) -> &str {
        self.core.role()
    }

    async fn process(&self, msg: &Message) -> Message {
        tracing::info!(worker = %self.name(), "processing writing request");
        match self.write(msg).await {
            Ok((content, format_error)) => {
                let meta = format_error
                    .map(|e| ("format_error".to_string(), Value::String(e)))
                    .into_iter()
                    .collect();
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
    use crate::llm::{LlmError, ScriptedLlmClient};
    use crate::tools::{FormatDocumentTool, ToolRegistry};

    #[tokio::test]
    async fn test_output_is_formatted() {
        let llm = Arc::new(ScriptedLlmClient::new().then("Usage guide body"));
        let tools = ToolRegistry::new().with(FormatDocumentTool);
        let worker = WritingWorker::new(llm, ToolInvoker::new(tools, 5));
        let reply = worker
            .process(&Message::new("manager", "writer", "Document it"))
            .await;
        assert_eq!(reply.content(), "# Document\n\nUsage guide body");
    }

    #[tokio::test]
    async fn test_decision_failure_is_encoded() {
        let llm = Arc::new(ScriptedLlmClient::new().then_fail(LlmError::Api("down".into())));
        let worker = WritingWorker::new(llm, ToolInvoker::new(ToolRegistry::new(), 5));
        let reply = worker.process(&Message::new("manager", "writer", "x")).await;
        assert!(reply.content().starts_with("Error:"));
        assert_eq!(reply.error_kind(), Some(ErrorKind::DecisionUnavailable));
    }
}
