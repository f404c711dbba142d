//! Reviewer：评审交付物，若注册了 validate 则附上校验结果

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::HiveError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::ToolInvoker;
use crate::workers::{Worker, WorkerCore};

const NAME: &str = "reviewer";
const ROLE: &str = "Review Specialist - Validates and improves quality";
const SYSTEM_PROMPT: &str = "You are a review specialist worker in a multi-worker team.
Your role is to critically evaluate work and provide constructive feedback.
Focus on accuracy, completeness, clarity and concrete improvements. Be thorough but fair.";

pub struct ReviewWorker {
    core: WorkerCore,
}

impl ReviewWorker {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolInvoker) -> Self {
        Self {
            core: WorkerCore::new(NAME, ROLE, SYSTEM_PROMPT, llm, tools),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.core.set_name(name);
        self
    }

    async fn review(&self, msg: &Message) -> Result<(String, Value), HiveError> {
        let under_review = format!("{}{}", msg.content(), self.core.prior_context(msg));
        let prompt = format!(
            "Please review this work:\n\n{under_review}\n\n\
             Provide:\n1. Overall assessment (Good/Needs Work)\n2. Strengths\n\
             3. Issues\n4. Suggestions\n\nYour review:"
        );
        let decision = self.core.decide(&prompt).await?;
        let mut review = decision.text;

        let validation = match self
            .core
            .follow_up("validate", json!({ "content": under_review }))
            .await
        {
            Some(Ok(out)) => Some(out),
            Some(Err(e)) => Some(format!("Validation error: {e}")),
            None => None,
        };
        if let Some(v) = &validation {
            review.push_str(&format!("\n\nValidation: {v}"));
        }
        Ok((review, Value::from(validation)))
    }
}

#[async_trait]
impl Worker for ReviewWorker {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn role(&self) -> &str {
        self.core.role()
    }

    async fn process(&self, msg: &Message) -> Message {
        tracing::info!(worker = %self.name(), chars = msg.content().len(), "processing review request");
        match self.review(msg).await {
            Ok((review, validation)) => {
                let meta = [("validation_result".to_string(), validation)]
                    .into_iter()
                    .collect();
                self.core.reply(msg, review, meta)
            }
            Err(e) => self.core.fail(msg, &e),
        }
    }
}
