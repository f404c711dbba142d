//! validate 工具：内容质量检查

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::Tool;

/// 短于此长度的内容会被提示
const MIN_LENGTH: usize = 50;

pub struct ValidateTool;

#[async_trait]
impl Tool for ValidateTool {
    fn name(&self) -> &str {
        "validate"
    }

    fn description(&self) -> &str {
        "Validates content quality. Args: {\"content\": \"text\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"content": {"type": "string"}},
            "required": ["content"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let content = args
            .get("content")
            .and_then(Value::as_str)
            .ok_or("missing content")?;

        let mut checks = Vec::new();
        if content.chars().count() < MIN_LENGTH {
            checks.push("⚠️  Content is quite short");
        } else {
            checks.push("✓ Adequate length");
        }
        if content.contains('\n') {
            checks.push("✓ Has structure/breaks");
        }
        let lower = content.to_lowercase();
        if ["error", "fail", "issue", "problem"].iter().any(|w| lower.contains(w)) {
            checks.push("⚠️  Contains error/issue mentions");
        }
        Ok(checks.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_short_content_flagged() {
        let out = ValidateTool.execute(json!({"content": "tiny"})).await.unwrap();
        assert!(out.contains("quite short"));
    }

    #[tokio::test]
    async fn test_issue_mentions_flagged() {
        let text = format!("{}\nThere is one known issue.", "x".repeat(60));
        let out = ValidateTool.execute(json!({"content": text})).await.unwrap();
        assert!(out.contains("Adequate length"));
        assert!(out.contains("Has structure"));
        assert!(out.contains("issue mentions"));
    }
}
