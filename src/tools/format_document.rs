//! format_document 工具：保证 markdown 文档有标题

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::Tool;

pub struct FormatDocumentTool;

#[async_trait]
impl Tool for FormatDocumentTool {
    fn name(&self) -> &str {
        "format_document"
    }

    fn description(&self) -> &str {
        "Formats document in specified style. Args: {\"content\": \"text\", \"style\": \"markdown\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {"type": "string"},
                "style": {"type": "string", "enum": ["markdown", "plain"]}
            },
            "required": ["content"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let content = args
            .get("content")
            .and_then(Value::as_str)
            .ok_or("missing content")?;
        let style = args.get("style").and_then(Value::as_str).unwrap_or("markdown");
        if style == "markdown" && !content.starts_with('#') {
            return Ok(format!("# Document\n\n{content}"));
        }
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_adds_heading() {
        let out = FormatDocumentTool
            .execute(json!({"content": "Some content"}))
            .await
            .unwrap();
        assert_eq!(out, "# Document\n\nSome content");
    }

    #[tokio::test]
    async fn test_keeps_existing_heading() {
        let out = FormatDocumentTool
            .execute(json!({"content": "# Title\nbody"}))
            .await
            .unwrap();
        assert_eq!(out, "# Title\nbody");
    }
}
