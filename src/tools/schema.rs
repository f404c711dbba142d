//! 工具调用格式与参数校验
//!
//! - tool_call_schema_json：用 schemars 生成「合法 tool call」的 JSON Schema，拼入 Worker 的 system prompt
//! - parse_tool_call：严格识别决策函数回复中的工具请求（整条回复就是一个 tool call 对象）
//! - validate_args：调用前按工具声明的 parameters schema 做结构校验

use jsonschema::validator_for;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 决策函数请求调用工具的格式：{"tool": "...", "args": {...}}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ToolCall {
    /// 工具名，必须在该 Worker 的工具集中
    pub tool: String,
    /// 工具参数，须满足该工具的 parameters schema
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    Value::Object(Default::default())
}

/// 返回工具调用的 JSON Schema 字符串，可拼入 system prompt
pub fn tool_call_schema_json() -> String {
    let schema = schema_for!(ToolCall);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 去掉一层 ``` / ```json 代码围栏；没有围栏则原样返回
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.trim()
}

/// 若整条回复（可带代码围栏）是一个 tool call 对象则返回它；否则视为文本结果
pub fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let body = strip_code_fence(response);
    if !body.starts_with('{') {
        return None;
    }
    serde_json::from_str::<ToolCall>(body)
        .ok()
        .filter(|call| !call.tool.trim().is_empty())
}

/// 按 schema 校验参数，返回第一条错误描述
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), String> {
    let validator = validator_for(schema).map_err(|e| format!("invalid schema: {e}"))?;
    let mut errors = validator.iter_errors(args);
    match errors.next() {
        Some(first) => Err(first.to_string()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query_schema() -> Value {
        json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"],
            "additionalProperties": false
        })
    }

    #[test]
    fn test_schema_mentions_fields() {
        let s = tool_call_schema_json();
        assert!(s.contains("tool"));
        assert!(s.contains("args"));
    }

    #[test]
    fn test_parse_plain_tool_call() {
        let call = parse_tool_call(r#"{"tool": "web_search", "args": {"query": "rust"}}"#).unwrap();
        assert_eq!(call.tool, "web_search");
        assert_eq!(call.args["query"], "rust");
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let text = "```json\n{\"tool\": \"validate\", \"args\": {\"content\": \"x\"}}\n```";
        assert_eq!(parse_tool_call(text).unwrap().tool, "validate");
    }

    #[test]
    fn test_text_with_braces_is_not_a_tool_call() {
        assert!(parse_tool_call("fn main() { println!(\"hi\"); }").is_none());
        assert!(parse_tool_call("Here you go: {\"tool\": \"x\"}").is_none());
        assert!(parse_tool_call(r#"{"result": "done"}"#).is_none());
        assert!(parse_tool_call(r#"{"tool": "  "}"#).is_none());
    }

    #[test]
    fn test_missing_args_default_to_empty_object() {
        let call = parse_tool_call(r#"{"tool": "ping"}"#).unwrap();
        assert_eq!(call.args, json!({}));
    }

    #[test]
    fn test_validate_args() {
        assert!(validate_args(&query_schema(), &json!({"query": "rust"})).is_ok());
        assert!(validate_args(&query_schema(), &json!({})).is_err());
        assert!(validate_args(&query_schema(), &json!({"query": 3})).is_err());
        assert!(validate_args(&query_schema(), &json!({"query": "a", "extra": 1})).is_err());
        assert!(validate_args(&query_schema(), &json!("query")).is_err());
    }
}
