//! code_executor 工具：对代码做静态结构检查（演示实现，不真正执行）

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::Tool;

pub struct CodeExecutorTool;

#[async_trait]
impl Tool for CodeExecutorTool {
    fn name(&self) -> &str {
        "code_executor"
    }

    fn description(&self) -> &str {
        "Executes code and returns result (static check). Args: {\"code\": \"source\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"code": {"type": "string"}},
            "required": ["code"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let code = args
            .get("code")
            .and_then(Value::as_str)
            .ok_or("missing code")?;
        if code.trim().is_empty() {
            return Err("no code to run".to_string());
        }
        let verdict = if ["def ", "class ", "fn ", "struct "].iter().any(|k| code.contains(k)) {
            "Code structure looks valid. Functions and classes defined correctly."
        } else if code.contains("import ") || code.contains("use ") {
            "Code includes imports. Dependencies should be documented."
        } else {
            "Code syntax appears valid."
        };
        Ok(verdict.to_string())
    }
}
