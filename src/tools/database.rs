//! search_database 工具（内置知识表，演示用）

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::Tool;

const ENTRIES: &[(&str, &str)] = &[
    ("best practices python", "Python best practices: Use virtual environments, follow PEP 8, write tests, use type hints, document code."),
    ("code review checklist", "Code review checklist: 1) Correctness, 2) Tests, 3) Documentation, 4) Performance, 5) Security, 6) Style consistency."),
    ("project structure", "Standard Python project: project/src/main.py, tests/, docs/, README.md, requirements.txt, .gitignore."),
    ("error handling", "Error handling: Use try-except, catch specific exceptions, log errors, provide helpful messages, fail gracefully."),
];

/// 内部数据库检索：任一关键词命中即返回该条目
pub struct SearchDatabaseTool;

#[async_trait]
impl Tool for SearchDatabaseTool {
    fn name(&self) -> &str {
        "search_database"
    }

    fn description(&self) -> &str {
        "Searches internal database for information. Args: {\"query\": \"text\", \"table\": \"all\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "minLength": 1},
                "table": {"type": "string"}
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or("missing query")?
            .to_lowercase();
        let hit = ENTRIES
            .iter()
            .find(|(key, _)| key.split_whitespace().any(|word| query.contains(word)));
        Ok(match hit {
            Some((_, text)) => text.to_string(),
            None => format!("Database search for '{query}': Found {} related entries.", ENTRIES.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_match() {
        let out = SearchDatabaseTool
            .execute(json!({"query": "review process"}))
            .await
            .unwrap();
        assert!(out.starts_with("Code review checklist"));
    }
}
