//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters_schema / execute），由 ToolRegistry 按名注册与查找，
//! ToolInvoker 在调用时做参数校验、加超时并统一转 HiveError。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// 工具 trait：名称、描述（供决策函数理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（首行会拼进 Worker 的 prompt）
    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认接受任意对象
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具；Err 为底层失败原因
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// 工具注册表：按名称有序存储 Arc<dyn Tool>，保证生成的 prompt 稳定
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "tool re-registered, previous definition replaced");
        }
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 返回 (name, 描述首行) 列表，用于生成 prompt 中的工具段落
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|(name, tool)| {
                let first_line = tool
                    .description()
                    .trim()
                    .lines()
                    .next()
                    .unwrap_or("No description")
                    .to_string();
                (name.clone(), first_line)
            })
            .collect()
    }

    /// 工具 schema JSON（name / description / parameters），可拼入 system prompt
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            self.1
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_descriptions_are_sorted_first_lines() {
        let registry = ToolRegistry::new()
            .with(Named("zeta", "Last tool\nmore detail"))
            .with(Named("alpha", "  First tool  "));
        assert_eq!(
            registry.tool_descriptions(),
            vec![
                ("alpha".to_string(), "First tool".to_string()),
                ("zeta".to_string(), "Last tool".to_string()),
            ]
        );
    }

    #[test]
    fn test_schema_json_lists_parameters() {
        let registry = ToolRegistry::new().with(Named("alpha", "A"));
        let parsed: Value = serde_json::from_str(&registry.to_schema_json()).unwrap();
        assert_eq!(parsed[0]["name"], "alpha");
        assert_eq!(parsed[0]["parameters"]["type"], "object");
    }

    #[test]
    fn test_lookup() {
        let registry = ToolRegistry::new().with(Named("alpha", "A"));
        assert!(registry.contains("alpha"));
        assert!(registry.get("beta").is_none());
        assert_eq!(registry.tool_names(), vec!["alpha".to_string()]);
    }
}
