//! 工具调用器
//!
//! 持有某个 Worker 的 ToolRegistry 与超时，invoke(tool_name, args) 依次：
//! 查找工具（ToolNotFound）-> 按 schema 校验参数（InvalidArgument）-> 在超时内执行（ToolExecutionFailed）。
//! 本层不重试；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::core::HiveError;
use crate::tools::schema::validate_args;
use crate::tools::ToolRegistry;

/// 审计日志中参数预览的最大字符数
const ARGS_PREVIEW_CHARS: usize = 200;

/// 工具调用器：对每次调用施加参数校验与超时，并将结果映射为 HiveError
#[derive(Clone)]
pub struct ToolInvoker {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self::with_timeout(registry, Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(registry: ToolRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn invoke(&self, tool_name: &str, args: Value) -> Result<String, HiveError> {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = self.invoke_inner(tool_name, args).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind().as_str(),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit, "tool");

        result
    }

    async fn invoke_inner(&self, tool_name: &str, args: Value) -> Result<String, HiveError> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| HiveError::ToolNotFound {
                tool: tool_name.to_string(),
            })?;

        validate_args(&tool.parameters_schema(), &args).map_err(|reason| {
            HiveError::InvalidArgument {
                tool: tool_name.to_string(),
                reason,
            }
        })?;

        match timeout(self.timeout, tool.execute(args)).await {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(cause)) => Err(HiveError::ToolExecutionFailed {
                tool: tool_name.to_string(),
                cause,
            }),
            Err(_) => Err(HiveError::ToolExecutionFailed {
                tool: tool_name.to_string(),
                cause: format!("timed out after {}ms", self.timeout.as_millis()),
            }),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > ARGS_PREVIEW_CHARS {
        format!("{}...", s.chars().take(ARGS_PREVIEW_CHARS).collect::<String>())
    } else {
        s
    }
}
