//! Worker 公共部分
//!
//! 一次 decide：system（角色 + 工具列表 + 参数 schema + 调用格式）+ prompt -> 决策函数；
//! 若回复是工具请求则调用一次工具，把结果喂回做第二次决策。每次 process 至多一轮工具调用，
//! 第二次回复即使仍像工具请求也按文本结果处理。

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::HiveError;
use crate::llm::{decide, LlmClient};
use crate::message::Message;
use crate::tools::{parse_tool_call, tool_call_schema_json, ToolCall, ToolInvoker};

/// 一次决策的结果
#[derive(Debug, Clone)]
pub struct Decision {
    /// 最终文本结果
    pub text: String,
    /// 决策函数请求过的工具（若有）
    pub tool_call: Option<ToolCall>,
    /// 该工具的输出
    pub tool_output: Option<String>,
}

impl Decision {
    /// 写入回复元数据的工具调用记录
    pub fn metadata(&self) -> HashMap<String, Value> {
        let mut meta = HashMap::new();
        if let Some(call) = &self.tool_call {
            meta.insert(
                "tool_call".to_string(),
                serde_json::json!({"tool": call.tool, "args": call.args}),
            );
        }
        if let Some(output) = &self.tool_output {
            meta.insert("tool_output".to_string(), Value::String(output.clone()));
        }
        meta
    }
}

/// 角色无关的 Worker 能力：持有名字、角色描述、system prompt、决策函数与工具调用器
pub struct WorkerCore {
    name: String,
    role: String,
    system_prompt: String,
    llm: Arc<dyn LlmClient>,
    tools: ToolInvoker,
}

impl WorkerCore {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        system_prompt: impl Into<String>,
        llm: Arc<dyn LlmClient>,
        tools: ToolInvoker,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            system_prompt: system_prompt.into(),
            llm,
            tools,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn tools(&self) -> &ToolInvoker {
        &self.tools
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// 工具列表段落："- name: 描述首行"；无工具时为 "No tools available"
    pub fn format_tools(&self) -> String {
        let descriptions = self.tools.registry().tool_descriptions();
        if descriptions.is_empty() {
            return "No tools available".to_string();
        }
        descriptions
            .iter()
            .map(|(name, desc)| format!("- {name}: {desc}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn system(&self) -> String {
        if self.tools.registry().is_empty() {
            return self.system_prompt.clone();
        }
        format!(
            "{}\n\nYou have access to these tools:\n{}\n\n\
             Tool parameters (JSON Schema):\n{}\n\n\
             To use a tool, reply with ONLY a JSON object matching this schema and nothing else:\n{}\n\
             Otherwise reply with your result as plain text.",
            self.system_prompt,
            self.format_tools(),
            self.tools.registry().to_schema_json(),
            tool_call_schema_json()
        )
    }

    /// 调用决策函数，必要时执行一轮工具调用
    pub async fn decide(&self, prompt: &str) -> Result<Decision, HiveError> {
        let system = self.system();
        let first = decide(self.llm.as_ref(), &system, prompt).await?;

        let Some(call) = parse_tool_call(&first) else {
            return Ok(Decision {
                text: first,
                tool_call: None,
                tool_output: None,
            });
        };

        tracing::debug!(worker = %self.name, tool = %call.tool, "decision requested tool");
        let output = self.tools.invoke(&call.tool, call.args.clone()).await?;

        let follow_up = format!(
            "{prompt}\n\nTool `{}` returned:\n{output}\n\n\
             Now provide your final result as plain text. Do not request another tool.",
            call.tool
        );
        let second = decide(self.llm.as_ref(), &system, &follow_up).await?;

        Ok(Decision {
            text: second,
            tool_call: Some(call),
            tool_output: Some(output),
        })
    }

    /// 拼接前置子任务结果段落；没有依赖时为空串
    pub fn prior_context(&self, msg: &Message) -> String {
        let prior = msg.prior_results();
        if prior.is_empty() {
            return String::new();
        }
        let mut out = String::from("\n\nContext from previous workers:\n");
        for p in prior {
            out.push_str(&format!("\n{}'s output (subtask {}):\n{}\n", p.worker, p.subtask_id, p.output));
        }
        out
    }

    /// 成功回复：sender 为自己，receiver 为原发送方
    pub fn reply(
        &self,
        to: &Message,
        content: impl Into<String>,
        metadata: HashMap<String, Value>,
    ) -> Message {
        Message::builder(self.name.clone(), to.sender(), content)
            .metadata_map(metadata)
            .build()
    }

    /// 失败回复：错误编码进内容与元数据
    pub fn fail(&self, to: &Message, err: &HiveError) -> Message {
        tracing::warn!(worker = %self.name, kind = %err.kind(), error = %err, "worker failed");
        Message::error(self.name.clone(), to.sender(), err)
    }

    /// 执行角色固定的后续工具步骤（该工具已注册时）；失败不影响子任务结果
    pub async fn follow_up(&self, tool: &str, args: Value) -> Option<Result<String, HiveError>> {
        if !self.tools.has_tool(tool) {
            return None;
        }
        Some(self.tools.invoke(tool, args).await)
    }
}
