//! 参与方之间的消息
//!
//! Message 构造后不可变：Orchestrator 向 Worker 派发子任务、Worker 返回结果都以 Message 承载。
//! 子任务执行期的错误不以异常形式越过 Worker 边界，而是编码为 `Error: <reason>` 内容，
//! 并在元数据中写入 `error_kind`；Scheduler 只按 `error_kind` 判定失败。

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{ErrorKind, HiveError};

/// 错误内容前缀
pub const ERROR_PREFIX: &str = "Error:";
/// 元数据键：错误种类
pub const META_ERROR_KIND: &str = "error_kind";
/// 元数据键：所依赖子任务的结果（Vec<PriorResult>）
pub const META_PRIOR_RESULTS: &str = "prior_results";
/// Display 时内容预览字符数
const DISPLAY_PREVIEW_CHARS: usize = 100;

/// 参与方之间传递的消息（按值比较与序列化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    sender: String,
    receiver: String,
    content: String,
    #[serde(default)]
    metadata: HashMap<String, Value>,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            content: content.into(),
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn builder(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: impl Into<String>,
    ) -> MessageBuilder {
        MessageBuilder {
            inner: Self::new(sender, receiver, content),
        }
    }

    /// 构造一条失败消息：内容为 `Error: <kind>: <reason>`，元数据记录 error_kind
    pub fn error(sender: impl Into<String>, receiver: impl Into<String>, err: &HiveError) -> Self {
        let kind = err.kind();
        Self::builder(sender, receiver, format!("{ERROR_PREFIX} {kind}: {err}"))
            .metadata(META_ERROR_KIND, Value::String(kind.as_str().to_string()))
            .build()
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// 是否为失败消息：只认元数据中的 error_kind，内容以 "Error:" 开头的正常回复不算失败
    pub fn is_error(&self) -> bool {
        self.metadata.contains_key(META_ERROR_KIND)
    }

    /// 失败消息的错误种类；error_kind 无法识别时记为 SubtaskFailed
    pub fn error_kind(&self) -> Option<ErrorKind> {
        let raw = self.metadata.get(META_ERROR_KIND)?;
        Some(
            raw.as_str()
                .and_then(ErrorKind::parse)
                .unwrap_or(ErrorKind::SubtaskFailed),
        )
    }

    /// 派发时附带的前置子任务结果；没有或格式不符时返回空
    pub fn prior_results(&self) -> Vec<PriorResult> {
        self.metadata
            .get(META_PRIOR_RESULTS)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

/// 某个已完成前置子任务的结果，随派发消息传给依赖它的 Worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorResult {
    pub subtask_id: String,
    pub worker: String,
    pub output: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.content.chars().take(DISPLAY_PREVIEW_CHARS).collect();
        write!(f, "[{} → {}]: {}...", self.sender, self.receiver, preview)
    }
}

/// Message 构造器：构建完成后消息即冻结
#[derive(Debug)]
pub struct MessageBuilder {
    inner: Message,
}

impl MessageBuilder {
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inner.metadata.insert(key.into(), value);
        self
    }

    pub fn metadata_map(mut self, map: HashMap<String, Value>) -> Self {
        self.inner.metadata.extend(map);
        self
    }

    pub fn build(self) -> Message {
        self.inner
    }
}
