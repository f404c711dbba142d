//! Worker：接收一条子任务 Message，按需调用一次工具，返回结果 Message
//!
//! 每种角色（Researcher / Coder / Reviewer / Writer …）各自实现 Worker trait；
//! 公共部分（拼 prompt、调用决策函数、单轮工具调用、失败编码）由 WorkerCore 提供。
//! Worker 在一次 Run 内无状态，可被并发调用。

pub mod base;
pub mod coder;
pub mod researcher;
pub mod reviewer;
pub mod writer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Message;

pub use base::{Decision, WorkerCore};
pub use coder::CodingWorker;
pub use researcher::ResearchWorker;
pub use reviewer::ReviewWorker;
pub use writer::WritingWorker;

/// Worker 能力接口
///
/// `process` 不向外抛错：决策函数失败、工具不存在等都编码进返回 Message 的内容与元数据
/// （见 [`Message::error`]），由 Scheduler 决定子任务状态。
#[async_trait]
pub trait Worker: Send + Sync {
    /// 注册名（计划中的 workerName）
    fn name(&self) -> &str;

    /// 角色描述（供 DelegationPlanner 选人）
    fn role(&self) -> &str;

    async fn process(&self, msg: &Message) -> Message;
}

/// Worker 注册表：名字 -> Worker，Orchestrator 构造后只读，可在并发 Run 之间共享
///
/// 保持注册顺序，规划 prompt 中的 Worker 列表按此顺序输出。
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: Vec<Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Worker；同名者被替换（位置不变）
    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        match self.workers.iter_mut().find(|w| w.name() == worker.name()) {
            Some(slot) => *slot = worker,
            None => self.workers.push(worker),
        }
    }

    pub fn with(mut self, worker: impl Worker + 'static) -> Self {
        self.register(Arc::new(worker));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Worker>> {
        self.workers.iter().find(|w| w.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workers.iter().any(|w| w.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name().to_string()).collect()
    }

    /// (名字, 角色描述)，注册顺序
    pub fn roles(&self) -> Vec<(String, String)> {
        self.workers
            .iter()
            .map(|w| (w.name().to_string(), w.role().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
