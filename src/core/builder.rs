//! Orchestrator 构建器：统一的组装逻辑
//!
//! 同一决策函数供 DelegationPlanner 与 ResultSynthesizer 使用；Worker 注册表在 build 后只读。

use std::sync::Arc;
use std::time::Duration;

use crate::config::OrchestratorSection;
use crate::core::orchestrator::Orchestrator;
use crate::llm::LlmClient;
use crate::manager::{DelegationPlanner, ResultSynthesizer};
use crate::workers::{Worker, WorkerRegistry};
use crate::workflow::{CancelPolicy, EventSender, EventSink, Scheduler};

pub struct OrchestratorBuilder {
    llm: Arc<dyn LlmClient>,
    workers: WorkerRegistry,
    max_parallel: usize,
    cancel_policy: CancelPolicy,
    run_timeout: Option<Duration>,
    events: Option<EventSender>,
}

impl OrchestratorBuilder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let defaults = OrchestratorSection::default();
        Self {
            llm,
            workers: WorkerRegistry::new(),
            max_parallel: defaults.max_parallel,
            cancel_policy: defaults.cancel_policy,
            run_timeout: None,
            events: None,
        }
    }

    /// 应用 [orchestrator] 配置段
    pub fn with_config(mut self, section: &OrchestratorSection) -> Self {
        self.max_parallel = section.max_parallel;
        self.cancel_policy = section.cancel_policy;
        self.run_timeout = (section.run_timeout_secs > 0)
            .then(|| Duration::from_secs(section.run_timeout_secs));
        self
    }

    /// 注册一个 Worker
    pub fn worker(mut self, worker: impl Worker + 'static) -> Self {
        self.workers.register(Arc::new(worker));
        self
    }

    pub fn worker_arc(mut self, worker: Arc<dyn Worker>) -> Self {
        self.workers.register(worker);
        self
    }

    /// 追加整个注册表（如 create_software_team 的结果）
    pub fn workers(mut self, registry: WorkerRegistry) -> Self {
        for name in registry.names() {
            if let Some(worker) = registry.get(&name) {
                self.workers.register(worker);
            }
        }
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.max_parallel = n;
        self
    }

    pub fn cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    /// Run 截止时间；到期等同取消
    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    /// 订阅编排事件
    pub fn events(mut self, tx: EventSender) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn build(self) -> Orchestrator {
        let synthesizer = ResultSynthesizer::new(Arc::clone(&self.llm)).with_roles(self.workers.roles());
        Orchestrator {
            planner: DelegationPlanner::new(self.llm),
            synthesizer,
            scheduler: Scheduler::new(self.max_parallel).with_cancel_policy(self.cancel_policy),
            workers: self.workers,
            run_timeout: self.run_timeout,
            events: EventSink::new(self.events),
        }
    }
}
