//! Orchestrator：对外唯一入口 run(task)
//!
//! 规划 -> 调度执行 -> 汇总。规划期错误（UnknownWorker / CyclicPlan / UnparsablePlan）在任何派发之前中止；
//! 执行期子任务失败按中止策略返回 SubtaskFailed；取消或截止时间到期返回 Cancelled，不再派发新子任务。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::builder::OrchestratorBuilder;
use crate::core::HiveError;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient, RetryConfig, RetryingLlmClient};
use crate::manager::{DelegationPlanner, ResultSynthesizer};
use crate::workers::WorkerRegistry;
use crate::workflow::{EventSink, OrchestrationEvent, Plan, Scheduler, SharedContext};

/// 一次 Run 的完整结果
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub task: String,
    /// 执行后的计划（含各子任务最终状态）
    pub plan: Plan,
    pub context: SharedContext,
    pub answer: String,
    pub elapsed_ms: u64,
}

pub struct Orchestrator {
    pub(crate) workers: WorkerRegistry,
    pub(crate) planner: DelegationPlanner,
    pub(crate) synthesizer: ResultSynthesizer,
    pub(crate) scheduler: Scheduler,
    pub(crate) run_timeout: Option<Duration>,
    pub(crate) events: EventSink,
}

impl Orchestrator {
    pub fn builder(llm: Arc<dyn LlmClient>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(llm)
    }

    pub fn workers(&self) -> &WorkerRegistry {
        &self.workers
    }

    /// 执行任务，返回最终回答
    pub async fn run(&self, task: &str) -> Result<String, HiveError> {
        Ok(self.run_detailed(task).await?.answer)
    }

    /// 执行任务，返回计划、SharedContext 与最终回答
    pub async fn run_detailed(&self, task: &str) -> Result<RunReport, HiveError> {
        self.run_with_cancel(task, CancellationToken::new()).await
    }

    /// 可取消的执行；token 被取消后不再派发新子任务
    pub async fn run_with_cancel(
        &self,
        task: &str,
        cancel: CancellationToken,
    ) -> Result<RunReport, HiveError> {
        let cancel = cancel.child_token();
        let deadline = self.run_timeout.map(|timeout| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "run deadline reached, cancelling");
                token.cancel();
            })
        });

        let result = self.execute(task, &cancel).await;

        if let Some(handle) = deadline {
            handle.abort();
        }
        result
    }

    async fn execute(&self, task: &str, cancel: &CancellationToken) -> Result<RunReport, HiveError> {
        let start = Instant::now();
        if self.workers.is_empty() {
            return Err(HiveError::Config("no workers registered".to_string()));
        }
        tracing::info!(task = %task, workers = ?self.workers.names(), "run started");

        let roles = self.workers.roles();
        let mut plan = tokio::select! {
            plan = self.planner.plan(task, &roles) => plan?,
            _ = cancel.cancelled() => return Err(self.cancelled(Vec::new())),
        };
        tracing::info!(subtasks = plan.len(), "plan created");
        self.events.emit(OrchestrationEvent::PlanCreated {
            task: task.to_string(),
            plan: plan.clone(),
        });

        let context = self
            .scheduler
            .execute(&mut plan, &self.workers, cancel, &self.events)
            .await?;

        tracing::info!(entries = context.len(), "synthesizing final answer");
        self.events.emit(OrchestrationEvent::Synthesizing {
            entries: context.len(),
        });
        let answer = tokio::select! {
            answer = self.synthesizer.synthesize(task, &plan, &context) => answer?,
            _ = cancel.cancelled() => return Err(self.cancelled(context.ids())),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(elapsed_ms, "run finished");
        self.events.emit(OrchestrationEvent::Finished { elapsed_ms });

        Ok(RunReport {
            task: task.to_string(),
            plan,
            context,
            answer,
            elapsed_ms,
        })
    }

    fn cancelled(&self, completed: Vec<String>) -> HiveError {
        tracing::warn!(completed = ?completed, "run cancelled");
        self.events.emit(OrchestrationEvent::Cancelled {
            completed: completed.clone(),
        });
        HiveError::Cancelled { completed }
    }
}

/// 根据配置与环境变量选择决策函数后端（DeepSeek / OpenAI 兼容 / Mock），按 [llm.retry] 包装重试
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_deepseek_key = std::env::var("DEEPSEEK_API_KEY").is_ok();
    let has_openai_key = std::env::var("OPENAI_API_KEY").is_ok();

    let base: Arc<dyn LlmClient> = match provider.as_str() {
        "mock" => {
            tracing::info!("Using Mock LLM");
            Arc::new(MockLlmClient)
        }
        "deepseek" if has_deepseek_key || has_openai_key => {
            // 非 DeepSeek 模型名（如默认的 gpt-4o-mini）回退到 deepseek-chat
            let model = cfg
                .llm
                .model
                .starts_with("deepseek")
                .then_some(cfg.llm.model.as_str());
            tracing::info!("Using DeepSeek LLM ({})", model.unwrap_or("deepseek-chat"));
            Arc::new(OpenAiClient::deepseek(model).with_temperature(cfg.llm.temperature))
        }
        "openai" if has_openai_key => {
            tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
            Arc::new(
                OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, None)
                    .with_temperature(cfg.llm.temperature),
            )
        }
        _ => {
            tracing::warn!(provider = %provider, "No API key set or provider unknown, using Mock LLM");
            Arc::new(MockLlmClient)
        }
    };

    if cfg.llm.retry.max_retries > 0 {
        Arc::new(RetryingLlmClient::new(base, RetryConfig::from(&cfg.llm.retry)))
    } else {
        base
    }
}
