//! 调度引擎
//!
//! 按依赖图分波次执行计划：同一波次内的子任务并发派发（受 max_parallel 限制，按计划顺序启动），
//! 波次结束后由调度器按计划顺序把结果写入 SharedContext。
//!
//! 失败策略为中止：某子任务失败后，其传递依赖方标记为 Failed 且不派发，后续波次不再派发，
//! 返回 SubtaskFailed（列出已完成与未派发的子任务）。
//! 取消：观察到取消后不再派发；Abandon 丢弃在途子任务，Drain 等待在途子任务完成并记录结果。
//! 每个派发在独立的 tokio 任务中运行，Worker panic 只让对应子任务失败；取得并发许可后子任务才进入 Running。

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::core::{ErrorKind, HiveError};
use crate::message::{Message, PriorResult, ERROR_PREFIX, META_PRIOR_RESULTS};
use crate::workers::{Worker, WorkerRegistry};
use crate::workflow::context::{ContextEntry, SharedContext};
use crate::workflow::events::{EventSink, OrchestrationEvent};
use crate::workflow::graph::PlanGraph;
use crate::workflow::types::*;

/// 派发消息的发送方
pub const DISPATCHER: &str = "manager";
/// 元数据键：派发消息对应的子任务 id
pub const META_SUBTASK_ID: &str = "subtask_id";

/// 取消时对在途子任务的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelPolicy {
    /// 丢弃在途子任务
    #[default]
    Abandon,
    /// 等待在途子任务完成并记录结果
    Drain,
}

enum Outcome {
    Completed(Message),
    Failed { kind: ErrorKind, reason: String },
    /// 取到并发许可前已取消
    NotDispatched,
}

/// 一个波次内已派发的任务；提前返回时中止仍在运行的任务
struct WaveTasks(Vec<JoinHandle<Outcome>>);

impl Drop for WaveTasks {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// 计划调度器
#[derive(Debug, Clone)]
pub struct Scheduler {
    max_parallel: usize,
    cancel_policy: CancelPolicy,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Scheduler {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.clamp(1, Semaphore::MAX_PERMITS),
            cancel_policy: CancelPolicy::default(),
        }
    }

    pub fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn cancel_policy(&self) -> CancelPolicy {
        self.cancel_policy
    }

    /// 执行计划，返回全部子任务的结果
    ///
    /// 依赖图无效（悬空依赖、环）或引用未注册 Worker 时在任何派发之前失败。
    pub async fn execute(
        &self,
        plan: &mut Plan,
        workers: &WorkerRegistry,
        cancel: &CancellationToken,
        events: &EventSink,
    ) -> Result<SharedContext, HiveError> {
        let graph = PlanGraph::new(plan)?;
        let waves = graph.waves()?;
        if let Some(s) = plan.subtasks().iter().find(|s| !workers.contains(&s.worker)) {
            return Err(HiveError::UnknownWorker {
                worker: s.worker.clone(),
            });
        }
        plan.reset();

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut context = SharedContext::new();
        let mut dispatched: HashSet<SubtaskId> = HashSet::new();

        for (index, wave) in waves.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(cancelled(&context, events));
            }
            tracing::info!(wave = index, subtasks = ?wave, "wave started");
            events.emit(OrchestrationEvent::WaveStarted {
                index,
                subtasks: wave.clone(),
            });

            let mut jobs = Vec::with_capacity(wave.len());
            for id in &wave {
                let Some(subtask) = plan.get(id) else {
                    continue;
                };
                let worker = workers
                    .get(&subtask.worker)
                    .ok_or_else(|| HiveError::UnknownWorker {
                        worker: subtask.worker.clone(),
                    })?;
                jobs.push((id.clone(), worker, dispatch_message(subtask, &context)));
            }

            let (started_tx, mut started_rx) = mpsc::unbounded_channel();
            let mut launched = Vec::with_capacity(jobs.len());
            let mut tasks = WaveTasks(Vec::with_capacity(jobs.len()));
            for (id, worker, msg) in jobs {
                plan.set_status(&id, SubtaskStatus::Ready);
                tasks.0.push(tokio::spawn(dispatch(
                    worker,
                    msg,
                    id.clone(),
                    Arc::clone(&semaphore),
                    cancel.clone(),
                    events.clone(),
                    started_tx.clone(),
                )));
                launched.push(id);
            }
            drop(started_tx);

            let abandon = self.cancel_policy == CancelPolicy::Abandon;
            let joined = {
                let all = join_all(tasks.0.iter_mut());
                tokio::pin!(all);
                loop {
                    tokio::select! {
                        biased;
                        Some(id) = started_rx.recv() => plan.set_status(&id, SubtaskStatus::Running),
                        _ = cancel.cancelled(), if abandon => {
                            for id in &launched {
                                if plan.status_of(id) == Some(SubtaskStatus::Running) {
                                    plan.set_status(id, SubtaskStatus::Failed);
                                }
                            }
                            return Err(cancelled(&context, events));
                        }
                        joined = &mut all => break joined,
                    }
                }
            };

            let outcomes: Vec<Outcome> = launched
                .iter()
                .zip(joined)
                .map(|(id, result)| match result {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        let reason = join_failure_reason(err);
                        let worker = plan.get(id).map(|s| s.worker.clone()).unwrap_or_default();
                        tracing::error!(subtask = %id, worker = %worker, reason = %reason, "dispatch crashed");
                        events.emit(OrchestrationEvent::SubtaskFailed {
                            id: id.clone(),
                            worker,
                            kind: ErrorKind::SubtaskFailed,
                            reason: reason.clone(),
                        });
                        Outcome::Failed {
                            kind: ErrorKind::SubtaskFailed,
                            reason,
                        }
                    }
                })
                .collect();

            let mut failures = Vec::new();
            for (id, outcome) in launched.iter().zip(outcomes) {
                let worker = plan.get(id).map(|s| s.worker.clone()).unwrap_or_default();
                match outcome {
                    Outcome::Completed(reply) => {
                        dispatched.insert(id.clone());
                        plan.set_status(id, SubtaskStatus::Done);
                        context.record(ContextEntry {
                            subtask_id: id.clone(),
                            worker,
                            output: reply.content().to_string(),
                            metadata: reply.metadata().clone(),
                            completed_at: reply.timestamp(),
                        });
                    }
                    Outcome::Failed { kind, reason } => {
                        dispatched.insert(id.clone());
                        plan.set_status(id, SubtaskStatus::Failed);
                        failures.push((id.clone(), worker, kind, reason));
                    }
                    Outcome::NotDispatched => plan.set_status(id, SubtaskStatus::Ready),
                }
            }

            if let Some((subtask, worker, cause, reason)) = failures.first().cloned() {
                for (failed, ..) in &failures {
                    for dependent in graph.transitive_dependents(failed) {
                        if plan.status_of(&dependent) == Some(SubtaskStatus::Failed) {
                            continue;
                        }
                        plan.set_status(&dependent, SubtaskStatus::Failed);
                        tracing::info!(subtask = %dependent, blocked_by = %failed, "skipping dependent of failed subtask");
                        events.emit(OrchestrationEvent::SubtaskSkipped {
                            id: dependent,
                            blocked_by: failed.clone(),
                        });
                    }
                }
                let skipped = plan
                    .ids()
                    .into_iter()
                    .filter(|id| !dispatched.contains(id))
                    .collect();
                tracing::error!(subtask = %subtask, worker = %worker, cause = %cause, "aborting run");
                return Err(HiveError::SubtaskFailed {
                    subtask,
                    worker,
                    cause,
                    reason,
                    completed: context.ids(),
                    skipped,
                });
            }

            if cancel.is_cancelled() {
                return Err(cancelled(&context, events));
            }
        }

        Ok(context)
    }
}

fn cancelled(context: &SharedContext, events: &EventSink) -> HiveError {
    let completed = context.ids();
    tracing::warn!(completed = ?completed, "run cancelled, no further dispatch");
    events.emit(OrchestrationEvent::Cancelled {
        completed: completed.clone(),
    });
    HiveError::Cancelled { completed }
}

/// 构造派发消息：内容为子任务描述，元数据携带子任务 id 与所依赖子任务的结果
fn dispatch_message(subtask: &Subtask, context: &SharedContext) -> Message {
    let prior: Vec<PriorResult> = subtask
        .depends_on
        .iter()
        .filter_map(|dep| context.get(dep))
        .map(ContextEntry::to_prior_result)
        .collect();

    let mut builder = Message::builder(DISPATCHER, &subtask.worker, &subtask.description)
        .metadata(META_SUBTASK_ID, Value::String(subtask.id.clone()));
    if !prior.is_empty() {
        if let Ok(value) = serde_json::to_value(&prior) {
            builder = builder.metadata(META_PRIOR_RESULTS, value);
        }
    }
    builder.build()
}

async fn dispatch(
    worker: Arc<dyn Worker>,
    msg: Message,
    id: SubtaskId,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    events: EventSink,
    started: mpsc::UnboundedSender<SubtaskId>,
) -> Outcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return Outcome::NotDispatched;
    };
    if cancel.is_cancelled() {
        return Outcome::NotDispatched;
    }
    let _ = started.send(id.clone());

    let name = worker.name().to_string();
    tracing::info!(subtask = %id, worker = %name, "dispatching subtask");
    events.emit(OrchestrationEvent::SubtaskDispatched {
        id: id.clone(),
        worker: name.clone(),
    });

    let reply = worker.process(&msg).await;
    if reply.is_error() {
        let kind = reply.error_kind().unwrap_or(ErrorKind::SubtaskFailed);
        let content = reply.content().trim_start();
        let reason = content
            .strip_prefix(ERROR_PREFIX)
            .unwrap_or(content)
            .trim()
            .to_string();
        tracing::warn!(subtask = %id, worker = %name, kind = %kind, "subtask failed");
        events.emit(OrchestrationEvent::SubtaskFailed {
            id,
            worker: name,
            kind,
            reason: reason.clone(),
        });
        Outcome::Failed { kind, reason }
    } else {
        tracing::info!(subtask = %id, worker = %name, chars = reply.content().len(), "subtask completed");
        events.emit(OrchestrationEvent::SubtaskCompleted {
            id,
            worker: name,
            chars: reply.content().chars().count(),
        });
        Outcome::Completed(reply)
    }
}

/// 派发任务未正常结束（Worker panic 或被中止）时的失败原因
fn join_failure_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return "dispatch aborted".to_string();
    }
    let payload = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("worker panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::PlanBuilder;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// 记录派发顺序与并发峰值的测试 Worker
    struct StubWorker {
        name: &'static str,
        delay: Duration,
        fail: bool,
        log: Arc<Mutex<Vec<String>>>,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Worker for StubWorker {
        fn name(&self) -> &str {
            self.name
        }

        fn role(&self) -> &str {
            "stub"
        }

        async fn process(&self, msg: &Message) -> Message {
            self.log.lock().unwrap().push(format!("start {}", self.name));
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("end {}", self.name));

            if self.fail {
                let err = HiveError::ToolNotFound { tool: "compile".into() };
                return Message::error(self.name, msg.sender(), &err);
            }
            let prior: Vec<String> = msg.prior_results().into_iter().map(|p| p.output).collect();
            Message::new(
                self.name,
                msg.sender(),
                format!("{} did '{}' with [{}]", self.name, msg.content(), prior.join(",")),
            )
        }
    }

    struct Team {
        registry: WorkerRegistry,
        log: Arc<Mutex<Vec<String>>>,
        peak: Arc<AtomicUsize>,
    }

    fn team(specs: &[(&'static str, u64, bool)]) -> Team {
        let log = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut registry = WorkerRegistry::new();
        for (name, delay_ms, fail) in specs {
            registry.register(Arc::new(StubWorker {
                name: *name,
                delay: Duration::from_millis(*delay_ms),
                fail: *fail,
                log: log.clone(),
                running: running.clone(),
                peak: peak.clone(),
            }));
        }
        Team { registry, log, peak }
    }

    fn starts(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock()
            .unwrap()
            .iter()
            .filter(|l| l.starts_with("start"))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_dependency_order_and_prior_results() {
        let t = team(&[("researcher", 20, false), ("coder", 0, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "research")
            .subtask("2", "coder", "code")
            .sequential("1", "2")
            .build()
            .unwrap();

        let ctx = Scheduler::new(4)
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::default())
            .await
            .unwrap();

        assert_eq!(
            *t.log.lock().unwrap(),
            vec!["start researcher", "end researcher", "start coder", "end coder"]
        );
        assert_eq!(ctx.get("1").unwrap().output, "researcher did 'research' with []");
        assert_eq!(
            ctx.get("2").unwrap().output,
            "coder did 'code' with [researcher did 'research' with []]"
        );
        assert!(plan.subtasks().iter().all(|s| s.status == SubtaskStatus::Done));
    }

    #[tokio::test]
    async fn test_failure_aborts_and_skips_dependents() {
        let t = team(&[("researcher", 0, true), ("coder", 0, false), ("writer", 0, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "research")
            .subtask("2", "coder", "code")
            .subtask("3", "writer", "write")
            .sequential("1", "2")
            .sequential("2", "3")
            .build()
            .unwrap();

        let err = Scheduler::new(4)
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::default())
            .await
            .unwrap_err();

        match err {
            HiveError::SubtaskFailed { subtask, worker, cause, reason, completed, skipped } => {
                assert_eq!(subtask, "1");
                assert_eq!(worker, "researcher");
                assert_eq!(cause, ErrorKind::ToolNotFound);
                assert!(reason.contains("compile"));
                assert!(completed.is_empty());
                assert_eq!(skipped, vec!["2", "3"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(starts(&t.log), vec!["start researcher"]);
        assert!(plan.subtasks().iter().all(|s| s.status == SubtaskStatus::Failed));
    }

    #[tokio::test]
    async fn test_same_wave_runs_concurrently() {
        let t = team(&[("researcher", 40, false), ("coder", 10, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("a", "researcher", "one")
            .subtask("b", "coder", "two")
            .build()
            .unwrap();

        let ctx = Scheduler::new(4)
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::default())
            .await
            .unwrap();

        assert_eq!(ctx.len(), 2);
        assert!(ctx.contains("a") && ctx.contains("b"));
        // 写入顺序与完成顺序无关
        assert_eq!(ctx.ids(), vec!["a", "b"]);
        assert_eq!(t.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_max_parallel_bounds_wave() {
        let t = team(&[("researcher", 10, false), ("coder", 10, false), ("writer", 10, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "x")
            .subtask("2", "coder", "y")
            .subtask("3", "writer", "z")
            .build()
            .unwrap();

        Scheduler::new(1)
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::default())
            .await
            .unwrap();

        assert_eq!(t.peak.load(Ordering::SeqCst), 1);
        assert_eq!(
            starts(&t.log),
            vec!["start researcher", "start coder", "start writer"]
        );
    }

    #[tokio::test]
    async fn test_unknown_worker_rejected_before_dispatch() {
        let t = team(&[("researcher", 0, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "x")
            .subtask("2", "designer", "y")
            .build()
            .unwrap();

        let err = Scheduler::default()
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownWorker);
        assert!(t.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_rechecked_before_dispatch() {
        let t = team(&[("researcher", 0, false), ("coder", 0, false)]);
        let mut plan = Plan::from_subtasks(vec![
            Subtask::new("0", "researcher", "free"),
            Subtask::new("1", "researcher", "a").with_deps(["2"]),
            Subtask::new("2", "coder", "b").with_deps(["1"]),
        ]);

        let err = Scheduler::default()
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicPlan);
        assert!(t.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_dispatches_nothing() {
        let t = team(&[("researcher", 0, false)]);
        let mut plan = PlanBuilder::new().subtask("1", "researcher", "x").build().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = Scheduler::default()
            .execute(&mut plan, &t.registry, &token, &EventSink::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HiveError::Cancelled { ref completed } if completed.is_empty()));
        assert!(t.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_abandon_drops_in_flight() {
        let t = team(&[("researcher", 5_000, false)]);
        let mut plan = PlanBuilder::new().subtask("1", "researcher", "x").build().unwrap();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            Scheduler::default().execute(&mut plan, &t.registry, &token, &EventSink::default()),
        )
        .await
        .expect("abandon returns promptly");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
        assert_eq!(starts(&t.log), vec!["start researcher"]);
    }

    #[tokio::test]
    async fn test_drain_finishes_in_flight_but_stops_dispatch() {
        let t = team(&[("researcher", 80, false), ("coder", 0, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "x")
            .subtask("2", "coder", "y")
            .sequential("1", "2")
            .build()
            .unwrap();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = Scheduler::new(2)
            .with_cancel_policy(CancelPolicy::Drain)
            .execute(&mut plan, &t.registry, &token, &EventSink::default())
            .await
            .unwrap_err();
        match err {
            HiveError::Cancelled { completed } => assert_eq!(completed, vec!["1"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(starts(&t.log), vec!["start researcher"]);
        assert_eq!(plan.status_of("1"), Some(SubtaskStatus::Done));
        assert_eq!(plan.status_of("2"), Some(SubtaskStatus::Pending));
    }

    #[tokio::test]
    async fn test_events_follow_execution() {
        let t = team(&[("researcher", 0, false), ("coder", 0, true)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "x")
            .subtask("2", "coder", "y")
            .sequential("1", "2")
            .build()
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _ = Scheduler::default()
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::new(Some(tx)))
            .await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(serde_json::to_value(&ev).unwrap()["type"].as_str().unwrap().to_string());
        }
        assert_eq!(
            kinds,
            vec![
                "wave_started",
                "subtask_dispatched",
                "subtask_completed",
                "wave_started",
                "subtask_dispatched",
                "subtask_failed",
            ]
        );
    }

    #[tokio::test]
    async fn test_same_plan_twice_yields_same_context() {
        let t = team(&[("researcher", 5, false), ("coder", 1, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "x")
            .subtask("2", "coder", "y")
            .subtask("3", "coder", "z")
            .depends_on("3", ["1", "2"])
            .build()
            .unwrap();
        let scheduler = Scheduler::default();
        let token = CancellationToken::new();

        let first = scheduler
            .execute(&mut plan, &t.registry, &token, &EventSink::default())
            .await
            .unwrap();
        let second = scheduler
            .execute(&mut plan, &t.registry, &token, &EventSink::default())
            .await
            .unwrap();
        assert_eq!(first.outputs(), second.outputs());
    }

    #[test]
    fn test_cancel_policy_names() {
        let p: CancelPolicy = serde_json::from_str("\"drain\"").unwrap();
        assert_eq!(p, CancelPolicy::Drain);
        assert_eq!(Scheduler::new(0).max_parallel(), 1);
    }

    struct PanickingWorker;

    #[async_trait]
    impl Worker for PanickingWorker {
        fn name(&self) -> &str {
            "writer"
        }

        fn role(&self) -> &str {
            "stub"
        }

        async fn process(&self, _msg: &Message) -> Message {
            panic!("worker bug")
        }
    }

    #[tokio::test]
    async fn test_worker_panic_fails_only_its_subtask() {
        let mut t = team(&[("researcher", 0, false), ("coder", 0, false)]);
        t.registry.register(Arc::new(PanickingWorker));
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "research")
            .subtask("2", "writer", "write")
            .subtask("3", "coder", "code")
            .sequential("2", "3")
            .build()
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = Scheduler::default()
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::new(Some(tx)))
            .await
            .unwrap_err();

        match err {
            HiveError::SubtaskFailed { subtask, worker, cause, reason, completed, skipped } => {
                assert_eq!(subtask, "2");
                assert_eq!(worker, "writer");
                assert_eq!(cause, ErrorKind::SubtaskFailed);
                assert!(reason.contains("worker panicked: worker bug"));
                assert_eq!(completed, vec!["1"]);
                assert_eq!(skipped, vec!["3"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(plan.status_of("2"), Some(SubtaskStatus::Failed));
        assert_eq!(plan.status_of("3"), Some(SubtaskStatus::Failed));

        let mut failed = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let OrchestrationEvent::SubtaskFailed { id, .. } = ev {
                failed.push(id);
            }
        }
        assert_eq!(failed, vec!["2"]);
    }

    #[tokio::test]
    async fn test_oversized_max_parallel_is_capped() {
        let scheduler = Scheduler::new(usize::MAX);
        assert_eq!(scheduler.max_parallel(), Semaphore::MAX_PERMITS);

        let t = team(&[("researcher", 0, false), ("coder", 0, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "x")
            .subtask("2", "coder", "y")
            .build()
            .unwrap();
        let ctx = scheduler
            .execute(&mut plan, &t.registry, &CancellationToken::new(), &EventSink::default())
            .await
            .unwrap();
        assert_eq!(ctx.ids(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_queued_subtask_is_not_running_until_it_holds_a_permit() {
        let t = team(&[("researcher", 5_000, false), ("coder", 0, false)]);
        let mut plan = PlanBuilder::new()
            .subtask("1", "researcher", "x")
            .subtask("2", "coder", "y")
            .build()
            .unwrap();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let err = Scheduler::new(1)
            .execute(&mut plan, &t.registry, &token, &EventSink::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(starts(&t.log), vec!["start researcher"]);
        // 在途的被丢弃；排队中的从未开始
        assert_eq!(plan.status_of("1"), Some(SubtaskStatus::Failed));
        assert_eq!(plan.status_of("2"), Some(SubtaskStatus::Ready));
    }
}
