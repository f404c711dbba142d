//! Hive - 多 Worker 协作编排
//!
//! 用法：`hive [--config <file>] "<task>"`。未给出任务时依次运行内置示例。
//! 没有 API Key 时使用 Mock 决策函数，流程照常跑通。Ctrl-C 取消当前 Run。

use std::path::PathBuf;

use anyhow::{bail, Context};
use hive::config::{load_config, AppConfig};
use hive::core::{create_llm_from_config, Orchestrator};
use hive::team::create_software_team;
use tokio_util::sync::CancellationToken;

const EXAMPLE_TASKS: &[&str] = &[
    "Research Python web scraping best practices, write a simple scraper, and document it",
    "Create a Python function to calculate fibonacci numbers, review it, and write documentation",
    "Research REST API design, write example code, and create a usage guide",
];

fn parse_args() -> anyhow::Result<(Option<PathBuf>, Vec<String>)> {
    let mut config_path = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let Some(path) = args.next() else {
                bail!("--config requires a file path");
            };
            config_path = Some(PathBuf::from(path));
        } else {
            words.push(arg);
        }
    }
    let tasks = if words.is_empty() {
        EXAMPLE_TASKS.iter().map(|t| t.to_string()).collect()
    } else {
        vec![words.join(" ")]
    };
    Ok((config_path, tasks))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = hive::observability::init();

    let (config_path, tasks) = parse_args()?;
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let llm = create_llm_from_config(&cfg);
    let team = create_software_team(llm.clone(), &cfg);
    let orchestrator = Orchestrator::builder(llm)
        .with_config(&cfg.orchestrator)
        .workers(team)
        .build();

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    for (i, task) in tasks.iter().enumerate() {
        println!("\n=== Task {}/{}: {task}\n", i + 1, tasks.len());
        let report = orchestrator
            .run_with_cancel(task, cancel.clone())
            .await
            .with_context(|| format!("Run failed for task: {task}"))?;
        println!("{}", report.answer);
        println!(
            "\n({} subtasks in {} ms)",
            report.plan.len(),
            report.elapsed_ms
        );
    }

    Ok(())
}
