//! Hive - 多 Worker 协作编排核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、Orchestrator（规划 -> 调度 -> 汇总）
//! - **llm**: 决策函数抽象与实现（OpenAI 兼容 / DeepSeek / Mock）及重试包装
//! - **manager**: DelegationPlanner 与 ResultSynthesizer
//! - **message**: 参与方之间的不可变消息
//! - **observability**: tracing 初始化
//! - **team**: 演示团队工厂
//! - **tools**: 工具注册表、调用器与演示工具
//! - **workers**: Worker trait 与各角色实现
//! - **workflow**: 子任务 / 计划、依赖图、SharedContext、事件与调度引擎

pub mod config;
pub mod core;
pub mod llm;
pub mod manager;
pub mod message;
pub mod observability;
pub mod team;
pub mod tools;
pub mod workers;
pub mod workflow;

pub use crate::core::{ErrorKind, HiveError, Orchestrator, RunReport};
pub use message::Message;
