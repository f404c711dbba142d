//! 可观测性：tracing 订阅器
//!
//! 默认 info，可通过 RUST_LOG 覆盖；日志写 stderr，stdout 只留给最终回答。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 安装全局订阅器；已安装过时返回错误而不 panic
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
}
