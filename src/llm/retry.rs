//! 调用方重试策略
//!
//! 编排核心本身不重试决策函数；需要重试时由调用方用 RetryingLlmClient 包一层。
//! 仅对瞬时错误（超时 / 限流）做指数退避，限流时优先使用服务端给出的 retry_after。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::RetrySection;
use crate::llm::{ChatMessage, LlmClient, LlmError};

/// 重试参数
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl From<&RetrySection> for RetryConfig {
    fn from(s: &RetrySection) -> Self {
        Self {
            max_retries: s.max_retries,
            initial_backoff: Duration::from_millis(s.initial_backoff_ms),
            max_backoff: Duration::from_millis(s.max_backoff_ms),
        }
    }
}

impl RetryConfig {
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// 带重试的决策函数包装
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(messages).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let wait = match &e {
                        LlmError::RateLimited { retry_after_ms } => {
                            Duration::from_millis(*retry_after_ms).min(self.config.max_backoff)
                        }
                        _ => self.config.backoff(attempt),
                    };
                    tracing::warn!(attempt, error = %e, wait_ms = wait.as_millis() as u64, "retrying llm call");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let inner = Arc::new(
            ScriptedLlmClient::new()
                .then_fail(LlmError::Timeout)
                .then_fail(LlmError::RateLimited { retry_after_ms: 1 })
                .then("done"),
        );
        let client = RetryingLlmClient::new(inner.clone(), fast());
        let out = client.complete(&[ChatMessage::user("x")]).await.unwrap();
        assert_eq!(out, "done");
        assert_eq!(inner.call_count(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let inner = Arc::new(ScriptedLlmClient::new().then_fail(LlmError::Api("401".into())));
        let client = RetryingLlmClient::new(inner.clone(), fast());
        let err = client.complete(&[ChatMessage::user("x")]).await.unwrap_err();
        assert_eq!(err, LlmError::Api("401".into()));
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = Arc::new(
            ScriptedLlmClient::new()
                .then_fail(LlmError::Timeout)
                .then_fail(LlmError::Timeout)
                .then_fail(LlmError::Timeout)
                .then("late"),
        );
        let client = RetryingLlmClient::new(inner.clone(), fast());
        assert_eq!(
            client.complete(&[ChatMessage::user("x")]).await,
            Err(LlmError::Timeout)
        );
        assert_eq!(inner.call_count(), 3);
    }

    #[test]
    fn test_backoff_is_capped() {
        let cfg = RetryConfig {
            max_retries: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
        };
        assert_eq!(cfg.backoff(0), Duration::from_millis(100));
        assert_eq!(cfg.backoff(1), Duration::from_millis(200));
        assert_eq!(cfg.backoff(5), Duration::from_millis(300));
    }
}
