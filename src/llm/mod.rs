//! 决策函数层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）与调用方重试包装

pub mod mock;
pub mod openai;
pub mod retry;
pub mod traits;

pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage};
pub use retry::{RetryConfig, RetryingLlmClient};
pub use traits::{decide, ChatMessage, LlmClient, LlmError, Role};
