//! 工具层：注册表、调用器（校验 + 超时 + 审计）、调用格式，以及演示团队使用的工具

pub mod code_executor;
pub mod database;
pub mod format_document;
pub mod invoker;
pub mod registry;
pub mod schema;
pub mod validate;
pub mod web_search;

pub use code_executor::CodeExecutorTool;
pub use database::SearchDatabaseTool;
pub use format_document::FormatDocumentTool;
pub use invoker::ToolInvoker;
pub use registry::{Tool, ToolRegistry};
pub use schema::{parse_tool_call, tool_call_schema_json, validate_args, ToolCall};
pub use validate::ValidateTool;
pub use web_search::WebSearchTool;
