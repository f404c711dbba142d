//! 演示团队：researcher / coder / reviewer / writer 四个 Worker 及各自的工具

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::LlmClient;
use crate::tools::{
    CodeExecutorTool, FormatDocumentTool, SearchDatabaseTool, ToolInvoker, ToolRegistry,
    ValidateTool, WebSearchTool,
};
use crate::workers::{CodingWorker, ResearchWorker, ReviewWorker, WorkerRegistry, WritingWorker};

/// 组建软件开发团队；所有 Worker 共用同一决策函数，工具超时取自 [tools] 配置
pub fn create_software_team(llm: Arc<dyn LlmClient>, config: &AppConfig) -> WorkerRegistry {
    let timeout = config.tools.tool_timeout_secs;
    let invoker = |registry: ToolRegistry| ToolInvoker::new(registry, timeout);

    let research_tools = ToolRegistry::new().with(WebSearchTool).with(SearchDatabaseTool);
    let coding_tools = ToolRegistry::new().with(CodeExecutorTool);
    let review_tools = ToolRegistry::new().with(ValidateTool);
    let writing_tools = ToolRegistry::new().with(FormatDocumentTool);

    WorkerRegistry::new()
        .with(ResearchWorker::new(Arc::clone(&llm), invoker(research_tools)))
        .with(CodingWorker::new(Arc::clone(&llm), invoker(coding_tools)))
        .with(ReviewWorker::new(Arc::clone(&llm), invoker(review_tools)))
        .with(WritingWorker::new(llm, invoker(writing_tools)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_team_composition() {
        let team = create_software_team(Arc::new(MockLlmClient), &AppConfig::default());
        assert_eq!(team.names(), vec!["researcher", "coder", "reviewer", "writer"]);
        assert!(team
            .roles()
            .iter()
            .any(|(_, role)| role.starts_with("Writing Specialist")));
    }
}
