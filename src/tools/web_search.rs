//! web_search 工具（离线演示实现）
//!
//! 按关键词匹配内置摘要，无网络访问；接入真实搜索时替换 execute 即可。

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::Tool;

const KNOWLEDGE: &[(&str, &str)] = &[
    ("python", "Python is a high-level programming language known for readability and versatility. Created by Guido van Rossum in 1991."),
    ("machine learning", "Machine learning is a subset of AI that enables systems to learn from data. Popular frameworks include TensorFlow, PyTorch, and scikit-learn."),
    ("web scraping", "Web scraping extracts data from websites. Common tools: BeautifulSoup, Scrapy, Selenium. Always check robots.txt and terms of service."),
    ("api", "API (Application Programming Interface) allows different software to communicate. REST and GraphQL are popular API architectures."),
    ("database", "Databases store and organize data. SQL databases (PostgreSQL, MySQL) for structured data; NoSQL (MongoDB, Redis) for flexible schemas."),
];

/// 网页搜索（演示）
pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web for information. Args: {\"query\": \"text\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"query": {"type": "string", "minLength": 1}},
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or("missing query")?;
        let lower = query.to_lowercase();
        let hit = KNOWLEDGE
            .iter()
            .find(|(key, _)| lower.contains(key))
            .map(|(_, text)| text.to_string());
        Ok(hit.unwrap_or_else(|| {
            format!("Search results for '{query}': Found general information. Key concepts include best practices, implementation strategies, and common use cases.")
        }))
    }
}
