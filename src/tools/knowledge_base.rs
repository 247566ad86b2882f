//! 知识库检索：nature.org 站内关键词搜索，返回 SearchResult 列表

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::html::extract_search_results;
use crate::tools::models::ToolOutput;
use crate::tools::registry::parse_args;
use crate::tools::schema::parameters_for;
use crate::tools::{ScrapingClient, Tool, ToolError, ToolId};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct KnowledgeBaseArgs {
    /// The query to search for in the knowledge base.
    pub query: String,
}

pub struct KnowledgeBaseTool {
    scraping: Arc<ScrapingClient>,
}

impl KnowledgeBaseTool {
    pub fn new(scraping: Arc<ScrapingClient>) -> Self {
        Self { scraping }
    }
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn id(&self) -> ToolId {
        ToolId::KnowledgeBase
    }

    fn description(&self) -> &str {
        "Key word search! Searches TNC's knowledge base for articles containing the query. This function is the main source of information about TNC's initiatives, projects, reports and anything else."
    }

    fn parameters_schema(&self) -> Value {
        parameters_for::<KnowledgeBaseArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: KnowledgeBaseArgs = parse_args(args)?;
        let html = self.scraping.fetch(&self.scraping.search_url(&args.query)).await?;
        let results = extract_search_results(&html);
        tracing::info!(query = %args.query, count = results.len(), "knowledge base search");
        Ok(results.to_value())
    }
}
