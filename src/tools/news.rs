//! 新闻检索：nature.org newsroom 关键词搜索，返回 NewsCard 列表

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::html::extract_news_cards;
use crate::tools::models::ToolOutput;
use crate::tools::registry::parse_args;
use crate::tools::schema::parameters_for;
use crate::tools::{ScrapingClient, Tool, ToolError, ToolId};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NewsSearchArgs {
    /// The query to search for in the news articles.
    pub query: String,
}

pub struct NewsSearchTool {
    scraping: Arc<ScrapingClient>,
}

impl NewsSearchTool {
    pub fn new(scraping: Arc<ScrapingClient>) -> Self {
        Self { scraping }
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    fn id(&self) -> ToolId {
        ToolId::NewsSearch
    }

    fn description(&self) -> &str {
        "Searches for news headlines containing the query key word regarding TNC."
    }

    fn parameters_schema(&self) -> Value {
        parameters_for::<NewsSearchArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: NewsSearchArgs = parse_args(args)?;
        let html = self.scraping.fetch(&self.scraping.newsroom_url(&args.query)).await?;
        let cards = extract_news_cards(&html);
        tracing::info!(query = %args.query, count = cards.len(), "news search");
        Ok(cards.to_value())
    }
}
