//! 网页访问工具：经抓取后端取回任意 URL，HTML 转为可读文本并按配置截断

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::html::{html_to_text, looks_like_html, truncate_chars};
use crate::tools::registry::parse_args;
use crate::tools::schema::parameters_for;
use crate::tools::{ScrapingClient, Tool, ToolError, ToolId};

/// html2text 渲染宽度
const TEXT_WIDTH: usize = 120;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VisitArgs {
    /// String representation of the URL to visit.
    pub url: String,
}

pub struct VisitWebSiteTool {
    scraping: Arc<ScrapingClient>,
    max_result_chars: usize,
}

impl VisitWebSiteTool {
    pub fn new(scraping: Arc<ScrapingClient>, max_result_chars: usize) -> Self {
        Self {
            scraping,
            max_result_chars,
        }
    }
}

#[async_trait]
impl Tool for VisitWebSiteTool {
    fn id(&self) -> ToolId {
        ToolId::VisitWebSite
    }

    fn description(&self) -> &str {
        "Visit any website and returns the string representation of the web page under the given URL."
    }

    fn parameters_schema(&self) -> Value {
        parameters_for::<VisitArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: VisitArgs = parse_args(args)?;
        let url = args.url.trim();
        if url.is_empty() {
            return Err(ToolError::InvalidArguments("Missing url".to_string()));
        }
        tracing::info!(url = %url, "visit web site");

        let body = self.scraping.fetch(url).await?;
        let body = if looks_like_html(&body) {
            html_to_text(&body, TEXT_WIDTH)
        } else {
            body
        };
        Ok(Value::String(truncate_chars(body, self.max_result_chars)))
    }
}
