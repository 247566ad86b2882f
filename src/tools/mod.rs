pub mod directory;
pub mod events;
pub mod executor;
pub mod html;
pub mod knowledge_base;
pub mod models;
pub mod news;
pub mod registry;
pub mod schema;
pub mod scraping;
pub mod visit;

use std::sync::Arc;

pub use directory::{media_accounts, website_structure, MediaAccountsTool, WebsiteStructureTool};
pub use events::{event_search, EventSearchTool};
pub use executor::{error_value, ToolExecutor};
pub use knowledge_base::KnowledgeBaseTool;
pub use models::{EventCard, NewsCard, SearchResult, ToolOutput};
pub use news::NewsSearchTool;
pub use registry::{Tool, ToolError, ToolId, ToolRegistry};
pub use schema::ToolSpec;
pub use scraping::ScrapingClient;
pub use visit::VisitWebSiteTool;

use crate::config::ToolsSection;

/// 注册目录中的全部六个工具（抓取类工具共享同一个 ScrapingClient）
pub fn default_registry(cfg: &ToolsSection) -> ToolRegistry {
    let scraping = Arc::new(ScrapingClient::from_config(&cfg.scraping));

    let mut tools = ToolRegistry::new();
    tools.register(MediaAccountsTool);
    tools.register(WebsiteStructureTool);
    tools.register(VisitWebSiteTool::new(
        scraping.clone(),
        cfg.scraping.max_result_chars,
    ));
    tools.register(KnowledgeBaseTool::new(scraping.clone()));
    tools.register(EventSearchTool);
    tools.register(NewsSearchTool::new(scraping));
    tools
}

/// 抓取后端指向不可达地址且无 key：知识库 / 新闻都会以 MissingCredential 失败
#[cfg(test)]
pub(crate) fn offline_registry() -> ToolRegistry {
    let scraping = Arc::new(ScrapingClient::new(
        "http://127.0.0.1:9",
        None,
        "https://www.nature.org",
        1,
    ));
    let mut tools = ToolRegistry::new();
    tools.register(MediaAccountsTool);
    tools.register(WebsiteStructureTool);
    tools.register(VisitWebSiteTool::new(scraping.clone(), 1000));
    tools.register(KnowledgeBaseTool::new(scraping.clone()));
    tools.register(EventSearchTool);
    tools.register(NewsSearchTool::new(scraping));
    tools
}
