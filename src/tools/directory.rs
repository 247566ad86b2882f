//! 静态目录：社交媒体账号与网站结构（无外部调用）

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::{Tool, ToolError, ToolId};

const SITE_MAP_JSON: &str = include_str!("data/site_map.json");

/// TNC 官方社交媒体账号
pub fn media_accounts() -> Value {
    json!({
        "facebook": "https://www.facebook.com/thenatureconservancy/",
        "twitter": "https://x.com/nature_org",
        "linkedin": "https://www.linkedin.com/company/the-nature-conservancy/",
        "instagram": "https://www.instagram.com/nature_org/?hl=en",
        "youtube": "https://www.youtube.com/user/natureconservancy",
        "tiktok": "https://www.tiktok.com/@thenatureconservancy",
    })
}

/// nature.org 网站结构（主栏目、子页面与外链）
pub fn website_structure() -> Result<Value, serde_json::Error> {
    serde_json::from_str(SITE_MAP_JSON)
}

pub struct MediaAccountsTool;

#[async_trait]
impl Tool for MediaAccountsTool {
    fn id(&self) -> ToolId {
        ToolId::MediaAccounts
    }

    fn description(&self) -> &str {
        "Returns the public URLs for different TNC's social media accounts to follow, interact, or get updates."
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(media_accounts())
    }
}

pub struct WebsiteStructureTool;

#[async_trait]
impl Tool for WebsiteStructureTool {
    fn id(&self) -> ToolId {
        ToolId::WebsiteStructure
    }

    fn description(&self) -> &str {
        "Returns the structure of TNC's website with the main sections, subsections and external URLs. For more informed decisions and navigation regarding user requests."
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        website_structure().map_err(|e| ToolError::Request(format!("site map: {e}")))
    }
}
