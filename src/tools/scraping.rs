//! 抓取后端客户端（ScrapingAnt 兼容接口）
//!
//! GET {base_url}/v2/general?url=<目标页>&x-api-key=<key>，返回目标页 HTML 文本。
//! 知识库与新闻检索都是「拼出 nature.org 的搜索页 URL → 经抓取后端取回 HTML」。

use std::time::Duration;

use reqwest::Client;

use crate::config::ScrapingSection;
use crate::tools::ToolError;

/// 抓取客户端：持有 HTTP Client、后端地址、API Key 与站点根地址
pub struct ScrapingClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    site_url: String,
}

impl ScrapingClient {
    pub fn new(base_url: &str, api_key: Option<String>, site_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// 从 [tools.scraping] 配置构造；api_key 未配置时回退到 SCRAPINGANT_API_KEY
    pub fn from_config(cfg: &ScrapingSection) -> Self {
        let api_key = cfg
            .api_key
            .clone()
            .or_else(|| std::env::var("SCRAPINGANT_API_KEY").ok());
        Self::new(&cfg.base_url, api_key, &cfg.site_url, cfg.timeout_secs)
    }

    /// 站内搜索页
    pub fn search_url(&self, query: &str) -> String {
        format!("{}/en-us/search/?q={}", self.site_url, urlencoding::encode(query))
    }

    /// 新闻检索页
    pub fn newsroom_url(&self, query: &str) -> String {
        format!("{}/en-us/newsroom/?press_q={}", self.site_url, urlencoding::encode(query))
    }

    /// 经抓取后端取回目标页文本
    pub async fn fetch(&self, target_url: &str) -> Result<String, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredential("SCRAPINGANT_API_KEY".to_string()))?;

        tracing::debug!(target_url = %target_url, "scraping fetch");
        let resp = self
            .client
            .get(format!("{}/v2/general", self.base_url))
            .query(&[("url", target_url), ("x-api-key", api_key)])
            .send()
            .await
            .map_err(|e| ToolError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ToolError::Status(resp.status().as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::Request(format!("Read body: {e}")))?;

        // 去除 BOM，避免 HTML 检测失败
        Ok(body.strip_prefix('\u{FEFF}').map(str::to_string).unwrap_or(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_urls_are_encoded() {
        let client = ScrapingClient::new("https://api.scrapingant.com", None, "https://www.nature.org/", 5);
        assert_eq!(
            client.search_url("wetland restoration"),
            "https://www.nature.org/en-us/search/?q=wetland%20restoration"
        );
        assert_eq!(
            client.newsroom_url("fire & water"),
            "https://www.nature.org/en-us/newsroom/?press_q=fire%20%26%20water"
        );
    }

    #[tokio::test]
    async fn test_fetch_without_key() {
        let client = ScrapingClient::new("http://127.0.0.1:9", Some("  ".to_string()), "https://www.nature.org", 5);
        let err = client.fetch("https://www.nature.org").await.unwrap_err();
        assert!(matches!(err, ToolError::MissingCredential(_)));
    }

    #[tokio::test]
    async fn test_fetch_passes_target_and_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/general")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("url".into(), "https://www.nature.org/en-us/".into()),
                mockito::Matcher::UrlEncoded("x-api-key".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body("\u{FEFF}<html>ok</html>")
            .create_async()
            .await;

        let client = ScrapingClient::new(&server.url(), Some("secret".into()), "https://www.nature.org", 5);
        let body = client.fetch("https://www.nature.org/en-us/").await.unwrap();
        assert_eq!(body, "<html>ok</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2/general")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = ScrapingClient::new(&server.url(), Some("secret".into()), "https://www.nature.org", 5);
        let err = client.fetch("https://www.nature.org").await.unwrap_err();
        assert!(matches!(err, ToolError::Status(503)));
    }
}
