//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `TNC__*` 覆盖（双下划线表示嵌套，如 `TNC__LLM__MODEL=gpt-4o-mini`）。
//! 密钥未写入配置时回退到 `OPENAI_API_KEY` / `SCRAPINGANT_API_KEY`。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::AgentError;

/// 内置系统提示词（找不到 config/prompts/system.txt 时使用）
const FALLBACK_SYSTEM_PROMPT: &str = "You are an AI assistant for The Nature Conservancy (TNC). \
Help users find information about TNC's work, initiatives, events and how to get involved. \
Use the available tools to look up TNC-specific information before answering, and cite the URLs you found.";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub tools: ToolsSection,
}

/// [app] 段：名称、欢迎语、系统提示词路径、日志文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// 新会话的第一条 assistant 消息
    pub welcome_message: String,
    pub system_prompt_path: Option<PathBuf>,
    /// 设置后日志写入该文件（TUI 模式下避免日志覆盖界面）
    pub log_file: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "TNC Conservation Assistant".to_string(),
            welcome_message: "Welcome to The Nature Conservancy's Conservation Assistant! How can I help you with conservation topics today?".to_string(),
            system_prompt_path: None,
            log_file: None,
        }
    }
}

/// [llm] 段：端点、模型、密钥、工具轮数上限、温度
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    /// OpenAI 兼容端点；未设置时使用 https://api.openai.com/v1
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// 单次问答中最多几轮「模型请求工具」；用尽后强制不带工具再问一次
    pub max_turns: usize,
    pub temperature: f32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: None,
            api_key: None,
            max_turns: 3,
            temperature: 0.0,
        }
    }
}

impl LlmSection {
    /// 配置中的 api_key 优先，其次 OPENAI_API_KEY；都没有时返回 MissingCredential
    pub fn resolve_api_key(&self) -> Result<String, AgentError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::MissingCredential("OPENAI_API_KEY".to_string()))
    }
}

/// [tools] 段：单次工具调用超时与抓取后端
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    pub tool_timeout_secs: u64,
    pub scraping: ScrapingSection,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
            scraping: ScrapingSection::default(),
        }
    }
}

/// [tools.scraping] 段：抓取后端地址 / 密钥、目标站点、超时、正文最大字符数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapingSection {
    pub base_url: String,
    pub api_key: Option<String>,
    pub site_url: String,
    pub timeout_secs: u64,
    pub max_result_chars: usize,
}

impl Default for ScrapingSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.scrapingant.com".to_string(),
            api_key: None,
            site_url: "https://www.nature.org".to_string(),
            timeout_secs: 60,
            max_result_chars: 8000,
        }
    }
}

/// 从 config 目录加载配置，环境变量 TNC__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 TNC__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("TNC")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 系统提示词：[app].system_prompt_path > config/prompts/system.txt > 内置
pub fn load_system_prompt(cfg: &AppConfig) -> String {
    cfg.app
        .system_prompt_path
        .iter()
        .cloned()
        .chain([
            PathBuf::from("config/prompts/system.txt"),
            PathBuf::from("../config/prompts/system.txt"),
        ])
        .find_map(|p| std::fs::read_to_string(p).ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SYSTEM_PROMPT.to_string())
}
