//! 工具注册表
//!
//! 工具集合是固定的六个（ToolId 枚举），每个 ToolId 在注册表中映射到一个 Tool 实现；
//! ToolExecutor 构造时检查目录完整性，缺失实现是构造期错误而不是运行期分支。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::core::AgentError;
use crate::tools::schema::{no_parameters, ToolSpec};

/// 模型可见的工具标识；name() 即目录中的函数名
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolId {
    MediaAccounts,
    WebsiteStructure,
    VisitWebSite,
    KnowledgeBase,
    EventSearch,
    NewsSearch,
}

impl ToolId {
    /// 目录顺序
    pub const ALL: [ToolId; 6] = [
        ToolId::MediaAccounts,
        ToolId::WebsiteStructure,
        ToolId::VisitWebSite,
        ToolId::KnowledgeBase,
        ToolId::EventSearch,
        ToolId::NewsSearch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolId::MediaAccounts => "get_media_accounts",
            ToolId::WebsiteStructure => "get_website_structure",
            ToolId::VisitWebSite => "visit_any_web_site",
            ToolId::KnowledgeBase => "search_TNC_knowledge_base",
            ToolId::EventSearch => "event_search",
            ToolId::NewsSearch => "news_search",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 单次工具执行失败；由 ToolExecutor 转为 {"error": ...}
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0} is not set")]
    MissingCredential(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {0}")]
    Status(u16),
}

/// 工具 trait：标识、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON 对象）
#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> ToolId;

    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认无参数
    fn parameters_schema(&self) -> Value {
        no_parameters()
    }

    /// 执行工具，返回纯数据（对象 / 数组 / 字符串）
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

/// 将参数对象反序列化为具体参数结构；null 视为空对象
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// 工具注册表：ToolId -> Arc<dyn Tool>，按目录顺序迭代
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolId, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册实现；同一 ToolId 重复注册时后者覆盖前者
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let id = tool.id();
        if self.tools.insert(id, Arc::new(tool)).is_some() {
            tracing::warn!(tool = %id, "tool registered twice, keeping the latest");
        }
    }

    pub fn get(&self, id: ToolId) -> Option<Arc<dyn Tool>> {
        self.tools.get(&id).cloned()
    }

    /// 目录中尚无实现的工具
    pub fn missing(&self) -> Vec<ToolId> {
        ToolId::ALL
            .into_iter()
            .filter(|id| !self.tools.contains_key(id))
            .collect()
    }

    /// 目录完整性检查：六个工具必须全部注册
    pub fn ensure_complete(&self) -> Result<(), AgentError> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = missing.iter().map(|id| id.name()).collect();
        Err(AgentError::Config(format!(
            "no implementation registered for tool(s): {}",
            names.join(", ")
        )))
    }

    /// 生成发送给模型的工具目录
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|(id, tool)| ToolSpec {
                name: id.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }
}
