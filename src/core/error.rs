//! Agent 错误类型
//!
//! 工具执行失败不会出现在这里（由 ToolExecutor 转为 {"error": ...} 反馈给模型）；
//! 这里只有初始化失败与中止整轮对话的错误。

use thiserror::Error;

use crate::llm::LlmError;

/// 初始化或一次完整问答过程中的致命错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 缺少凭据（如 OPENAI_API_KEY），构造 Assistant 时返回
    #[error("{0} is not set")]
    MissingCredential(String),

    #[error("Config error: {0}")]
    Config(String),

    /// 补全端点调用失败（网络、HTTP 状态、响应格式）
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// 模型给出的工具参数不是合法 JSON
    #[error("Invalid arguments for tool {tool}: {message}")]
    ToolArguments { tool: String, message: String },
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::Config(e.to_string())
    }
}
