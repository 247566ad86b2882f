//! LLM 客户端抽象
//!
//! 补全端点是系统唯一的外部线协议依赖：请求 = 模型 + 消息序列 + 温度 + 可选工具目录，
//! 响应 = 一条 assistant 消息（可能带 tool_calls）。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;
use crate::tools::ToolSpec;

/// 补全调用失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// 网络 / 连接 / 响应体解析失败
    #[error("request failed: {0}")]
    Transport(String),

    /// 端点返回了错误对象
    #[error("API error: {0}")]
    Api(String),

    #[error("response contained no choices")]
    EmptyResponse,
}

/// 一次补全请求；tools 为 None 时不附带工具目录（强制模型直接作答）
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: Option<&'a [ToolSpec]>,
    pub temperature: f32,
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式补全，返回首个 choice 的 assistant 消息
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Message, LlmError>;

    /// 模型标识（日志用）
    fn model(&self) -> &str;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
