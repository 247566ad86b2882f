//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按顺序回放预设的回复，并记录每次请求（消息条数、是否附带工具目录、温度），
//! 便于断言编排循环的调用次数与终止行为。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::memory::{Message, ToolCall};

/// 一次被记录的补全请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub message_count: usize,
    pub with_tools: bool,
    pub temperature: f32,
    pub last_role: Option<crate::memory::Role>,
}

/// 脚本化客户端：回复用尽后返回 fallback（默认 "(no more scripted replies)"）
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Result<Message, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fallback: Option<Message>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条纯文本回复
    pub fn reply_text(self, content: &str) -> Self {
        self.push(Ok(Message::assistant(content)))
    }

    /// 追加一条工具调用回复：calls 为 (name, arguments JSON)
    pub fn reply_tools(self, calls: &[(&str, &str)]) -> Self {
        let turn = self.replies.lock().map(|r| r.len()).unwrap_or(0);
        let tool_calls = calls
            .iter()
            .enumerate()
            .map(|(i, (name, args))| ToolCall::new(format!("call_{turn}_{i}"), *name, *args))
            .collect();
        self.push(Ok(Message::assistant_with_tool_calls("", tool_calls)))
    }

    /// 追加一次失败
    pub fn reply_error(self, err: LlmError) -> Self {
        self.push(Err(err))
    }

    /// 回复用尽后一直返回该消息（用于「模型每轮都要调工具」场景）
    pub fn repeat_forever(mut self, message: Message) -> Self {
        self.fallback = Some(message);
        self
    }

    fn push(self, reply: Result<Message, LlmError>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Message, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                message_count: request.messages.len(),
                with_tools: request.tools.is_some(),
                temperature: request.temperature,
                last_role: request.messages.last().map(|m| m.role),
            });
        }

        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match next {
            Some(reply) => reply,
            None => Ok(self
                .fallback
                .clone()
                .unwrap_or_else(|| Message::assistant("(no more scripted replies)"))),
        }
    }
}
