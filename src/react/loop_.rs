//! 工具调用主循环
//!
//! 发送消息序列 + 工具目录 -> 追加 assistant 回复 -> 若无 tool_calls 则返回文本；
//! 否则按顺序逐个分发工具、追加 tool 结果消息，进入下一轮。
//! 轮数达到上限仍在请求工具时，不带工具目录再请求一次并直接返回其文本（不再分发任何工具）。

use std::sync::Arc;
use std::time::Instant;

use crate::core::AgentError;
use crate::llm::{CompletionRequest, LlmClient};
use crate::memory::Message;
use crate::tools::ToolExecutor;

/// 默认工具轮数上限
pub const DEFAULT_MAX_TURNS: usize = 3;
/// 补全服务失败时返回给用户的固定前缀
pub const SERVICE_FAILURE_PREFIX: &str = "Oops, something went wrong with the AI service";
/// 日志中内容预览的最大字符数
const CONTENT_PREVIEW_CHARS: usize = 100;
/// 日志中工具结果预览的最大字符数
const RESULT_PREVIEW_CHARS: usize = 500;

fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

/// 补全编排器：持有 LLM 与工具分发器，本身不持有消息序列
pub struct ToolLoop {
    llm: Arc<dyn LlmClient>,
    executor: Arc<ToolExecutor>,
    max_turns: usize,
    temperature: f32,
}

impl ToolLoop {
    pub fn new(llm: Arc<dyn LlmClient>, executor: Arc<ToolExecutor>) -> Self {
        Self {
            llm,
            executor,
            max_turns: DEFAULT_MAX_TURNS,
            temperature: 0.0,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    /// 在给定消息序列上运行循环（原地追加 assistant / tool 消息），返回最终文本。
    /// 补全失败或工具参数不是合法 JSON 时中止并返回错误，不重试。
    pub async fn run(&self, messages: &mut Vec<Message>) -> Result<String, AgentError> {
        let specs = self.executor.specs();
        let mut turn = 0;

        tracing::info!("Starting tool-calling process with max {} turns", self.max_turns);

        while turn < self.max_turns {
            turn += 1;
            tracing::info!("Tool-calling turn {}/{}", turn, self.max_turns);
            tracing::debug!(message_count = messages.len(), "sending request to {}", self.llm.model());

            let start = Instant::now();
            let reply = self
                .llm
                .complete(CompletionRequest {
                    messages: messages.as_slice(),
                    tools: Some(specs),
                    temperature: self.temperature,
                })
                .await?;
            tracing::info!(
                "LLM API response received in {:.2} seconds",
                start.elapsed().as_secs_f64()
            );
            tracing::debug!(
                has_content = !reply.content.is_empty(),
                content_preview = %preview(&reply.content, CONTENT_PREVIEW_CHARS),
                tool_call_count = reply.tool_calls.len(),
                "turn {} response",
                turn
            );

            if !reply.has_tool_calls() {
                tracing::info!("No tool calls made, returning final response");
                let content = reply.content.clone();
                messages.push(reply);
                return Ok(content);
            }

            let tool_calls = reply.tool_calls.clone();
            messages.push(reply);

            for call in &tool_calls {
                tracing::info!("Processing tool call: {}", call.name);
                tracing::debug!(
                    id = %call.id,
                    args = %preview(&call.arguments, CONTENT_PREVIEW_CHARS),
                    "function {} arguments",
                    call.name
                );

                let args = call
                    .parse_arguments()
                    .map_err(|e| AgentError::ToolArguments {
                        tool: call.name.clone(),
                        message: e.to_string(),
                    })?;

                let start = Instant::now();
                let result = self.executor.dispatch(&call.name, args).await;
                let result_text = result.to_string();
                tracing::info!(
                    "Function {} executed in {:.2} seconds",
                    call.name,
                    start.elapsed().as_secs_f64()
                );
                tracing::debug!(
                    result = %preview(&result_text, RESULT_PREVIEW_CHARS),
                    "function {} response",
                    call.name
                );

                messages.push(Message::tool_result(call, result_text));
            }
        }

        tracing::info!("Requesting final response after tool calls");
        let start = Instant::now();
        let reply = self
            .llm
            .complete(CompletionRequest {
                messages: messages.as_slice(),
                tools: None,
                temperature: self.temperature,
            })
            .await?;
        tracing::info!(
            "Final response received in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
        if reply.has_tool_calls() {
            tracing::warn!(
                count = reply.tool_calls.len(),
                "turn budget exhausted, ignoring tool calls in final response"
            );
        }

        let content = reply.content.trim().to_string();
        tracing::debug!(content = %preview(&content, RESULT_PREVIEW_CHARS), "final response content");
        Ok(content)
    }

    /// 同 run，但把错误折叠为固定的道歉文本
    pub async fn respond(&self, messages: &mut Vec<Message>) -> String {
        match self.run(messages).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(error = %e, "tool-calling loop aborted");
                format!("{SERVICE_FAILURE_PREFIX}: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};
    use crate::memory::{validate_sequence, Role, ToolCall};
    use crate::tools::offline_registry;

    fn tool_loop(mock: MockLlmClient) -> (Arc<MockLlmClient>, ToolLoop) {
        let mock = Arc::new(mock);
        let executor = Arc::new(ToolExecutor::new(offline_registry(), 5).unwrap());
        let llm: Arc<dyn LlmClient> = mock.clone();
        (mock, ToolLoop::new(llm, executor))
    }

    fn opening() -> Vec<Message> {
        vec![Message::system("sys"), Message::user("Any volunteer events in New York?")]
    }

    #[tokio::test]
    async fn test_plain_answer_returns_after_one_call() {
        let (mock, tl) = tool_loop(MockLlmClient::new().reply_text("Here is the answer."));
        let mut messages = opening();

        let answer = tl.run(&mut messages).await.unwrap();

        assert_eq!(answer, "Here is the answer.");
        assert_eq!(mock.call_count(), 1);
        let req = &mock.requests()[0];
        assert!(req.with_tools);
        assert_eq!(req.temperature, 0.0);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_budget_exhausted_forces_final_call_without_tools() {
        let events = r#"{"region":"New York","key_word":"volunteer"}"#;
        let mock = MockLlmClient::new()
            .reply_tools(&[("event_search", events)])
            .reply_tools(&[("event_search", events)])
            .reply_tools(&[("event_search", events)])
            .reply_text("  Final summary.  ");
        let (mock, tl) = tool_loop(mock);
        let mut messages = opening();

        let answer = tl.run(&mut messages).await.unwrap();

        assert_eq!(answer, "Final summary.");
        let requests = mock.requests();
        assert_eq!(requests.len(), DEFAULT_MAX_TURNS + 1);
        assert!(requests[..DEFAULT_MAX_TURNS].iter().all(|r| r.with_tools));
        assert!(!requests[DEFAULT_MAX_TURNS].with_tools);
        assert_eq!(requests[DEFAULT_MAX_TURNS].last_role, Some(Role::Tool));

        // system + user + 3 * (assistant + tool)；最终回复不追加
        assert_eq!(messages.len(), 2 + 2 * DEFAULT_MAX_TURNS);
        assert!(validate_sequence(&messages).is_ok());
    }

    #[tokio::test]
    async fn test_tool_calls_in_final_reply_are_ignored() {
        let forever = Message::assistant_with_tool_calls(
            "I still want to search.",
            vec![ToolCall::new("c", "news_search", r#"{"query":"fire"}"#)],
        );
        let (mock, tl) = tool_loop(MockLlmClient::new().repeat_forever(forever));
        let tl = tl.with_max_turns(2);
        let mut messages = opening();

        let answer = tl.run(&mut messages).await.unwrap();

        assert_eq!(answer, "I still want to search.");
        assert_eq!(mock.call_count(), 3);
        let tool_messages = messages.iter().filter(|m| m.role == Role::Tool).count();
        assert_eq!(tool_messages, 2);
    }

    #[tokio::test]
    async fn test_zero_budget_goes_straight_to_final_call() {
        let (mock, tl) = tool_loop(MockLlmClient::new().reply_text("direct"));
        let tl = tl.with_max_turns(0);
        let mut messages = opening();

        assert_eq!(tl.run(&mut messages).await.unwrap(), "direct");
        assert_eq!(mock.call_count(), 1);
        assert!(!mock.requests()[0].with_tools);
    }

    #[tokio::test]
    async fn test_calls_dispatched_in_order_and_correlated() {
        let mock = MockLlmClient::new()
            .reply_tools(&[
                ("get_media_accounts", "{}"),
                ("launch_rockets", r#"{"count": 3}"#),
                ("event_search", r#"{"region":"Denver","key_word":"film"}"#),
            ])
            .reply_text("done");
        let (_mock, tl) = tool_loop(mock);
        let mut messages = opening();

        assert_eq!(tl.run(&mut messages).await.unwrap(), "done");

        let assistant = &messages[2];
        let tools: Vec<&Message> = messages.iter().filter(|m| m.role == Role::Tool).collect();
        assert_eq!(tools.len(), 3);
        for (call, msg) in assistant.tool_calls.iter().zip(&tools) {
            assert_eq!(msg.tool_call_id.as_deref(), Some(call.id.as_str()));
            assert_eq!(msg.name.as_deref(), Some(call.name.as_str()));
        }

        let unknown: serde_json::Value = serde_json::from_str(&tools[1].content).unwrap();
        assert_eq!(unknown["error"], "Function launch_rockets not implemented");
        let events: serde_json::Value = serde_json::from_str(&tools[2].content).unwrap();
        assert_eq!(events.as_array().map(Vec::len), Some(4));
        assert!(validate_sequence(&messages).is_ok());
    }

    #[tokio::test]
    async fn test_transport_failure_aborts() {
        let mock = MockLlmClient::new()
            .reply_tools(&[("get_media_accounts", "")])
            .reply_error(LlmError::Transport("connection reset".into()));
        let (mock, tl) = tool_loop(mock);
        let mut messages = opening();

        let err = tl.run(&mut messages).await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(LlmError::Transport(_))));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_respond_folds_error_into_apology() {
        let (_mock, tl) =
            tool_loop(MockLlmClient::new().reply_error(LlmError::Api("rate limited".into())));
        let mut messages = opening();

        let text = tl.respond(&mut messages).await;
        assert_eq!(
            text,
            "Oops, something went wrong with the AI service: LLM error: API error: rate limited"
        );
    }

    #[tokio::test]
    async fn test_malformed_arguments_abort() {
        let mock = MockLlmClient::new()
            .reply_tools(&[("news_search", "{\"query\": ")])
            .reply_text("unreachable");
        let (mock, tl) = tool_loop(mock);
        let mut messages = opening();

        let err = tl.run(&mut messages).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolArguments { ref tool, .. } if tool == "news_search"));
        assert_eq!(mock.call_count(), 1);
    }
}
