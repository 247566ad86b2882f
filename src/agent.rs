//! 会话适配层
//!
//! Assistant 持有系统提示词与 ToolLoop，对外提供三种入口：
//! generate_response 单轮问答（不带历史），process_message 维护 ChatSession，
//! chat_with_history 直接在调用方的消息序列上运行。
//! 所有入口都不返回错误：失败被折叠为固定的道歉文本（process_message 会把道歉作为
//! assistant 回复写入会话）；需要区分失败的调用方用 try_process_message。

use std::sync::Arc;
use std::time::Instant;

use crate::config::{load_system_prompt, AppConfig};
use crate::core::AgentError;
use crate::llm::{LlmClient, OpenAiClient};
use crate::memory::{ChatSession, Message};
use crate::react::{ToolLoop, SERVICE_FAILURE_PREFIX};
use crate::tools::{default_registry, ToolExecutor};

fn preview(s: &str) -> String {
    s.chars().take(50).collect()
}

/// 自然保护助手：系统提示词 + 工具调用循环
pub struct Assistant {
    system_message: String,
    tool_loop: ToolLoop,
}

impl Assistant {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: Arc<ToolExecutor>,
        system_message: impl Into<String>,
        max_turns: usize,
        temperature: f32,
    ) -> Self {
        Self {
            system_message: system_message.into(),
            tool_loop: ToolLoop::new(llm, executor)
                .with_max_turns(max_turns)
                .with_temperature(temperature),
        }
    }

    /// 从配置构建：解析 API key、创建 OpenAI 兼容客户端、注册六个工具
    ///
    /// 缺少 OPENAI_API_KEY 时返回 MissingCredential，而不是等到第一次请求才失败。
    pub fn from_config(cfg: &AppConfig) -> Result<Self, AgentError> {
        let api_key = cfg.llm.resolve_api_key()?;
        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            &api_key,
        ));
        let executor = Arc::new(ToolExecutor::new(
            default_registry(&cfg.tools),
            cfg.tools.tool_timeout_secs,
        )?);
        tracing::info!(model = %cfg.llm.model, "assistant initialized");

        Ok(Self::new(
            llm,
            executor,
            load_system_prompt(cfg),
            cfg.llm.max_turns,
            cfg.llm.temperature,
        ))
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    /// 替换后续调用使用的系统提示词
    pub fn set_system_message(&mut self, system_message: impl Into<String>) {
        tracing::info!("Setting new system message");
        self.system_message = system_message.into();
        tracing::debug!(system_message = %self.system_message, "new system message");
    }

    /// 累计 token 用量 (prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.tool_loop.llm().token_usage()
    }

    /// 单轮问答：[system, user]
    pub async fn generate_response(&self, question: &str) -> String {
        tracing::info!("Generating response for question: {}...", preview(question));
        let mut messages = vec![
            Message::system(self.system_message.as_str()),
            Message::user(question),
        ];
        self.tool_loop.respond(&mut messages).await
    }

    /// 追加用户消息，以 [system] + 会话历史运行循环，并把回复追加进会话（会话 +2）。
    /// 补全失败时回复为道歉文本，同样追加。
    pub async fn process_message(&self, prompt: &str, session: &mut ChatSession) -> String {
        let response = match self.run_session(prompt, session).await {
            Ok(response) => response,
            Err(e) => format!("{SERVICE_FAILURE_PREFIX}: {e}"),
        };
        session.push_assistant(response.as_str());
        tracing::debug!(message_count = session.len(), "session after processing");
        response
    }

    /// 同 process_message，但把错误交给调用方（UI 命令循环据此进入 Error 阶段）。
    /// 失败时用户消息已在会话中，assistant 回复不追加（会话 +1）。
    pub async fn try_process_message(
        &self,
        prompt: &str,
        session: &mut ChatSession,
    ) -> Result<String, AgentError> {
        let response = self.run_session(prompt, session).await?;
        session.push_assistant(response.as_str());
        tracing::debug!(message_count = session.len(), "session after processing");
        Ok(response)
    }

    /// 追加用户消息并运行循环；不写入 assistant 回复
    async fn run_session(
        &self,
        prompt: &str,
        session: &mut ChatSession,
    ) -> Result<String, AgentError> {
        tracing::info!("Processing new message: {}...", preview(prompt));
        tracing::debug!(message_count = session.len(), "session before processing");

        session.push_user(prompt);

        let mut messages = Vec::with_capacity(session.len() + 1);
        messages.push(Message::system(self.system_message.as_str()));
        messages.extend(session.messages().iter().map(Message::to_plain));

        let start = Instant::now();
        let response = self.tool_loop.run(&mut messages).await.map_err(|e| {
            tracing::error!(error = %e, "failed to process message");
            e
        })?;
        tracing::info!(
            "Response generated in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
        let (prompt_tokens, completion_tokens, total_tokens) = self.token_usage();
        tracing::debug!(prompt_tokens, completion_tokens, total_tokens, "cumulative token usage");
        Ok(response)
    }

    /// 直接在调用方持有的消息序列上运行（序列需自带 system 消息）
    pub async fn chat_with_history(&self, messages: &mut Vec<Message>) -> String {
        tracing::info!("Processing chat with history");
        tracing::debug!(message_count = messages.len(), "chat history");
        self.tool_loop.respond(messages).await
    }
}

/// 去掉模型回复中包裹 JSON 的 markdown 代码块标记
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let body = trimmed.trim_matches('`');
    let body = match body.split_once('\n') {
        Some((first, rest)) if first.trim().eq_ignore_ascii_case("json") => rest,
        _ if body.eq_ignore_ascii_case("json") => "",
        _ => body,
    };
    body.replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};
    use crate::memory::Role;
    use crate::tools::offline_registry;

    fn assistant(mock: MockLlmClient) -> (Arc<MockLlmClient>, Assistant) {
        let mock = Arc::new(mock);
        let executor = Arc::new(ToolExecutor::new(offline_registry(), 5).unwrap());
        let llm: Arc<dyn LlmClient> = mock.clone();
        (mock, Assistant::new(llm, executor, "You help with TNC.", 3, 0.0))
    }

    #[tokio::test]
    async fn test_process_message_grows_session_by_two() {
        let (mock, assistant) = assistant(
            MockLlmClient::new()
                .reply_tools(&[("event_search", r#"{"region":"NY","key_word":"hike"}"#)])
                .reply_text("There are four events."),
        );
        let mut session = ChatSession::with_welcome("Welcome!");

        let reply = assistant.process_message("Any hikes?", &mut session).await;

        assert_eq!(reply, "There are four events.");
        assert_eq!(session.len(), 3);
        let last = &session.messages()[2];
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "There are four events.");
        assert!(last.tool_calls.is_empty());

        // system + welcome + user
        assert_eq!(mock.requests()[0].message_count, 3);
    }

    #[tokio::test]
    async fn test_process_message_failure_appends_apology() {
        let (_mock, assistant) = assistant(
            MockLlmClient::new().reply_error(LlmError::Transport("dns failure".into())),
        );
        let mut session = ChatSession::new();

        let reply = assistant.process_message("Hello", &mut session).await;

        assert_eq!(
            reply,
            "Oops, something went wrong with the AI service: LLM error: request failed: dns failure"
        );
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[1].role, Role::Assistant);
        assert_eq!(session.messages()[1].content, reply);
    }

    #[tokio::test]
    async fn test_try_process_message_failure_keeps_user_turn_only() {
        let (_mock, assistant) = assistant(
            MockLlmClient::new().reply_error(LlmError::Transport("dns failure".into())),
        );
        let mut session = ChatSession::new();

        let err = assistant
            .try_process_message("Hello", &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Llm(LlmError::Transport(_))));
        assert_eq!(session.len(), 1);
        assert_eq!(session.messages()[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_history_is_replayed_as_plain_turns() {
        let (mock, assistant) = assistant(
            MockLlmClient::new()
                .reply_text("first")
                .reply_text("second"),
        );
        let mut session = ChatSession::new();

        assistant.process_message("one", &mut session).await;
        assistant.process_message("two", &mut session).await;

        assert_eq!(session.len(), 4);
        // system + user + assistant + user
        assert_eq!(mock.requests()[1].message_count, 4);
        assert_eq!(mock.requests()[1].last_role, Some(Role::User));
    }

    #[tokio::test]
    async fn test_generate_response_is_stateless() {
        let (mock, assistant) = assistant(MockLlmClient::new().reply_text("Hi there"));
        assert_eq!(assistant.generate_response("Hi").await, "Hi there");
        assert_eq!(mock.requests()[0].message_count, 2);
    }

    #[tokio::test]
    async fn test_generate_response_folds_service_error() {
        let (_mock, assistant) =
            assistant(MockLlmClient::new().reply_error(LlmError::EmptyResponse));
        let reply = assistant.generate_response("Hi").await;
        assert!(reply.starts_with("Oops, something went wrong with the AI service: "));
    }

    #[tokio::test]
    async fn test_chat_with_history_appends_to_caller_sequence() {
        let (_mock, assistant) = assistant(
            MockLlmClient::new()
                .reply_tools(&[("get_media_accounts", "{}")])
                .reply_text("Follow us on Instagram."),
        );
        let mut messages = vec![Message::system("custom"), Message::user("Socials?")];

        let reply = assistant.chat_with_history(&mut messages).await;

        assert_eq!(reply, "Follow us on Instagram.");
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[3].role, Role::Tool);
    }

    #[test]
    fn test_set_system_message() {
        let (_mock, mut assistant) = assistant(MockLlmClient::new());
        assistant.set_system_message("Be brief.");
        assert_eq!(assistant.system_message(), "Be brief.");
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("{\"plain\": true}"), "{\"plain\": true}");
    }
}
