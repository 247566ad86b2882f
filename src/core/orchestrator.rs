//! 命令循环
//!
//! UI 通过 mpsc 发送 Command，后台任务持有 Assistant 与 ChatSession，
//! 每次状态变化通过 watch 通道推送 UiState 快照。

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::agent::Assistant;
use crate::config::AppConfig;
use crate::core::{AgentPhase, UiState};
use crate::memory::{ChatSession, Message};

/// UI -> Core 的命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 提交用户输入，跑一次完整问答
    Submit(String),
    /// 清空对话，重新放入欢迎语
    Clear,
    /// 退出应用
    Quit,
}

/// 用已加载的配置构建 Assistant（进程内仅一次），启动命令循环
///
/// 缺少 OPENAI_API_KEY 时直接返回错误，由 main 打印后退出。
pub async fn create_agent(
    cfg: &AppConfig,
) -> anyhow::Result<(mpsc::UnboundedSender<Command>, watch::Receiver<UiState>)> {
    let assistant = Assistant::from_config(cfg)?;
    Ok(spawn_command_loop(
        Arc::new(assistant),
        cfg.app.welcome_message.clone(),
    ))
}

/// 启动后台任务：消费 Command，推送 UiState
pub fn spawn_command_loop(
    assistant: Arc<Assistant>,
    welcome_message: String,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<UiState>) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let mut session = ChatSession::with_welcome(welcome_message.as_str());
    let (state_tx, state_rx) = watch::channel(UiState::idle(session.messages().to_vec()));

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                Command::Submit(input) => {
                    let input = input.trim().to_string();
                    if input.is_empty() {
                        continue;
                    }

                    // 先推送带用户消息的 Thinking 快照，再跑问答
                    let mut pending = session.messages().to_vec();
                    pending.push(Message::user(input.as_str()));
                    let _ = state_tx.send(UiState::thinking(pending));

                    let state = match assistant.try_process_message(&input, &mut session).await {
                        Ok(_) => UiState::idle(session.messages().to_vec()),
                        Err(e) => UiState {
                            phase: AgentPhase::Error,
                            history: session.messages().to_vec(),
                            input_locked: false,
                            error_message: Some(e.to_string()),
                        },
                    };
                    let _ = state_tx.send(state);
                }
                Command::Clear => {
                    session = ChatSession::with_welcome(welcome_message.as_str());
                    let _ = state_tx.send(UiState::idle(session.messages().to_vec()));
                }
                Command::Quit => break,
            }
        }
        tracing::debug!("command loop stopped");
    });

    (cmd_tx, state_rx)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llm::{LlmClient, LlmError, MockLlmClient};
    use crate::memory::Role;
    use crate::tools::{offline_registry, ToolExecutor};

    fn spawn(mock: MockLlmClient) -> (mpsc::UnboundedSender<Command>, watch::Receiver<UiState>) {
        let llm: Arc<dyn LlmClient> = Arc::new(mock);
        let executor = Arc::new(ToolExecutor::new(offline_registry(), 5).unwrap());
        let assistant = Assistant::new(llm, executor, "sys", 3, 0.0);
        spawn_command_loop(Arc::new(assistant), "Welcome!".to_string())
    }

    async fn wait_for<F: Fn(&UiState) -> bool>(rx: &mut watch::Receiver<UiState>, pred: F) -> UiState {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let state = rx.borrow_and_update().clone();
                if pred(&state) {
                    return state;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_agent_uses_given_config() {
        let mut cfg = AppConfig::default();
        cfg.llm.api_key = Some("sk-test".into());
        cfg.app.welcome_message = "Hi from the preserve".into();

        let (_tx, rx) = create_agent(&cfg).await.unwrap();
        let state = rx.borrow().clone();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].content, "Hi from the preserve");
    }

    #[tokio::test]
    async fn test_initial_state_has_welcome() {
        let (_tx, rx) = spawn(MockLlmClient::new());
        let state = rx.borrow().clone();
        assert_eq!(state.phase, AgentPhase::Idle);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].content, "Welcome!");
    }

    #[tokio::test]
    async fn test_submit_then_clear() {
        let (tx, mut rx) = spawn(MockLlmClient::new().reply_text("Hello from TNC"));

        tx.send(Command::Submit("hi".into())).unwrap();
        let state = wait_for(&mut rx, |s| s.phase == AgentPhase::Idle && s.history.len() == 3).await;
        assert_eq!(state.history[2].role, Role::Assistant);
        assert_eq!(state.history[2].content, "Hello from TNC");

        tx.send(Command::Clear).unwrap();
        let state = wait_for(&mut rx, |s| s.history.len() == 1).await;
        assert_eq!(state.history[0].content, "Welcome!");
    }

    #[tokio::test]
    async fn test_failure_moves_to_error_phase() {
        let (tx, mut rx) = spawn(MockLlmClient::new().reply_error(LlmError::Api("quota".into())));

        tx.send(Command::Submit("hi".into())).unwrap();
        let state = wait_for(&mut rx, |s| s.phase == AgentPhase::Error).await;
        assert!(!state.input_locked);
        assert_eq!(state.error_message.as_deref(), Some("LLM error: API error: quota"));
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[1].role, Role::User);
    }
}
