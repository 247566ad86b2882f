//! UI 状态投影
//!
//! UI 只持有轻量的 UiState（阶段、会话历史、输入锁、错误）；会话本体由命令循环持有。

use serde::Serialize;

use crate::memory::Message;

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug, Serialize)]
pub struct UiState {
    pub phase: AgentPhase,
    pub history: Vec<Message>,
    pub input_locked: bool,
    pub error_message: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            phase: AgentPhase::Idle,
            history: Vec::new(),
            input_locked: false,
            error_message: None,
        }
    }
}

impl UiState {
    /// 空闲态：解锁输入并展示最新历史
    pub fn idle(history: Vec<Message>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    /// 处理中：锁定输入
    pub fn thinking(history: Vec<Message>) -> Self {
        Self {
            phase: AgentPhase::Thinking,
            history,
            input_locked: true,
            error_message: None,
        }
    }
}

/// Agent 阶段（UI 投影用）
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum AgentPhase {
    Idle,
    Thinking,
    Error,
}
