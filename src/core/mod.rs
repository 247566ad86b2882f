//! 核心编排层：错误类型、UI 状态投影、命令循环

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::AgentError;
pub use orchestrator::{create_agent, Command};
pub use state::{AgentPhase, UiState};
