//! 记忆层：对话消息模型与会话历史

pub mod conversation;

pub use conversation::{validate_sequence, ChatSession, Message, Role, ToolCall};
