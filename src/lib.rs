//! TNC 自然保护助手：带工具调用的对话前端
//!
//! 模块划分：
//! - **agent**: 会话适配层（单轮问答、维护会话历史、替换系统提示词）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、UI 状态投影、命令循环
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **memory**: 消息模型与会话历史
//! - **observability**: 日志初始化
//! - **react**: 有界的工具调用循环
//! - **tools**: 六个 TNC 查询工具、工具目录与分发器
//! - **ui**: Ratatui TUI 界面

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod tools;
pub mod ui;

pub use agent::{strip_code_fences, Assistant};
