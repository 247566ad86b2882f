//! 工具调用编排：有界的「请求模型 -> 执行工具 -> 回填结果」循环

pub mod loop_;

pub use loop_::{ToolLoop, DEFAULT_MAX_TURNS, SERVICE_FAILURE_PREFIX};
