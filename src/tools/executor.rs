//! 工具分发器
//!
//! 持有完整的 ToolRegistry 与单次调用超时；dispatch(tool_name, args) 永不返回错误：
//! 未知工具名、参数错误、执行失败、超时一律转为 {"error": "..."} 交给模型。
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::{ToolId, ToolRegistry, ToolSpec};

/// 工具执行器：按 ToolId 查表执行，并将所有失败映射为结构化错误对象
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
    specs: Vec<ToolSpec>,
}

/// 结构化错误对象
pub fn error_value(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

impl ToolExecutor {
    /// 目录中的任一工具未注册时返回 AgentError::Config
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Result<Self, AgentError> {
        registry.ensure_complete()?;
        let specs = registry.specs();
        tracing::info!("Registered {} tools", specs.len());
        Ok(Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
            specs,
        })
    }

    /// 发送给模型的工具目录
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// 执行指定工具，返回纯数据结果或 {"error": ...}
    pub async fn dispatch(&self, tool_name: &str, args: Value) -> Value {
        let start = Instant::now();
        let args_preview = args_preview(&args);

        let (outcome, value) = match ToolId::from_name(tool_name).and_then(|id| self.registry.get(id)) {
            None => {
                tracing::error!("Function {} not implemented", tool_name);
                (
                    "unknown",
                    error_value(format!("Function {tool_name} not implemented")),
                )
            }
            Some(tool) => match timeout(self.timeout, tool.execute(args)).await {
                Ok(Ok(value)) => ("ok", value),
                Ok(Err(e)) => {
                    tracing::warn!(tool = %tool_name, error = %e, "tool execution failed");
                    ("error", error_value(e.to_string()))
                }
                Err(_) => (
                    "timeout",
                    error_value(format!(
                        "Tool {tool_name} timed out after {}s",
                        self.timeout.as_secs()
                    )),
                ),
            },
        };

        let audit = json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": outcome == "ok",
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        value
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
