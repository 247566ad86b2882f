//! 对话数据模型与会话历史
//!
//! Message / ToolCall 与 OpenAI Chat Completions 的消息结构一一对应；
//! ChatSession 只保存用户可见的 user / assistant 消息，工具轮次只存在于编排器的工作序列中。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 消息角色（与 LLM API 一致，序列化为小写）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// 模型发起的一次工具调用；arguments 为模型给出的 JSON 文本，原样保留
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// 解析参数 JSON；空串视为无参数（空对象）
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.arguments)
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// 仅 assistant 消息：本轮请求的工具调用
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// 仅 tool 消息：对应的 ToolCall.id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// 仅 tool 消息：工具名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// 带工具调用的 assistant 消息（content 可为空串）
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// 工具结果消息，通过 tool_call_id 与 assistant 的调用对应
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            ..Self::plain(Role::Tool, content)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// 只保留 role + content（会话历史转发给模型时使用）
    pub fn to_plain(&self) -> Self {
        Self::plain(self.role, self.content.clone())
    }
}

/// 校验消息序列的角色顺序：system 只能出现在首位；每条 tool 消息必须回应
/// 之前最近一条 assistant 消息中的某个调用 id，且该 assistant 之后没有插入 user。
pub fn validate_sequence(messages: &[Message]) -> Result<(), String> {
    let mut pending: Vec<&str> = Vec::new();
    for (idx, m) in messages.iter().enumerate() {
        match m.role {
            Role::System if idx != 0 => {
                return Err(format!("system message at position {idx}"));
            }
            Role::System => {}
            Role::User => pending.clear(),
            Role::Assistant => {
                pending = m.tool_calls.iter().map(|c| c.id.as_str()).collect();
            }
            Role::Tool => {
                let id = m
                    .tool_call_id
                    .as_deref()
                    .ok_or_else(|| format!("tool message at position {idx} has no tool_call_id"))?;
                let Some(pos) = pending.iter().position(|p| *p == id) else {
                    return Err(format!("tool message at position {idx} answers unknown call {id}"));
                };
                pending.remove(pos);
            }
        }
    }
    Ok(())
}

/// 会话：一个用户的有序、只追加消息序列（user / assistant）
#[derive(Clone, Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以一条 assistant 欢迎语开场
    pub fn with_welcome(welcome: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(welcome)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn test_tool_result_carries_call_id() {
        let call = ToolCall::new("call_1", "news_search", r#"{"query":"fire"}"#);
        let msg = Message::tool_result(&call, "[]");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.name.as_deref(), Some("news_search"));
    }

    #[test]
    fn test_parse_empty_arguments() {
        let call = ToolCall::new("c", "get_media_accounts", "");
        assert_eq!(call.parse_arguments().unwrap(), serde_json::json!({}));
        let bad = ToolCall::new("c", "news_search", "{not json");
        assert!(bad.parse_arguments().is_err());
    }

    #[test]
    fn test_validate_sequence() {
        let call = ToolCall::new("a", "event_search", "{}");
        let ok = vec![
            Message::system("sys"),
            Message::user("q"),
            Message::assistant_with_tool_calls("", vec![call.clone()]),
            Message::tool_result(&call, "[]"),
            Message::assistant("done"),
        ];
        assert!(validate_sequence(&ok).is_ok());

        let late_system = vec![Message::user("q"), Message::system("sys")];
        assert!(validate_sequence(&late_system).is_err());

        let orphan = vec![Message::user("q"), Message::tool_result(&call, "[]")];
        assert!(validate_sequence(&orphan).is_err());
    }

    #[test]
    fn test_to_plain_drops_tool_data() {
        let call = ToolCall::new("a", "event_search", "{}");
        let msg = Message::assistant_with_tool_calls("text", vec![call]);
        let plain = msg.to_plain();
        assert!(plain.tool_calls.is_empty());
        assert_eq!(plain.content, "text");
    }

    #[test]
    fn test_session_welcome_and_clear() {
        let mut session = ChatSession::with_welcome("Welcome!");
        session.push_user("hello");
        session.push_assistant("hi");
        assert_eq!(session.len(), 3);
        assert_eq!(session.messages()[0].role, Role::Assistant);
        session.clear();
        assert!(session.is_empty());
    }
}
