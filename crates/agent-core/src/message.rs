//! Conversation Messages
//!
//! Role-tagged entries shared by memory, prompts and the log sink.

use serde::{Deserialize, Serialize};

use crate::provider::{ModelReply, ToolCallRequest};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Goal summary sent ahead of the transcript
    System,
    /// Task input and tool results
    User,
    /// Model reply
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a prompt or memory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Tool calls carried by an assistant reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Record a model reply as an assistant entry.
    ///
    /// Content falls back to an empty string; tool calls are kept verbatim.
    pub fn from_reply(reply: &ModelReply) -> Self {
        let mut msg = Self::assistant(reply.content().unwrap_or_default());
        if !reply.tool_calls().is_empty() {
            msg.tool_calls = Some(reply.tool_calls().to_vec());
        }
        msg
    }

    /// Whether this message carries tool calls
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_from_tool_reply() {
        let reply = ModelReply::tool_call("implement_next_move", r#"{"row": 0, "col": 0}"#);
        let msg = Message::from_reply(&reply);

        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "");
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn test_serialization_skips_empty_tool_calls() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }
}
