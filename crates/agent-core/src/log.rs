//! Global Log Sink
//!
//! Append-only record of everything the agents said and did, keyed by agent
//! name. Written by the loop, read only by display surfaces.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Message, Role};
use crate::provider::ToolCallRequest;

/// One logged exchange
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Agent that produced or received the entry
    pub agent_session: String,

    pub role: Role,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,

    pub time: DateTime<Utc>,
}

impl LogEntry {
    /// Stamp a memory message for `agent`
    pub fn from_message(agent: impl Into<String>, message: &Message) -> Self {
        Self {
            agent_session: agent.into(),
            role: message.role,
            content: message.content.clone(),
            tool_calls: message.tool_calls.clone(),
            time: Utc::now(),
        }
    }

    /// Human-facing text: the `message` or `result` of a JSON tool result,
    /// the raw content otherwise.
    pub fn display_content(&self) -> String {
        let trimmed = self.content.trim();
        if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
            return self.content.clone();
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(body) => match body.get("message").or_else(|| body.get("result")) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            Err(_) => self.content.clone(),
        }
    }

    /// One line per tool call: `> name: arguments`
    pub fn display_tool_calls(&self) -> Option<String> {
        let calls = self.tool_calls.as_ref()?;
        Some(
            calls
                .iter()
                .map(|c| format!("> {}: {}\n", c.name, c.arguments))
                .collect(),
        )
    }
}

/// Log destination owned by the host
pub trait LogSink: Send + Sync {
    fn append(&self, entry: LogEntry);
}

/// In-process log sink (for development/testing and the CLI)
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: RwLock<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn entries_for(&self, agent: &str) -> Vec<LogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.agent_session == agent)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemoryLogSink {
    fn append(&self, entry: LogEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ModelReply;

    #[test]
    fn test_memory_sink() {
        let sink = MemoryLogSink::new();
        sink.append(LogEntry::from_message("agent", &Message::user("task")));
        sink.append(LogEntry::from_message("helper", &Message::user("sub task")));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.entries_for("agent").len(), 1);
        assert_eq!(sink.entries()[1].agent_session, "helper");

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_display_content() {
        let entry = |content: &str| LogEntry::from_message("agent", &Message::user(content));

        assert_eq!(entry("plain text").display_content(), "plain text");
        assert_eq!(
            entry(r#"{"tool_executed": false, "message": "no tool"}"#).display_content(),
            "no tool"
        );
        assert_eq!(
            entry(r#"{"tool_executed": true, "result": "Implemented a move at [0, 0]"}"#)
                .display_content(),
            "Implemented a move at [0, 0]"
        );
        assert_eq!(entry(r#"{"error": "x"}"#).display_content(), "");
    }

    #[test]
    fn test_display_tool_calls() {
        let reply = ModelReply::tool_call("implement_next_move", r#"{"row": 1}"#);
        let entry = LogEntry::from_message("agent", &Message::from_reply(&reply));
        assert_eq!(
            entry.display_tool_calls().as_deref(),
            Some("> implement_next_move: {\"row\": 1}\n")
        );
    }
}
