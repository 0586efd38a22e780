//! Model Collaborator
//!
//! The loop only depends on a function `Prompt -> ModelReply`. Hosts plug in a
//! concrete client (HTTP, scripted, local) by implementing [`ModelClient`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{ModelClient, ModelReply};
//!
//! let reply = client.generate(&prompt).await?;
//! if let ModelReply::Text { content } = reply {
//!     println!("{content}");
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::language::Prompt;

/// A tool invocation requested by the model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call ID for tracking
    #[serde(default)]
    pub id: Option<String>,

    /// Tool identifier
    pub name: String,

    /// JSON-encoded argument payload, exactly as the model produced it
    pub arguments: String,
}

impl ToolCallRequest {
    /// Create a tool call with a generated ID
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: Some(format!("call_{}", uuid::Uuid::new_v4().simple())),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Reply from the model collaborator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelReply {
    /// Plain answer, no tool intent
    Text { content: String },

    /// One or more tool calls, optionally with accompanying text
    ToolCalls {
        #[serde(default)]
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Reply carrying a single tool call
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::ToolCalls {
            content: None,
            calls: vec![ToolCallRequest::new(name, arguments)],
        }
    }

    /// Build a reply from the optional fields a chat API returns.
    ///
    /// An empty call list collapses to a text reply.
    pub fn from_parts(content: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        if calls.is_empty() {
            Self::Text {
                content: content.unwrap_or_default(),
            }
        } else {
            Self::ToolCalls { content, calls }
        }
    }

    /// Text content, if any
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content),
            Self::ToolCalls { content, .. } => content.as_deref(),
        }
    }

    /// Requested tool calls (empty for text replies)
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::Text { .. } => &[],
            Self::ToolCalls { calls, .. } => calls,
        }
    }
}

impl std::fmt::Display for ModelReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text { content } => write!(f, "{content}"),
            Self::ToolCalls { content, calls } => {
                if let Some(content) = content {
                    write!(f, "{content} ")?;
                }
                let rendered: Vec<String> = calls
                    .iter()
                    .map(|c| format!("{}({})", c.name, c.arguments))
                    .collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// Strategy trait for model backends
///
/// Timeouts, retries and truncation are the implementor's concern. A reply
/// without tool intent is an ordinary `Ok`, never an error.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a reply for the prompt
    async fn generate(&self, prompt: &Prompt) -> Result<ModelReply>;

    /// Client name for logs
    fn name(&self) -> &str {
        "model"
    }
}
