//! # agent-runtime
//!
//! Model clients for the agent loop.
//!
//! ## Clients
//!
//! - **Chat** (default): any OpenAI-compatible `/chat/completions` endpoint,
//!   Cerebras out of the box
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{ChatClient, ChatConfig};
//!
//! let client = ChatClient::from_config(ChatConfig::from_env())?;
//! let agent = Agent::builder("player")
//!     .model(Arc::new(client))
//!     .build()?;
//! ```

pub mod chat;

pub use chat::{ChatClient, ChatConfig};

// Re-export core types for convenience
pub use agent_core::{
    Action, ActionContext, ActionRegistry, Agent, AgentError, Memory, Message, ModelClient,
    ModelReply, Prompt, Result, Role,
};
