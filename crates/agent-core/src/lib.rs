//! # agent-core
//!
//! Provider-agnostic agent action loop: goals, memory, a tool registry,
//! prompt construction and sandboxed action execution.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Agent                              │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │    Action    │  │    ModelClient      │  │
//! │  │    Loop     │──│   Registry   │──│    (Strategy)       │  │
//! │  └─────────────┘  └──────────────┘  └─────────────────────┘  │
//! │         │                │                                   │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────┐  │
//! │  │   Memory    │  │ Environment  │  │   AgentLanguage     │  │
//! │  └─────────────┘  └──────────────┘  └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ModelClient` trait keeps the loop independent of the chat backend;
//! `AgentLanguage` owns the prompt format and reply parsing.

pub mod context;
pub mod environment;
pub mod error;
pub mod language;
pub mod log;
pub mod memory;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod registry;
pub mod tool;

pub use context::{ActionContext, UiMode};
pub use environment::{ActionOutcome, Environment};
pub use error::{AgentError, Result};
pub use language::{AgentLanguage, FunctionCallingLanguage, Goal, Invocation, Prompt};
pub use log::{LogEntry, LogSink, MemoryLogSink};
pub use memory::Memory;
pub use message::{Message, Role};
pub use provider::{ModelClient, ModelReply, ToolCallRequest};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, RunOutcome, StopReason, UnknownToolPolicy};
pub use registry::{AgentRegistry, CALL_AGENT, call_agent_action};
pub use tool::{Action, ActionBuilder, ActionHandler, ActionRegistry, Args, ParamType, ParameterSchema};
