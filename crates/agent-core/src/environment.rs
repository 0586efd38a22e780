//! Execution Environment
//!
//! Runs a resolved action and wraps whatever happens into an
//! [`ActionOutcome`]. Handler errors and panics never escape.

use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::context::ActionContext;
use crate::tool::{Action, Args};

/// Uniform result record fed back into memory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether a handler ran to completion
    pub tool_executed: bool,

    /// Handler return value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Informational note (no tool chosen)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Diagnostic trace for handler failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ActionOutcome {
    pub fn success(result: Value) -> Self {
        Self {
            tool_executed: true,
            result: Some(result),
            message: None,
            error: None,
            traceback: None,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn failure(error: impl Into<String>, traceback: impl Into<String>) -> Self {
        Self {
            tool_executed: false,
            result: None,
            message: None,
            error: Some(error.into()),
            traceback: Some(traceback.into()),
            timestamp: None,
        }
    }

    /// The model answered without calling a tool
    pub fn no_action() -> Self {
        Self {
            tool_executed: false,
            result: None,
            message: Some("LLM chose to respond without using a tool.".into()),
            error: None,
            traceback: None,
            timestamp: None,
        }
    }

    /// The model named a tool it was not offered
    pub fn unknown_tool(name: &str) -> Self {
        Self {
            tool_executed: false,
            result: None,
            message: None,
            error: Some(format!(
                "Tool '{name}' does not exist. Please check your available tools."
            )),
            traceback: None,
            timestamp: None,
        }
    }

    /// JSON form written to memory
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"tool_executed": false, "error": "unserializable result: {e}"}}"#)
        })
    }
}

/// Executes actions on behalf of the agent loop
#[derive(Clone, Copy, Debug, Default)]
pub struct Environment;

impl Environment {
    pub const fn new() -> Self {
        Self
    }

    /// Run `action` with `args`, converting any failure into a result.
    pub async fn execute_action(
        &self,
        action: &Action,
        context: &ActionContext,
        args: Args,
    ) -> ActionOutcome {
        let call = AssertUnwindSafe(action.execute(context, args)).catch_unwind();

        match call.await {
            Ok(Ok(result)) => ActionOutcome::success(result),
            Ok(Err(e)) => {
                warn!(tool = action.name(), error = %e, "action failed");
                ActionOutcome::failure(e.to_string(), format!("{e:?}"))
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".into());
                warn!(tool = action.name(), reason = %reason, "action panicked");
                ActionOutcome::failure(
                    format!("Action '{}' panicked: {reason}", action.name()),
                    format!("panic in handler of '{}': {reason}", action.name()),
                )
            }
        }
    }
}
