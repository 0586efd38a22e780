//! Agent Language
//!
//! Turns goals, memory and actions into a model request, and a model reply
//! back into an [`Invocation`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::environment::Environment;
use crate::memory::Memory;
use crate::message::Message;
use crate::provider::ModelReply;
use crate::tool::{Action, Args};

/// Upper bound on advertised tool descriptions, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 1024;

/// Keys some models wrap their arguments in
pub const ARGUMENT_ENVELOPES: [&str; 3] = ["args", "arguments", "parameters"];

/// A persistent instruction
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Goal {
    pub content: String,
}

impl Goal {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Function definition inside a tool descriptor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool entry sent to the model (OpenAI function-tool shape)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDescriptor,
}

/// Model-ready request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDescriptor>,
}

/// Parsed intent of a model reply. `tool: None` is a final answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub tool: Option<String>,
    pub args: Args,
}

/// Prompt construction and reply parsing strategy
pub trait AgentLanguage: Send + Sync {
    fn format_goals(&self, goals: &[Goal]) -> Vec<Message>;

    fn format_memory(&self, memory: &Memory) -> Vec<Message>;

    fn format_actions(&self, actions: &[&Action]) -> Vec<ToolDescriptor>;

    fn construct_prompt(
        &self,
        actions: &[&Action],
        environment: &Environment,
        goals: &[Goal],
        memory: &Memory,
    ) -> Prompt;

    fn parse_response(&self, reply: &ModelReply) -> Invocation;
}

/// Native function-calling language
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionCallingLanguage;

impl FunctionCallingLanguage {
    pub const fn new() -> Self {
        Self
    }
}

impl AgentLanguage for FunctionCallingLanguage {
    /// All goals collapse into a single system message.
    fn format_goals(&self, goals: &[Goal]) -> Vec<Message> {
        let descriptions: Vec<&str> = goals.iter().map(|g| g.content.as_str()).collect();
        vec![Message::system(format!("Main Goals: {}", descriptions.join("; ")))]
    }

    fn format_memory(&self, memory: &Memory) -> Vec<Message> {
        memory.get_memories(None).to_vec()
    }

    fn format_actions(&self, actions: &[&Action]) -> Vec<ToolDescriptor> {
        actions
            .iter()
            .map(|action| ToolDescriptor {
                kind: "function".into(),
                function: FunctionDescriptor {
                    name: action.name().to_string(),
                    description: action
                        .description()
                        .chars()
                        .take(MAX_DESCRIPTION_CHARS)
                        .collect(),
                    parameters: action.parameters().clone(),
                },
            })
            .collect()
    }

    fn construct_prompt(
        &self,
        actions: &[&Action],
        _environment: &Environment,
        goals: &[Goal],
        memory: &Memory,
    ) -> Prompt {
        let mut messages = self.format_goals(goals);
        messages.extend(self.format_memory(memory));

        Prompt {
            messages,
            tools: self.format_actions(actions),
        }
    }

    /// Only the first tool call is honoured; parallel calls in the same reply
    /// are ignored.
    fn parse_response(&self, reply: &ModelReply) -> Invocation {
        let Some(call) = reply.tool_calls().first() else {
            let content = reply
                .content()
                .map_or_else(|| reply.to_string(), str::to_string);
            let mut args = Map::new();
            args.insert("content".into(), Value::String(content));
            return Invocation { tool: None, args };
        };

        if reply.tool_calls().len() > 1 {
            debug!(
                tool = %call.name,
                ignored = reply.tool_calls().len() - 1,
                "ignoring parallel tool calls"
            );
        }

        Invocation {
            tool: Some(call.name.clone()),
            args: decode_arguments(&call.arguments),
        }
    }
}

/// Decode a raw argument payload, stripping a single wrapper envelope.
///
/// Undecodable or non-object payloads yield an empty argument set.
pub fn decode_arguments(raw: &str) -> Args {
    let mut args = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            debug!(payload = %other, "tool arguments are not an object");
            return Map::new();
        }
        Err(e) => {
            debug!(error = %e, "undecodable tool arguments");
            return Map::new();
        }
    };

    let envelope = match args.iter().next() {
        Some((key, Value::Object(_))) if args.len() == 1 => {
            ARGUMENT_ENVELOPES.contains(&key.as_str()).then(|| key.clone())
        }
        _ => None,
    };

    match envelope.and_then(|key| args.remove(&key)) {
        Some(Value::Object(inner)) => inner,
        _ => args,
    }
}
