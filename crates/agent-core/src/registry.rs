//! Agent Registry
//!
//! Named agents that can be reached through the `call_agent` action.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use crate::context::ActionContext;
use crate::error::AgentError;
use crate::memory::Memory;
use crate::message::Role;
use crate::reasoning::Agent;
use crate::tool::{Action, ActionHandler, Args, ParamType, ParameterSchema, require_str};

/// Name of the delegation action
pub const CALL_AGENT: &str = "call_agent";

/// Name → agent map, passed to actions through the context
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. A name that is already taken is replaced.
    pub fn register_agent(&mut self, name: impl Into<String>, agent: Arc<Agent>) {
        let name = name.into();
        info!(agent = %name, actions = agent.actions().len(), "Registered agent");
        self.agents.insert(name, agent);
    }

    pub fn get_agent(&self, name: &str) -> Option<Arc<Agent>> {
        self.agents.get(name).cloned()
    }

    /// Action names of a registered agent
    pub fn get_agent_tool_registry(&self, name: &str) -> Option<Vec<String>> {
        self.agents.get(name).map(|agent| {
            agent
                .actions()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect()
        })
    }

    /// Sorted agent names
    pub fn agent_names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Runs a peer agent on a fresh memory and reports its last words
struct CallAgent;

#[async_trait]
impl ActionHandler for CallAgent {
    async fn call(&self, context: &ActionContext, args: Args) -> anyhow::Result<Value> {
        let name = require_str(&args, "agent_name")?;
        let task = require_str(&args, "task")?;

        let registry = context
            .agent_registry()
            .ok_or_else(|| AgentError::Config("No agent registry in context".into()))?;
        let agent = registry
            .get_agent(name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_string()))?;

        let mut memory = Memory::with_max_history(agent.config().max_history);
        let outcome = agent.run(task, &mut memory, context).await?;

        Ok(json!({
            "agent": name,
            "iterations": outcome.iterations,
            "stop_reason": outcome.stop_reason,
            "final_message": last_content(&memory, Role::Assistant),
            "final_result": memory.last().map(|m| m.content.clone()),
        }))
    }
}

fn last_content(memory: &Memory, role: Role) -> Option<String> {
    memory
        .all()
        .iter()
        .rev()
        .find(|m| m.role == role && !m.content.is_empty())
        .map(|m| m.content.clone())
}

/// The delegation action. Its description is rewritten per run with the
/// peers available in the context.
pub fn call_agent_action() -> Action {
    Action::builder(CALL_AGENT)
        .description("Call another agent to finish a task.")
        .parameter(
            ParameterSchema::new("agent_name", ParamType::String)
                .describe("Name of the agent to call"),
        )
        .parameter(
            ParameterSchema::new("task", ParamType::String).describe("Task for the called agent"),
        )
        .tag("delegation")
        .build_with(CallAgent)
}
