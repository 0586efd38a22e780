//! Reasoning Loop
//!
//! Think → act → record → check termination, until the model stops calling
//! tools, calls a terminal action, or the iteration cap is hit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::ActionContext;
use crate::environment::{ActionOutcome, Environment};
use crate::error::{AgentError, Result};
use crate::language::{AgentLanguage, FunctionCallingLanguage, Goal, Invocation};
use crate::log::{LogEntry, LogSink};
use crate::memory::{DEFAULT_MAX_HISTORY, Memory};
use crate::message::Message;
use crate::provider::{ModelClient, ModelReply};
use crate::registry::CALL_AGENT;
use crate::tool::{Action, ActionRegistry};

/// What to do when the model names a tool that is not registered.
///
/// `Terminate` treats the reply as "no action" for the termination check
/// even though an error result was recorded. `Retry` keeps looping so the
/// model can read the error and pick a real tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownToolPolicy {
    #[default]
    Terminate,
    Retry,
}

/// Agent configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum loop iterations per run
    pub max_iterations: usize,

    pub unknown_tool_policy: UnknownToolPolicy,

    /// Keep looping when a terminal action was called but failed
    pub retry_failed_terminal: bool,

    /// Read window for memories created by [`Agent::ask`]
    pub max_history: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            unknown_tool_policy: UnknownToolPolicy::default(),
            retry_failed_terminal: false,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Why a run stopped
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "tool", rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without calling a tool
    NoAction,
    /// A terminal action was called
    TerminalAction(String),
    /// The model called an unregistered tool
    UnknownTool(String),
    /// The iteration cap was reached
    MaxIterations,
}

/// Summary of a finished run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub iterations: usize,
    pub stop_reason: StopReason,
}

/// The main Agent struct
pub struct Agent {
    name: String,
    goals: Vec<Goal>,
    language: Arc<dyn AgentLanguage>,
    actions: ActionRegistry,
    model: Arc<dyn ModelClient>,
    environment: Environment,
    tags: Vec<String>,
    log: Option<Arc<dyn LogSink>>,
    config: AgentConfig,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("goals", &self.goals.len())
            .field("actions", &self.actions)
            .field("model", &self.model.name())
            .field("tags", &self.tags)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Append a goal, e.g. a difficulty level chosen at runtime
    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    pub const fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run on a fresh memory and return the transcript
    pub async fn ask(&self, task: &str, context: &ActionContext) -> Result<Memory> {
        let mut memory = Memory::with_max_history(self.config.max_history);
        self.run(task, &mut memory, context).await?;
        Ok(memory)
    }

    /// Execute the loop, appending to `memory`.
    ///
    /// Model failures propagate; tool failures are recorded and the loop
    /// carries on.
    pub async fn run(
        &self,
        task: &str,
        memory: &mut Memory,
        context: &ActionContext,
    ) -> Result<RunOutcome> {
        self.set_current_task(memory, task);

        let advertised = self.advertised_actions(context);
        let advertised: Vec<&Action> = advertised.iter().collect();

        for iteration in 1..=self.config.max_iterations {
            // 1. think
            let prompt = self.language.construct_prompt(
                &advertised,
                &self.environment,
                &self.goals,
                memory,
            );
            self.trace(context, iteration, "thinking", "");

            let reply = self.model.generate(&prompt).await?;
            self.record(memory, Message::from_reply(&reply));
            self.trace(context, iteration, "decision", &reply.to_string());

            // 2. act
            let (action, invocation) = self.get_action(&advertised, &reply);
            let outcome = match (&invocation.tool, action) {
                (None, _) => ActionOutcome::no_action(),
                (Some(name), None) => {
                    warn!(agent = %self.name, tool = %name, "model called an unknown tool");
                    ActionOutcome::unknown_tool(name)
                }
                (Some(_), Some(action)) => {
                    let outcome = self
                        .environment
                        .execute_action(action, context, invocation.args)
                        .await;
                    self.trace(context, iteration, "action result", &outcome.to_json_string());
                    outcome
                }
            };

            // 3. record
            self.record(memory, Message::user(outcome.to_json_string()));

            // 4. check termination
            if let Some(stop_reason) = self.should_terminate(&advertised, &reply, &outcome) {
                debug!(agent = %self.name, iteration, reason = ?stop_reason, "run finished");
                return Ok(RunOutcome {
                    iterations: iteration,
                    stop_reason,
                });
            }
        }

        warn!(
            agent = %self.name,
            max_iterations = self.config.max_iterations,
            "iteration cap reached"
        );
        Ok(RunOutcome {
            iterations: self.config.max_iterations,
            stop_reason: StopReason::MaxIterations,
        })
    }

    /// Resolve the reply's invocation against the actions offered this run.
    /// A registered action outside the agent's tags counts as unknown.
    fn get_action<'a>(
        &self,
        advertised: &[&'a Action],
        reply: &ModelReply,
    ) -> (Option<&'a Action>, Invocation) {
        let invocation = self.language.parse_response(reply);
        let action = invocation
            .tool
            .as_deref()
            .and_then(|name| advertised.iter().copied().find(|a| a.name() == name));
        (action, invocation)
    }

    /// Re-parses the reply on its own, independent of how execution went.
    fn should_terminate(
        &self,
        advertised: &[&Action],
        reply: &ModelReply,
        outcome: &ActionOutcome,
    ) -> Option<StopReason> {
        let (action, invocation) = self.get_action(advertised, reply);

        match (invocation.tool, action) {
            (None, _) => Some(StopReason::NoAction),
            (Some(name), None) => match self.config.unknown_tool_policy {
                UnknownToolPolicy::Terminate => Some(StopReason::UnknownTool(name)),
                UnknownToolPolicy::Retry => None,
            },
            (Some(name), Some(action)) => {
                let failed = !outcome.tool_executed && self.config.retry_failed_terminal;
                (action.is_terminal() && !failed).then_some(StopReason::TerminalAction(name))
            }
        }
    }

    /// Actions offered to the model this run.
    ///
    /// The delegation action is re-described with the peers currently in the
    /// context's agent registry; the registered action itself is untouched.
    fn advertised_actions(&self, context: &ActionContext) -> Vec<Action> {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();

        self.actions
            .get_actions(&tags)
            .into_iter()
            .map(|action| match context.agent_registry() {
                Some(registry) if action.name() == CALL_AGENT => action.with_description(format!(
                    "Call another agent to finish a task. List of available agents: {:?}",
                    registry.agent_names()
                )),
                _ => action.clone(),
            })
            .collect()
    }

    /// Seed memory (and the log) with the user's task
    fn set_current_task(&self, memory: &mut Memory, task: &str) {
        self.record(memory, Message::user(task));
    }

    fn record(&self, memory: &mut Memory, message: Message) {
        if let Some(log) = &self.log {
            log.append(LogEntry::from_message(&self.name, &message));
        }
        memory.add_memory(message);
    }

    fn trace(&self, context: &ActionContext, iteration: usize, step: &str, detail: &str) {
        if context.debug {
            info!(agent = %self.name, iteration, ui = %context.ui_mode, "{step} {detail}");
        } else {
            debug!(agent = %self.name, iteration, "{step} {detail}");
        }
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    name: String,
    goals: Vec<Goal>,
    language: Arc<dyn AgentLanguage>,
    actions: ActionRegistry,
    model: Option<Arc<dyn ModelClient>>,
    tags: Vec<String>,
    log: Option<Arc<dyn LogSink>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goals: Vec::new(),
            language: Arc::new(FunctionCallingLanguage),
            actions: ActionRegistry::new(),
            model: None,
            tags: Vec::new(),
            log: None,
            config: AgentConfig::default(),
        }
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goals.push(Goal::new(goal));
        self
    }

    pub fn goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goals.extend(goals.into_iter().map(Goal::new));
        self
    }

    pub fn language(mut self, language: Arc<dyn AgentLanguage>) -> Self {
        self.language = language;
        self
    }

    pub fn actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    pub fn model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    /// Only advertise actions carrying one of these tags
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let model = self
            .model
            .ok_or_else(|| AgentError::Config("Model client is required".into()))?;

        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        Ok(Agent {
            name: self.name,
            goals: self.goals,
            language: self.language,
            actions: self.actions,
            model,
            environment: Environment::new(),
            tags: self.tags,
            log: self.log,
            config: self.config,
        })
    }
}
