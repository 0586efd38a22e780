//! Tool System
//!
//! Actions are named, schema-described handlers offered to the model.
//! They are built with [`Action::builder`] and stored in an [`ActionRegistry`]
//! that the agent loop consults when dispatching a model's tool call.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::context::ActionContext;
use crate::error::{AgentError, Result};

/// Decoded tool arguments
pub type Args = Map<String, Value>;

/// Parameter names reserved for context injection; never advertised.
pub const RESERVED_PARAMS: [&str; 2] = ["action_context", "action_agent"];

/// Description used when none is supplied
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Declared type of a handler parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    Unknown,
}

impl ParamType {
    /// JSON Schema type name
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String | Self::Unknown => "string",
            Self::Integer | Self::Float => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Parameter declaration used to derive an action's JSON schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default value; parameters without one are required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSchema {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            default: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Build a JSON schema object from parameter declarations.
///
/// Reserved context-injection names are skipped.
pub fn derive_parameters(params: &[ParameterSchema]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        if RESERVED_PARAMS.contains(&param.name.as_str()) {
            continue;
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!(param.param_type.json_type()));
        if let Some(description) = &param.description {
            schema.insert("description".into(), json!(description));
        }
        properties.insert(param.name.clone(), Value::Object(schema));

        if param.is_required() {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Callable behind an action
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action. Errors are caught by the environment and fed back to
    /// the model as a failure result.
    async fn call(&self, context: &ActionContext, args: Args) -> anyhow::Result<Value>;
}

/// Adapter for synchronous closures
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> ActionHandler for FnHandler<F>
where
    F: Fn(&ActionContext, Args) -> anyhow::Result<Value> + Send + Sync,
{
    async fn call(&self, context: &ActionContext, args: Args) -> anyhow::Result<Value> {
        (self.0)(context, args)
    }
}

/// A registered capability
#[derive(Clone)]
pub struct Action {
    name: String,
    description: String,
    parameters: Value,
    terminal: bool,
    tags: BTreeSet<String>,
    handler: Arc<dyn ActionHandler>,
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("terminal", &self.terminal)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Action {
    pub fn builder(name: impl Into<String>) -> ActionBuilder {
        ActionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON schema of the arguments
    pub const fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// Whether calling this action ends the agent loop
    pub const fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.tags.contains(*t))
    }

    /// Copy of this action advertised under a different description
    #[must_use]
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self.clone()
        }
    }

    /// Invoke the handler directly
    pub async fn execute(&self, context: &ActionContext, args: Args) -> anyhow::Result<Value> {
        self.handler.call(context, args).await
    }
}

/// Explicit registration call building an [`Action`]
pub struct ActionBuilder {
    name: String,
    description: Option<String>,
    params: Vec<ParameterSchema>,
    parameters_override: Option<Value>,
    terminal: bool,
    tags: BTreeSet<String>,
    handler: Option<Arc<dyn ActionHandler>>,
}

impl ActionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
            parameters_override: None,
            terminal: false,
            tags: BTreeSet::new(),
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a parameter used for schema derivation
    pub fn parameter(mut self, param: ParameterSchema) -> Self {
        self.params.push(param);
        self
    }

    /// Use an explicit schema instead of deriving one
    pub fn parameters_override(mut self, schema: Value) -> Self {
        self.parameters_override = Some(schema);
        self
    }

    pub const fn terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn handler<H: ActionHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn handler_fn<F>(self, f: F) -> Self
    where
        F: Fn(&ActionContext, Args) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.handler(FnHandler(f))
    }

    pub fn build(mut self) -> Result<Action> {
        let handler = self.handler.take().ok_or_else(|| {
            AgentError::Config(format!("Action '{}' has no handler", self.name))
        })?;
        Ok(self.finish(handler))
    }

    /// Build with `handler`, replacing any handler set earlier
    pub fn build_with<H: ActionHandler + 'static>(self, handler: H) -> Action {
        self.finish(Arc::new(handler))
    }

    fn finish(self, handler: Arc<dyn ActionHandler>) -> Action {
        let parameters = self
            .parameters_override
            .unwrap_or_else(|| derive_parameters(&self.params));

        Action {
            name: self.name,
            description: self.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.into()),
            parameters,
            terminal: self.terminal,
            tags: self.tags,
            handler,
        }
    }
}

/// Registry for available actions
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: Vec<Action>,
    index: HashMap<String, usize>,
    by_tag: HashMap<String, Vec<String>>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action, replacing any action with the same name in place
    pub fn register(&mut self, action: Action) {
        let name = action.name.clone();

        for names in self.by_tag.values_mut() {
            names.retain(|n| *n != name);
        }
        self.by_tag.retain(|_, names| !names.is_empty());
        for tag in &action.tags {
            self.by_tag.entry(tag.clone()).or_default().push(name.clone());
        }

        info!(tool = %name, terminal = action.terminal, "registered action");

        if let Some(&slot) = self.index.get(&name) {
            self.actions[slot] = action;
        } else {
            self.index.insert(name, self.actions.len());
            self.actions.push(action);
        }
    }

    /// Build and register in one step
    pub fn register_tool(&mut self, builder: ActionBuilder) -> Result<()> {
        self.register(builder.build()?);
        Ok(())
    }

    /// Exact lookup by name
    pub fn get_action(&self, name: &str) -> Option<&Action> {
        self.index.get(name).map(|&slot| &self.actions[slot])
    }

    /// Actions matching any of `tags`, or all actions when `tags` is empty.
    ///
    /// Registration order is preserved and no action appears twice.
    pub fn get_actions(&self, tags: &[&str]) -> Vec<&Action> {
        if tags.is_empty() {
            return self.actions.iter().collect();
        }
        self.actions.iter().filter(|a| a.has_any_tag(tags)).collect()
    }

    /// Names indexed under `tag`
    pub fn actions_by_tag(&self, tag: &str) -> &[String] {
        self.by_tag.get(tag).map_or(&[], Vec::as_slice)
    }

    /// Action names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

/// Extract a non-negative integer. Models often send `1.0` or `"1"` for
/// parameters advertised as "number", so both are accepted.
pub fn require_usize(args: &Args, key: &str) -> anyhow::Result<usize> {
    let value = args
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {key}"))?;

    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX.into())
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| anyhow::anyhow!("Parameter '{key}' must be a non-negative integer, got {value}"))
}

/// Extract a required string parameter
pub fn require_str<'a>(args: &'a Args, key: &str) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {key}"))
}

/// Extract an optional string parameter
pub fn optional_str<'a>(args: &'a Args, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}
