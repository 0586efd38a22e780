//! Action Context
//!
//! Run-scoped dependencies handed to every action handler: the agent
//! directory, host flags and named host objects such as the game.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::registry::AgentRegistry;

/// Host surface the run is attached to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    #[default]
    Cli,
    Web,
}

impl std::fmt::Display for UiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// Read-only bag of dependencies for one invocation
#[derive(Clone, Default)]
pub struct ActionContext {
    agent_registry: Option<Arc<AgentRegistry>>,
    properties: HashMap<String, Arc<dyn Any + Send + Sync>>,

    /// Log every loop step at info level
    pub debug: bool,

    pub ui_mode: UiMode,
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.properties.keys().collect();
        keys.sort();
        f.debug_struct("ActionContext")
            .field("has_agent_registry", &self.agent_registry.is_some())
            .field("properties", &keys)
            .field("debug", &self.debug)
            .field("ui_mode", &self.ui_mode)
            .finish()
    }
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent_registry(mut self, registry: Arc<AgentRegistry>) -> Self {
        self.agent_registry = Some(registry);
        self
    }

    /// Attach a named host object. Values are looked up by key and type.
    pub fn with_property<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.properties.insert(key.into(), Arc::new(value));
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_ui_mode(mut self, ui_mode: UiMode) -> Self {
        self.ui_mode = ui_mode;
        self
    }

    /// Registered agents, if the host supplied a directory
    pub fn agent_registry(&self) -> Option<&Arc<AgentRegistry>> {
        self.agent_registry.as_ref()
    }

    /// Borrow a property. `None` when missing or stored under another type.
    pub fn property<T: Any>(&self, key: &str) -> Option<&T> {
        self.properties.get(key)?.downcast_ref::<T>()
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_property_lookup() {
        let ctx = ActionContext::new()
            .with_property("answer", 42_u32)
            .with_property("label", String::from("board"));

        assert_eq!(ctx.property::<u32>("answer"), Some(&42));
        assert_eq!(ctx.property::<String>("label").map(String::as_str), Some("board"));
        // wrong type
        assert!(ctx.property::<i64>("answer").is_none());
        assert!(ctx.property::<u32>("missing").is_none());
    }

    #[test]
    fn test_flags() {
        let ctx = ActionContext::new().with_debug(true).with_ui_mode(UiMode::Web);
        assert!(ctx.debug);
        assert_eq!(ctx.ui_mode.to_string(), "web");
        assert!(ctx.agent_registry().is_none());
    }

    #[test]
    fn test_debug_lists_property_keys() {
        let ctx = ActionContext::new()
            .with_property("game", 1_u8)
            .with_property("clock", 2_u8);

        let text = format!("{ctx:?}");
        assert!(text.contains(r#"properties: ["clock", "game"]"#));
        assert!(text.contains("has_agent_registry: false"));
    }
}
