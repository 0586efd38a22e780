//! Agent Memory
//!
//! Append-only transcript of a run. The history cap only narrows the read
//! window handed to the prompt; nothing is ever evicted.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Default read window size
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Ordered log of role-tagged messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    items: Vec<Message>,

    #[serde(default = "default_max_history")]
    max_history: usize,
}

const fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub const fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub const fn with_max_history(max_history: usize) -> Self {
        Self {
            items: Vec::new(),
            max_history,
        }
    }

    /// Append an entry
    pub fn add_memory(&mut self, message: Message) {
        self.items.push(message);
    }

    /// The most recent `limit` entries in insertion order.
    ///
    /// `None` (or zero) reads the configured `max_history` window.
    pub fn get_memories(&self, limit: Option<usize>) -> &[Message] {
        let limit = limit.filter(|&l| l > 0).unwrap_or(self.max_history);
        let start = self.items.len().saturating_sub(limit);
        &self.items[start..]
    }

    /// Every entry, including those outside the read window
    pub fn all(&self) -> &[Message] {
        &self.items
    }

    pub fn last(&self) -> Option<&Message> {
        self.items.last()
    }

    pub const fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
