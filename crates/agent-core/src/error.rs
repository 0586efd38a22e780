//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
///
/// Only failures that the loop cannot feed back to the model surface here.
/// Unknown tools and failing handlers are recorded into memory instead.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model collaborator returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Model endpoint unreachable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited by the model endpoint
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication against the model endpoint failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Agent not found in the agent registry
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::RateLimited(_) => "The AI player is thinking too often. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your API key.".into(),
            Self::AgentNotFound(name) => format!("No agent named '{name}' is registered."),
            Self::Config(msg) => format!("Configuration problem: {msg}"),
            Self::Other(_) => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(AgentError::RateLimited("slow down".into()).is_retryable());
        assert!(AgentError::ProviderUnavailable("down".into()).is_retryable());
        assert!(!AgentError::Auth("bad key".into()).is_retryable());
        assert!(!AgentError::Provider("500".into()).is_retryable());
    }

    #[test]
    fn test_user_message() {
        let msg = AgentError::AgentNotFound("helper".into()).user_message();
        assert!(msg.contains("helper"));
    }
}
