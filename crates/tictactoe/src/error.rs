//! Error Types for the Game Host

use agent_core::AgentError;
use thiserror::Error;

use crate::board::Player;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Board size must be at least 3, got {0}")]
    InvalidSize(usize),

    #[error("Cell [{row}, {col}] is outside the {size}x{size} board")]
    OutOfBounds { row: usize, col: usize, size: usize },

    #[error("Cell [{row}, {col}] is already marked")]
    Occupied { row: usize, col: usize },

    #[error("The game is over, player {winner} already won")]
    GameOver { winner: Player },

    #[error("It is the agent's turn")]
    AgentTurn,

    #[error("No game board in the action context")]
    BoardUnavailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl GameError {
    /// Whether asking the agent again may succeed
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Agent(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Text for the player; agent failures are reworded, game errors
    /// already read well
    pub fn user_message(&self) -> String {
        match self {
            Self::Agent(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_agent_errors_are_retryable() {
        assert!(GameError::from(AgentError::RateLimited("429".into())).is_retryable());
        assert!(GameError::from(AgentError::ProviderUnavailable("refused".into())).is_retryable());
        assert!(!GameError::from(AgentError::Auth("401: bad key".into())).is_retryable());
        assert!(!GameError::AgentTurn.is_retryable());
        assert!(!GameError::Occupied { row: 0, col: 0 }.is_retryable());
    }

    #[test]
    fn test_user_message() {
        let auth = GameError::from(AgentError::Auth("401: invalid key sk-123".into()));
        assert_eq!(auth.user_message(), "Authentication failed. Please check your API key.");
        assert!(!auth.user_message().contains("sk-123"));

        assert_eq!(
            GameError::Occupied { row: 1, col: 2 }.user_message(),
            "Cell [1, 2] is already marked"
        );
    }
}
