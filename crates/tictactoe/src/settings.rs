//! Game Settings
//!
//! Loaded from the environment (`.env` is read by the binary).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// How hard the agent should play
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(GameError::Config(format!("unknown difficulty '{other}'"))),
        }
    }
}

/// Who plays the second seat
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Human against the agent
    #[default]
    Agent,
    /// Two humans sharing the terminal
    Human,
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Agent => "agent",
            Self::Human => "human",
        })
    }
}

impl FromStr for PlayMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "agent" | "ai" => Ok(Self::Agent),
            "human" => Ok(Self::Human),
            other => Err(GameError::Config(format!("unknown play mode '{other}'"))),
        }
    }
}

/// Game configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Board edge length; also the number of marks a player may keep
    pub board_size: usize,

    /// Memory read window of the agent
    pub max_history: usize,

    /// Log the agent's steps at info level
    pub debug: bool,

    pub difficulty: Difficulty,

    pub play_mode: PlayMode,

    /// Loop cap per agent turn
    pub max_iterations: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            board_size: 4,
            max_history: 3,
            debug: false,
            difficulty: Difficulty::default(),
            play_mode: PlayMode::default(),
            max_iterations: 50,
        }
    }
}

impl GameSettings {
    pub fn from_env() -> Result<Self, GameError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys keep their defaults;
    /// malformed values are rejected.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GameError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let number = |key: &str, default: usize| -> Result<usize, GameError> {
            get(key).map_or(Ok(default), |v| {
                v.trim()
                    .parse()
                    .map_err(|_| GameError::Config(format!("{key} must be a number, got '{v}'")))
            })
        };

        // a zero window would hide the board from the agent
        let max_history = number("MAX_HISTORY", defaults.max_history)?;
        if max_history == 0 {
            return Err(GameError::Config("MAX_HISTORY must be at least 1".into()));
        }

        Ok(Self {
            board_size: number("BOARD_SIZE", defaults.board_size)?,
            max_history,
            debug: get("AGENT_DEBUG").is_some_and(|v| {
                matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
            }),
            difficulty: get("GAME_DIFFICULTY")
                .map_or(Ok(defaults.difficulty), |v| v.parse())?,
            play_mode: get("PLAY_MODE").map_or(Ok(defaults.play_mode), |v| v.parse())?,
            max_iterations: number("MAX_ITERATIONS", defaults.max_iterations)?,
        })
    }
}
