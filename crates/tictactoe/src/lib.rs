//! # tictactoe
//!
//! A Tic-Tac-Toe variant played against an LLM agent.
//!
//! ## Rules
//!
//! Each player keeps at most N marks on an N×N board. Placing one more mark
//! removes that player's oldest one; the mark due to go next is shown
//! negative so both sides can plan around it.
//!
//! ```text
//!  4×4, human (1) holds four marks, the oldest is flagged
//!  ┌────┬────┬────┬────┐
//!  │ -1 │  0 │  2 │  0 │
//!  ├────┼────┼────┼────┤
//!  │  0 │  1 │  0 │  0 │
//!  ├────┼────┼────┼────┤
//!  │  2 │  0 │  1 │  0 │
//!  ├────┼────┼────┼────┤
//!  │  0 │  1 │  0 │  0 │
//!  └────┴────┴────┴────┘
//!  human's next move clears [0, 0]
//! ```
//!
//! ## Flow
//!
//! The host owns a [`GameSession`]. After every human move in agent mode the
//! [`AiPlayer`] runs its agent, whose only tool (`implement_next_move`) plays
//! on the board shared through the action context.

pub mod board;
pub mod error;
pub mod game;
pub mod player;
pub mod session;
pub mod settings;
pub mod svckit;

pub use board::{Board, Player};
pub use error::{GameError, Result};
pub use game::{GAME_KEY, GameBoard, SharedBoard};
pub use player::{AiPlayer, build_agent, game_goals};
pub use session::{GameSession, TurnReport};
pub use settings::{Difficulty, GameSettings, PlayMode};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{NEXT_MOVE, NextMoveTool, next_move_action};
}
