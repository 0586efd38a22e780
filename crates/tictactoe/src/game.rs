//! Game Collaborator
//!
//! The board handed to tools through the action context.

use std::sync::{Arc, Mutex, PoisonError};

use agent_core::ActionContext;

use crate::board::{Board, Player};
use crate::error::{GameError, Result};

/// Context property key of the shared board
pub const GAME_KEY: &str = "game";

/// Board as stored in the action context
pub type SharedBoard = Arc<dyn GameBoard>;

/// Mutable game shared between the host and the agent's tools
pub trait GameBoard: Send + Sync {
    /// Place a mark; returns the winner if this move ended the game
    fn make_move(&self, row: usize, col: usize, player: Player) -> Result<Option<Player>>;

    /// Copy of the current state
    fn snapshot(&self) -> Board;

    fn reset(&self);
}

impl GameBoard for Mutex<Board> {
    fn make_move(&self, row: usize, col: usize, player: Player) -> Result<Option<Player>> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .make_move(row, col, player)
    }

    fn snapshot(&self) -> Board {
        self.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn reset(&self) {
        self.lock().unwrap_or_else(PoisonError::into_inner).reset();
    }
}

/// Wrap a board for sharing
pub fn shared(board: Board) -> SharedBoard {
    Arc::new(Mutex::new(board))
}

/// Look up the board placed in `context` under [`GAME_KEY`]
pub fn board_from(context: &ActionContext) -> Result<&SharedBoard> {
    context
        .property::<SharedBoard>(GAME_KEY)
        .ok_or(GameError::BoardUnavailable)
}
