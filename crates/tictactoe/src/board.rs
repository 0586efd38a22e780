//! Game Board
//!
//! An N×N Tic-Tac-Toe variant where each player keeps at most N marks.
//!
//! ```text
//!  Cell values
//!  ───────────
//!   0   empty
//!   1   human
//!   2   agent
//!  -1   human's oldest mark, removed on the human's next move
//!  -2   agent's oldest mark, removed on the agent's next move
//! ```
//!
//! Flagged marks still count toward a winning line.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Smallest playable board
pub const MIN_SIZE: usize = 3;

/// The two players
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Human,
    Agent,
}

impl Player {
    /// Cell value of this player's marks
    pub const fn mark(self) -> i8 {
        match self {
            Self::Human => 1,
            Self::Agent => 2,
        }
    }

    pub const fn other(self) -> Self {
        match self {
            Self::Human => Self::Agent,
            Self::Agent => Self::Human,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Human => 0,
            Self::Agent => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mark())
    }
}

/// Board state, move history and turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Vec<i8>>,
    /// Live marks per player, oldest first
    history: [VecDeque<(usize, usize)>; 2],
    current: Player,
    winner: Option<Player>,
}

impl Board {
    pub fn new(size: usize) -> Result<Self> {
        if size < MIN_SIZE {
            return Err(GameError::InvalidSize(size));
        }

        Ok(Self {
            size,
            cells: vec![vec![0; size]; size],
            history: [VecDeque::new(), VecDeque::new()],
            current: Player::Human,
            winner: None,
        })
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[Vec<i8>] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<i8> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub const fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub const fn current_player(&self) -> Player {
        self.current
    }

    pub const fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Live marks of `player`, oldest first
    pub fn marks(&self, player: Player) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.history[player.index()].iter().copied()
    }

    /// Clear the board, human to move
    pub fn reset(&mut self) {
        for row in &mut self.cells {
            row.fill(0);
        }
        for marks in &mut self.history {
            marks.clear();
        }
        self.current = Player::Human;
        self.winner = None;
    }

    /// Place a mark for `player`.
    ///
    /// Returns the winner when this move completes a line. Otherwise the
    /// player's oldest mark is evicted once they hold more than `size` marks,
    /// the new oldest is flagged once they hold exactly `size`, and the turn
    /// passes. Turn order is not enforced here; hosts decide who moves.
    pub fn make_move(&mut self, row: usize, col: usize, player: Player) -> Result<Option<Player>> {
        if let Some(winner) = self.winner {
            return Err(GameError::GameOver { winner });
        }
        if row >= self.size || col >= self.size {
            return Err(GameError::OutOfBounds {
                row,
                col,
                size: self.size,
            });
        }
        if self.cells[row][col] != 0 {
            return Err(GameError::Occupied { row, col });
        }

        self.cells[row][col] = player.mark();

        if let Some(winner) = self.find_winner() {
            self.winner = Some(winner);
            return Ok(Some(winner));
        }

        let marks = &mut self.history[player.index()];
        marks.push_back((row, col));

        if marks.len() > self.size {
            if let Some((r, c)) = marks.pop_front() {
                self.cells[r][c] = 0;
            }
        }
        if marks.len() == self.size {
            if let Some(&(r, c)) = marks.front() {
                self.cells[r][c] = -player.mark();
            }
        }

        self.current = player.other();
        Ok(None)
    }

    fn find_winner(&self) -> Option<Player> {
        let n = self.size;
        for i in 0..n {
            if let Some(p) = line_owner(self.cells[i].iter().copied()) {
                return Some(p);
            }
            if let Some(p) = line_owner((0..n).map(|r| self.cells[r][i])) {
                return Some(p);
            }
        }

        line_owner((0..n).map(|i| self.cells[i][i]))
            .or_else(|| line_owner((0..n).map(|i| self.cells[n - 1 - i][i])))
    }
}

/// Player holding every cell of a line, flagged marks included
fn line_owner(mut cells: impl Iterator<Item = i8>) -> Option<Player> {
    let first = cells.next()?.abs();
    let player = [Player::Human, Player::Agent]
        .into_iter()
        .find(|p| p.mark() == first)?;
    cells.all(|v| v.abs() == first).then_some(player)
}

/// Nested-array form, e.g. `[[0, 1, 0], [0, 2, 0], [-1, 0, 0]]`
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self
            .cells
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(i8::to_string).collect();
                format!("[{}]", cells.join(", "))
            })
            .collect();
        write!(f, "[{}]", rows.join(", "))
    }
}
