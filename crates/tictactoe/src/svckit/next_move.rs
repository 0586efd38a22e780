//! Next Move Tool
//!
//! Lets the agent place its mark. Calling it ends the agent's turn.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use agent_core::{
    Action, ActionContext, ActionHandler, Args, ParamType, ParameterSchema,
    tool::require_usize,
};

use crate::board::Player;
use crate::game::board_from;

/// Tool name advertised to the model
pub const NEXT_MOVE: &str = "implement_next_move";

/// Plays a mark for the agent on the board found in the context
pub struct NextMoveTool;

#[async_trait]
impl ActionHandler for NextMoveTool {
    async fn call(&self, context: &ActionContext, args: Args) -> anyhow::Result<Value> {
        let row = require_usize(&args, "row")?;
        let col = require_usize(&args, "col")?;

        let winner = board_from(context)?.make_move(row, col, Player::Agent)?;
        info!(row, col, winner = ?winner, "agent moved");

        let message = match winner {
            Some(Player::Human) => "Game over! Human wins!".to_string(),
            Some(Player::Agent) => "Game over! You win!".to_string(),
            None => format!("Implemented a move at [{row}, {col}]"),
        };
        Ok(json!(message))
    }
}

/// Terminal move action for a `size`×`size` board
pub fn next_move_action(size: usize) -> Action {
    let last = size.saturating_sub(1);

    Action::builder(NEXT_MOVE)
        .description(format!(
            "Implement your next move of the tic-tac-toe game. You need to provide the row \
             and column index of the cell you want to mark. The row and column index should \
             be between 0 and {last}."
        ))
        .parameter(ParameterSchema::new("row", ParamType::Integer).describe("Row index"))
        .parameter(ParameterSchema::new("col", ParamType::Integer).describe("Column index"))
        .terminal(true)
        .tag("game")
        .build_with(NextMoveTool)
}
