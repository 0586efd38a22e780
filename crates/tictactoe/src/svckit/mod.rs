//! Service Kit - Agent Tools
//!
//! Game tools that implement `agent_core::ActionHandler`.

mod next_move;

pub use next_move::{NEXT_MOVE, NextMoveTool, next_move_action};
