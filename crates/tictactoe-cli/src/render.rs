//! Terminal Rendering
//!
//! Board grid and agent transcript, as plain text.

use std::fmt::Write as _;

use agent_core::LogEntry;
use tictactoe::Board;

fn glyph(cell: i8) -> &'static str {
    match cell {
        1 => "X",
        2 => "O",
        -1 => "x",
        -2 => "o",
        _ => " ",
    }
}

/// Grid with row and column indices. Lowercase marks are about to vanish.
pub fn board(board: &Board) -> String {
    let size = board.size();
    let mut out = String::from("   ");
    for col in 0..size {
        let _ = write!(out, " {col}  ");
    }
    out.push('\n');

    let divider = format!("   {}\n", vec!["---"; size].join("+"));
    for (r, row) in board.cells().iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|&c| format!(" {} ", glyph(c))).collect();
        let _ = writeln!(out, "{r}  {}", cells.join("|"));
        if r + 1 < size {
            out.push_str(&divider);
        }
    }
    out
}

/// One block per log entry, tool calls indented below the content
pub fn transcript(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "[{}] {} ({}): {}",
            entry.time.format("%H:%M:%S"),
            entry.agent_session,
            entry.role,
            entry.display_content()
        );
        if let Some(calls) = entry.display_tool_calls() {
            for line in calls.lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
    }
    out
}
