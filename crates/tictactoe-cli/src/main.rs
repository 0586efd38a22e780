//! Tic-Tac-Toe in the terminal
//!
//! Human against an LLM agent (or against another human) on an N×N board
//! where each player keeps at most N marks.

mod commands;
mod render;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{LogSink, MemoryLogSink};
use agent_runtime::ChatClient;
use tictactoe::{AiPlayer, GameError, GameSession, GameSettings, PlayMode, build_agent};

use crate::commands::{Command, HELP};

/// Extra attempts when the agent ends its turn without a valid move
const AGENT_RETRIES: usize = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let settings = GameSettings::from_env()?;
    let log = Arc::new(MemoryLogSink::new());

    let ai = match settings.play_mode {
        PlayMode::Agent => {
            let client = ChatClient::from_env()?;
            match client.health_check().await {
                Ok(true) => tracing::info!("✓ Connected to {}", client.config().base_url),
                Ok(false) | Err(_) => {
                    tracing::warn!("⚠ Model endpoint not reachable - agent moves will fail");
                    if client.config().api_key.is_none() {
                        tracing::warn!("  Set MODEL_API_KEY or CEREBRAS_API_KEY in .env");
                    }
                }
            }

            let sink: Arc<dyn LogSink> = log.clone();
            let agent = build_agent(Arc::new(client), &settings, Some(sink))?;
            tracing::info!("Agent '{}' ready with {} tool(s):", agent.name(), agent.actions().len());
            for name in agent.actions().names() {
                tracing::info!("  • {}", name);
            }
            Some(AiPlayer::new(agent, &settings))
        }
        PlayMode::Human => None,
    };

    let mut session = GameSession::new(&settings, ai, log)?;

    println!("{HELP}\n");
    println!("{}", render::board(&session.board()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let board = session.board();
        if board.is_over() {
            println!("Game over! Type `reset` to play again or `quit` to leave.");
        } else {
            println!("Player {} to move:", board.current_player());
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            Command::Move { row, col } => play(&mut session, row, col).await,
            Command::Show => println!("{}", render::board(&session.board())),
            Command::Log => print!("{}", render::transcript(&session.log().entries())),
            Command::Reset => {
                session.reset();
                println!("{}", render::board(&session.board()));
            }
            Command::Difficulty(level) => match session.ai_mut() {
                Some(ai) => {
                    ai.set_difficulty(level);
                    println!("Difficulty set to {level}");
                }
                None => println!("No agent in this game"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}

/// One human move plus the agent's answer. The agent is asked again when it
/// stalls or hits a transient model error.
async fn play(session: &mut GameSession, row: usize, col: usize) {
    match session.human_move(row, col).await {
        Ok(report) => {
            if let Some(winner) = report.winner {
                println!("{}", render::board(&session.board()));
                println!("Player {winner} wins!");
                return;
            }
        }
        Err(e) => {
            println!("{}", e.user_message());
            // a stalled agent still owes its move
            let resume = matches!(e, GameError::AgentTurn) || e.is_retryable();
            if !resume || !session.awaiting_agent() {
                return;
            }
        }
    }

    for attempt in 1..=AGENT_RETRIES {
        if !session.awaiting_agent() {
            break;
        }
        tracing::warn!(attempt, "agent has not moved yet, asking again");
        if let Err(e) = session.agent_turn().await {
            println!("{}", e.user_message());
            if !e.is_retryable() {
                break;
            }
        }
    }

    let board = session.board();
    println!("{}", render::board(&board));
    if let Some(winner) = board.winner() {
        println!("Player {winner} wins!");
    }
}
