//! Game Session
//!
//! Host-side state: board, play mode, the AI seat and the log sink. The
//! board travels to the agent's tools through the action context.

use std::sync::Arc;

use tracing::{info, warn};

use agent_core::{ActionContext, MemoryLogSink, RunOutcome};

use crate::board::{Board, Player};
use crate::error::{GameError, Result};
use crate::game::{GAME_KEY, SharedBoard, shared};
use crate::player::AiPlayer;
use crate::settings::{GameSettings, PlayMode};

/// What happened during one human turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    /// Seat that made the human move
    pub mover: Player,

    /// Agent run triggered by the move, if any
    pub agent_outcome: Option<RunOutcome>,

    pub winner: Option<Player>,
}

/// One game in progress
pub struct GameSession {
    board: SharedBoard,
    context: ActionContext,
    mode: PlayMode,
    ai: Option<AiPlayer>,
    log: Arc<MemoryLogSink>,
}

impl GameSession {
    /// `ai` is required in agent mode and ignored otherwise.
    pub fn new(
        settings: &GameSettings,
        ai: Option<AiPlayer>,
        log: Arc<MemoryLogSink>,
    ) -> Result<Self> {
        if settings.play_mode == PlayMode::Agent && ai.is_none() {
            return Err(GameError::Config("agent mode needs an AI player".into()));
        }

        let board = shared(Board::new(settings.board_size)?);
        let context = ActionContext::new()
            .with_property(GAME_KEY, board.clone())
            .with_debug(settings.debug);

        info!(
            size = settings.board_size,
            mode = %settings.play_mode,
            difficulty = %settings.difficulty,
            "New game"
        );

        Ok(Self {
            board,
            context,
            mode: settings.play_mode,
            ai: ai.filter(|_| settings.play_mode == PlayMode::Agent),
            log,
        })
    }

    pub fn board(&self) -> Board {
        self.board.snapshot()
    }

    pub const fn mode(&self) -> PlayMode {
        self.mode
    }

    pub const fn log(&self) -> &Arc<MemoryLogSink> {
        &self.log
    }

    pub const fn ai(&self) -> Option<&AiPlayer> {
        self.ai.as_ref()
    }

    pub fn ai_mut(&mut self) -> Option<&mut AiPlayer> {
        self.ai.as_mut()
    }

    /// Whether the agent still owes a move
    pub fn awaiting_agent(&self) -> bool {
        let board = self.board.snapshot();
        self.ai.is_some() && !board.is_over() && board.current_player() == Player::Agent
    }

    /// Play `row, col` for the seat whose turn it is, then let the agent
    /// answer when it holds the other seat.
    pub async fn human_move(&mut self, row: usize, col: usize) -> Result<TurnReport> {
        if self.awaiting_agent() {
            return Err(GameError::AgentTurn);
        }

        let mover = self.board.snapshot().current_player();
        if let Some(winner) = self.board.make_move(row, col, mover)? {
            return Ok(TurnReport {
                mover,
                agent_outcome: None,
                winner: Some(winner),
            });
        }

        let agent_outcome = if self.awaiting_agent() {
            Some(self.agent_turn().await?)
        } else {
            None
        };

        Ok(TurnReport {
            mover,
            agent_outcome,
            winner: self.board.snapshot().winner(),
        })
    }

    /// Run the agent for its pending move
    pub async fn agent_turn(&mut self) -> Result<RunOutcome> {
        let Some(ai) = self.ai.as_mut() else {
            return Err(GameError::Config("no AI player in this session".into()));
        };

        let outcome = ai.play_turn(&self.context).await?;
        if self.board.snapshot().current_player() == Player::Agent {
            warn!(reason = ?outcome.stop_reason, "agent finished without moving");
        }
        Ok(outcome)
    }

    /// Start over: empty board, fresh agent memory, cleared log
    pub fn reset(&mut self) {
        self.board.reset();
        if let Some(ai) = self.ai.as_mut() {
            ai.clear_memory();
        }
        self.log.clear();
        info!("Game reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{AGENT_NAME, build_agent};
    use agent_core::{LogSink, ModelClient, ModelReply, Prompt, StopReason};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Plays the scripted cells in order
    struct ScriptedMoves(Mutex<Vec<(usize, usize)>>);

    #[async_trait]
    impl ModelClient for ScriptedMoves {
        async fn generate(&self, _prompt: &Prompt) -> agent_core::Result<ModelReply> {
            let mut moves = self.0.lock().unwrap();
            Ok(if moves.is_empty() {
                ModelReply::text("I have no move")
            } else {
                let (row, col) = moves.remove(0);
                ModelReply::tool_call(
                    "implement_next_move",
                    format!(r#"{{"row": {row}, "col": {col}}}"#),
                )
            })
        }
    }

    fn agent_session(size: usize, moves: Vec<(usize, usize)>) -> GameSession {
        let settings = GameSettings {
            board_size: size,
            ..GameSettings::default()
        };
        let log = Arc::new(MemoryLogSink::new());
        let sink: Arc<dyn LogSink> = log.clone();
        let agent = build_agent(Arc::new(ScriptedMoves(Mutex::new(moves))), &settings, Some(sink))
            .unwrap();
        GameSession::new(&settings, Some(AiPlayer::new(agent, &settings)), log).unwrap()
    }

    #[tokio::test]
    async fn test_agent_answers_human_move() {
        let mut session = agent_session(3, vec![(1, 1)]);

        let report = session.human_move(0, 0).await.unwrap();

        assert_eq!(report.mover, Player::Human);
        assert_eq!(report.winner, None);
        assert_eq!(
            report.agent_outcome.unwrap().stop_reason,
            StopReason::TerminalAction("implement_next_move".into())
        );
        let board = session.board();
        assert_eq!(board.cell(0, 0), Some(1));
        assert_eq!(board.cell(1, 1), Some(2));
        assert_eq!(board.current_player(), Player::Human);
        assert_eq!(session.log().entries_for(AGENT_NAME).len(), 3);
    }

    #[tokio::test]
    async fn test_agent_that_does_not_move_keeps_the_turn() {
        let mut session = agent_session(3, vec![]);

        session.human_move(0, 0).await.unwrap();
        assert!(session.awaiting_agent());
        assert!(matches!(session.human_move(0, 1).await, Err(GameError::AgentTurn)));

        let outcome = session.agent_turn().await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::NoAction);
    }

    #[tokio::test]
    async fn test_agent_wins() {
        let mut session = agent_session(3, vec![(0, 0), (0, 1), (0, 2)]);

        session.human_move(2, 0).await.unwrap();
        session.human_move(1, 2).await.unwrap();
        let report = session.human_move(2, 2).await.unwrap();

        assert_eq!(report.winner, Some(Player::Agent));
        assert!(session.board().is_over());
        assert!(matches!(
            session.human_move(1, 0).await,
            Err(GameError::GameOver { winner: Player::Agent })
        ));
    }

    #[tokio::test]
    async fn test_two_humans_alternate() {
        let settings = GameSettings {
            board_size: 3,
            play_mode: PlayMode::Human,
            ..GameSettings::default()
        };
        let mut session =
            GameSession::new(&settings, None, Arc::new(MemoryLogSink::new())).unwrap();

        assert_eq!(session.human_move(0, 0).await.unwrap().mover, Player::Human);
        assert_eq!(session.human_move(1, 1).await.unwrap().mover, Player::Agent);
        assert_eq!(session.board().cell(1, 1), Some(2));
        assert!(session.agent_turn().await.is_err());
    }

    #[tokio::test]
    async fn test_reset() {
        let mut session = agent_session(3, vec![(1, 1)]);
        session.human_move(0, 0).await.unwrap();

        session.reset();

        assert_eq!(session.board(), Board::new(3).unwrap());
        assert!(session.ai().unwrap().memory().is_empty());
        assert!(session.log().is_empty());
    }

    #[test]
    fn test_agent_mode_requires_player() {
        let result = GameSession::new(
            &GameSettings::default(),
            None,
            Arc::new(MemoryLogSink::new()),
        );
        assert!(matches!(result, Err(GameError::Config(_))));
    }
}
