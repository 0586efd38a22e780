//! AI Player
//!
//! Wraps the game agent, its rule goals and the memory shared across turns.

use std::sync::Arc;

use tracing::info;

use agent_core::{
    ActionContext, ActionRegistry, Agent, AgentConfig, Goal, LogSink, Memory, ModelClient,
    RunOutcome,
};

use crate::error::Result;
use crate::game::board_from;
use crate::settings::{Difficulty, GameSettings};
use crate::svckit::next_move_action;

/// Name the agent is registered and logged under
pub const AGENT_NAME: &str = "agent";

/// Rule goals for a `size`×`size` board
pub fn game_goals(size: usize) -> Vec<String> {
    let row = format!("[{}]", vec!["x"; size].join(", "));
    let canvas = format!("[{}]", vec![row; size].join(", "));

    vec![
        "You are a professional chess player. Now you are playing a Tic-Tac-Toe game with a human. Here is the rules: ".into(),
        format!(
            "1. This game has two players. There is a {size} x {size} canva with {} cells, on which each player could mark their own icon on any empty cell.",
            size * size
        ),
        format!(
            "2. When a player has {size} consecutive marks in a row, column, or diagonal, the game is over and the player win."
        ),
        format!(
            "3. In addition, different from the normal Tic-Tac-Toe game, if a player has already marked {size} cells on the canva, the oldest cell will be removed after the new move is implemented. That means you would have at most {size} icons on the canva."
        ),
        "Your goal is to win the game according to the difficulty level set. If it is set 'hard', be extremely smart and do not let the human player win. Otherwise if it is set 'easy', be mercy with the human player.".into(),
        "After each move by the human, you will receive the most current state of the canva.".into(),
        format!(
            "The canva is represented as a two dimensional array: {canvas}. Value 0 means empty, 1 means human player, 2 means you. Negative number means it is going to be removed in the next round."
        ),
        "You would be also given a tool for you to tell the system which cell you would like to put icon on next. Execute it every round.".into(),
        "You are not allowed to mark the cell that is already marked (1 or 2).".into(),
    ]
}

/// Goal stating the difficulty level
pub fn difficulty_goal(difficulty: Difficulty) -> Goal {
    Goal::new(format!("[Important] The difficulty level is {difficulty}."))
}

/// Build the game agent for the configured board
pub fn build_agent(
    model: Arc<dyn ModelClient>,
    settings: &GameSettings,
    log: Option<Arc<dyn LogSink>>,
) -> Result<Agent> {
    let mut actions = ActionRegistry::new();
    actions.register(next_move_action(settings.board_size));

    let mut builder = Agent::builder(AGENT_NAME)
        .goals(game_goals(settings.board_size))
        .actions(actions)
        .model(model)
        .config(AgentConfig {
            max_iterations: settings.max_iterations,
            // an occupied or out-of-range cell gets another try
            retry_failed_terminal: true,
            max_history: settings.max_history,
            ..AgentConfig::default()
        });
    if let Some(log) = log {
        builder = builder.log_sink(log);
    }

    Ok(builder.build()?)
}

/// The agent seat at the table
pub struct AiPlayer {
    agent: Agent,
    memory: Memory,
    difficulty: Difficulty,
    /// Level stated by the latest difficulty goal
    announced: Option<Difficulty>,
}

impl AiPlayer {
    pub fn new(agent: Agent, settings: &GameSettings) -> Self {
        Self {
            agent,
            memory: Memory::with_max_history(settings.max_history),
            difficulty: settings.difficulty,
            announced: None,
        }
    }

    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Transcript shared across turns
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Takes effect on the next turn
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Forget earlier turns
    pub fn clear_memory(&mut self) {
        self.memory = Memory::with_max_history(self.memory.max_history());
    }

    /// Let the agent make one move on the board found in `context`.
    pub async fn play_turn(&mut self, context: &ActionContext) -> Result<RunOutcome> {
        if self.announced != Some(self.difficulty) {
            self.agent.add_goal(difficulty_goal(self.difficulty));
            self.announced = Some(self.difficulty);
        }

        let canvas = board_from(context)?.snapshot();
        let query = format!("The current canva is {canvas}. Please implement your next move.");

        let outcome = self.agent.run(&query, &mut self.memory, context).await?;
        info!(
            iterations = outcome.iterations,
            reason = ?outcome.stop_reason,
            difficulty = %self.difficulty,
            "agent turn finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Player};
    use crate::game::{GAME_KEY, SharedBoard, shared};
    use agent_core::{AgentError, ModelReply, Prompt, Role, StopReason};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies in order, repeating the last one; keeps every prompt.
    struct ScriptedModel {
        replies: Vec<ModelReply>,
        prompts: Mutex<Vec<Prompt>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<ModelReply>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate(&self, prompt: &Prompt) -> agent_core::Result<ModelReply> {
            let mut prompts = self.prompts.lock().unwrap();
            let idx = prompts.len().min(self.replies.len() - 1);
            prompts.push(prompt.clone());
            Ok(self.replies[idx].clone())
        }
    }

    fn settings(size: usize) -> GameSettings {
        GameSettings {
            board_size: size,
            ..GameSettings::default()
        }
    }

    fn table(size: usize, model: Arc<ScriptedModel>) -> (AiPlayer, SharedBoard, ActionContext) {
        let settings = settings(size);
        let agent = build_agent(model, &settings, None).unwrap();
        let board = shared(Board::new(size).unwrap());
        let context = ActionContext::new().with_property(GAME_KEY, board.clone());
        (AiPlayer::new(agent, &settings), board, context)
    }

    #[test]
    fn test_goals_follow_board_size() {
        let goals = game_goals(4);
        assert_eq!(goals.len(), 9);
        assert!(goals[1].contains("4 x 4 canva with 16 cells"));
        assert!(goals[6].contains("[[x, x, x, x], [x, x, x, x], [x, x, x, x], [x, x, x, x]]"));
        assert!(game_goals(3)[2].contains("3 consecutive marks"));
    }

    #[tokio::test]
    async fn test_agent_moves_on_empty_board() {
        let model = ScriptedModel::new(vec![ModelReply::tool_call(
            "implement_next_move",
            r#"{"row": 0, "col": 0}"#,
        )]);
        let (mut player, board, context) = table(3, model.clone());

        let outcome = player.play_turn(&context).await.unwrap();

        assert_eq!(outcome.iterations, 1);
        assert_eq!(
            outcome.stop_reason,
            StopReason::TerminalAction("implement_next_move".into())
        );
        assert_eq!(board.snapshot().cell(0, 0), Some(2));

        let roles: Vec<Role> = player.memory().all().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert!(player.memory().all()[0].content.starts_with(
            "The current canva is [[0, 0, 0], [0, 0, 0], [0, 0, 0]]."
        ));
        assert!(player.memory().all()[2].content.contains("Implemented a move at [0, 0]"));
    }

    #[tokio::test]
    async fn test_occupied_cell_is_retried() {
        let model = ScriptedModel::new(vec![
            ModelReply::tool_call("implement_next_move", r#"{"row": 1, "col": 1}"#),
            ModelReply::tool_call("implement_next_move", r#"{"args": {"row": 2, "col": 0}}"#),
        ]);
        let (mut player, board, context) = table(3, model);
        board.make_move(1, 1, Player::Human).unwrap();

        let outcome = player.play_turn(&context).await.unwrap();

        assert_eq!(outcome.iterations, 2);
        let snapshot = board.snapshot();
        assert_eq!(snapshot.cell(1, 1), Some(1));
        assert_eq!(snapshot.cell(2, 0), Some(2));
    }

    #[tokio::test]
    async fn test_difficulty_goal_added_once() {
        let model = ScriptedModel::new(vec![ModelReply::text("thinking...")]);
        let (mut player, _, context) = table(3, model.clone());

        player.play_turn(&context).await.unwrap();
        player.play_turn(&context).await.unwrap();
        player.set_difficulty(Difficulty::Hard);
        player.play_turn(&context).await.unwrap();

        let goals: Vec<&str> = player.agent().goals().iter().map(|g| g.content.as_str()).collect();
        assert_eq!(goals.iter().filter(|g| g.contains("difficulty level is easy")).count(), 1);
        assert_eq!(goals.last().copied(), Some("[Important] The difficulty level is hard."));

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[2].messages[0].content.ends_with("The difficulty level is hard."));
    }

    #[tokio::test]
    async fn test_switching_back_restates_difficulty() {
        let model = ScriptedModel::new(vec![ModelReply::text("thinking...")]);
        let (mut player, _, context) = table(3, model.clone());

        player.play_turn(&context).await.unwrap();
        player.set_difficulty(Difficulty::Hard);
        player.play_turn(&context).await.unwrap();
        player.set_difficulty(Difficulty::Easy);
        player.play_turn(&context).await.unwrap();
        player.play_turn(&context).await.unwrap();

        let goals: Vec<&str> = player.agent().goals().iter().map(|g| g.content.as_str()).collect();
        assert_eq!(goals.iter().filter(|g| g.contains("difficulty level")).count(), 3);

        let prompts = model.prompts.lock().unwrap();
        let system = &prompts[2].messages[0].content;
        assert!(system.ends_with("[Important] The difficulty level is easy."));
        assert_eq!(prompts[3].messages[0].content, *system);
    }

    #[tokio::test]
    async fn test_memory_window() {
        let model = ScriptedModel::new(vec![ModelReply::text("pass")]);
        let (mut player, _, context) = table(3, model.clone());

        player.play_turn(&context).await.unwrap();
        player.play_turn(&context).await.unwrap();

        assert_eq!(player.memory().len(), 6);
        // system goal + the last three entries
        assert_eq!(model.prompts.lock().unwrap()[1].messages.len(), 4);

        player.clear_memory();
        assert!(player.memory().is_empty());
    }

    #[tokio::test]
    async fn test_missing_board() {
        let model = ScriptedModel::new(vec![ModelReply::text("")]);
        let (mut player, _, _) = table(3, model);

        let err = player.play_turn(&ActionContext::new()).await.unwrap_err();
        assert!(matches!(err, crate::GameError::BoardUnavailable));
    }

    #[test]
    fn test_build_requires_valid_iterations() {
        let model = ScriptedModel::new(vec![ModelReply::text("")]);
        let settings = GameSettings {
            max_iterations: 0,
            ..GameSettings::default()
        };
        let err = build_agent(model, &settings, None).err().unwrap();
        assert!(matches!(err, crate::GameError::Agent(AgentError::Config(_))));
    }
}
