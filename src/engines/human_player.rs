use std::collections::VecDeque;

use crate::engines::player::{Player, PlayerCommand};
use crate::errors::{EngineError, EngineResult};
use crate::game_state::game_state::GameState;

/// Replays commands entered by a person, in the order they were entered.
#[derive(Debug, Clone, Default)]
pub struct HumanPlayer {
    pending: VecDeque<PlayerCommand>,
}

impl HumanPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_command(&mut self, command: PlayerCommand) {
        self.pending.push_back(command);
    }

    /// Queue a command given as text (`e4`, `swap`, `draw rep Nf3`).
    pub fn push_text(&mut self, text: &str) -> EngineResult<()> {
        self.pending.push_back(text.parse()?);
        Ok(())
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Player for HumanPlayer {
    fn get_command(
        &mut self,
        _game_state: &GameState,
        _draw_offer: bool,
        _history: &[GameState],
    ) -> EngineResult<PlayerCommand> {
        self.pending.pop_front().ok_or(EngineError::NoPendingCommand)
    }

    fn is_human_player(&self) -> bool {
        true
    }

    fn use_book(&mut self, _enabled: bool) {}

    fn time_limit(&mut self, _min_time_ms: Option<u64>, _max_time_ms: Option<u64>, _random_mode: bool) {}

    fn clear_tt(&mut self) {}
}
