//! Player abstraction shared by the computer and human sides of a game.
//!
//! A game driver asks the side to move for a `PlayerCommand` and does not
//! care whether a search or a person produced it.

use std::fmt;
use std::str::FromStr;

use crate::errors::{EngineError, EngineResult};
use crate::game_state::game_state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRule {
    FiftyMove,
    Repetition,
}

/// A draw claim, made either right away or after playing `move_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawClaim {
    pub rule: DrawRule,
    pub move_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// A move in short algebraic notation.
    Move(String),
    /// The side to move has no legal move; hand control to the other side.
    Swap,
    ClaimDraw(DrawClaim),
}

impl fmt::Display for DrawClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.rule {
            DrawRule::FiftyMove => "draw 50",
            DrawRule::Repetition => "draw rep",
        })?;
        if let Some(mv) = &self.move_text {
            write!(f, " {mv}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerCommand::Move(mv) => f.write_str(mv),
            PlayerCommand::Swap => f.write_str("swap"),
            PlayerCommand::ClaimDraw(claim) => claim.fmt(f),
        }
    }
}

impl FromStr for PlayerCommand {
    type Err = EngineError;

    /// Parse the text form produced by `Display`. Move text is not checked
    /// against any position here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let invalid = |reason: &str| EngineError::InvalidMoveText {
            text: s.trim().to_owned(),
            reason: reason.to_owned(),
        };

        let command = match tokens.next() {
            None => return Err(invalid("empty command")),
            Some("swap") => PlayerCommand::Swap,
            Some("draw") => {
                let rule = match tokens.next() {
                    Some("50") => DrawRule::FiftyMove,
                    Some("rep") => DrawRule::Repetition,
                    _ => return Err(invalid("draw claims are 'draw 50' or 'draw rep'")),
                };
                PlayerCommand::ClaimDraw(DrawClaim {
                    rule,
                    move_text: tokens.next().map(str::to_owned),
                })
            }
            Some(mv) => PlayerCommand::Move(mv.to_owned()),
        };

        if tokens.next().is_some() {
            return Err(invalid("trailing text"));
        }
        Ok(command)
    }
}

pub trait Player: Send {
    /// Decide what to do in `game_state`.
    ///
    /// `history` lists the game positions before `game_state`, oldest first.
    fn get_command(
        &mut self,
        game_state: &GameState,
        draw_offer: bool,
        history: &[GameState],
    ) -> EngineResult<PlayerCommand>;

    fn is_human_player(&self) -> bool;

    fn use_book(&mut self, enabled: bool);

    /// `None` leaves a limit open.
    fn time_limit(&mut self, min_time_ms: Option<u64>, max_time_ms: Option<u64>, random_mode: bool);

    fn clear_tt(&mut self);
}
