//! Pluggable board evaluation interfaces and baseline implementations.
//!
//! Search remains modular by delegating static position scoring to this trait,
//! allowing alternate heuristics to be swapped without altering search code.

use crate::game_state::{chess_types::*, game_state::GameState};

pub const MATE_SCORE: i32 = 30000;

/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1000;

pub trait BoardScorer: Send + Sync {
    /// Score from the perspective of the side to move.
    fn score(&self, game_state: &GameState) -> i32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl MaterialScorer {
    #[inline]
    pub const fn piece_value(piece: PieceKind) -> i32 {
        match piece {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 0,
        }
    }

    #[inline]
    fn material_balance_light_minus_dark(game_state: &GameState) -> i32 {
        ALL_PIECE_KINDS.iter().fold(0i32, |score, &piece| {
            let light = game_state.pieces[Color::Light.index()][piece.index()].count_ones() as i32;
            let dark = game_state.pieces[Color::Dark.index()][piece.index()].count_ones() as i32;
            score + (light - dark) * Self::piece_value(piece)
        })
    }
}

impl BoardScorer for MaterialScorer {
    fn score(&self, game_state: &GameState) -> i32 {
        let light_minus_dark = Self::material_balance_light_minus_dark(game_state);
        match game_state.side_to_move {
            Color::Light => light_minus_dark,
            Color::Dark => -light_minus_dark,
        }
    }
}

#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Score of the side to move when it is checkmated `ply` half-moves from the root.
#[inline]
pub const fn mated_in(ply: usize) -> i32 {
    -MATE_SCORE + ply as i32
}
