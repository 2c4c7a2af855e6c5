//! Move value passed between generation, search and the player layer.

use std::fmt;

use crate::game_state::chess_types::{PieceKind, Square};
use crate::utils::algebraic::square_name;

/// A move plus a transient score.
///
/// The score carries ordering heuristics into the search and search results
/// back out to root selection. Equality ignores it: two moves are the same
/// move if they share from/to/promotion.
#[derive(Debug, Clone, Copy, Eq)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub score: i32,
}

impl ChessMove {
    #[inline]
    pub const fn new(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        Self {
            from,
            to,
            promotion,
            score: 0,
        }
    }

    #[inline]
    pub const fn quiet(from: Square, to: Square) -> Self {
        Self::new(from, to, None)
    }

    #[inline]
    pub fn same_move(&self, other: &ChessMove) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    #[inline]
    pub fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }
}

impl PartialEq for ChessMove {
    fn eq(&self, other: &Self) -> bool {
        self.same_move(other)
    }
}

impl fmt::Display for ChessMove {
    /// Long algebraic coordinates, e.g. `e2e4` or `a7a8q`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", square_name(self.from), square_name(self.to))?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}
