//! Weighted random choice among scored root moves.
//!
//! Moves close to the best score are picked often, moves a pawn or more
//! worse rarely, following a Gaussian falloff on the centipawn gap.

use rand::Rng;

use crate::moves::chess_move::ChessMove;

/// `ceil(100 * exp(-d^2 / 2))` with `d` the gap to the best score in pawns.
///
/// The best move weighs 100. Rounding up keeps even hopeless moves at 1 until
/// the exponential underflows.
pub fn move_probability_weight(score: i32, best_score: i32) -> u32 {
    let gap = (f64::from(best_score) - f64::from(score)) / 100.0;
    let weight = 100.0 * (-gap * gap / 2.0).exp();
    weight.ceil() as u32
}

/// Draw one move with probability proportional to its weight against the
/// highest score in `moves`. `None` only for an empty slice.
pub fn pick_weighted<R: Rng + ?Sized>(moves: &[ChessMove], rng: &mut R) -> Option<ChessMove> {
    let best_score = moves.iter().map(|mv| mv.score).max()?;
    let total: u64 = moves
        .iter()
        .map(|mv| u64::from(move_probability_weight(mv.score, best_score)))
        .sum();
    if total == 0 {
        return moves.first().copied();
    }

    let mut pick = rng.random_range(0..total);
    for mv in moves {
        let weight = u64::from(move_probability_weight(mv.score, best_score));
        if pick < weight {
            return Some(*mv);
        }
        pick -= weight;
    }
    moves.last().copied()
}
