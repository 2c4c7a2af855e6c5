//! 50-move and repetition rules.
//!
//! Hash lists passed in here hold the keys of the positions that preceded the
//! one being examined, oldest first, and never the examined position itself.

use crate::game_state::chess_rules::{FIFTY_MOVE_HALFMOVES, REPETITION_CLAIM_COUNT};
use crate::game_state::game_state::GameState;

#[inline]
pub fn can_claim_draw_50(game_state: &GameState) -> bool {
    game_state.halfmove_clock >= FIFTY_MOVE_HALFMOVES
}

/// Threefold repetition claim, counting the current occurrence.
pub fn can_claim_draw_rep(game_state: &GameState, previous_hashes: &[u64]) -> bool {
    let earlier = previous_hashes
        .iter()
        .filter(|&&hash| hash == game_state.zobrist_key)
        .count();
    earlier + 1 >= REPETITION_CLAIM_COUNT
}

/// Draw-by-repetition test used inside the search tree.
///
/// A single repeat of a position first reached during the search is already
/// scored as a draw, while positions from the game history need the full
/// claim count. Only positions since the last capture or pawn move are
/// scanned.
pub fn is_search_repetition(
    key: u64,
    previous_hashes: &[u64],
    first_search_index: usize,
    halfmove_clock: u16,
) -> bool {
    let stop = previous_hashes
        .len()
        .saturating_sub(usize::from(halfmove_clock));
    let mut reps = 0usize;

    for (idx, &hash) in previous_hashes.iter().enumerate().skip(stop).rev() {
        if hash != key {
            continue;
        }
        if idx >= first_search_index {
            return true;
        }
        reps += 1;
        if reps + 1 >= REPETITION_CLAIM_COUNT {
            return true;
        }
    }

    false
}
