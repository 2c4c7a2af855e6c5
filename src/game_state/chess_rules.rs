//! Canonical chess-rule constants.
//!
//! Starting position plus the thresholds used by draw detection.

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Half-move clock value at which the 50-move rule allows a claim.
pub const FIFTY_MOVE_HALFMOVES: u16 = 100;

/// Occurrences (including the current one) needed for a repetition claim.
pub const REPETITION_CLAIM_COUNT: usize = 3;
