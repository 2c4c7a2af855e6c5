use crate::game_state::chess_types::*;

/// Everything `unmake_move` needs to invert one `make_move`.
///
/// Returned by value from `make_move` and consumed by the paired
/// `unmake_move`; records must be replayed in strict LIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an undo record must be handed back to unmake_move"]
pub struct UndoState {
    pub captured_piece: Option<Piece>,
    /// Differs from the destination square only for en-passant captures.
    pub captured_square: Square,

    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,

    pub prev_zobrist_key: u64,
}
