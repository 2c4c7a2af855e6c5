use crate::errors::{EngineError, EngineResult};
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::move_generator::legal_moves;
use crate::moves::chess_move::ChessMove;
use crate::utils::algebraic::algebraic_to_square;

#[inline]
pub fn move_to_long_algebraic(mv: &ChessMove) -> String {
    mv.to_string()
}

/// Parse coordinate notation (`e2e4`, `e7e8q`) into the matching legal move.
pub fn long_algebraic_to_move(
    long_algebraic: &str,
    game_state: &mut GameState,
) -> EngineResult<ChessMove> {
    let text = long_algebraic.trim();
    let invalid = |reason: &str| EngineError::InvalidMoveText {
        text: text.to_owned(),
        reason: reason.to_owned(),
    };

    if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
        return Err(invalid("expected 4 or 5 characters"));
    }

    let from = algebraic_to_square(&text[0..2])?;
    let to = algebraic_to_square(&text[2..4])?;
    let promotion = match text.as_bytes().get(4) {
        Some(&ch) => Some(
            char_to_promotion(char::from(ch)).ok_or_else(|| invalid("bad promotion piece"))?,
        ),
        None => None,
    };

    let wanted = ChessMove::new(from, to, promotion);
    legal_moves(game_state)?
        .into_iter()
        .find(|mv| mv.same_move(&wanted))
        .ok_or_else(|| invalid("not a legal move in this position"))
}

fn char_to_promotion(ch: char) -> Option<PieceKind> {
    match ch.to_ascii_lowercase() {
        'n' => Some(PieceKind::Knight),
        'b' => Some(PieceKind::Bishop),
        'r' => Some(PieceKind::Rook),
        'q' => Some(PieceKind::Queen),
        _ => None,
    }
}
