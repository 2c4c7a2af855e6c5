//! In-place make/unmake of a move.
//!
//! `make_move` mutates the position and hands back the `UndoState` that
//! `unmake_move` needs to restore it bit for bit, Zobrist key included.

use crate::errors::{EngineError, EngineResult};
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::attacks::pawn_attacks;
use crate::moves::chess_move::ChessMove;
use crate::search::zobrist::{castling_key, en_passant_file_key, side_to_move_key};

/// Play `mv` on `game_state`.
///
/// The move only has to be pseudo-legal: leaving the own king attacked is
/// allowed here and detected by the caller. Errors leave the position
/// untouched.
pub fn make_move(game_state: &mut GameState, mv: &ChessMove) -> EngineResult<UndoState> {
    let moving_color = game_state.side_to_move;
    let moved = validate_move_shape(game_state, mv)?;

    let is_en_passant = moved.kind == PieceKind::Pawn
        && game_state.en_passant_square == Some(mv.to)
        && file_of(mv.from) != file_of(mv.to)
        && game_state.piece_on(mv.to).is_none();
    let captured_square = match (is_en_passant, moving_color) {
        (true, Color::Light) => mv.to - 8,
        (true, Color::Dark) => mv.to + 8,
        (false, _) => mv.to,
    };

    let prev_castling_rights = game_state.castling_rights;
    let prev_en_passant_square = game_state.en_passant_square;
    let prev_halfmove_clock = game_state.halfmove_clock;
    let prev_zobrist_key = game_state.zobrist_key;

    game_state.zobrist_key ^= castling_key(prev_castling_rights);
    if let Some(ep) = prev_en_passant_square {
        game_state.zobrist_key ^= en_passant_file_key(file_of(ep));
    }

    let captured_piece = game_state.remove_piece(captured_square);
    game_state.remove_piece(mv.from);
    let placed = match mv.promotion {
        Some(kind) => Piece::new(moving_color, kind),
        None => moved,
    };
    game_state.put_piece(mv.to, placed);

    if moved.kind == PieceKind::King && mv.from.abs_diff(mv.to) == 2 {
        let (rook_from, rook_to) = castling_rook_squares(mv.from, mv.to);
        if let Some(rook) = game_state.remove_piece(rook_from) {
            game_state.put_piece(rook_to, rook);
        }
    }

    update_castling_rights(game_state, moving_color, mv.from, mv.to, moved.kind);

    game_state.en_passant_square = None;
    if moved.kind == PieceKind::Pawn && mv.from.abs_diff(mv.to) == 16 {
        let ep = (mv.from + mv.to) / 2;
        // Only record the square when an enemy pawn could actually take.
        let enemy_pawns =
            game_state.pieces[moving_color.opposite().index()][PieceKind::Pawn.index()];
        if pawn_attacks(moving_color, ep) & enemy_pawns != 0 {
            game_state.en_passant_square = Some(ep);
        }
    }

    if moved.kind == PieceKind::Pawn || captured_piece.is_some() {
        game_state.halfmove_clock = 0;
    } else {
        game_state.halfmove_clock = game_state.halfmove_clock.saturating_add(1);
    }
    if moving_color == Color::Dark {
        game_state.fullmove_number = game_state.fullmove_number.saturating_add(1);
    }

    game_state.side_to_move = moving_color.opposite();
    game_state.zobrist_key ^= side_to_move_key();
    game_state.zobrist_key ^= castling_key(game_state.castling_rights);
    if let Some(ep) = game_state.en_passant_square {
        game_state.zobrist_key ^= en_passant_file_key(file_of(ep));
    }

    Ok(UndoState {
        captured_piece,
        captured_square,
        prev_castling_rights,
        prev_en_passant_square,
        prev_halfmove_clock,
        prev_zobrist_key,
    })
}

/// Revert the `make_move` that produced `undo`.
///
/// Must be called with the record of the most recent unreverted move on this
/// position.
pub fn unmake_move(game_state: &mut GameState, mv: &ChessMove, undo: UndoState) {
    let moving_color = game_state.side_to_move.opposite();
    game_state.side_to_move = moving_color;
    if moving_color == Color::Dark {
        game_state.fullmove_number = game_state.fullmove_number.saturating_sub(1);
    }

    if let Some(placed) = game_state.remove_piece(mv.to) {
        let original = match mv.promotion {
            Some(_) => Piece::new(moving_color, PieceKind::Pawn),
            None => placed,
        };
        game_state.put_piece(mv.from, original);

        if original.kind == PieceKind::King && mv.from.abs_diff(mv.to) == 2 {
            let (rook_from, rook_to) = castling_rook_squares(mv.from, mv.to);
            if let Some(rook) = game_state.remove_piece(rook_to) {
                game_state.put_piece(rook_from, rook);
            }
        }
    }

    if let Some(captured) = undo.captured_piece {
        game_state.put_piece(undo.captured_square, captured);
    }

    game_state.castling_rights = undo.prev_castling_rights;
    game_state.en_passant_square = undo.prev_en_passant_square;
    game_state.halfmove_clock = undo.prev_halfmove_clock;
    game_state.zobrist_key = undo.prev_zobrist_key;
}

/// Copying variant of [`make_move`] for callers that keep the old position.
pub fn apply_move(game_state: &GameState, mv: &ChessMove) -> EngineResult<GameState> {
    let mut next = game_state.clone();
    let _ = make_move(&mut next, mv)?;
    Ok(next)
}

fn illegal(mv: &ChessMove, reason: &str) -> EngineError {
    EngineError::IllegalMove {
        from: mv.from,
        to: mv.to,
        reason: reason.to_owned(),
    }
}

fn validate_move_shape(game_state: &GameState, mv: &ChessMove) -> EngineResult<Piece> {
    if mv.from > 63 || mv.to > 63 || mv.from == mv.to {
        return Err(illegal(mv, "squares out of range"));
    }

    let moved = match game_state.piece_on(mv.from) {
        Some(piece) if piece.color == game_state.side_to_move => piece,
        Some(_) => return Err(illegal(mv, "piece on from-square belongs to the opponent")),
        None => return Err(illegal(mv, "no piece on from-square")),
    };

    if let Some(target) = game_state.piece_on(mv.to) {
        if target.color == moved.color {
            return Err(illegal(mv, "destination holds an own piece"));
        }
    }

    let reaches_last_rank = matches!(
        (moved.color, rank_of(mv.to)),
        (Color::Light, 7) | (Color::Dark, 0)
    );
    match mv.promotion {
        Some(PieceKind::Pawn | PieceKind::King) => {
            return Err(illegal(mv, "invalid promotion piece"));
        }
        Some(_) if moved.kind != PieceKind::Pawn || !reaches_last_rank => {
            return Err(illegal(mv, "promotion without a pawn reaching the last rank"));
        }
        None if moved.kind == PieceKind::Pawn && reaches_last_rank => {
            return Err(illegal(mv, "pawn reaching the last rank must promote"));
        }
        _ => {}
    }

    Ok(moved)
}

#[inline]
fn castling_rook_squares(king_from: Square, king_to: Square) -> (Square, Square) {
    if king_to > king_from {
        (king_from + 3, king_from + 1)
    } else {
        (king_from - 4, king_from - 1)
    }
}

fn update_castling_rights(
    game_state: &mut GameState,
    moving_color: Color,
    from: Square,
    to: Square,
    moved_piece: PieceKind,
) {
    if moved_piece == PieceKind::King {
        if moving_color == Color::Light {
            game_state.castling_rights &= !(CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE);
        } else {
            game_state.castling_rights &= !(CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE);
        }
    }

    // A rook leaving its corner, or anything landing there, ends that right.
    for square in [from, to] {
        match square {
            0 => game_state.castling_rights &= !CASTLE_LIGHT_QUEENSIDE,
            7 => game_state.castling_rights &= !CASTLE_LIGHT_KINGSIDE,
            56 => game_state.castling_rights &= !CASTLE_DARK_QUEENSIDE,
            63 => game_state.castling_rights &= !CASTLE_DARK_KINGSIDE,
            _ => {}
        }
    }
}
