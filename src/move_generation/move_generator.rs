//! Move list pipeline: pseudo-legal generation, then legality filtering by
//! make/unmake and king safety.
//!
//! Ordering scores are assigned by `search::move_ordering`, which needs the
//! search's killer and hash-move state.

use crate::errors::EngineResult;
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::{make_move, unmake_move};
use crate::move_generation::legal_move_checks::{is_king_in_check, side_to_move_in_check};
use crate::move_generation::pseudo_legal::generate_pseudo_legal_moves;
use crate::moves::chess_move::ChessMove;

/// Why a position has no legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMoveReason {
    Checkmate,
    Stalemate,
}

pub fn pseudo_legal_moves(game_state: &GameState) -> Vec<ChessMove> {
    let mut moves = Vec::with_capacity(64);
    generate_pseudo_legal_moves(game_state, &mut moves);
    moves
}

/// Keep only the moves that do not leave the mover's king attacked.
///
/// Each candidate is made and unmade on `game_state`, which is back in its
/// original state when this returns.
pub fn remove_illegal(
    game_state: &mut GameState,
    moves: Vec<ChessMove>,
) -> EngineResult<Vec<ChessMove>> {
    let mover = game_state.side_to_move;
    let mut legal = Vec::with_capacity(moves.len());

    for mv in moves {
        let undo = make_move(game_state, &mv)?;
        let safe = !is_king_in_check(game_state, mover);
        unmake_move(game_state, &mv, undo);
        if safe {
            legal.push(mv);
        }
    }

    Ok(legal)
}

#[inline]
pub fn legal_moves(game_state: &mut GameState) -> EngineResult<Vec<ChessMove>> {
    let pseudo = pseudo_legal_moves(game_state);
    remove_illegal(game_state, pseudo)
}

/// Classify a position whose legal move list came back empty.
#[inline]
pub fn no_move_reason(game_state: &GameState) -> NoMoveReason {
    if side_to_move_in_check(game_state) {
        NoMoveReason::Checkmate
    } else {
        NoMoveReason::Stalemate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::chess_move::ChessMove;

    #[test]
    fn pinned_piece_cannot_leave_the_pin() {
        // Light knight on e2 is pinned by the rook on e8.
        let mut game =
            GameState::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").expect("FEN should parse");
        let moves = legal_moves(&mut game).expect("generation should succeed");
        assert!(moves.iter().all(|m| m.from != 12));
        assert!(moves.contains(&ChessMove::quiet(4, 3)));
    }

    #[test]
    fn remove_illegal_leaves_position_untouched() {
        let mut game = GameState::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .expect("FEN should parse");
        let before = game.clone();
        let _ = legal_moves(&mut game).expect("generation should succeed");
        assert_eq!(game, before);
    }

    #[test]
    fn distinguishes_checkmate_from_stalemate() {
        let mut mate =
            GameState::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").expect("FEN should parse");
        assert!(legal_moves(&mut mate).expect("generation should succeed").is_empty());
        assert_eq!(no_move_reason(&mate), NoMoveReason::Checkmate);

        let mut stale =
            GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("FEN should parse");
        assert!(legal_moves(&mut stale).expect("generation should succeed").is_empty());
        assert_eq!(no_move_reason(&stale), NoMoveReason::Stalemate);
    }
}
