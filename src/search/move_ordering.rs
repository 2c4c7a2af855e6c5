//! Move ordering heuristics.
//!
//! Ordering only affects how quickly alpha-beta cuts; every score here is a
//! sort key and never feeds back into evaluation.

use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::chess_move::ChessMove;
use crate::search::board_scoring::MaterialScorer;

pub const MAX_PLY: usize = 128;

const HASH_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_BASE: i32 = 100_000;
const PROMOTION_BASE: i32 = 90_000;
const FIRST_KILLER_SCORE: i32 = 50_000;
const SECOND_KILLER_SCORE: i32 = 49_000;

/// Two quiet moves per ply that recently caused a beta cutoff.
#[derive(Debug, Clone)]
pub struct KillerTable {
    killers: [[Option<ChessMove>; 2]; MAX_PLY],
}

impl Default for KillerTable {
    fn default() -> Self {
        Self {
            killers: [[None; 2]; MAX_PLY],
        }
    }
}

impl KillerTable {
    pub fn clear(&mut self) {
        self.killers.fill([None; 2]);
    }

    pub fn record(&mut self, ply: usize, mv: ChessMove) {
        let Some(slot) = self.killers.get_mut(ply) else {
            return;
        };
        if slot[0] == Some(mv) {
            return;
        }
        slot[1] = slot[0];
        slot[0] = Some(mv.with_score(0));
    }

    fn rank(&self, ply: usize, mv: &ChessMove) -> Option<i32> {
        let slot = self.killers.get(ply)?;
        if slot[0].as_ref() == Some(mv) {
            Some(FIRST_KILLER_SCORE)
        } else if slot[1].as_ref() == Some(mv) {
            Some(SECOND_KILLER_SCORE)
        } else {
            None
        }
    }
}

#[inline]
pub fn is_capture(game_state: &GameState, mv: &ChessMove) -> bool {
    captured_kind(game_state, mv).is_some()
}

#[inline]
pub fn is_tactical(game_state: &GameState, mv: &ChessMove) -> bool {
    mv.promotion.is_some() || is_capture(game_state, mv)
}

fn captured_kind(game_state: &GameState, mv: &ChessMove) -> Option<PieceKind> {
    if let Some(victim) = game_state.piece_on(mv.to) {
        return Some(victim.kind);
    }
    let mover = game_state.piece_on(mv.from)?;
    let en_passant = mover.kind == PieceKind::Pawn
        && game_state.en_passant_square == Some(mv.to)
        && file_of(mv.from) != file_of(mv.to);
    en_passant.then_some(PieceKind::Pawn)
}

/// Assign an ordering score to every move.
///
/// The hash move ranks first, then captures by most valuable victim and least
/// valuable attacker, then promotions, then killers for `ply`, then the rest.
pub fn score_move_list(
    game_state: &GameState,
    moves: &mut [ChessMove],
    hash_move: Option<&ChessMove>,
    killers: &KillerTable,
    ply: usize,
) {
    for mv in moves.iter_mut() {
        mv.score = if hash_move == Some(&*mv) {
            HASH_MOVE_SCORE
        } else if let Some(victim) = captured_kind(game_state, mv) {
            let attacker = game_state
                .piece_on(mv.from)
                .map_or(PieceKind::Pawn, |piece| piece.kind);
            let promo_gain = mv.promotion.map_or(0, MaterialScorer::piece_value);
            CAPTURE_BASE + MaterialScorer::piece_value(victim) * 10 + promo_gain
                - MaterialScorer::piece_value(attacker) / 10
        } else if let Some(promo) = mv.promotion {
            PROMOTION_BASE + MaterialScorer::piece_value(promo)
        } else {
            killers.rank(ply, mv).unwrap_or(0)
        };
    }
}

/// Stable sort by descending score.
#[inline]
pub fn sort_by_score(moves: &mut [ChessMove]) {
    moves.sort_by(|a, b| b.score.cmp(&a.score));
}

pub fn order_moves(
    game_state: &GameState,
    moves: &mut [ChessMove],
    hash_move: Option<&ChessMove>,
    killers: &KillerTable,
    ply: usize,
) {
    score_move_list(game_state, moves, hash_move, killers, ply);
    sort_by_score(moves);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::move_generator::legal_moves;

    #[test]
    fn hash_move_then_captures_then_quiet() {
        let mut game = GameState::from_fen("4k3/8/8/3q4/4P3/8/8/4K1N1 w - - 0 1").expect("FEN should parse");
        let mut moves = legal_moves(&mut game).expect("generation should succeed");
        let hash_move = ChessMove::quiet(6, 21);

        order_moves(&game, &mut moves, Some(&hash_move), &KillerTable::default(), 0);

        assert_eq!(moves[0], hash_move);
        assert_eq!(moves[1], ChessMove::quiet(28, 35));
        assert!(moves[2..].iter().all(|m| m.score < CAPTURE_BASE));
    }

    #[test]
    fn prefers_cheaper_attacker_for_same_victim() {
        let game = GameState::from_fen("4k3/8/8/3r4/4P3/8/3Q4/4K3 w - - 0 1").expect("FEN should parse");
        let mut moves = vec![ChessMove::quiet(11, 35), ChessMove::quiet(28, 35)];
        order_moves(&game, &mut moves, None, &KillerTable::default(), 0);
        assert_eq!(moves[0], ChessMove::quiet(28, 35));
    }

    #[test]
    fn killers_rank_above_plain_quiet_moves() {
        let game = GameState::new_game();
        let mut killers = KillerTable::default();
        killers.record(3, ChessMove::quiet(1, 18));
        let mut moves = vec![ChessMove::quiet(12, 28), ChessMove::quiet(1, 18)];
        order_moves(&game, &mut moves, None, &killers, 3);
        assert_eq!(moves[0], ChessMove::quiet(1, 18));

        order_moves(&game, &mut moves, None, &killers, 4);
        assert_eq!(moves[0], ChessMove::quiet(1, 18), "ties keep their order");
    }
}
