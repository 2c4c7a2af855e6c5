use std::thread;

use crate::errors::{EngineError, EngineResult};
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_apply::{make_move, unmake_move};
use crate::move_generation::legal_move_checks::side_to_move_in_check;
use crate::move_generation::move_generator::legal_moves;
use crate::moves::chess_move::ChessMove;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: usize,
    pub captures: usize,
    pub en_passant: usize,
    pub castles: usize,
    pub promotions: usize,
    pub checks: usize,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
    }
}

pub fn perft(game_state: &GameState, depth: u8) -> EngineResult<PerftCounts> {
    let mut work = game_state.clone();
    let mut total = PerftCounts::default();
    if depth == 0 {
        total.nodes = 1;
        return Ok(total);
    }
    perft_recurse(&mut work, depth, &mut total)?;
    Ok(total)
}

/// Same totals as [`perft`], with one worker thread per root move.
pub fn perft_multi_threaded(game_state: &GameState, depth: u8) -> EngineResult<PerftCounts> {
    if depth <= 1 {
        return perft(game_state, depth);
    }

    let mut root = game_state.clone();
    let root_moves = legal_moves(&mut root)?;

    let results: Vec<EngineResult<PerftCounts>> = thread::scope(|scope| {
        let handles: Vec<_> = root_moves
            .iter()
            .map(|mv| {
                let mut local_state = root.clone();
                scope.spawn(move || -> EngineResult<PerftCounts> {
                    let mut local = PerftCounts::default();
                    let undo = make_move(&mut local_state, mv)?;
                    perft_recurse(&mut local_state, depth - 1, &mut local)?;
                    unmake_move(&mut local_state, mv, undo);
                    Ok(local)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(EngineError::WorkerPanicked("perft".to_owned()))
                })
            })
            .collect()
    });

    let mut total = PerftCounts::default();
    for result in results {
        total.merge(result?);
    }
    Ok(total)
}

fn perft_recurse(
    game_state: &mut GameState,
    depth: u8,
    counts: &mut PerftCounts,
) -> EngineResult<()> {
    let moves = legal_moves(game_state)?;

    if depth == 1 {
        for mv in &moves {
            count_leaf(game_state, mv, counts)?;
        }
        return Ok(());
    }

    for mv in &moves {
        let undo = make_move(game_state, mv)?;
        perft_recurse(game_state, depth - 1, counts)?;
        unmake_move(game_state, mv, undo);
    }

    Ok(())
}

fn count_leaf(game_state: &mut GameState, mv: &ChessMove, counts: &mut PerftCounts) -> EngineResult<()> {
    let moved_kind = game_state.piece_on(mv.from).map(|p| p.kind);

    let undo = make_move(game_state, mv)?;
    counts.nodes += 1;
    if undo.captured_piece.is_some() {
        counts.captures += 1;
        if undo.captured_square != mv.to {
            counts.en_passant += 1;
        }
    }
    if moved_kind == Some(PieceKind::King) && mv.from.abs_diff(mv.to) == 2 {
        counts.castles += 1;
    }
    if mv.promotion.is_some() {
        counts.promotions += 1;
    }
    if side_to_move_in_check(game_state) {
        counts.checks += 1;
    }
    unmake_move(game_state, mv, undo);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    fn nodes(fen: &str, depth: u8) -> usize {
        let game = GameState::from_fen(fen).expect("FEN should parse");
        perft(&game, depth).expect("perft should run").nodes
    }

    #[test]
    fn perft_depth_zero_counts_single_node() {
        assert_eq!(nodes(STARTING_POSITION_FEN, 0), 1);
    }

    #[test]
    fn starting_position_counts() {
        assert_eq!(nodes(STARTING_POSITION_FEN, 1), 20);
        assert_eq!(nodes(STARTING_POSITION_FEN, 2), 400);

        let game = GameState::from_fen(STARTING_POSITION_FEN).expect("FEN should parse");
        let counts = perft(&game, 3).expect("perft should run");
        assert_eq!(counts.nodes, 8902);
        assert_eq!(counts.captures, 34);
        assert_eq!(counts.checks, 12);
    }

    #[test]
    fn kiwipete_counts() {
        let game = GameState::from_fen(KIWIPETE).expect("FEN should parse");
        let d1 = perft(&game, 1).expect("perft should run");
        assert_eq!(d1.nodes, 48);
        assert_eq!(d1.captures, 8);
        assert_eq!(d1.castles, 2);

        let d2 = perft(&game, 2).expect("perft should run");
        assert_eq!(d2.nodes, 2039);
        assert_eq!(d2.captures, 351);
        assert_eq!(d2.en_passant, 1);
        assert_eq!(d2.castles, 91);
        assert_eq!(d2.checks, 3);
    }

    #[test]
    fn tricky_position_counts() {
        assert_eq!(nodes(POSITION_3, 1), 14);
        assert_eq!(nodes(POSITION_3, 2), 191);
        assert_eq!(nodes(POSITION_3, 3), 2812);
        assert_eq!(nodes(POSITION_4, 1), 6);
        assert_eq!(nodes(POSITION_4, 2), 264);
        assert_eq!(nodes(POSITION_5, 1), 44);
        assert_eq!(nodes(POSITION_5, 2), 1486);
    }

    #[test]
    fn multi_threaded_matches_single_threaded() {
        let game = GameState::from_fen(KIWIPETE).expect("FEN should parse");
        let single = perft(&game, 2).expect("perft should run");
        let multi = perft_multi_threaded(&game, 2).expect("perft should run");
        assert_eq!(single, multi);
    }
}
