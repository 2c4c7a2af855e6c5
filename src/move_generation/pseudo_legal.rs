//! Pseudo-legal generation, one routine per piece family.
//!
//! Moves produced here may leave the mover's own king attacked; that is
//! filtered later by `remove_illegal`. Castling is the exception: the king
//! may not leave, cross or land on an attacked square, and that is checked
//! here since the filter only looks at the final king square.

use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_checks::is_square_attacked;
use crate::moves::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
};
use crate::moves::chess_move::ChessMove;

pub fn generate_pseudo_legal_moves(game_state: &GameState, out: &mut Vec<ChessMove>) {
    generate_pawn_moves(game_state, out);
    generate_knight_moves(game_state, out);
    generate_slider_moves(game_state, PieceKind::Bishop, out);
    generate_slider_moves(game_state, PieceKind::Rook, out);
    generate_slider_moves(game_state, PieceKind::Queen, out);
    generate_king_moves(game_state, out);
}

#[inline]
fn push_targets(from: Square, mut targets: u64, out: &mut Vec<ChessMove>) {
    while targets != 0 {
        let to = targets.trailing_zeros() as Square;
        out.push(ChessMove::quiet(from, to));
        targets &= targets - 1;
    }
}

#[inline]
fn push_pawn_move(from: Square, to: Square, promotes: bool, out: &mut Vec<ChessMove>) {
    if promotes {
        for promo in PROMOTION_KINDS {
            out.push(ChessMove::new(from, to, Some(promo)));
        }
    } else {
        out.push(ChessMove::quiet(from, to));
    }
}

pub fn generate_pawn_moves(game_state: &GameState, out: &mut Vec<ChessMove>) {
    let side = game_state.side_to_move;
    let enemy_occ = game_state.occupancy_by_color[side.opposite().index()];
    let empty = !game_state.occupancy_all;
    let (start_rank, promotion_rank) = match side {
        Color::Light => (1, 7),
        Color::Dark => (6, 0),
    };

    let mut pawns = game_state.pieces[side.index()][PieceKind::Pawn.index()];
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;

        let one_step = match side {
            Color::Light => from + 8,
            Color::Dark => from - 8,
        };
        if (1u64 << one_step) & empty != 0 {
            push_pawn_move(from, one_step, rank_of(one_step) == promotion_rank, out);

            if rank_of(from) == start_rank {
                let two_step = match side {
                    Color::Light => from + 16,
                    Color::Dark => from - 16,
                };
                if (1u64 << two_step) & empty != 0 {
                    out.push(ChessMove::quiet(from, two_step));
                }
            }
        }

        let mut captures = pawn_attacks(side, from) & enemy_occ;
        if let Some(ep) = game_state.en_passant_square {
            captures |= pawn_attacks(side, from) & (1u64 << ep);
        }
        while captures != 0 {
            let to = captures.trailing_zeros() as Square;
            push_pawn_move(from, to, rank_of(to) == promotion_rank, out);
            captures &= captures - 1;
        }
    }
}

pub fn generate_knight_moves(game_state: &GameState, out: &mut Vec<ChessMove>) {
    let side = game_state.side_to_move;
    let own_occ = game_state.occupancy_by_color[side.index()];

    let mut knights = game_state.pieces[side.index()][PieceKind::Knight.index()];
    while knights != 0 {
        let from = knights.trailing_zeros() as Square;
        push_targets(from, knight_attacks(from) & !own_occ, out);
        knights &= knights - 1;
    }
}

pub fn generate_slider_moves(game_state: &GameState, kind: PieceKind, out: &mut Vec<ChessMove>) {
    let side = game_state.side_to_move;
    let own_occ = game_state.occupancy_by_color[side.index()];
    let occupancy = game_state.occupancy_all;

    let mut sliders = game_state.pieces[side.index()][kind.index()];
    while sliders != 0 {
        let from = sliders.trailing_zeros() as Square;
        let attacks = match kind {
            PieceKind::Bishop => bishop_attacks(from, occupancy),
            PieceKind::Rook => rook_attacks(from, occupancy),
            _ => queen_attacks(from, occupancy),
        };
        push_targets(from, attacks & !own_occ, out);
        sliders &= sliders - 1;
    }
}

pub fn generate_king_moves(game_state: &GameState, out: &mut Vec<ChessMove>) {
    let side = game_state.side_to_move;
    let Some(from) = game_state.king_square(side) else {
        return;
    };

    let own_occ = game_state.occupancy_by_color[side.index()];
    push_targets(from, king_attacks(from) & !own_occ, out);

    generate_castling_moves(game_state, from, out);
}

struct CastleLane {
    right: CastlingRights,
    king_from: Square,
    king_to: Square,
    must_be_empty: u64,
    king_path: [Square; 2],
}

const LIGHT_LANES: [CastleLane; 2] = [
    CastleLane {
        right: CASTLE_LIGHT_KINGSIDE,
        king_from: 4,
        king_to: 6,
        must_be_empty: (1 << 5) | (1 << 6),
        king_path: [5, 6],
    },
    CastleLane {
        right: CASTLE_LIGHT_QUEENSIDE,
        king_from: 4,
        king_to: 2,
        must_be_empty: (1 << 1) | (1 << 2) | (1 << 3),
        king_path: [3, 2],
    },
];

const DARK_LANES: [CastleLane; 2] = [
    CastleLane {
        right: CASTLE_DARK_KINGSIDE,
        king_from: 60,
        king_to: 62,
        must_be_empty: (1 << 61) | (1 << 62),
        king_path: [61, 62],
    },
    CastleLane {
        right: CASTLE_DARK_QUEENSIDE,
        king_from: 60,
        king_to: 58,
        must_be_empty: (1 << 57) | (1 << 58) | (1 << 59),
        king_path: [59, 58],
    },
];

fn generate_castling_moves(game_state: &GameState, king_from: Square, out: &mut Vec<ChessMove>) {
    let side = game_state.side_to_move;
    let enemy = side.opposite();
    let lanes = match side {
        Color::Light => &LIGHT_LANES,
        Color::Dark => &DARK_LANES,
    };
    let own_rooks = game_state.pieces[side.index()][PieceKind::Rook.index()];

    for lane in lanes {
        if king_from != lane.king_from || game_state.castling_rights & lane.right == 0 {
            continue;
        }
        let rook_square = if lane.king_to > lane.king_from {
            lane.king_from + 3
        } else {
            lane.king_from - 4
        };
        if own_rooks & (1u64 << rook_square) == 0 {
            continue;
        }
        if game_state.occupancy_all & lane.must_be_empty != 0 {
            continue;
        }
        // Cannot castle out of, through, or into check.
        if is_square_attacked(game_state, king_from, enemy)
            || lane
                .king_path
                .iter()
                .any(|&sq| is_square_attacked(game_state, sq, enemy))
        {
            continue;
        }
        out.push(ChessMove::quiet(lane.king_from, lane.king_to));
    }
}

#[cfg(test)]
mod tests {
    use super::generate_pseudo_legal_moves;
    use crate::game_state::game_state::GameState;
    use crate::moves::chess_move::ChessMove;

    fn pseudo(fen: &str) -> Vec<ChessMove> {
        let game = GameState::from_fen(fen).expect("FEN should parse");
        let mut out = Vec::new();
        generate_pseudo_legal_moves(&game, &mut out);
        out
    }

    #[test]
    fn starting_position_has_twenty_pseudo_moves() {
        let moves = pseudo(crate::game_state::chess_rules::STARTING_POSITION_FEN);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn promotions_expand_to_four_pieces() {
        let moves = pseudo("7k/P7/8/8/8/8/8/K7 w - - 0 1");
        let promos = moves.iter().filter(|m| m.promotion.is_some()).count();
        assert_eq!(promos, 4);
    }

    #[test]
    fn en_passant_capture_is_generated() {
        let moves = pseudo("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert!(moves.contains(&ChessMove::quiet(36, 43)));
    }

    #[test]
    fn castling_through_attacked_square_is_not_generated() {
        // Dark rook on f8 covers f1.
        let moves = pseudo("4kr2/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(!moves.contains(&ChessMove::quiet(4, 6)));

        let free = pseudo("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(free.contains(&ChessMove::quiet(4, 6)));
    }
}
