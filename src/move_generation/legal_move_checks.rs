use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};

#[inline]
pub fn is_king_in_check(game_state: &GameState, color: Color) -> bool {
    let Some(king_sq) = game_state.king_square(color) else {
        return false;
    };
    is_square_attacked(game_state, king_sq, color.opposite())
}

/// True when the side to move is in check.
#[inline]
pub fn side_to_move_in_check(game_state: &GameState) -> bool {
    is_king_in_check(game_state, game_state.side_to_move)
}

pub fn is_square_attacked(game_state: &GameState, square: Square, attacker_color: Color) -> bool {
    attackers_to_square(game_state, square, attacker_color) != 0
}

/// Bitboard of `attacker_color` pieces attacking `square`.
pub fn attackers_to_square(game_state: &GameState, square: Square, attacker_color: Color) -> u64 {
    let attacker = &game_state.pieces[attacker_color.index()];
    let occupancy = game_state.occupancy_all;

    // A pawn of the defending color on `square` would capture exactly where
    // attacking pawns stand.
    let pawns = pawn_attacks(attacker_color.opposite(), square) & attacker[PieceKind::Pawn.index()];
    let knights = knight_attacks(square) & attacker[PieceKind::Knight.index()];
    let kings = king_attacks(square) & attacker[PieceKind::King.index()];
    let diagonal = bishop_attacks(square, occupancy)
        & (attacker[PieceKind::Bishop.index()] | attacker[PieceKind::Queen.index()]);
    let straight = rook_attacks(square, occupancy)
        & (attacker[PieceKind::Rook.index()] | attacker[PieceKind::Queen.index()]);

    pawns | knights | kings | diagonal | straight
}
