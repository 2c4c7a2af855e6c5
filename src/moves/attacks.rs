//! Attack bitboards for every piece kind.
//!
//! Leaper tables (knight, king, pawn captures) are generated at compile time;
//! slider attacks are traced ray by ray against the current occupancy.

use crate::game_state::chess_types::{Color, Square};

pub const KNIGHT_ATTACKS: [u64; 64] = generate_leaper_table(&KNIGHT_STEPS);
pub const KING_ATTACKS: [u64; 64] = generate_leaper_table(&KING_STEPS);
pub const LIGHT_PAWN_ATTACKS: [u64; 64] = generate_leaper_table(&[(-1, 1), (1, 1)]);
pub const DARK_PAWN_ATTACKS: [u64; 64] = generate_leaper_table(&[(-1, -1), (1, -1)]);

const KNIGHT_STEPS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
const ROOK_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

#[inline]
pub const fn knight_attacks(square: Square) -> u64 {
    KNIGHT_ATTACKS[square as usize]
}

#[inline]
pub const fn king_attacks(square: Square) -> u64 {
    KING_ATTACKS[square as usize]
}

/// Squares a pawn of `color` standing on `square` captures on.
#[inline]
pub const fn pawn_attacks(color: Color, square: Square) -> u64 {
    match color {
        Color::Light => LIGHT_PAWN_ATTACKS[square as usize],
        Color::Dark => DARK_PAWN_ATTACKS[square as usize],
    }
}

#[inline]
pub fn bishop_attacks(square: Square, occupancy: u64) -> u64 {
    BISHOP_DIRECTIONS
        .iter()
        .fold(0u64, |acc, &(df, dr)| acc | trace_ray(square, df, dr, occupancy))
}

#[inline]
pub fn rook_attacks(square: Square, occupancy: u64) -> u64 {
    ROOK_DIRECTIONS
        .iter()
        .fold(0u64, |acc, &(df, dr)| acc | trace_ray(square, df, dr, occupancy))
}

#[inline]
pub fn queen_attacks(square: Square, occupancy: u64) -> u64 {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}

fn trace_ray(square: Square, file_step: i32, rank_step: i32, occupancy: u64) -> u64 {
    let mut file = i32::from(square % 8) + file_step;
    let mut rank = i32::from(square / 8) + rank_step;
    let mut attacks = 0u64;

    while (0..8).contains(&file) && (0..8).contains(&rank) {
        let bit = 1u64 << (rank * 8 + file);
        attacks |= bit;
        if (occupancy & bit) != 0 {
            break;
        }
        file += file_step;
        rank += rank_step;
    }

    attacks
}

const fn generate_leaper_table(steps: &[(i32, i32)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0usize;

    while sq < 64 {
        let file = (sq % 8) as i32;
        let rank = (sq / 8) as i32;
        let mut attacks = 0u64;
        let mut i = 0usize;
        while i < steps.len() {
            let f = file + steps[i].0;
            let r = rank + steps[i].1;
            if f >= 0 && f < 8 && r >= 0 && r < 8 {
                attacks |= 1u64 << (r * 8 + f);
            }
            i += 1;
        }
        table[sq] = attacks;
        sq += 1;
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaper_table_sizes() {
        assert_eq!(knight_attacks(27).count_ones(), 8);
        assert_eq!(knight_attacks(0).count_ones(), 2);
        assert_eq!(king_attacks(0).count_ones(), 3);
        assert_eq!(king_attacks(27).count_ones(), 8);
    }

    #[test]
    fn pawn_attacks_point_forward() {
        let e2 = 12;
        assert_eq!(pawn_attacks(Color::Light, e2), (1u64 << 19) | (1u64 << 21));
        let e7 = 52;
        assert_eq!(pawn_attacks(Color::Dark, e7), (1u64 << 43) | (1u64 << 45));
        assert_eq!(pawn_attacks(Color::Light, 8), 1u64 << 17);
    }

    #[test]
    fn sliders_stop_at_first_blocker() {
        let a1 = 0;
        let blocker_on_a4 = 1u64 << 24;
        let attacks = rook_attacks(a1, blocker_on_a4);
        assert_ne!(attacks & (1u64 << 24), 0);
        assert_eq!(attacks & (1u64 << 32), 0);

        assert_eq!(queen_attacks(27, 0).count_ones(), 27);
        assert_eq!(bishop_attacks(27, 0).count_ones(), 13);
    }
}
