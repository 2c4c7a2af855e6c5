//! Zobrist hashing support for fast position identity and repetition tracking.
//!
//! The keys are generated from a fixed seed so hashes are deterministic across
//! runs, which keeps book lookups and test fixtures stable.

use std::sync::OnceLock;

use crate::game_state::{chess_types::*, game_state::GameState};

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;

    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for color in &mut piece_square {
        for piece in color {
            for sq in piece {
                *sq = next_random_u64(&mut seed);
            }
        }
    }

    let side_to_move = next_random_u64(&mut seed);

    // Index 0 (no rights) stays zero so an empty rights mask adds nothing.
    let mut castling = [0u64; 16];
    for key in castling.iter_mut().skip(1) {
        *key = next_random_u64(&mut seed);
    }

    let mut en_passant_file = [0u64; 8];
    for key in &mut en_passant_file {
        *key = next_random_u64(&mut seed);
    }

    ZobristTables {
        piece_square,
        side_to_move,
        castling,
        en_passant_file,
    }
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
pub fn piece_square_key(color: Color, piece: PieceKind, square: Square) -> u64 {
    tables().piece_square[color.index()][piece.index()][square as usize]
}

#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    tables().castling[(castling_rights & 0x0F) as usize]
}

#[inline]
pub fn en_passant_file_key(file: u8) -> u64 {
    tables().en_passant_file[(file & 7) as usize]
}

/// Xor'ed in when dark is to move.
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// Compute the full position key from scratch.
///
/// `make_move` maintains the same value incrementally; this is the reference
/// it is checked against.
pub fn compute_zobrist_key(game_state: &GameState) -> u64 {
    let mut key = 0u64;

    for (square, piece) in game_state.squares.iter().enumerate() {
        if let Some(piece) = piece {
            key ^= piece_square_key(piece.color, piece.kind, square as Square);
        }
    }

    if game_state.side_to_move == Color::Dark {
        key ^= side_to_move_key();
    }

    key ^= castling_key(game_state.castling_rights);

    if let Some(ep_square) = game_state.en_passant_square {
        key ^= en_passant_file_key(file_of(ep_square));
    }

    key
}

#[inline]
pub fn refresh_game_state_hash(game_state: &mut GameState) {
    game_state.zobrist_key = compute_zobrist_key(game_state);
}
