//! Core incremental board state representation.
//!
//! `GameState` keeps a square-indexed board alongside per-piece bitboards and
//! occupancy caches. All mutation goes through `put_piece` / `remove_piece`,
//! which keep the three views and the Zobrist key in sync.

use crate::errors::EngineResult;
use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::chess_types::*;
use crate::search::zobrist::piece_square_key;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// 8x8 board, `squares[0] == a1`.
    pub squares: [Option<Piece>; 64],

    // [color][piece_kind]
    pub pieces: [[u64; 6]; 2],
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,

    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,

    pub halfmove_clock: u16,
    pub fullmove_number: u16,

    pub zobrist_key: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            squares: [None; 64],
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,

            side_to_move: Color::Light,
            castling_rights: 0,
            en_passant_square: None,

            halfmove_clock: 0,
            fullmove_number: 1,

            zobrist_key: 0,
        }
    }
}

impl GameState {
    #[inline]
    pub fn new_empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn new_game() -> Self {
        parse_fen(STARTING_POSITION_FEN).expect("starting FEN should always parse")
    }

    #[inline]
    pub fn from_fen(fen: &str) -> EngineResult<Self> {
        parse_fen(fen)
    }

    #[inline]
    pub fn get_fen(&self) -> String {
        generate_fen(self)
    }

    #[inline]
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.squares[square as usize]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let kings = self.pieces[color.index()][PieceKind::King.index()];
        if kings == 0 {
            None
        } else {
            Some(kings.trailing_zeros() as Square)
        }
    }

    /// Place `piece` on an empty square, updating bitboards and hash.
    #[inline]
    pub fn put_piece(&mut self, square: Square, piece: Piece) {
        let mask = 1u64 << square;
        self.squares[square as usize] = Some(piece);
        self.pieces[piece.color.index()][piece.kind.index()] |= mask;
        self.occupancy_by_color[piece.color.index()] |= mask;
        self.occupancy_all |= mask;
        self.zobrist_key ^= piece_square_key(piece.color, piece.kind, square);
    }

    /// Clear `square`, returning whatever stood there.
    #[inline]
    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.squares[square as usize].take()?;
        let mask = !(1u64 << square);
        self.pieces[piece.color.index()][piece.kind.index()] &= mask;
        self.occupancy_by_color[piece.color.index()] &= mask;
        self.occupancy_all &= mask;
        self.zobrist_key ^= piece_square_key(piece.color, piece.kind, square);
        Some(piece)
    }
}

#[cfg(test)]
mod tests {
    use super::GameState;
    use crate::game_state::chess_types::{Color, Piece, PieceKind};
    use crate::search::zobrist::compute_zobrist_key;

    #[test]
    fn put_and_remove_keep_views_in_sync() {
        let mut game = GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let before = game.clone();

        game.put_piece(27, Piece::new(Color::Light, PieceKind::Queen));
        assert_eq!(game.piece_on(27), Some(Piece::new(Color::Light, PieceKind::Queen)));
        assert_ne!(game.occupancy_all & (1u64 << 27), 0);
        assert_eq!(game.zobrist_key, compute_zobrist_key(&game));

        let removed = game.remove_piece(27);
        assert_eq!(removed, Some(Piece::new(Color::Light, PieceKind::Queen)));
        assert_eq!(game, before);
    }

    #[test]
    fn king_square_finds_both_kings() {
        let game = GameState::new_game();
        assert_eq!(game.king_square(Color::Light), Some(4));
        assert_eq!(game.king_square(Color::Dark), Some(60));
    }
}
