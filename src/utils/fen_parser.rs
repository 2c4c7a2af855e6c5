//! FEN-to-GameState parser.
//!
//! Builds fully-populated incremental state from a Forsyth-Edwards Notation
//! string, including board, bitboards, rights, clocks and the Zobrist key.
//! The half-move and full-move fields may be omitted (EPD style).

use crate::errors::{EngineError, EngineResult};
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::moves::attacks::pawn_attacks;
use crate::search::zobrist::refresh_game_state_hash;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> EngineResult<GameState> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or_else(|| invalid("missing board layout"))?;
    let side_part = parts.next().ok_or_else(|| invalid("missing side-to-move"))?;
    let castling_part = parts.next().ok_or_else(|| invalid("missing castling rights"))?;
    let en_passant_part = parts.next().ok_or_else(|| invalid("missing en-passant square"))?;
    let halfmove_part = parts.next().unwrap_or("0");
    let fullmove_part = parts.next().unwrap_or("1");

    if parts.next().is_some() {
        return Err(invalid("extra trailing fields"));
    }

    let mut game_state = GameState::new_empty();

    parse_board(board_part, &mut game_state)?;
    game_state.side_to_move = parse_side_to_move(side_part)?;
    game_state.castling_rights = parse_castling_rights(castling_part)?;
    // Dropped unless a pawn can take, matching what make_move records.
    game_state.en_passant_square = parse_en_passant_square(en_passant_part)?
        .filter(|&ep| en_passant_capturable(&game_state, ep));
    game_state.halfmove_clock = halfmove_part
        .parse::<u16>()
        .map_err(|_| invalid(&format!("halfmove clock '{halfmove_part}'")))?;
    game_state.fullmove_number = fullmove_part
        .parse::<u16>()
        .map_err(|_| invalid(&format!("fullmove number '{fullmove_part}'")))?
        .max(1);

    for color in [Color::Light, Color::Dark] {
        if game_state.pieces[color.index()][PieceKind::King.index()].count_ones() != 1 {
            return Err(invalid("each side needs exactly one king"));
        }
    }

    refresh_game_state_hash(&mut game_state);
    Ok(game_state)
}

fn invalid(reason: &str) -> EngineError {
    EngineError::InvalidFen(reason.to_owned())
}

fn parse_board(board_part: &str, game_state: &mut GameState) -> EngineResult<()> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid("board layout must contain 8 ranks"));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_idx;
        let mut file = 0usize;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(invalid(&format!("empty-square count '{ch}'")));
                }
                file += empty_count as usize;
                continue;
            }

            let piece = piece_from_fen_char(ch)
                .ok_or_else(|| invalid(&format!("piece character '{ch}'")))?;
            if file >= 8 {
                return Err(invalid("board rank has too many files"));
            }
            if piece.kind == PieceKind::Pawn && (board_rank == 0 || board_rank == 7) {
                return Err(invalid("pawn on first or last rank"));
            }

            game_state.put_piece((board_rank * 8 + file) as Square, piece);
            file += 1;
        }

        if file != 8 {
            return Err(invalid("board rank does not sum to 8 files"));
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> EngineResult<Color> {
    match side_part {
        "w" => Ok(Color::Light),
        "b" => Ok(Color::Dark),
        _ => Err(invalid(&format!("side-to-move field '{side_part}'"))),
    }
}

fn parse_castling_rights(castling_part: &str) -> EngineResult<CastlingRights> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        match ch {
            'K' => rights |= CASTLE_LIGHT_KINGSIDE,
            'Q' => rights |= CASTLE_LIGHT_QUEENSIDE,
            'k' => rights |= CASTLE_DARK_KINGSIDE,
            'q' => rights |= CASTLE_DARK_QUEENSIDE,
            _ => return Err(invalid(&format!("castling rights character '{ch}'"))),
        }
    }

    Ok(rights)
}

fn parse_en_passant_square(en_passant_part: &str) -> EngineResult<Option<Square>> {
    if en_passant_part == "-" {
        return Ok(None);
    }

    Ok(Some(algebraic_to_square(en_passant_part)?))
}

fn en_passant_capturable(game_state: &GameState, ep: Square) -> bool {
    let side = game_state.side_to_move;
    let pawns = game_state.pieces[side.index()][PieceKind::Pawn.index()];
    pawn_attacks(side.opposite(), ep) & pawns != 0
}

fn piece_from_fen_char(ch: char) -> Option<Piece> {
    let color = if ch.is_ascii_uppercase() {
        Color::Light
    } else {
        Color::Dark
    };

    let kind = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some(Piece::new(color, kind))
}
