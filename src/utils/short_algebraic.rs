//! Short algebraic notation (`Nf3`, `exd5`, `O-O`, `e8=Q#`).

use crate::errors::{EngineError, EngineResult};
use crate::game_state::{chess_types::*, game_state::GameState};
use crate::move_generation::legal_move_apply::{make_move, unmake_move};
use crate::move_generation::legal_move_checks::side_to_move_in_check;
use crate::move_generation::move_generator::legal_moves;
use crate::moves::chess_move::ChessMove;
use crate::utils::algebraic::{file_char, rank_char, square_name};

/// Format `mv`, which must be legal in `game_state`.
///
/// The position is used for disambiguation and the check/mate suffix and is
/// restored before returning.
pub fn move_to_san(game_state: &mut GameState, mv: &ChessMove) -> EngineResult<String> {
    let piece = game_state.piece_on(mv.from).ok_or_else(|| EngineError::IllegalMove {
        from: mv.from,
        to: mv.to,
        reason: "no piece on from-square".to_owned(),
    })?;

    let mut out = String::new();
    if piece.kind == PieceKind::King && mv.from.abs_diff(mv.to) == 2 {
        out.push_str(if mv.to > mv.from { "O-O" } else { "O-O-O" });
    } else {
        let is_capture = game_state.piece_on(mv.to).is_some()
            || (piece.kind == PieceKind::Pawn && file_of(mv.from) != file_of(mv.to));

        if piece.kind == PieceKind::Pawn {
            if is_capture {
                out.push(file_char(mv.from));
            }
        } else {
            out.push(piece.kind.letter());
            out.push_str(&disambiguation(game_state, mv, piece.kind)?);
        }

        if is_capture {
            out.push('x');
        }
        out.push_str(&square_name(mv.to));

        if let Some(promo) = mv.promotion {
            out.push('=');
            out.push(promo.letter());
        }
    }

    let undo = make_move(game_state, mv)?;
    let suffix = if side_to_move_in_check(game_state) {
        match legal_moves(game_state) {
            Ok(replies) if replies.is_empty() => Some('#'),
            Ok(_) => Some('+'),
            Err(err) => {
                unmake_move(game_state, mv, undo);
                return Err(err);
            }
        }
    } else {
        None
    };
    unmake_move(game_state, mv, undo);

    if let Some(suffix) = suffix {
        out.push(suffix);
    }
    Ok(out)
}

fn disambiguation(game_state: &mut GameState, mv: &ChessMove, kind: PieceKind) -> EngineResult<String> {
    let rivals: Vec<Square> = legal_moves(game_state)?
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && game_state.piece_on(other.from).map(|p| p.kind) == Some(kind)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return Ok(String::new());
    }
    if rivals.iter().all(|&sq| file_of(sq) != file_of(mv.from)) {
        return Ok(file_char(mv.from).to_string());
    }
    if rivals.iter().all(|&sq| rank_of(sq) != rank_of(mv.from)) {
        return Ok(rank_char(mv.from).to_string());
    }
    Ok(square_name(mv.from))
}

/// Parse short algebraic text into the matching legal move.
///
/// Check and annotation marks are optional; `0-0` is accepted for `O-O`.
pub fn san_to_move(text: &str, game_state: &mut GameState) -> EngineResult<ChessMove> {
    let wanted = normalize(text);
    for mv in legal_moves(game_state)? {
        if normalize(&move_to_san(game_state, &mv)?) == wanted {
            return Ok(mv);
        }
    }
    Err(EngineError::InvalidMoveText {
        text: text.to_owned(),
        reason: "no legal move matches".to_owned(),
    })
}

fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
}

#[cfg(test)]
mod tests {
    use super::{move_to_san, san_to_move};
    use crate::game_state::game_state::GameState;
    use crate::game_state::chess_types::PieceKind;
    use crate::moves::chess_move::ChessMove;

    fn san(fen: &str, mv: ChessMove) -> String {
        let mut game = GameState::from_fen(fen).expect("FEN should parse");
        move_to_san(&mut game, &mv).expect("SAN should format")
    }

    #[test]
    fn formats_basic_moves() {
        let start = crate::game_state::chess_rules::STARTING_POSITION_FEN;
        assert_eq!(san(start, ChessMove::quiet(12, 28)), "e4");
        assert_eq!(san(start, ChessMove::quiet(6, 21)), "Nf3");
    }

    #[test]
    fn formats_captures_castling_and_promotion() {
        assert_eq!(
            san("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", ChessMove::quiet(28, 35)),
            "exd5"
        );
        assert_eq!(
            san("4k3/8/8/8/8/8/8/4K2R w K - 0 1", ChessMove::quiet(4, 6)),
            "O-O"
        );
        assert_eq!(
            san("8/P7/8/8/8/8/8/k6K w - - 0 1", ChessMove::new(48, 56, Some(PieceKind::Queen))),
            "a8=Q+"
        );
    }

    #[test]
    fn disambiguates_and_marks_mate() {
        // Rooks on a1 and h1 can both reach d1.
        assert_eq!(
            san("4k3/8/8/8/8/8/4K3/R6R w - - 0 1", ChessMove::quiet(0, 3)),
            "Rad1"
        );
        assert_eq!(
            san("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", ChessMove::quiet(0, 56)),
            "Ra8#"
        );
    }

    #[test]
    fn parses_short_algebraic() {
        let mut game = GameState::new_game();
        let before = game.clone();
        assert_eq!(
            san_to_move("Nf3", &mut game).expect("Nf3 should parse"),
            ChessMove::quiet(6, 21)
        );
        assert!(san_to_move("Nf4", &mut game).is_err());
        assert_eq!(game, before);
    }
}
