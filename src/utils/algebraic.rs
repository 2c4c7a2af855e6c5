//! Square name conversions (`e4` <-> index).

use crate::errors::{EngineError, EngineResult};
use crate::game_state::chess_types::Square;

/// Convert a square name (for example: "e4") to a square index.
#[inline]
pub fn algebraic_to_square(square: &str) -> EngineResult<Square> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(EngineError::InvalidSquare(square.to_owned()));
    }

    let file = bytes[0];
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(EngineError::InvalidSquare(square.to_owned()));
    }

    Ok((rank - b'1') * 8 + (file - b'a'))
}

/// Name of a square index. Indices above 63 wrap onto the board.
#[inline]
pub fn square_name(square: Square) -> String {
    let square = square & 63;
    let file_char = char::from(b'a' + square % 8);
    let rank_char = char::from(b'1' + square / 8);
    format!("{file_char}{rank_char}")
}

#[inline]
pub fn file_char(square: Square) -> char {
    char::from(b'a' + (square & 63) % 8)
}

#[inline]
pub fn rank_char(square: Square) -> char {
    char::from(b'1' + (square & 63) / 8)
}

#[cfg(test)]
mod tests {
    use super::{algebraic_to_square, square_name};

    #[test]
    fn round_trip_square_conversions() {
        assert_eq!(algebraic_to_square("a1").expect("a1 should parse"), 0);
        assert_eq!(algebraic_to_square("h8").expect("h8 should parse"), 63);
        assert_eq!(square_name(0), "a1");
        assert_eq!(square_name(28), "e4");
    }

    #[test]
    fn rejects_off_board_names() {
        assert!(algebraic_to_square("i1").is_err());
        assert!(algebraic_to_square("a9").is_err());
        assert!(algebraic_to_square("e").is_err());
    }
}
