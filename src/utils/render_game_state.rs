//! Plain-text board diagram for logs and the analysis binary.

use crate::game_state::{chess_types::*, game_state::GameState};
use crate::utils::fen_generator::piece_to_fen_char;

const FILE_LABELS: &str = "   a b c d e f g h";

/// Rank 8 at the top, uppercase for light pieces, `.` for empty squares.
pub fn render_game_state(game_state: &GameState) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(FILE_LABELS);
    out.push('\n');

    for rank in (0..8u8).rev() {
        let label = char::from(b'1' + rank);
        out.push(label);
        out.push_str(" |");
        for file in 0..8u8 {
            out.push(' ');
            out.push(
                game_state
                    .piece_on(make_square(file, rank))
                    .map_or('.', piece_to_fen_char),
            );
        }
        out.push_str(" | ");
        out.push(label);
        out.push('\n');
    }

    out.push_str(FILE_LABELS);
    out.push('\n');
    out.push_str(match game_state.side_to_move {
        Color::Light => "light to move",
        Color::Dark => "dark to move",
    });
    out
}
