//! Crate root module declarations for the Kestrel chess engine core.
//!
//! Exposes the board representation, move generation, search, opening book
//! and player layers so binaries, tests and front-ends can import stable
//! module paths.

pub mod errors;

pub mod game_state {
    pub mod chess_rules;
    pub mod chess_types;
    pub mod game_state;
    pub mod undo_state;
}

pub mod moves {
    pub mod attacks;
    pub mod chess_move;
}

pub mod move_generation {
    pub mod legal_move_apply;
    pub mod legal_move_checks;
    pub mod move_generator;
    pub mod perft;
    pub mod pseudo_legal;
}

pub mod search {
    pub mod board_scoring;
    pub mod draw_rules;
    pub mod iterative_deepening;
    pub mod move_ordering;
    pub mod transposition_table;
    pub mod zobrist;
}

pub mod tables {
    pub mod opening_book;
}

pub mod engines {
    pub mod computer_player;
    pub mod human_player;
    pub mod player;
    pub mod random_selection;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod long_algebraic;
    pub mod render_game_state;
    pub mod short_algebraic;
}
