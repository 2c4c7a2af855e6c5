//! Error types shared by parsing, notation, move application and the player
//! front door.
//!
//! Expected game outcomes (no legal move, no draw claim) are not errors and
//! never travel through this type.

use thiserror::Error;

use crate::game_state::chess_types::Square;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid move text '{text}': {reason}")]
    InvalidMoveText { text: String, reason: String },

    /// A move could not be applied to the position it was offered for.
    #[error("illegal move {from}->{to}: {reason}")]
    IllegalMove {
        from: Square,
        to: Square,
        reason: String,
    },

    #[error("search was started without candidate moves")]
    NoCandidateMoves,

    #[error("opening book error: {0}")]
    OpeningBook(String),

    #[error("invalid option {name}={value}")]
    InvalidOption { name: String, value: String },

    #[error("no pending command from human player")]
    NoPendingCommand,

    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
