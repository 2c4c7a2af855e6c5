//! Opening book built from tab-separated move sequences.
//!
//! Each row holds a sequence of long algebraic moves from the initial
//! position and an optional weight. Every prefix position of every row is
//! indexed by Zobrist key, so transpositions share their candidates.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::Rng;

use crate::errors::{EngineError, EngineResult};
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::apply_move;
use crate::move_generation::move_generator::legal_moves;
use crate::moves::chess_move::ChessMove;
use crate::utils::long_algebraic::long_algebraic_to_move;
use crate::utils::short_algebraic::move_to_san;

const DEFAULT_BOOK_TSV: &str = include_str!("data/default_book.tsv");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookMove {
    pub mv: ChessMove,
    pub weight: u32,
}

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    by_hash: HashMap<u64, Vec<BookMove>>,
}

impl OpeningBook {
    /// The book compiled into the crate.
    pub fn load_default() -> EngineResult<Self> {
        Self::from_tsv_str(DEFAULT_BOOK_TSV)
    }

    pub fn from_tsv_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            EngineError::OpeningBook(format!("failed reading {}: {e}", path.display()))
        })?;
        Self::from_tsv_str(&data)
    }

    /// Parse a TSV with a header row naming a `uci` (or `moves`) column and
    /// optionally a `weight` (or `count`) column. Rows without a weight count
    /// once.
    pub fn from_tsv_str(tsv: &str) -> EngineResult<Self> {
        let mut lines = tsv.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| EngineError::OpeningBook("opening TSV is empty".to_owned()))?;

        let mut sequence_idx = None;
        let mut weight_idx = None;
        for (i, name) in header.split('\t').enumerate() {
            match name.trim().to_ascii_lowercase().as_str() {
                "uci" | "moves" => sequence_idx = sequence_idx.or(Some(i)),
                "weight" | "count" => weight_idx = Some(i),
                _ => {}
            }
        }
        let sequence_idx = sequence_idx.ok_or_else(|| {
            EngineError::OpeningBook("header needs a 'uci' or 'moves' column".to_owned())
        })?;

        let mut book = Self::default();
        for line in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            let sequence = fields
                .get(sequence_idx)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    EngineError::OpeningBook(format!("missing move sequence in row '{line}'"))
                })?;

            let weight = match weight_idx.and_then(|idx| fields.get(idx)) {
                Some(text) => text.trim().parse::<u32>().map_err(|_| {
                    EngineError::OpeningBook(format!("bad weight '{}' in row '{line}'", text.trim()))
                })?,
                None => 1,
            };

            book.add_line(sequence, weight).map_err(|e| {
                EngineError::OpeningBook(format!("row '{line}': {e}"))
            })?;
        }

        Ok(book)
    }

    fn add_line(&mut self, sequence: &str, weight: u32) -> EngineResult<()> {
        let mut state = GameState::new_game();
        for token in sequence.split_whitespace() {
            let mv = long_algebraic_to_move(token, &mut state)?;

            let row = self.by_hash.entry(state.zobrist_key).or_default();
            match row.iter_mut().find(|entry| entry.mv == mv) {
                Some(entry) => entry.weight = entry.weight.saturating_add(weight),
                None => row.push(BookMove { mv, weight }),
            }

            state = apply_move(&state, &mv)?;
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn moves_for(&self, game_state: &GameState) -> Option<&[BookMove]> {
        self.by_hash
            .get(&game_state.zobrist_key)
            .map(|row| row.as_slice())
    }

    /// Candidates for `game_state` that are legal there, in book order.
    ///
    /// A hash collision could index a row for some other position; the
    /// legality filter keeps such entries out.
    fn legal_candidates(&self, game_state: &mut GameState) -> EngineResult<Vec<BookMove>> {
        let Some(row) = self.moves_for(game_state) else {
            return Ok(Vec::new());
        };
        let row = row.to_vec();
        let legal = legal_moves(game_state)?;
        Ok(row
            .into_iter()
            .filter(|entry| entry.weight > 0 && legal.contains(&entry.mv))
            .collect())
    }

    /// Pick a book move with probability proportional to its weight.
    pub fn get_book_move<R: Rng + ?Sized>(
        &self,
        game_state: &mut GameState,
        rng: &mut R,
    ) -> EngineResult<Option<ChessMove>> {
        let candidates = self.legal_candidates(game_state)?;
        let total_weight: u64 = candidates.iter().map(|c| u64::from(c.weight)).sum();
        if total_weight == 0 {
            return Ok(None);
        }

        let mut pick = rng.random_range(0..total_weight);
        for candidate in &candidates {
            let weight = u64::from(candidate.weight);
            if pick < weight {
                return Ok(Some(candidate.mv));
            }
            pick -= weight;
        }
        Ok(candidates.last().map(|c| c.mv))
    }

    /// Every book move for the position in short algebraic notation with its
    /// weight, heaviest first: `"e4(41) d4(25)"`.
    pub fn all_book_moves(&self, game_state: &mut GameState) -> EngineResult<String> {
        let mut candidates = self.legal_candidates(game_state)?;
        candidates.sort_by(|a, b| b.weight.cmp(&a.weight));

        let mut parts = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let san = move_to_san(game_state, &candidate.mv)?;
            parts.push(format!("{san}({})", candidate.weight));
        }
        Ok(parts.join(" "))
    }
}
