//! Fixed-size transposition table keyed by Zobrist hash.
//!
//! One slot per index (no chaining). Entries carry the generation of the
//! search that wrote them; a new search bumps the generation so that deep
//! results from earlier moves give way to anything the current search finds.

use std::collections::HashSet;

use tracing::trace;

use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::make_move;
use crate::move_generation::move_generator::legal_moves;
use crate::moves::chess_move::ChessMove;
use crate::utils::short_algebraic::move_to_san;

pub const DEFAULT_TT_LOG_SIZE: u8 = 15;
const MAX_TT_LOG_SIZE: u8 = 28;

/// Longest principal variation `extract_pv` will walk.
pub const MAX_PV_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Fail high: the true score is at least `score`.
    Lower,
    /// Fail low: the true score is at most `score`.
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Option<ChessMove>,
    pub score: i32,
    pub depth: u8,
    pub bound: Bound,
    pub generation: u8,
}

impl TTEntry {
    /// Whether this entry may cut a node searched to `depth` with window
    /// `(alpha, beta)`, given `score` already converted to the node's ply.
    #[inline]
    pub fn usable_cutoff(&self, score: i32, depth: u8, alpha: i32, beta: i32) -> bool {
        if self.depth < depth {
            return false;
        }
        match self.bound {
            Bound::Exact => true,
            Bound::Lower => score >= beta,
            Bound::Upper => score <= alpha,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TTStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
    pub rejected_stores: u64,
}

/// One step of a principal variation read back from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvMove {
    pub mv: ChessMove,
    pub bound: Bound,
    pub san: String,
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    mask: usize,
    generation: u8,
    stats: TTStats,
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TT_LOG_SIZE)
    }
}

impl TranspositionTable {
    /// Table with `2^log_size` slots.
    pub fn new(log_size: u8) -> Self {
        let log_size = log_size.clamp(1, MAX_TT_LOG_SIZE);
        let count = 1usize << log_size;
        Self {
            entries: vec![None; count],
            mask: count - 1,
            generation: 0,
            stats: TTStats::default(),
        }
    }

    /// Advance the age stamp. Called once per top-level search.
    #[inline]
    pub fn next_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.generation = 0;
        self.stats = TTStats::default();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> TTStats {
        self.stats
    }

    #[inline]
    fn idx(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    /// Entry for `key`, if the slot holds exactly that key.
    pub fn probe(&mut self, key: u64) -> Option<TTEntry> {
        self.stats.probes += 1;
        let hit = self.peek(key).copied();
        if hit.is_some() {
            self.stats.hits += 1;
        }
        hit
    }

    /// Like [`probe`](Self::probe) without touching the statistics.
    #[inline]
    pub fn peek(&self, key: u64) -> Option<&TTEntry> {
        self.entries[self.idx(key)]
            .as_ref()
            .filter(|entry| entry.key == key)
    }

    /// Store `entry` stamped with the current generation.
    ///
    /// An occupied slot is kept when it was written by the current search
    /// with at least the new entry's depth (strictly greater for the same
    /// key, so a same-depth re-search refreshes it).
    pub fn store(&mut self, mut entry: TTEntry) {
        entry.generation = self.generation;
        let idx = self.idx(entry.key);

        if let Some(existing) = self.entries[idx] {
            let fresh = existing.generation == self.generation;
            let same_key = existing.key == entry.key;
            let protected = if same_key {
                existing.depth > entry.depth
            } else {
                existing.depth >= entry.depth
            };
            if fresh && protected {
                self.stats.rejected_stores += 1;
                return;
            }
            if same_key && entry.best_move.is_none() {
                entry.best_move = existing.best_move;
            }
        }

        self.stats.stores += 1;
        self.entries[idx] = Some(entry);
    }

    /// Follow stored best moves from `game_state`.
    ///
    /// Stops on a miss, on a stored move that is not legal in the reached
    /// position, after a move that repeats an earlier position of the line,
    /// or at [`MAX_PV_LENGTH`] moves.
    pub fn principal_variation(&self, game_state: &GameState) -> Vec<PvMove> {
        let mut state = game_state.clone();
        let mut seen = HashSet::new();
        seen.insert(state.zobrist_key);
        let mut line = Vec::new();

        while line.len() < MAX_PV_LENGTH {
            let Some(entry) = self.peek(state.zobrist_key) else {
                break;
            };
            let Some(mv) = entry.best_move else {
                break;
            };
            let Ok(legal) = legal_moves(&mut state) else {
                break;
            };
            if !legal.contains(&mv) {
                trace!(key = state.zobrist_key, mv = %mv, "stale PV move");
                break;
            }
            let Ok(san) = move_to_san(&mut state, &mv) else {
                break;
            };
            let bound = entry.bound;
            if make_move(&mut state, &mv).is_err() {
                break;
            }
            line.push(PvMove { mv, bound, san });

            if !seen.insert(state.zobrist_key) {
                break;
            }
        }

        line
    }

    /// Principal variation as space-separated short algebraic moves; fail
    /// high/low entries are prefixed with `>` / `<`.
    pub fn extract_pv(&self, game_state: &GameState) -> String {
        self.principal_variation(game_state)
            .iter()
            .map(|step| match step.bound {
                Bound::Exact => step.san.clone(),
                Bound::Lower => format!(">{}", step.san),
                Bound::Upper => format!("<{}", step.san),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
