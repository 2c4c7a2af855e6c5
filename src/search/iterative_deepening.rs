//! Iterative deepening search with negamax alpha-beta pruning.
//!
//! A `Search` owns a private copy of the root position and mutates it with
//! make/unmake while walking the tree. Results of every completed depth are
//! committed to the root move list, which then orders the next depth. A depth
//! interrupted by the time or node budget is thrown away.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::errors::{EngineError, EngineResult};
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::{make_move, unmake_move};
use crate::move_generation::legal_move_checks::{is_king_in_check, side_to_move_in_check};
use crate::move_generation::move_generator::pseudo_legal_moves;
use crate::moves::chess_move::ChessMove;
use crate::search::board_scoring::{is_mate_score, mated_in, BoardScorer, MATE_SCORE, MATE_THRESHOLD};
use crate::search::draw_rules::{can_claim_draw_50, is_search_repetition};
use crate::search::move_ordering::{
    is_tactical, order_moves, score_move_list, sort_by_score, KillerTable, MAX_PLY,
};
use crate::search::transposition_table::{Bound, TTEntry, TranspositionTable};

const INFINITE_SCORE: i32 = MATE_SCORE + 1;
const QUIESCENCE_MAX_PLY: u8 = 10;

/// Nodes visited between two reads of the clock and the shared time limits.
pub const TIME_CHECK_INTERVAL: u64 = 1000;

pub const MAX_SEARCH_DEPTH: u8 = 100;

const UNLIMITED_MS: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Do not start another depth once this much time has passed.
    pub min_time_ms: Option<u64>,
    /// Abort the running depth once this much time has passed.
    pub max_time_ms: Option<u64>,
    pub max_depth: u8,
    pub max_nodes: Option<u64>,
    pub verbose: bool,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            min_time_ms: None,
            max_time_ms: None,
            max_depth: MAX_SEARCH_DEPTH,
            max_nodes: None,
            verbose: false,
        }
    }
}

impl SearchLimits {
    pub fn depth(max_depth: u8) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }
}

/// Shared view of a running search's time limits.
///
/// Cloned out of a `Search` so another thread can move the limits; the search
/// picks the new values up at its next time check.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    limits: Arc<SharedLimits>,
}

#[derive(Debug)]
struct SharedLimits {
    min_time_ms: AtomicU64,
    max_time_ms: AtomicU64,
}

impl SearchHandle {
    fn new(min_time_ms: Option<u64>, max_time_ms: Option<u64>) -> Self {
        let handle = Self {
            limits: Arc::new(SharedLimits {
                min_time_ms: AtomicU64::new(UNLIMITED_MS),
                max_time_ms: AtomicU64::new(UNLIMITED_MS),
            }),
        };
        handle.time_limit(min_time_ms, max_time_ms);
        handle
    }

    /// Replace both limits. A minimum above the maximum is lowered to it.
    pub fn time_limit(&self, min_time_ms: Option<u64>, max_time_ms: Option<u64>) {
        let max = max_time_ms.unwrap_or(UNLIMITED_MS);
        let min = min_time_ms.unwrap_or(UNLIMITED_MS).min(max);
        self.limits.min_time_ms.store(min, Ordering::Relaxed);
        self.limits.max_time_ms.store(max, Ordering::Relaxed);
    }

    #[inline]
    pub fn min_time_ms(&self) -> Option<u64> {
        decode_limit(self.limits.min_time_ms.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn max_time_ms(&self) -> Option<u64> {
        decode_limit(self.limits.max_time_ms.load(Ordering::Relaxed))
    }
}

#[inline]
fn decode_limit(raw: u64) -> Option<u64> {
    (raw != UNLIMITED_MS).then_some(raw)
}

/// Progress of a search after one completed depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub depth: u8,
    pub score: i32,
    pub best_move: ChessMove,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub pv: String,
}

/// Observer of a running search. Callbacks run on the search's thread, in
/// depth order, and stop before `iterative_deepening` returns.
pub trait SearchListener {
    fn notify_depth(&mut self, _depth: u8) {}

    /// Root move about to be searched, with its 1-based position in the list.
    fn notify_current_move(&mut self, _mv: &ChessMove, _move_number: usize) {}

    fn notify_progress(&mut self, report: &SearchReport);
}

pub struct Search<'a, S: BoardScorer> {
    game_state: GameState,
    /// Keys of every position before the current node: game history first,
    /// then the path from the root.
    pos_hash_list: Vec<u64>,
    pos_hash_first_new: usize,
    tt: &'a mut TranspositionTable,
    scorer: &'a S,
    listener: Option<&'a mut dyn SearchListener>,
    handle: SearchHandle,
    killers: KillerTable,
    max_depth: u8,
    max_nodes: Option<u64>,
    verbose: bool,
    nodes: u64,
    nodes_since_check: u64,
    started_at: Instant,
    stopped: bool,
}

impl<'a, S: BoardScorer> Search<'a, S> {
    /// `history` holds the keys of the game positions before `game_state`.
    pub fn new(
        game_state: &GameState,
        history: &[u64],
        tt: &'a mut TranspositionTable,
        scorer: &'a S,
        limits: SearchLimits,
    ) -> Self {
        let mut pos_hash_list = Vec::with_capacity(history.len() + MAX_PLY);
        pos_hash_list.extend_from_slice(history);

        Self {
            game_state: game_state.clone(),
            pos_hash_first_new: pos_hash_list.len(),
            pos_hash_list,
            tt,
            scorer,
            listener: None,
            handle: SearchHandle::new(limits.min_time_ms, limits.max_time_ms),
            killers: KillerTable::default(),
            max_depth: limits.max_depth.max(1),
            max_nodes: limits.max_nodes,
            verbose: limits.verbose,
            nodes: 0,
            nodes_since_check: 0,
            started_at: Instant::now(),
            stopped: false,
        }
    }

    pub fn set_listener(&mut self, listener: &'a mut dyn SearchListener) {
        self.listener = Some(listener);
    }

    #[inline]
    pub fn handle(&self) -> SearchHandle {
        self.handle.clone()
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Score every candidate at depth 0 for ordering; the root TT entry wins.
    pub fn score_root_moves(&mut self, moves: &mut [ChessMove]) {
        let hash_move = self
            .tt
            .peek(self.game_state.zobrist_key)
            .and_then(|entry| entry.best_move);
        score_move_list(&self.game_state, moves, hash_move.as_ref(), &self.killers, 0);
    }

    #[inline]
    fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Find the best of `moves`, deepening one ply at a time until a limit
    /// is hit. The returned move is always one of `moves`, with its score set.
    ///
    /// After each completed depth `moves` carries that depth's scores and is
    /// sorted best first. If no depth completes it is left untouched.
    pub fn iterative_deepening(&mut self, moves: &mut [ChessMove]) -> EngineResult<ChessMove> {
        if moves.is_empty() {
            return Err(EngineError::NoCandidateMoves);
        }

        self.started_at = Instant::now();
        self.nodes = 0;
        self.nodes_since_check = 0;
        self.stopped = false;
        self.killers.clear();

        let root_moves = moves;
        let mut best = root_moves[0].with_score(0);
        let mut completed_depth = 0u8;

        for depth in 1..=self.max_depth {
            if let Some(listener) = self.listener.as_deref_mut() {
                listener.notify_depth(depth);
            }

            let Some(scores) = self.search_root(root_moves, depth)? else {
                trace!(depth, nodes = self.nodes, "depth aborted");
                break;
            };

            for (mv, score) in root_moves.iter_mut().zip(scores) {
                mv.score = score;
            }
            sort_by_score(root_moves);
            best = root_moves[0];
            completed_depth = depth;

            self.tt.store(TTEntry {
                key: self.game_state.zobrist_key,
                best_move: Some(best),
                score: best.score,
                depth,
                bound: Bound::Exact,
                generation: 0,
            });
            self.report_depth(depth, &best);

            if root_moves.len() == 1 {
                break;
            }
            if is_mate_score(best.score) && MATE_SCORE - best.score.abs() <= i32::from(depth) {
                break;
            }
            if self
                .handle
                .min_time_ms()
                .is_some_and(|min| self.elapsed_ms() >= min)
            {
                break;
            }
            if self.max_nodes.is_some_and(|max| self.nodes >= max) {
                break;
            }
        }

        let elapsed_ms = self.elapsed_ms();
        let nps = if elapsed_ms == 0 {
            0
        } else {
            self.nodes.saturating_mul(1000) / elapsed_ms
        };
        let tt_stats = self.tt.stats();
        if self.verbose {
            info!(
                best = %best,
                score = best.score,
                depth = completed_depth,
                nodes = self.nodes,
                elapsed_ms,
                nps,
                tt_probes = tt_stats.probes,
                tt_hits = tt_stats.hits,
                tt_stores = tt_stats.stores,
                tt_rejected = tt_stats.rejected_stores,
                tt_generation = self.tt.generation(),
                "search finished"
            );
        } else {
            debug!(
                best = %best,
                score = best.score,
                depth = completed_depth,
                nodes = self.nodes,
                elapsed_ms,
                nps,
                tt_probes = tt_stats.probes,
                tt_hits = tt_stats.hits,
                tt_stores = tt_stats.stores,
                tt_rejected = tt_stats.rejected_stores,
                tt_generation = self.tt.generation(),
                "search finished"
            );
        }

        Ok(best)
    }

    fn report_depth(&mut self, depth: u8, best: &ChessMove) {
        let report = SearchReport {
            depth,
            score: best.score,
            best_move: *best,
            nodes: self.nodes,
            elapsed_ms: self.elapsed_ms(),
            pv: self.tt.extract_pv(&self.game_state),
        };

        if self.verbose {
            info!(depth, best = %best, score = report.score, nodes = report.nodes, pv = %report.pv, "depth complete");
        } else {
            debug!(depth, best = %best, score = report.score, nodes = report.nodes, pv = %report.pv, "depth complete");
        }

        if let Some(listener) = self.listener.as_deref_mut() {
            listener.notify_progress(&report);
        }
    }

    /// One full pass over the root moves. `None` when the budget ran out.
    ///
    /// Depth one gives every move an open window so each gets an exact
    /// score; deeper passes narrow alpha as usual.
    fn search_root(&mut self, root_moves: &[ChessMove], depth: u8) -> EngineResult<Option<Vec<i32>>> {
        let mut alpha = -INFINITE_SCORE;
        let beta = INFINITE_SCORE;
        let mut scores = Vec::with_capacity(root_moves.len());
        let root_key = self.game_state.zobrist_key;

        for (idx, mv) in root_moves.iter().enumerate() {
            if let Some(listener) = self.listener.as_deref_mut() {
                listener.notify_current_move(mv, idx + 1);
            }

            let window_alpha = if depth == 1 { -INFINITE_SCORE } else { alpha };

            let undo = make_move(&mut self.game_state, mv)?;
            self.pos_hash_list.push(root_key);
            let child = self.negamax(depth - 1, -beta, -window_alpha, 1);
            self.pos_hash_list.pop();
            unmake_move(&mut self.game_state, mv, undo);

            let Some(score) = child? else {
                return Ok(None);
            };
            let score = -score;
            scores.push(score);
            if score > alpha {
                alpha = score;
            }
        }

        Ok(Some(scores))
    }

    #[inline]
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if self.max_nodes.is_some_and(|max| self.nodes >= max) {
            self.stopped = true;
            return true;
        }

        self.nodes_since_check += 1;
        if self.nodes_since_check >= TIME_CHECK_INTERVAL {
            self.nodes_since_check = 0;
            if self
                .handle
                .max_time_ms()
                .is_some_and(|max| self.elapsed_ms() >= max)
            {
                self.stopped = true;
            }
        }
        self.stopped
    }

    fn negamax(&mut self, depth: u8, mut alpha: i32, beta: i32, ply: usize) -> EngineResult<Option<i32>> {
        if self.should_stop() {
            return Ok(None);
        }
        self.nodes += 1;

        let key = self.game_state.zobrist_key;
        let in_check = side_to_move_in_check(&self.game_state);

        if is_search_repetition(
            key,
            &self.pos_hash_list,
            self.pos_hash_first_new,
            self.game_state.halfmove_clock,
        ) {
            return Ok(Some(0));
        }
        if can_claim_draw_50(&self.game_state) && !in_check {
            return Ok(Some(0));
        }
        if ply >= MAX_PLY - 1 {
            return Ok(Some(self.scorer.score(&self.game_state)));
        }

        let tt_entry = self.tt.probe(key);
        if let Some(entry) = tt_entry {
            let score = tt_score_from_storage(entry.score, ply);
            if entry.usable_cutoff(score, depth, alpha, beta) {
                return Ok(Some(score));
            }
        }

        if depth == 0 {
            return self.quiescence(alpha, beta, ply, 0);
        }

        let hash_move = tt_entry.and_then(|entry| entry.best_move);
        let mut moves = pseudo_legal_moves(&self.game_state);
        order_moves(&self.game_state, &mut moves, hash_move.as_ref(), &self.killers, ply);

        let mover = self.game_state.side_to_move;
        let alpha_orig = alpha;
        let mut best_score = -INFINITE_SCORE;
        let mut best_move = None;
        let mut legal_count = 0usize;

        for mv in moves {
            let tactical = is_tactical(&self.game_state, &mv);
            let undo = make_move(&mut self.game_state, &mv)?;
            if is_king_in_check(&self.game_state, mover) {
                unmake_move(&mut self.game_state, &mv, undo);
                continue;
            }
            legal_count += 1;

            self.pos_hash_list.push(key);
            let child = self.negamax(depth - 1, -beta, -alpha, ply + 1);
            self.pos_hash_list.pop();
            unmake_move(&mut self.game_state, &mv, undo);

            let Some(score) = child? else {
                return Ok(None);
            };
            let score = -score;

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if !tactical {
                    self.killers.record(ply, mv);
                }
                break;
            }
        }

        if legal_count == 0 {
            // A 50-move claim does not save a side that is mated.
            return Ok(Some(if in_check { mated_in(ply) } else { 0 }));
        }
        if can_claim_draw_50(&self.game_state) {
            return Ok(Some(0));
        }

        let bound = if best_score <= alpha_orig {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(TTEntry {
            key,
            best_move,
            score: tt_score_for_storage(best_score, ply),
            depth,
            bound,
            generation: 0,
        });

        Ok(Some(best_score))
    }

    /// Captures, promotions and check evasions past the horizon; quiet
    /// checking moves are also tried on the first quiescence ply.
    fn quiescence(&mut self, mut alpha: i32, beta: i32, ply: usize, qply: u8) -> EngineResult<Option<i32>> {
        if qply > 0 {
            if self.should_stop() {
                return Ok(None);
            }
            self.nodes += 1;
        }

        if qply >= QUIESCENCE_MAX_PLY || ply >= MAX_PLY - 1 {
            return Ok(Some(self.scorer.score(&self.game_state)));
        }

        let mover = self.game_state.side_to_move;
        let in_check = side_to_move_in_check(&self.game_state);
        let mut best_score = -INFINITE_SCORE;

        if !in_check {
            let stand_pat = self.scorer.score(&self.game_state);
            if stand_pat >= beta {
                return Ok(Some(stand_pat));
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            best_score = stand_pat;
        }

        let mut moves = pseudo_legal_moves(&self.game_state);
        if !in_check {
            let mut candidates = Vec::with_capacity(moves.len());
            for mv in moves {
                if is_tactical(&self.game_state, &mv)
                    || (qply == 0 && self.gives_check(&mv)?)
                {
                    candidates.push(mv);
                }
            }
            moves = candidates;
        }
        order_moves(&self.game_state, &mut moves, None, &self.killers, ply);

        let mut legal_count = 0usize;
        for mv in moves {
            let undo = make_move(&mut self.game_state, &mv)?;
            if is_king_in_check(&self.game_state, mover) {
                unmake_move(&mut self.game_state, &mv, undo);
                continue;
            }
            legal_count += 1;

            let key_before = undo.prev_zobrist_key;
            self.pos_hash_list.push(key_before);
            let child = self.quiescence(-beta, -alpha, ply + 1, qply + 1);
            self.pos_hash_list.pop();
            unmake_move(&mut self.game_state, &mv, undo);

            let Some(score) = child? else {
                return Ok(None);
            };
            let score = -score;

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        if in_check && legal_count == 0 {
            return Ok(Some(mated_in(ply)));
        }
        Ok(Some(best_score))
    }

    fn gives_check(&mut self, mv: &ChessMove) -> EngineResult<bool> {
        let mover = self.game_state.side_to_move;
        let undo = make_move(&mut self.game_state, mv)?;
        let checks = !is_king_in_check(&self.game_state, mover)
            && side_to_move_in_check(&self.game_state);
        unmake_move(&mut self.game_state, mv, undo);
        Ok(checks)
    }
}

/// Mate scores are stored relative to the node so they stay valid when the
/// same position is reached at a different ply.
#[inline]
fn tt_score_for_storage(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

#[inline]
fn tt_score_from_storage(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}
