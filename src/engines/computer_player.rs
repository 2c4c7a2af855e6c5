//! The computer side of a game.
//!
//! `ComputerPlayer` turns a position plus game history into a command: a
//! side swap when no move exists, a book move, a forced move, or the result
//! of an iterative deepening search, annotated with a draw claim when the
//! rules allow one and the move is not winning.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::engines::player::{DrawClaim, DrawRule, Player, PlayerCommand};
use crate::engines::random_selection::pick_weighted;
use crate::errors::{EngineError, EngineResult};
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::{make_move, unmake_move};
use crate::move_generation::move_generator::{legal_moves, no_move_reason};
use crate::moves::chess_move::ChessMove;
use crate::search::board_scoring::MaterialScorer;
use crate::search::draw_rules::{can_claim_draw_50, can_claim_draw_rep};
use crate::search::iterative_deepening::{
    Search, SearchHandle, SearchLimits, SearchListener, MAX_SEARCH_DEPTH,
};
use crate::search::transposition_table::{TranspositionTable, DEFAULT_TT_LOG_SIZE};
use crate::tables::opening_book::OpeningBook;
use crate::utils::short_algebraic::move_to_san;

pub const ENGINE_NAME: &str = concat!("Kestrel ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub min_time_ms: Option<u64>,
    pub max_time_ms: Option<u64>,
    pub max_depth: u8,
    pub max_nodes: Option<u64>,
    pub verbose: bool,
    pub tt_log_size: u8,
    pub book_enabled: bool,
    pub random_mode: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            min_time_ms: Some(10_000),
            max_time_ms: Some(10_000),
            max_depth: MAX_SEARCH_DEPTH,
            max_nodes: None,
            verbose: true,
            tt_log_size: DEFAULT_TT_LOG_SIZE,
            book_enabled: true,
            random_mode: false,
        }
    }
}

impl PlayerConfig {
    fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            min_time_ms: self.min_time_ms,
            max_time_ms: self.max_time_ms,
            max_depth: self.max_depth,
            max_nodes: self.max_nodes,
            verbose: self.verbose,
        }
    }
}

type ActiveSearch = Arc<Mutex<Option<SearchHandle>>>;

fn set_active(slot: &ActiveSearch, handle: Option<SearchHandle>) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = handle;
}

/// Adjusts the time limits of whatever search the owning player is running.
///
/// Obtained from `ComputerPlayer::remote_control` before the search starts,
/// so another thread can shorten or extend it.
#[derive(Debug, Clone)]
pub struct RemoteControl {
    active: ActiveSearch,
}

impl RemoteControl {
    /// Returns false when no search was running.
    pub fn time_limit(&self, min_time_ms: Option<u64>, max_time_ms: Option<u64>) -> bool {
        let guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(handle) => {
                handle.time_limit(min_time_ms, max_time_ms);
                true
            }
            None => false,
        }
    }
}

pub struct ComputerPlayer {
    config: PlayerConfig,
    tt: TranspositionTable,
    book: OpeningBook,
    scorer: MaterialScorer,
    listener: Option<Box<dyn SearchListener + Send>>,
    active_search: ActiveSearch,
    rng: StdRng,
}

impl Default for ComputerPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputerPlayer {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    pub fn with_config(config: PlayerConfig) -> Self {
        let book = OpeningBook::load_default().unwrap_or_else(|err| {
            warn!(%err, "built-in opening book failed to load");
            OpeningBook::default()
        });

        Self {
            tt: TranspositionTable::new(config.tt_log_size),
            config,
            book,
            scorer: MaterialScorer,
            listener: None,
            active_search: Arc::default(),
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Reproducible book and random-mode choices.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_book(mut self, book: OpeningBook) -> Self {
        self.book = book;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    #[inline]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[inline]
    pub fn transposition_table(&self) -> &TranspositionTable {
        &self.tt
    }

    pub fn set_listener(&mut self, listener: Box<dyn SearchListener + Send>) {
        self.listener = Some(listener);
    }

    pub fn remote_control(&self) -> RemoteControl {
        RemoteControl {
            active: Arc::clone(&self.active_search),
        }
    }

    /// Replace the transposition table with an empty one of `2^log_size` slots.
    pub fn set_tt_log_size(&mut self, log_size: u8) {
        self.config.tt_log_size = log_size;
        self.tt = TranspositionTable::new(log_size);
    }

    pub fn set_option(&mut self, name: &str, value: &str) -> EngineResult<()> {
        let invalid = || EngineError::InvalidOption {
            name: name.to_owned(),
            value: value.to_owned(),
        };

        match name.trim().to_ascii_lowercase().as_str() {
            "mintime" => {
                let min = parse_limit(value).ok_or_else(invalid)?;
                let max = self.config.max_time_ms;
                self.time_limit(min, max, self.config.random_mode);
            }
            "maxtime" => {
                let max = parse_limit(value).ok_or_else(invalid)?;
                let min = self.config.min_time_ms;
                self.time_limit(min, max, self.config.random_mode);
            }
            "depth" => {
                let depth = value.trim().parse::<u8>().map_err(|_| invalid())?;
                self.config.max_depth = depth.clamp(1, MAX_SEARCH_DEPTH);
            }
            "nodes" => {
                self.config.max_nodes = parse_limit(value).ok_or_else(invalid)?;
            }
            "verbose" => {
                self.config.verbose = parse_bool(value).ok_or_else(invalid)?;
            }
            "hash" => {
                let log_size = value.trim().parse::<u8>().map_err(|_| invalid())?;
                self.set_tt_log_size(log_size);
            }
            "ownbook" => {
                self.config.book_enabled = parse_bool(value).ok_or_else(invalid)?;
            }
            "randommode" => {
                let random_mode = parse_bool(value).ok_or_else(invalid)?;
                let (min, max) = (self.config.min_time_ms, self.config.max_time_ms);
                self.time_limit(min, max, random_mode);
            }
            _ => return Err(invalid()),
        }
        Ok(())
    }

    /// Batch analysis: search `game_state` for `time_ms` without the book,
    /// history or draw claims. Returns the best move and its principal
    /// variation in short algebraic notation.
    pub fn search_position(&mut self, game_state: &GameState, time_ms: u64) -> EngineResult<(ChessMove, String)> {
        self.tt.next_generation();
        let mut position = game_state.clone();
        let mut moves = legal_moves(&mut position)?;

        let limits = SearchLimits {
            min_time_ms: Some(time_ms),
            max_time_ms: Some(time_ms),
            max_depth: MAX_SEARCH_DEPTH,
            max_nodes: None,
            verbose: false,
        };
        let best = self.run_search(&position, &[], &mut moves, limits, true)?;

        let mut pv = move_to_san(&mut position, &best)?;
        let undo = make_move(&mut position, &best)?;
        let rest = self.tt.extract_pv(&position);
        unmake_move(&mut position, &best, undo);
        if !rest.is_empty() {
            pv.push(' ');
            pv.push_str(&rest);
        }

        Ok((best, pv))
    }

    /// A draw claim available now, or after playing `mv`.
    ///
    /// `previous_hashes` holds the keys of the positions before `game_state`;
    /// it and `game_state` are back to their original contents on return.
    pub fn can_claim_draw(
        game_state: &mut GameState,
        previous_hashes: &mut Vec<u64>,
        mv: &ChessMove,
    ) -> EngineResult<Option<DrawClaim>> {
        if can_claim_draw_50(game_state) {
            return Ok(Some(DrawClaim {
                rule: DrawRule::FiftyMove,
                move_text: None,
            }));
        }
        if can_claim_draw_rep(game_state, previous_hashes) {
            return Ok(Some(DrawClaim {
                rule: DrawRule::Repetition,
                move_text: None,
            }));
        }

        let san = move_to_san(game_state, mv)?;
        let key_before = game_state.zobrist_key;
        let undo = make_move(game_state, mv)?;
        previous_hashes.push(key_before);

        let rule = if can_claim_draw_50(game_state) {
            Some(DrawRule::FiftyMove)
        } else if can_claim_draw_rep(game_state, previous_hashes) {
            Some(DrawRule::Repetition)
        } else {
            None
        };

        previous_hashes.pop();
        unmake_move(game_state, mv, undo);

        Ok(rule.map(|rule| DrawClaim {
            rule,
            move_text: Some(san),
        }))
    }

    fn run_search(
        &mut self,
        position: &GameState,
        history: &[u64],
        moves: &mut [ChessMove],
        limits: SearchLimits,
        order_first: bool,
    ) -> EngineResult<ChessMove> {
        let mut search = Search::new(position, history, &mut self.tt, &self.scorer, limits);
        if let Some(listener) = self.listener.as_deref_mut() {
            search.set_listener(listener);
        }
        if order_first {
            search.score_root_moves(moves);
        }

        set_active(&self.active_search, Some(search.handle()));
        let result = search.iterative_deepening(moves);
        set_active(&self.active_search, None);
        result
    }

    /// Depth-one search, then a weighted draw that favours moves scoring
    /// close to the best.
    fn find_semi_random_move(
        &mut self,
        position: &GameState,
        history: &[u64],
        moves: &mut [ChessMove],
    ) -> EngineResult<ChessMove> {
        let limits = SearchLimits {
            min_time_ms: None,
            max_time_ms: None,
            max_depth: 1,
            max_nodes: self.config.max_nodes,
            verbose: self.config.verbose,
        };
        self.run_search(position, history, moves, limits, false)?;
        pick_weighted(moves, &mut self.rng).ok_or(EngineError::NoCandidateMoves)
    }
}

impl Player for ComputerPlayer {
    fn get_command(
        &mut self,
        game_state: &GameState,
        draw_offer: bool,
        history: &[GameState],
    ) -> EngineResult<PlayerCommand> {
        if draw_offer {
            debug!("draw offer ignored");
        }

        let mut previous_hashes: Vec<u64> = history.iter().map(|p| p.zobrist_key).collect();
        self.tt.next_generation();

        let mut position = game_state.clone();
        let mut moves = legal_moves(&mut position)?;
        if moves.is_empty() {
            info!(reason = ?no_move_reason(&position), "no legal move, handing over to the other side");
            return Ok(PlayerCommand::Swap);
        }

        if self.config.book_enabled {
            if let Some(book_move) = self.book.get_book_move(&mut position, &mut self.rng)? {
                let listing = self.book.all_book_moves(&mut position)?;
                let san = move_to_san(&mut position, &book_move)?;
                info!(book_move = %san, book_moves = %listing, "book hit");
                return Ok(PlayerCommand::Move(san));
            }
        }

        let best = if moves.len() == 1
            && Self::can_claim_draw(&mut position, &mut previous_hashes, &moves[0])?.is_none()
        {
            debug!(mv = %moves[0], "single legal move");
            moves[0].with_score(0)
        } else if self.config.random_mode {
            self.find_semi_random_move(&position, &previous_hashes, &mut moves)?
        } else {
            let limits = self.config.search_limits();
            self.run_search(&position, &previous_hashes, &mut moves, limits, true)?
        };

        if best.score <= 0 {
            if let Some(claim) = Self::can_claim_draw(&mut position, &mut previous_hashes, &best)? {
                info!(%claim, score = best.score, "claiming draw");
                return Ok(PlayerCommand::ClaimDraw(claim));
            }
        }

        Ok(PlayerCommand::Move(move_to_san(&mut position, &best)?))
    }

    fn is_human_player(&self) -> bool {
        false
    }

    fn use_book(&mut self, enabled: bool) {
        self.config.book_enabled = enabled;
    }

    /// Random mode zeroes both limits; its depth-one search ignores time.
    fn time_limit(&mut self, min_time_ms: Option<u64>, max_time_ms: Option<u64>, random_mode: bool) {
        let (min, max) = if random_mode {
            (Some(0), Some(0))
        } else {
            match (min_time_ms, max_time_ms) {
                (Some(min), Some(max)) if min > max => (Some(max), Some(max)),
                (None, Some(max)) => (Some(max), Some(max)),
                limits => limits,
            }
        };

        self.config.min_time_ms = min;
        self.config.max_time_ms = max;
        self.config.random_mode = random_mode;
        self.remote_control().time_limit(min, max);
    }

    fn clear_tt(&mut self) {
        self.tt.clear();
    }
}

/// Non-negative milliseconds or node counts; `-1` and `none` mean unlimited.
fn parse_limit(value: &str) -> Option<Option<u64>> {
    let value = value.trim();
    if value == "-1" || value.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    value.parse::<u64>().ok().map(Some)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::long_algebraic::long_algebraic_to_move;

    #[test]
    fn options_update_config() {
        let mut player = ComputerPlayer::new();
        player.set_option("Depth", "3").expect("depth should parse");
        player.set_option("Nodes", "5000").expect("nodes should parse");
        player.set_option("OwnBook", "false").expect("bool should parse");
        player.set_option("Verbose", "off").expect("bool should parse");
        player.set_option("Hash", "12").expect("hash should parse");

        let config = player.config();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_nodes, Some(5000));
        assert!(!config.book_enabled);
        assert!(!config.verbose);
        assert_eq!(player.transposition_table().len(), 1 << 12);

        player.set_option("Nodes", "-1").expect("unlimited should parse");
        assert_eq!(player.config().max_nodes, None);
    }

    #[test]
    fn bad_options_are_rejected() {
        let mut player = ComputerPlayer::new();
        assert!(matches!(
            player.set_option("Depth", "deep"),
            Err(EngineError::InvalidOption { .. })
        ));
        assert!(player.set_option("Contempt", "10").is_err());
        assert!(player.set_option("OwnBook", "maybe").is_err());
    }

    #[test]
    fn time_limits_are_normalized() {
        let mut player = ComputerPlayer::new();
        player.time_limit(Some(5000), Some(2000), false);
        assert_eq!(player.config().min_time_ms, Some(2000));
        assert_eq!(player.config().max_time_ms, Some(2000));

        player.time_limit(Some(800), Some(3000), true);
        assert_eq!(player.config().min_time_ms, Some(0));
        assert_eq!(player.config().max_time_ms, Some(0));
        assert!(player.config().random_mode);
    }

    #[test]
    fn remote_control_without_search_reports_idle() {
        let player = ComputerPlayer::new();
        assert!(!player.remote_control().time_limit(Some(10), Some(10)));
    }

    #[test]
    fn fifty_move_claim_now_and_after_move() {
        let mut game = GameState::from_fen("4k3/4p3/8/8/8/8/4P3/4K3 w - - 99 80").expect("FEN should parse");
        let mut hashes = Vec::new();

        let king_move = long_algebraic_to_move("e1d1", &mut game).expect("move should parse");
        let claim = ComputerPlayer::can_claim_draw(&mut game, &mut hashes, &king_move)
            .expect("claim check should succeed")
            .expect("quiet move reaches the limit");
        assert_eq!(claim.to_string(), "draw 50 Kd1");

        let pawn_move = long_algebraic_to_move("e2e3", &mut game).expect("move should parse");
        assert_eq!(
            ComputerPlayer::can_claim_draw(&mut game, &mut hashes, &pawn_move),
            Ok(None)
        );

        let mut ready = GameState::from_fen("4k3/4p3/8/8/8/8/4P3/4K3 w - - 100 80").expect("FEN should parse");
        let claim = ComputerPlayer::can_claim_draw(&mut ready, &mut hashes, &pawn_move)
            .expect("claim check should succeed")
            .expect("the limit is already reached");
        assert_eq!(claim.to_string(), "draw 50");
        assert!(hashes.is_empty());
    }

    #[test]
    fn repetition_claim_after_move() {
        let mut game = GameState::new_game();
        let mut hashes = Vec::new();
        for text in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"] {
            let mv = long_algebraic_to_move(text, &mut game).expect("move should parse");
            hashes.push(game.zobrist_key);
            let _undo = make_move(&mut game, &mv).expect("move should apply");
        }

        let before = game.clone();
        let back = long_algebraic_to_move("f6g8", &mut game).expect("move should parse");
        let claim = ComputerPlayer::can_claim_draw(&mut game, &mut hashes, &back)
            .expect("claim check should succeed")
            .expect("third occurrence of the start position");
        assert_eq!(claim.to_string(), "draw rep Ng8");
        assert_eq!(game, before);
        assert_eq!(hashes.len(), 7);
    }
}
