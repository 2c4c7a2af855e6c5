use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use kestrel_chess::engines::computer_player::{ComputerPlayer, PlayerConfig};
use kestrel_chess::engines::player::{DrawClaim, DrawRule, Player, PlayerCommand};
use kestrel_chess::game_state::game_state::GameState;
use kestrel_chess::move_generation::legal_move_apply::make_move;
use kestrel_chess::move_generation::move_generator::legal_moves;
use kestrel_chess::search::iterative_deepening::{SearchListener, SearchReport};
use kestrel_chess::utils::long_algebraic::long_algebraic_to_move;
use kestrel_chess::utils::short_algebraic::move_to_san;

fn quick_player(depth: u8) -> ComputerPlayer {
    ComputerPlayer::with_config(PlayerConfig {
        min_time_ms: None,
        max_time_ms: None,
        max_depth: depth,
        book_enabled: false,
        verbose: false,
        ..PlayerConfig::default()
    })
    .with_rng_seed(17)
}

fn legal_san(game: &GameState) -> Vec<String> {
    let mut game = game.clone();
    let moves = legal_moves(&mut game).expect("generation should succeed");
    moves
        .iter()
        .map(|mv| move_to_san(&mut game, mv).expect("SAN should format"))
        .collect()
}

#[derive(Clone, Default)]
struct DepthLog(Arc<Mutex<Vec<u8>>>);

impl SearchListener for DepthLog {
    fn notify_progress(&mut self, report: &SearchReport) {
        self.0.lock().expect("log lock").push(report.depth);
    }
}

#[test]
fn start_position_search_returns_a_legal_move() {
    let game = GameState::new_game();
    let mut player = quick_player(1);
    let command = player.get_command(&game, false, &[]).expect("command should be produced");

    let PlayerCommand::Move(san) = command else {
        panic!("expected a move, got {command}");
    };
    let legal = legal_san(&game);
    assert_eq!(legal.len(), 20);
    assert!(legal.contains(&san), "{san} is not legal");
}

#[test]
fn book_move_is_used_when_enabled() {
    let game = GameState::new_game();
    let mut player = quick_player(1);
    player.use_book(true);
    let command = player.get_command(&game, false, &[]).expect("command should be produced");
    let text = command.to_string();
    assert!(["e4", "d4", "c4", "Nf3"].contains(&text.as_str()), "{text}");
}

#[test]
fn search_position_pv_starts_with_best_move() {
    let mut game = GameState::new_game();
    let mut player = quick_player(1);
    let (best, pv) = player.search_position(&game, 200).expect("search should run");

    let san = move_to_san(&mut game, &best).expect("SAN should format");
    assert!(pv.starts_with(&san), "pv '{pv}' should start with {san}");
    assert!(legal_moves(&mut game).expect("generation should succeed").contains(&best));
}

#[test]
fn single_legal_move_skips_the_search() {
    let game = GameState::from_fen("k7/8/8/8/8/8/1q6/K7 w - - 0 1").expect("FEN should parse");
    let log = DepthLog::default();
    let mut player = quick_player(6);
    player.set_listener(Box::new(log.clone()));

    let command = player.get_command(&game, false, &[]).expect("command should be produced");
    assert_eq!(command, PlayerCommand::Move("Kxb2".to_owned()));
    assert!(log.0.lock().expect("log lock").is_empty());
}

#[test]
fn listener_hears_each_completed_depth() {
    let game = GameState::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
        .expect("FEN should parse");
    let log = DepthLog::default();
    let mut player = quick_player(3);
    player.set_listener(Box::new(log.clone()));

    player.get_command(&game, false, &[]).expect("command should be produced");
    assert_eq!(*log.0.lock().expect("log lock"), vec![1, 2, 3]);
}

#[test]
fn stalemate_and_checkmate_swap_sides() {
    let mut player = quick_player(2);
    let stalemate = GameState::from_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").expect("FEN should parse");
    assert_eq!(
        player.get_command(&stalemate, false, &[]),
        Ok(PlayerCommand::Swap)
    );

    let mate = GameState::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 1 1").expect("FEN should parse");
    assert_eq!(player.get_command(&mate, false, &[]), Ok(PlayerCommand::Swap));
}

#[test]
fn claims_fifty_move_draw_in_level_position() {
    let game = GameState::from_fen("4k3/4p3/8/8/8/8/4P3/4K3 w - - 100 80").expect("FEN should parse");
    let mut player = quick_player(2);
    let command = player.get_command(&game, true, &[]).expect("command should be produced");
    assert_eq!(
        command,
        PlayerCommand::ClaimDraw(DrawClaim {
            rule: DrawRule::FiftyMove,
            move_text: None,
        })
    );
    assert_eq!(command.to_string(), "draw 50");
}

#[test]
fn claims_repetition_on_third_occurrence() {
    let mut game = GameState::new_game();
    let mut history = Vec::new();
    for text in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = long_algebraic_to_move(text, &mut game).expect("move should parse");
        history.push(game.clone());
        let _undo = make_move(&mut game, &mv).expect("move should apply");
    }

    let mut player = quick_player(2);
    let command = player.get_command(&game, false, &history).expect("command should be produced");
    assert_eq!(command.to_string(), "draw rep");
}

#[test]
fn winning_side_does_not_claim() {
    // Any quiet move would allow "draw 50", but winning the rook scores well.
    let game = GameState::from_fen("4k3/8/8/8/8/8/r7/R3K3 w - - 99 80").expect("FEN should parse");
    let mut player = quick_player(2);
    let command = player.get_command(&game, false, &[]).expect("command should be produced");
    assert_eq!(command, PlayerCommand::Move("Rxa2".to_owned()));
}

#[test]
fn random_mode_favours_the_clearly_best_move() {
    let game = GameState::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").expect("FEN should parse");
    let legal = legal_san(&game);
    let mut player = quick_player(4);
    player.time_limit(None, None, true);

    let mut captures = 0;
    for _ in 0..200 {
        let command = player.get_command(&game, false, &[]).expect("command should be produced");
        let PlayerCommand::Move(san) = command else {
            panic!("expected a move, got {command}");
        };
        assert!(legal.contains(&san), "{san} is not legal");
        if san == "exd5" {
            captures += 1;
        }
    }
    assert!(captures >= 170, "exd5 chosen only {captures} times");
}

#[test]
fn remote_time_limit_stops_a_running_search() {
    let game = GameState::new_game();
    let mut player = ComputerPlayer::with_config(PlayerConfig {
        min_time_ms: Some(60_000),
        max_time_ms: Some(60_000),
        book_enabled: false,
        verbose: false,
        ..PlayerConfig::default()
    });
    let remote = player.remote_control();

    let worker = thread::spawn(move || player.get_command(&game, false, &[]));

    let mut stopped = false;
    for _ in 0..10_000 {
        if remote.time_limit(Some(0), Some(0)) {
            stopped = true;
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    assert!(stopped, "search never became active");

    let command = worker
        .join()
        .expect("search thread should not panic")
        .expect("command should be produced");
    assert!(matches!(command, PlayerCommand::Move(_)), "{command}");
}
