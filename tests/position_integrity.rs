use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use kestrel_chess::game_state::chess_rules::STARTING_POSITION_FEN;
use kestrel_chess::game_state::game_state::GameState;
use kestrel_chess::move_generation::legal_move_apply::{make_move, unmake_move};
use kestrel_chess::move_generation::legal_move_checks::is_king_in_check;
use kestrel_chess::move_generation::move_generator::{legal_moves, pseudo_legal_moves, remove_illegal};
use kestrel_chess::search::zobrist::compute_zobrist_key;
use kestrel_chess::utils::long_algebraic::long_algebraic_to_move;

const FIXTURES: &[&str] = &[
    STARTING_POSITION_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

fn play(moves: &[&str]) -> GameState {
    let mut game = GameState::new_game();
    for text in moves {
        let mv = long_algebraic_to_move(text, &mut game).expect("move should parse");
        let _undo = make_move(&mut game, &mv).expect("move should apply");
    }
    game
}

#[test]
fn make_unmake_restores_every_fixture() {
    for fen in FIXTURES {
        let mut game = GameState::from_fen(fen).expect("FEN should parse");
        let original = game.clone();

        for mv in pseudo_legal_moves(&game) {
            let undo = make_move(&mut game, &mv).expect("pseudo-legal move should apply");
            assert_eq!(game.zobrist_key, compute_zobrist_key(&game), "{fen} {mv}");
            unmake_move(&mut game, &mv, undo);
            assert_eq!(game, original, "{fen} {mv}");
        }
    }
}

#[test]
fn legal_moves_never_leave_the_king_in_check() {
    for fen in FIXTURES {
        let mut game = GameState::from_fen(fen).expect("FEN should parse");
        let mover = game.side_to_move;
        let pseudo = pseudo_legal_moves(&game);
        let legal = remove_illegal(&mut game, pseudo.clone()).expect("filter should run");
        assert!(legal.len() <= pseudo.len());

        for mv in &legal {
            let undo = make_move(&mut game, mv).expect("legal move should apply");
            assert!(!is_king_in_check(&game, mover), "{fen} {mv}");
            unmake_move(&mut game, mv, undo);
        }
        for mv in pseudo.iter().filter(|mv| !legal.contains(mv)) {
            let undo = make_move(&mut game, mv).expect("pseudo-legal move should apply");
            assert!(is_king_in_check(&game, mover), "{fen} {mv} was dropped but is legal");
            unmake_move(&mut game, mv, undo);
        }
    }
}

#[test]
fn transpositions_hash_identically() {
    let a = play(&["e2e4", "e7e5", "g1f3"]);
    let b = play(&["g1f3", "e7e5", "e2e4"]);
    assert_eq!(a.zobrist_key, b.zobrist_key);

    let c = play(&["e2e4", "e7e5", "g1f3", "b8c6"]);
    assert_ne!(a.zobrist_key, c.zobrist_key);
}

#[test]
fn random_games_keep_incremental_hash_in_sync() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..20 {
        let mut game = GameState::new_game();
        let mut stack = Vec::new();

        for _ in 0..80 {
            let moves = legal_moves(&mut game).expect("generation should succeed");
            let Some(&mv) = moves.choose(&mut rng) else {
                break;
            };
            let before = game.clone();
            let undo = make_move(&mut game, &mv).expect("legal move should apply");
            assert_eq!(game.zobrist_key, compute_zobrist_key(&game));
            stack.push((mv, undo, before));
        }

        while let Some((mv, undo, before)) = stack.pop() {
            unmake_move(&mut game, &mv, undo);
            assert_eq!(game, before);
        }
        assert_eq!(game, GameState::new_game());
    }
}
