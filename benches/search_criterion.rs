use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use kestrel_chess::game_state::chess_rules::STARTING_POSITION_FEN;
use kestrel_chess::game_state::game_state::GameState;
use kestrel_chess::move_generation::move_generator::legal_moves;
use kestrel_chess::search::board_scoring::MaterialScorer;
use kestrel_chess::search::iterative_deepening::{Search, SearchLimits};
use kestrel_chess::search::transposition_table::TranspositionTable;

const POSITIONS: &[(&str, &str)] = &[
    ("start", STARTING_POSITION_FEN),
    (
        "kiwipete",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    ),
    ("rook_endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
];

fn bench_fixed_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_fixed_depth");
    group.sample_size(10);

    for &(name, fen) in POSITIONS {
        let mut game = GameState::from_fen(fen).expect("benchmark FEN should parse");
        let moves = legal_moves(&mut game).expect("benchmark position should generate");

        for depth in [3u8, 4] {
            group.bench_with_input(BenchmarkId::new(name, depth), &depth, |b, &depth| {
                b.iter(|| {
                    // Fresh table each run so every iteration does the same work.
                    let mut tt = TranspositionTable::new(16);
                    let mut root_moves = moves.clone();
                    let mut search = Search::new(
                        &game,
                        &[],
                        &mut tt,
                        &MaterialScorer,
                        SearchLimits::depth(depth),
                    );
                    let best = search
                        .iterative_deepening(black_box(&mut root_moves))
                        .expect("search should run");
                    black_box((best, search.nodes()))
                });
            });
        }
    }

    group.finish();
}

criterion_group!(search_benches, bench_fixed_depth);
criterion_main!(search_benches);
