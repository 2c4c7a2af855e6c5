//! Batch position analysis.
//!
//! Usage:
//! `cargo run --release --bin analyze_positions -- positions.epd`
//! `cat positions.fen | cargo run --release --bin analyze_positions -- --time 2000 --board`
//!
//! Each non-empty input line is a FEN (or EPD: operations after the fourth
//! field are ignored). Output is `fen -> best | pv`, one line per position.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kestrel_chess::engines::computer_player::{ComputerPlayer, PlayerConfig, ENGINE_NAME};
use kestrel_chess::errors::EngineResult;
use kestrel_chess::game_state::game_state::GameState;
use kestrel_chess::utils::render_game_state::render_game_state;
use kestrel_chess::utils::short_algebraic::move_to_san;

const DEFAULT_TIME_MS: u64 = 1000;

struct Args {
    input: Option<String>,
    time_ms: u64,
    show_board: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        input: None,
        time_ms: DEFAULT_TIME_MS,
        show_board: false,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--time" => {
                let value = it.next().ok_or("--time needs a value in milliseconds")?;
                args.time_ms = value
                    .parse()
                    .map_err(|_| format!("invalid --time value '{value}'"))?;
            }
            "--board" => args.show_board = true,
            other if other.starts_with("--") => return Err(format!("unknown flag '{other}'")),
            path => args.input = Some(path.to_owned()),
        }
    }
    Ok(args)
}

/// EPD lines carry only the first four FEN fields plus opcodes.
fn position_fields(line: &str) -> String {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let clocks_present = fields.len() >= 6
        && fields[4].parse::<u16>().is_ok()
        && fields[5].parse::<u16>().is_ok();
    let take = if clocks_present { 6 } else { fields.len().min(4) };
    fields[..take].join(" ")
}

fn analyze(player: &mut ComputerPlayer, fen: &str, time_ms: u64, show_board: bool) -> EngineResult<()> {
    let mut game = GameState::from_fen(fen)?;
    if show_board {
        println!("{}", render_game_state(&game));
    }

    let (best, pv) = player.search_position(&game, time_ms)?;
    let san = move_to_san(&mut game, &best)?;
    println!("{fen} -> {san} ({}) | {pv}", best.score);
    Ok(())
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = parse_args()?;
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).map_err(|e| format!("failed opening {path}: {e}"))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut player = ComputerPlayer::with_config(PlayerConfig {
        book_enabled: false,
        verbose: false,
        ..PlayerConfig::default()
    });
    info!(engine = ENGINE_NAME, time_ms = args.time_ms, "analyzing positions");

    let mut failures = 0usize;
    for line in reader.lines() {
        let line = line.map_err(|e| format!("failed reading input: {e}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fen = position_fields(line);
        if let Err(err) = analyze(&mut player, &fen, args.time_ms, args.show_board) {
            error!(%err, fen = %fen, "position skipped");
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} position(s) could not be analyzed"));
    }
    Ok(())
}
