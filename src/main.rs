//! Leelay: play Go against an external GTP engine from the terminal.
//!
//! ## Usage
//!
//! - `leelay play --engine ./leelaz -w network.gz` - Play with an engine attached
//! - `leelay demo` - Random self-play on the local board, no engine needed

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leelay::board::Point;
use leelay::config::EngineConfig;
use leelay::constants::{KOMI, N};
use leelay::game::Game;
use leelay::gtp::ProtocolClient;
use leelay::position::Move;

/// Leelay: play Go against an external GTP engine
#[derive(Parser)]
#[command(name = "leelay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively with an engine providing moves and evaluation
    Play(EngineArgs),
    /// Play random moves on the local board without an engine
    Demo {
        /// Number of moves to play
        #[arg(long, default_value_t = 60)]
        moves: usize,
        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct EngineArgs {
    /// Engine executable
    #[arg(long, default_value = "./leelaz")]
    engine: PathBuf,
    /// Network weights file
    #[arg(short, long)]
    weights: Option<PathBuf>,
    /// Search threads (0 = engine default)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
    /// GPU device id; repeat for several
    #[arg(long = "gpu")]
    gpus: Vec<u32>,
    #[arg(long, default_value_t = KOMI)]
    komi: f32,
    /// Thinking time per engine move, in seconds
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Extra arguments passed to the engine
    #[arg(last = true)]
    extra: Vec<String>,
}

impl EngineArgs {
    fn into_config(self) -> EngineConfig {
        let mut cfg = EngineConfig::new(self.engine);
        cfg.weights = self.weights;
        cfg.threads = self.threads;
        cfg.gpus = self.gpus;
        cfg.komi = self.komi;
        cfg.time_per_move = Duration::from_secs(self.seconds);
        cfg.extra_args = self.extra;
        cfg
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Play(args)) => run_play(args.into_config()),
        Some(Commands::Demo { moves, seed }) => {
            run_demo(moves, seed);
            Ok(())
        }
        None => {
            run_demo(60, None);
            Ok(())
        }
    }
}

fn run_play(config: EngineConfig) -> Result<()> {
    let mut client = ProtocolClient::new(config);
    client.start().context("failed to start engine")?;
    let mut game = Game::new(Some(client));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print_game(&mut stdout, &game)?;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }

        let result = match cmd.to_lowercase().as_str() {
            "quit" | "q" => break,
            "undo" | "u" => game.undo().map(|mv| match mv {
                Some(mv) => format!("undid {mv}"),
                None => "nothing to undo".to_string(),
            }),
            "pass" | "p" => game.pass().map(|()| "pass".to_string()),
            "genmove" | "z" => game.generate_move().map(|mv| {
                let picks = game
                    .engine()
                    .map(|e| e.candidates())
                    .unwrap_or_default()
                    .iter()
                    .map(|c| format!("{} {} ({:.1}%)", c.mv, c.simulations, c.winrate * 100.0))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("engine plays {mv} [{picks}]")
            }),
            "analysis" | "a" => {
                if let Some(engine) = game.engine_mut() {
                    engine.refresh();
                }
                let snap = game.engine().map(|e| e.analysis()).unwrap_or_default();
                Ok(format!(
                    "winrate {:.1}% over {} playouts",
                    snap.winrate * 100.0,
                    snap.playouts
                ))
            }
            vertex => match vertex.parse::<Point>() {
                Ok(pt) => game.play_move(pt).map(|ko| match ko {
                    Some(k) => format!("played {pt}, ko at {k}"),
                    None => format!("played {pt}"),
                }),
                Err(e) => Ok(e.to_string()),
            },
        };

        match result {
            Ok(msg) => writeln!(stdout, "{msg}")?,
            Err(e) => writeln!(stdout, "error: {e}")?,
        }
        print_game(&mut stdout, &game)?;
    }

    if let Some(mut client) = game.take_engine() {
        client.stop();
    }
    Ok(())
}

fn print_game(out: &mut impl Write, game: &Game) -> io::Result<()> {
    writeln!(out, "{}", game.board())?;
    writeln!(out, "{}", game.status())?;
    out.flush()
}

fn run_demo(moves: usize, seed: Option<u64>) {
    println!("Leelay: random play on a {N}x{N} board\n");

    let mut rng = match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };
    let mut game: Game = Game::new(None);

    for _ in 0..moves {
        let empty: Vec<Point> = game.board().empty_points().collect();
        if empty.is_empty() {
            break;
        }
        let pt = empty[rng.usize(..empty.len())];
        match game.play_move(pt) {
            Ok(Some(ko)) => println!("{} {pt} (ko at {ko})", game.next_player().opponent()),
            Ok(None) => println!("{} {pt}", game.next_player().opponent()),
            Err(e) => println!("{pt}: {e}"),
        }
    }
    println!("\n{}", game.board());

    let undone = game.undo().ok().flatten().map_or("nothing".to_string(), |m: Move| m.to_string());
    println!("Undid {undone}; {}", game.status());
}
