//! Othello engine command line
//!
//! Board arguments use the 64-character text form (A1 first) with an
//! optional side-to-move character, e.g.
//! `othello solve "...........................OX......XO........................... X"`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use othello::board::bitboard::popcount;
use othello::engine::{bench, Engine};
use othello::search::MpcTable;
use othello::{Board, Color, SearchConfig, Square};

#[derive(Parser, Debug)]
#[command(name = "othello", author, version, about = "Othello engine and endgame solver")]
struct Args {
    /// Search configuration (TOML); defaults apply to missing keys
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Multi-ProbCut coefficients (JSON) replacing the built-in table
    #[arg(long, global = true)]
    mpc: Option<PathBuf>,

    /// More logging; repeat for more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the legal moves
    Moves { board: String },
    /// Solve the position exactly
    Solve { board: String },
    /// Best move from a depth-limited search
    Search {
        board: String,
        /// Search depth in plies (default: engine_depth from the config)
        #[arg(short, long)]
        depth: Option<u32>,
    },
    /// Play a move and print the resulting board
    Play { board: String, square: String },
    /// Solve random positions and report the node rate
    Bench {
        #[arg(short, long, default_value_t = 20)]
        runs: usize,
        #[arg(short, long, default_value_t = 18)]
        empties: u32,
        /// Worker threads (default: available parallelism)
        #[arg(short, long)]
        threads: Option<usize>,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level),
    )
    .format(|buf, record| {
        writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
    })
    .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SearchConfig::default()),
    }
}

fn load_mpc(path: Option<&PathBuf>) -> Result<MpcTable> {
    match path {
        Some(path) => MpcTable::from_json_file(path)
            .with_context(|| format!("loading MPC table {}", path.display())),
        None => Ok(MpcTable::default()),
    }
}

fn parse_board(text: &str) -> Result<Board> {
    text.parse().with_context(|| format!("parsing board {text:?}"))
}

fn side(color: Color) -> &'static str {
    match color {
        Color::Black => "black",
        Color::White => "white",
    }
}

fn print_board(board: &Board) {
    println!("{board}");
    println!(
        "black {} white {}, {} to move",
        board.disk_count(Color::Black),
        board.disk_count(Color::White),
        side(board.to_move)
    );
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_ref())?;
    config.validate().context("invalid search configuration")?;

    match args.command {
        Command::Moves { board } => {
            let board = parse_board(&board)?;
            let moves = board.legal_moves();
            let names: Vec<String> = Square::iter_mask(moves).map(|sq| sq.to_string()).collect();
            println!("{} legal moves: {}", popcount(moves), names.join(" "));
        }
        Command::Solve { board } => {
            let board = parse_board(&board)?;
            let mut engine = Engine::with_mpc(config, load_mpc(args.mpc.as_ref())?)?;
            if board.legal_moves() == 0 {
                println!("{} must pass; score {}", side(board.to_move), engine.solve(&board));
            } else {
                let result = engine.solve_with_move(&board)?;
                if let Some(sq) = result.best_move {
                    println!(
                        "{sq} {:+} ({} empties, {} nodes, {} ms)",
                        result.score / 100,
                        board.position().empty_count(),
                        result.nodes,
                        result.time_ms
                    );
                }
            }
        }
        Command::Search { board, depth } => {
            let board = parse_board(&board)?;
            let mut engine = Engine::with_mpc(config, load_mpc(args.mpc.as_ref())?)?;
            if let Some(depth) = depth {
                if depth == 0 {
                    bail!("--depth must be at least 1");
                }
                engine.set_max_depth(depth);
            }
            let result = engine.get_move_with_stats(&board)?;
            match result.best_move {
                Some(sq) => println!(
                    "{sq} {:+.2} ({:?}, {} nodes, {} ms)",
                    f64::from(result.score) / 100.0,
                    result.search_type,
                    result.nodes,
                    result.time_ms
                ),
                None => println!("pass"),
            }
        }
        Command::Play { board, square } => {
            let board = parse_board(&board)?;
            let sq: Square = square.parse().with_context(|| format!("parsing square {square:?}"))?;
            let next = board
                .play(sq)
                .with_context(|| format!("{} cannot play {sq}", side(board.to_move)))?;
            print_board(&next);
        }
        Command::Bench {
            runs,
            empties,
            threads,
            seed,
        } => {
            if empties > 60 {
                bail!("--empties must be at most 60");
            }
            let threads = threads.unwrap_or_else(|| {
                std::thread::available_parallelism().map_or(1, |n| n.get())
            });
            let engine = Engine::new(config)?;
            info!("bench: {runs} runs, {empties} empties, {threads} threads, seed {seed}");
            let report = bench(engine.tables(), engine.config(), runs, empties, threads, seed);
            println!(
                "{} positions, {} nodes, {} ms, {:.0} nodes/s, checksum {}",
                report.positions,
                report.nodes,
                report.time_ms,
                report.nodes_per_second(),
                report.checksum
            );
        }
    }
    Ok(())
}
