//! Othello engine with an exact endgame solver
//!
//! - 64-bit bitboards with kindergarten flip tables
//! - Exact fail-soft endgame solver with parity ordering, a per-empties
//!   transposition table, enhanced transposition cutoffs and negascout
//! - Depth-limited midgame search with Multi-ProbCut that hands off to
//!   the solver near the end of the game
//!
//! # Architecture
//!
//! The engine is organized into several modules:
//! - [`board`]: Bitboards, flip tables, board text and square notation
//! - [`search`]: Empties list, transposition tables, move sorter, solver, midgame search
//! - [`eval`]: Evaluator trait and the built-in heuristic
//! - [`config`]: Search thresholds and weights
//! - [`engine`]: Engine choosing between solver and midgame, bulk solving
//!
//! # Quick Start
//!
//! ```
//! use othello::{Board, Engine, SearchConfig};
//!
//! let config = SearchConfig {
//!     engine_depth: 3,
//!     ..SearchConfig::default()
//! };
//! let mut engine = Engine::new(config).unwrap();
//!
//! let mut board = Board::start();
//! if let Some(sq) = engine.get_move(&board).unwrap() {
//!     board = board.play(sq).unwrap();
//!     println!("Engine plays {sq}");
//! }
//! assert_eq!(board.disk_count(othello::Color::Black), 4);
//! ```
//!
//! # Conventions
//!
//! Square `row * 8 + col` is bit `row * 8 + col`. Square names run from
//! `H8` (square 0) to `A1` (square 63); board text starts at `A1`.

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod search;

// Re-export commonly used types for convenience
pub use board::{Board, Color, Position, Square};
pub use config::SearchConfig;
pub use engine::{Engine, MoveResult, SearchType};
pub use error::{ConfigError, MoveError, ParseError, SearchError};
pub use search::{Searcher, Solver};
