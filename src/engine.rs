//! Engine integrating the exact solver and the midgame searcher
//!
//! The engine picks a search by the number of empty squares:
//!
//! 1. **Pass**: the side to move has no legal move
//! 2. **Solve**: at or below `engine_solve_empties`, perfect play
//! 3. **Midgame**: otherwise, a depth-limited search at the engine depth
//!
//! It also drives bulk work: [`solve_parallel`] spreads positions over
//! worker threads, each with its own [`Solver`], and [`bench`] times it.
//!
//! # Example
//!
//! ```
//! use othello::config::SearchConfig;
//! use othello::engine::{Engine, SearchType};
//! use othello::Board;
//!
//! let config = SearchConfig {
//!     engine_depth: 3,
//!     ..SearchConfig::default()
//! };
//! let mut engine = Engine::new(config).unwrap();
//! let result = engine.get_move_with_stats(&Board::start()).unwrap();
//! assert_eq!(result.search_type, SearchType::MidGame);
//! println!("Best move: {:?} ({} nodes)", result.best_move, result.nodes);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::board::{Board, MoveTables, Position, Square};
use crate::config::SearchConfig;
use crate::error::{ConfigError, SearchError};
use crate::eval::HeuristicEvaluator;
use crate::search::{MpcTable, Searcher, Solver, TTStats};

/// Type of search that produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// No legal move; the side to move passes
    Pass,
    /// Perfect play to the end of the game
    Solve,
    /// Depth-limited heuristic search
    MidGame,
}

/// Result of a move search with statistics.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Best move found; `None` for a pass
    pub best_move: Option<Square>,
    /// Centidisks for the side to move. Exact for [`SearchType::Solve`]
    pub score: i32,
    pub search_type: SearchType,
    /// Time taken in milliseconds
    pub time_ms: u64,
    /// Number of nodes searched
    pub nodes: u64,
}

impl MoveResult {
    #[inline]
    fn pass(time_ms: u64) -> Self {
        Self {
            best_move: None,
            score: 0,
            search_type: SearchType::Pass,
            time_ms,
            nodes: 0,
        }
    }

    #[inline]
    fn solved(sq: Square, disks: i32, time_ms: u64, nodes: u64) -> Self {
        Self {
            best_move: Some(sq),
            score: 100 * disks,
            search_type: SearchType::Solve,
            time_ms,
            nodes,
        }
    }

    #[inline]
    fn midgame(sq: Square, score: i32, time_ms: u64, nodes: u64) -> Self {
        Self {
            best_move: Some(sq),
            score,
            search_type: SearchType::MidGame,
            time_ms,
            nodes,
        }
    }
}

/// Othello engine.
///
/// Owns one [`Solver`] and one [`Searcher`] over shared, immutable flip
/// tables and configuration.
pub struct Engine {
    tables: Arc<MoveTables>,
    config: Arc<SearchConfig>,
    solver: Solver,
    searcher: Searcher<HeuristicEvaluator>,
    /// Midgame search depth
    max_depth: u32,
}

impl Engine {
    /// Create an engine with the built-in MPC table.
    ///
    /// Fails when the configuration is inconsistent.
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        Self::with_mpc(config, MpcTable::default())
    }

    /// Create an engine with explicit MPC coefficients.
    pub fn with_mpc(config: SearchConfig, mpc: MpcTable) -> Result<Self, ConfigError> {
        config.validate()?;
        let tables = Arc::new(MoveTables::new());
        let max_depth = config.engine_depth;
        let evaluator = HeuristicEvaluator::new(config.winner_gets_empties);
        let config = Arc::new(config);
        Ok(Self {
            solver: Solver::new(Arc::clone(&tables), Arc::clone(&config)),
            searcher: Searcher::new(Arc::clone(&tables), Arc::clone(&config), evaluator, mpc),
            tables,
            config,
            max_depth,
        })
    }

    pub fn tables(&self) -> &Arc<MoveTables> {
        &self.tables
    }

    pub fn config(&self) -> &Arc<SearchConfig> {
        &self.config
    }

    /// Best move for the side to move, `None` when it must pass.
    pub fn get_move(&mut self, board: &Board) -> Result<Option<Square>, SearchError> {
        Ok(self.get_move_with_stats(board)?.best_move)
    }

    /// Best move with search statistics.
    ///
    /// # Errors
    ///
    /// [`SearchError::Aborted`] when the midgame abort flag is raised.
    pub fn get_move_with_stats(&mut self, board: &Board) -> Result<MoveResult, SearchError> {
        let start = Instant::now();
        let pos = board.position();
        let moves = pos.moves();
        if moves == 0 {
            info!("{:?} has no legal move", board.to_move);
            return Ok(MoveResult::pass(elapsed_ms(start)));
        }

        let empties = pos.empty_count();
        let result = if empties <= self.config.engine_solve_empties {
            self.solve_move(pos, start)?
        } else {
            let nodes = self.searcher.nodes();
            let best = self.searcher.get_move_score(pos, moves, self.max_depth)?;
            MoveResult::midgame(
                best.square,
                best.score,
                elapsed_ms(start),
                self.searcher.nodes() - nodes,
            )
        };
        info!(
            "{:?} plays {} ({:?}, {} empties, score {}, {} nodes, {} ms)",
            board.to_move,
            result.best_move.map_or_else(|| "pass".to_string(), |sq| sq.to_string()),
            result.search_type,
            empties,
            result.score,
            result.nodes,
            result.time_ms
        );
        Ok(result)
    }

    /// Best move by perfect play regardless of the number of empties.
    ///
    /// # Errors
    ///
    /// [`SearchError::NoLegalMove`] when the side to move must pass.
    pub fn solve_with_move(&mut self, board: &Board) -> Result<MoveResult, SearchError> {
        self.solve_move(board.position(), Instant::now())
    }

    fn solve_move(&mut self, pos: Position, start: Instant) -> Result<MoveResult, SearchError> {
        self.solver.reset_nodes();
        let (sq, disks) = self.solver.solve_with_move(pos.mover, pos.enemy)?;
        Ok(MoveResult::solved(sq, disks, elapsed_ms(start), self.solver.nodes()))
    }

    /// Perfect-play disk differential for the side to move
    pub fn solve(&mut self, board: &Board) -> i32 {
        let pos = board.position();
        self.solver.solve(pos.mover, pos.enemy)
    }

    /// Heuristic score in centidisks at `depth` plies
    pub fn evaluate(&mut self, board: &Board, depth: u32) -> Result<i32, SearchError> {
        let pos = board.position();
        self.searcher.calc_score(pos.mover, pos.enemy, depth)
    }

    /// Set the midgame search depth.
    pub fn set_max_depth(&mut self, depth: u32) {
        self.max_depth = depth;
    }

    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Clear both transposition tables.
    ///
    /// Call this when starting a new game to avoid stale positions.
    pub fn clear_cache(&mut self) {
        self.solver.clear();
        self.searcher.clear();
    }

    /// Midgame transposition table statistics
    #[must_use]
    pub fn tt_stats(&self) -> TTStats {
        self.searcher.tt_stats()
    }

    /// Flag that aborts a running midgame search
    pub fn abort_handle(&self) -> Arc<std::sync::atomic::AtomicBool> {
        self.searcher.abort_handle()
    }
}

#[inline]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

// =============================================================================
// Bulk solving
// =============================================================================

/// Outcome of one exact solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solved {
    /// Disk differential for the side to move
    pub score: i32,
    pub nodes: u64,
}

/// Solve every position exactly on `threads` workers.
///
/// Each worker owns a [`Solver`] and pulls the next index from a shared
/// cursor; only the tables and the configuration are shared. Tables are
/// cleared before each position, so results do not depend on the
/// scheduling. Output order matches `positions`.
pub fn solve_parallel(
    tables: &Arc<MoveTables>,
    config: &Arc<SearchConfig>,
    positions: &[Position],
    threads: usize,
) -> Vec<Solved> {
    let threads = threads.clamp(1, positions.len().max(1));
    let cursor = AtomicUsize::new(0);

    let mut indexed: Vec<(usize, Solved)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|worker| {
                let cursor = &cursor;
                let mut solver = Solver::new(Arc::clone(tables), Arc::clone(config));
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let i = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(pos) = positions.get(i) else {
                            break;
                        };
                        solver.clear();
                        solver.reset_nodes();
                        let score = solver.solve(pos.mover, pos.enemy);
                        done.push((
                            i,
                            Solved {
                                score,
                                nodes: solver.nodes(),
                            },
                        ));
                    }
                    debug!("worker {worker} solved {} positions", done.len());
                    done
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    indexed.sort_unstable_by_key(|&(i, _)| i);
    indexed.into_iter().map(|(_, solved)| solved).collect()
}

/// Summary of a [`bench`] run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchReport {
    pub positions: usize,
    pub empties: u32,
    pub threads: usize,
    pub nodes: u64,
    pub time_ms: u64,
    /// Sum of the solved scores; identical across thread counts
    pub checksum: i64,
}

impl BenchReport {
    #[must_use]
    pub fn nodes_per_second(&self) -> f64 {
        if self.time_ms == 0 {
            0.0
        } else {
            self.nodes as f64 * 1000.0 / self.time_ms as f64
        }
    }
}

/// Solve `runs` seeded random positions with `empties` empty squares.
pub fn bench(
    tables: &Arc<MoveTables>,
    config: &Arc<SearchConfig>,
    runs: usize,
    empties: u32,
    threads: usize,
    seed: u64,
) -> BenchReport {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let positions: Vec<Position> = (0..runs).map(|_| Position::random(&mut rng, empties)).collect();

    let start = Instant::now();
    let solved = solve_parallel(tables, config, &positions, threads);
    let report = BenchReport {
        positions: solved.len(),
        empties,
        threads,
        nodes: solved.iter().map(|s| s.nodes).sum(),
        time_ms: elapsed_ms(start),
        checksum: solved.iter().map(|s| i64::from(s.score)).sum(),
    };
    info!(
        "bench: {} positions, {} empties, {} threads: {} nodes in {} ms ({:.0} nodes/s)",
        report.positions,
        report.empties,
        report.threads,
        report.nodes,
        report.time_ms,
        report.nodes_per_second()
    );
    report
}
