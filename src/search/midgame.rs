//! Depth-limited midgame search
//!
//! Negamax alpha-beta with principal variation search over a pluggable
//! [`Evaluator`]. Scores are centidisks. Additions over a plain search:
//!
//! - **Handoff**: at or below `handoff_empties` the exact [`Solver`] takes
//!   over and its disk score is scaled by 100
//! - **Transposition table**: depth-aware cutoffs and best-move hints
//! - **Internal iterative deepening**: a reduced-depth search supplies a
//!   first move when the table has none
//! - **Multi-ProbCut**: shallow null-window probes against a regressed
//!   window cut nodes that are very likely to fail high or low
//!
//! A pass does not consume depth. The abort flag is checked before every
//! move; a raised flag unwinds the whole search with
//! [`SearchError::Aborted`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use othello::board::{MoveTables, Position};
//! use othello::config::SearchConfig;
//! use othello::eval::HeuristicEvaluator;
//! use othello::search::{MpcTable, Searcher};
//!
//! let mut searcher = Searcher::new(
//!     Arc::new(MoveTables::new()),
//!     Arc::new(SearchConfig::default()),
//!     HeuristicEvaluator::default(),
//!     MpcTable::default(),
//! );
//! let pos = Position::start();
//! let best = searcher.get_move_score(pos, pos.moves(), 4).unwrap();
//! assert_ne!(pos.moves() & best.square.bit(), 0);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::board::bitboard::{calc_moves, has_moves};
use crate::board::{MoveTables, Position, Square};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::eval::Evaluator;

use super::mpc::MpcTable;
use super::solver::{Solver, SCORE_MAX};
use super::sorter::{MoveSorter, SortHints};
use super::tt::{position_hash, EntryType, TTStats, TranspositionTable};

/// Largest score in centidisks (a 64-0 win)
pub const SCORE_WIN: i32 = SCORE_MAX * 100;

/// Window bound beyond any reachable score
const SCORE_INF: i32 = SCORE_WIN + 1;

/// Best root move and its score in centidisks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveScore {
    pub square: Square,
    pub score: i32,
}

/// Midgame searcher. Single-threaded: one instance per thread.
pub struct Searcher<E: Evaluator> {
    tables: Arc<MoveTables>,
    config: Arc<SearchConfig>,
    evaluator: E,
    mpc: MpcTable,
    solver: Solver,
    tt: TranspositionTable,
    sorter: MoveSorter,
    nodes: u64,
    stopped: Arc<AtomicBool>,
}

impl<E: Evaluator> Searcher<E> {
    /// Create a searcher.
    ///
    /// # Arguments
    ///
    /// * `tables` - Shared flip tables
    /// * `config` - Thresholds; `midgame_tt_mb` sizes the table
    /// * `evaluator` - Leaf evaluation in centidisks
    /// * `mpc` - Probe coefficients; ignored when `mpc_enabled` is off
    #[must_use]
    pub fn new(
        tables: Arc<MoveTables>,
        config: Arc<SearchConfig>,
        evaluator: E,
        mpc: MpcTable,
    ) -> Self {
        Self {
            solver: Solver::new(Arc::clone(&tables), Arc::clone(&config)),
            tt: TranspositionTable::new(config.midgame_tt_mb),
            sorter: MoveSorter::new(&config),
            tables,
            config,
            evaluator,
            mpc,
            nodes: 0,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use an externally owned abort flag
    #[must_use]
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stopped = flag;
        self
    }

    /// Flag that stops the current search when set. Each search clears it
    /// on entry.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    /// Nodes visited, including exact-solver nodes after handoff
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Forget both transposition tables
    pub fn clear(&mut self) {
        self.tt.clear();
        self.solver.clear();
    }

    pub fn tt_stats(&self) -> TTStats {
        self.tt.stats()
    }

    // =========================================================================
    // Public entry points
    // =========================================================================

    /// Score of the position for the mover, searched `depth` plies deep.
    pub fn calc_score(&mut self, mover: u64, enemy: u64, depth: u32) -> Result<i32, SearchError> {
        assert_eq!(mover & enemy, 0, "mover and enemy overlap");
        self.stopped.store(false, Ordering::Relaxed);
        let n = Position::new(mover, enemy).empty_count();
        self.search(mover, enemy, -SCORE_INF, SCORE_INF, depth.min(n), n)
    }

    /// Best move among `moves` for `position`, searched `depth` plies deep.
    ///
    /// # Returns
    ///
    /// The move and its exact score at that depth, or
    /// [`SearchError::NoLegalMove`] when `moves` is empty.
    pub fn get_move_score(
        &mut self,
        position: Position,
        moves: u64,
        depth: u32,
    ) -> Result<MoveScore, SearchError> {
        if moves == 0 {
            return Err(SearchError::NoLegalMove);
        }
        debug_assert_eq!(moves & !position.moves(), 0, "illegal moves in mask");
        self.stopped.store(false, Ordering::Relaxed);
        let start = Instant::now();
        let nodes_before = self.nodes;

        let n = position.empty_count();
        let depth = depth.clamp(1, n);
        let hash = position_hash(position.mover, position.enemy);
        let slot = depth as usize;
        let hints = SortHints {
            parity: self.parity(position),
            hash_move: self.tt.get_best_move(hash),
            etc: None,
        };
        let count = self.sorter.sort(slot, &self.tables, position, moves, hints);

        let beta = SCORE_INF;
        let mut alpha = -SCORE_INF;
        let mut best: Option<MoveScore> = None;
        for i in 0..count {
            self.check_abort()?;
            let mv = self.sorter.get(slot, i);
            let child = mv.apply(position);
            let score = self.search_child(child, alpha, beta, depth - 1, n - 1, i == 0)?;
            if best.map_or(true, |b| score > b.score) {
                best = Some(MoveScore {
                    square: mv.square,
                    score,
                });
                alpha = alpha.max(score);
            }
        }
        let best = best.ok_or(SearchError::NoLegalMove)?;

        self.tt
            .store(hash, depth as u8, best.score, EntryType::Exact, Some(best.square));
        debug!(
            "search depth {depth}, {n} empties: {} {} ({} nodes, {} ms)",
            best.square,
            best.score,
            self.nodes - nodes_before,
            start.elapsed().as_millis()
        );
        Ok(best)
    }

    // =========================================================================
    // Recursion
    // =========================================================================

    #[inline]
    fn check_abort(&self) -> Result<(), SearchError> {
        if self.stopped.load(Ordering::Relaxed) {
            Err(SearchError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Odd-quadrant bits for the move sorter; skipped where parity is unused
    fn parity(&self, pos: Position) -> u8 {
        if pos.empty_count() > self.config.parity_sort_max_empties {
            return 0;
        }
        Square::iter_mask(pos.empties()).fold(0, |acc, sq| acc ^ self.tables.parity_region(sq))
    }

    /// Negated child score; the first child gets the full window, later
    /// ones a null window with a re-search when it lands inside
    fn search_child(
        &mut self,
        child: Position,
        alpha: i32,
        beta: i32,
        depth: u32,
        n: u32,
        first: bool,
    ) -> Result<i32, SearchError> {
        if first {
            return Ok(-self.search(child.mover, child.enemy, -beta, -alpha, depth, n)?);
        }
        let s = -self.search(child.mover, child.enemy, -alpha - 1, -alpha, depth, n)?;
        if s > alpha && s < beta {
            return Ok(-self.search(child.mover, child.enemy, -beta, -alpha, depth, n)?);
        }
        Ok(s)
    }

    /// Fail-soft negamax. `depth <= n` always holds.
    fn search(
        &mut self,
        mover: u64,
        enemy: u64,
        mut alpha: i32,
        beta: i32,
        depth: u32,
        n: u32,
    ) -> Result<i32, SearchError> {
        debug_assert!(alpha < beta, "window ({alpha}, {beta})");
        self.nodes += 1;

        if n <= self.config.handoff_empties {
            return Ok(self.solve_exact(mover, enemy, alpha, beta));
        }
        if depth == 0 {
            return Ok(self.evaluator.eval(mover, enemy).clamp(-SCORE_WIN, SCORE_WIN));
        }

        let moves = calc_moves(mover, enemy);
        if moves == 0 {
            if !has_moves(enemy, mover) {
                return Ok(100 * self.solver.terminal_score(mover, enemy));
            }
            return Ok(-self.search(enemy, mover, -beta, -alpha, depth, n)?);
        }

        let hash = position_hash(mover, enemy);
        if let Some(score) = self.tt.probe(hash, depth as u8, alpha, beta) {
            return Ok(score);
        }

        if self.config.mpc_enabled && depth >= self.config.mpc_min_depth {
            if let Some(score) = self.probcut(mover, enemy, alpha, beta, depth, n)? {
                return Ok(score);
            }
        }

        let mut hash_move = self.tt.get_best_move(hash);
        if hash_move.is_none() && depth >= self.config.iid_min_depth {
            let iid_depth = depth.saturating_sub(self.config.iid_reduction);
            self.search(mover, enemy, alpha, beta, iid_depth, n)?;
            hash_move = self.tt.get_best_move(hash);
        }

        let pos = Position::new(mover, enemy);
        let slot = depth as usize;
        let hints = SortHints {
            parity: self.parity(pos),
            hash_move,
            etc: None,
        };
        let count = self.sorter.sort(slot, &self.tables, pos, moves, hints);

        let original_alpha = alpha;
        let mut best_score = -SCORE_INF;
        let mut best_move = None;
        for i in 0..count {
            self.check_abort()?;
            let mv = self.sorter.get(slot, i);
            let score = self.search_child(mv.apply(pos), alpha, beta, depth - 1, n - 1, i == 0)?;
            if score > best_score {
                best_score = score;
                best_move = Some(mv.square);
                if score >= beta {
                    break;
                }
                alpha = alpha.max(score);
            }
        }

        let entry_type = if best_score >= beta {
            EntryType::LowerBound
        } else if best_score <= original_alpha {
            EntryType::UpperBound
        } else {
            EntryType::Exact
        };
        self.tt.store(hash, depth as u8, best_score, entry_type, best_move);
        Ok(best_score)
    }

    /// Exact solve with the centidisk window widened to whole disks.
    ///
    /// `floor(alpha / 100)` and `ceil(beta / 100)` keep the fail-soft
    /// contract after scaling back.
    fn solve_exact(&mut self, mover: u64, enemy: u64, alpha: i32, beta: i32) -> i32 {
        if alpha >= SCORE_WIN {
            return SCORE_WIN;
        }
        if beta <= -SCORE_WIN {
            return -SCORE_WIN;
        }
        let disk_alpha = alpha.div_euclid(100).max(-SCORE_MAX);
        let disk_beta = (-(-beta).div_euclid(100)).min(SCORE_MAX);
        let before = self.solver.nodes();
        let score = self.solver.solve_quiet(mover, enemy, disk_alpha, disk_beta);
        self.nodes += self.solver.nodes() - before;
        100 * score
    }

    /// Multi-ProbCut. `Some(beta)` or `Some(alpha)` when a shallow probe
    /// clears the regressed bound; cut nodes are not stored.
    fn probcut(
        &mut self,
        mover: u64,
        enemy: u64,
        alpha: i32,
        beta: i32,
        depth: u32,
        n: u32,
    ) -> Result<Option<i32>, SearchError> {
        let width = self.config.mpc_width;
        for i in 0..self.mpc.cutoffs(depth, n).len() {
            let cut = self.mpc.cutoffs(depth, n)[i];
            let (lo, hi) = cut.shallow_window(alpha, beta, width);

            if beta <= SCORE_WIN && hi > -SCORE_WIN && hi <= SCORE_WIN {
                let v = self.search(mover, enemy, hi - 1, hi, cut.shallow_depth, n)?;
                if v >= hi {
                    return Ok(Some(beta));
                }
            }
            if alpha >= -SCORE_WIN && lo >= -SCORE_WIN && lo < SCORE_WIN {
                let v = self.search(mover, enemy, lo, lo + 1, cut.shallow_depth, n)?;
                if v <= lo {
                    return Ok(Some(alpha));
                }
            }
        }
        Ok(None)
    }
}
