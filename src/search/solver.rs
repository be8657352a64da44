//! Exact endgame solver
//!
//! Fail-soft alpha-beta to the end of the game. The node type depends on
//! the number of empty squares `n`:
//!
//! | `n`                        | node                                 |
//! |----------------------------|--------------------------------------|
//! | 0                          | final score                          |
//! | 1, 2, 3                    | closed forms over the listed empties |
//! | below `parity_threshold`   | plain iteration over the empties     |
//! | below `sort_threshold`     | odd quadrants first, then the rest   |
//! | otherwise                  | sorted, see below                    |
//!
//! Sorted nodes use the table from `hash_threshold` empties and negascout
//! from `negascout_threshold`.
//!
//! For a window `(alpha, beta)` the returned `v` satisfies: `v >= beta`
//! when the true value is at least `beta`, `v <= alpha` when it is at
//! most `alpha`, and `v` is the true value otherwise.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use othello::board::{Board, MoveTables};
//! use othello::config::SearchConfig;
//! use othello::search::Solver;
//!
//! let board: Board = "
//!     XXXXXXXX
//!     XXXXXXXX
//!     XXXXXXXX
//!     XXXXOOOO
//!     XXXXOOOO
//!     XXXXOOOO
//!     XXXXOOO.
//!     XXXXOO.. O"
//!     .parse()
//!     .unwrap();
//! let pos = board.position();
//!
//! let mut solver = Solver::new(Arc::new(MoveTables::new()), Arc::new(SearchConfig::default()));
//! let score = solver.solve(pos.mover, pos.enemy);
//! assert!((-64..=64).contains(&score));
//! ```

use std::sync::Arc;

use log::trace;

use crate::board::bitboard::{calc_moves, has_moves, popcount};
use crate::board::{MoveTables, Position, Square};
use crate::config::SearchConfig;
use crate::error::SearchError;

use super::empties::{ListOfEmpties, SENTINEL};
use super::sorter::{EtcProbe, MoveSorter, SortHints};
use super::tt::{SolverTable, TTStats};

/// Largest possible disk differential
pub const SCORE_MAX: i32 = 64;

/// Below any reachable score; marks "no move tried yet"
const NO_SCORE: i32 = -SCORE_MAX - 1;

/// Score of a finished game from the mover's point of view.
///
/// With `winner_gets_empties` the empty squares are added to the winner's
/// count; a draw stays 0.
#[inline]
pub fn final_score(mover: u64, enemy: u64, winner_gets_empties: bool) -> i32 {
    let own = popcount(mover);
    let opp = popcount(enemy);
    let diff = own - opp;
    if !winner_gets_empties || diff == 0 {
        return diff;
    }
    let empties = 64 - own - opp;
    if diff > 0 {
        diff + empties
    } else {
        diff - empties
    }
}

/// Exact solver. Single-threaded: one instance per thread.
pub struct Solver {
    tables: Arc<MoveTables>,
    config: Arc<SearchConfig>,
    tt: SolverTable,
    empties: ListOfEmpties,
    sorter: MoveSorter,
    nodes: u64,
}

impl Solver {
    #[must_use]
    pub fn new(tables: Arc<MoveTables>, config: Arc<SearchConfig>) -> Self {
        Self {
            tt: SolverTable::new(config.tt_min_bits, config.tt_max_bits),
            sorter: MoveSorter::new(&config),
            empties: ListOfEmpties::new(),
            tables,
            config,
            nodes: 0,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Nodes visited since construction or the last [`Self::reset_nodes`]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn reset_nodes(&mut self) {
        self.nodes = 0;
    }

    /// Forget all stored bounds
    pub fn clear(&mut self) {
        self.tt.clear();
    }

    pub fn tt_stats(&self) -> TTStats {
        self.tt.stats()
    }

    /// Score of the finished game, honouring `winner_gets_empties`
    pub fn terminal_score(&self, mover: u64, enemy: u64) -> i32 {
        final_score(mover, enemy, self.config.winner_gets_empties)
    }

    /// Perfect-play disk differential for the mover
    pub fn solve(&mut self, mover: u64, enemy: u64) -> i32 {
        self.solve_window(mover, enemy, -SCORE_MAX, SCORE_MAX)
    }

    /// Fail-soft solve with window `(alpha, beta)`.
    ///
    /// # Panics
    ///
    /// If the masks overlap or the window is not `-64 <= alpha < beta <= 64`.
    pub fn solve_window(&mut self, mover: u64, enemy: u64, alpha: i32, beta: i32) -> i32 {
        let score = self.solve_quiet(mover, enemy, alpha, beta);
        trace!(
            "solve: score {score}, {} nodes, table {}% used",
            self.nodes,
            self.tt.stats().usage_percent
        );
        score
    }

    /// [`Self::solve_window`] without logging, for callers inside a search
    pub(crate) fn solve_quiet(&mut self, mover: u64, enemy: u64, alpha: i32, beta: i32) -> i32 {
        assert_eq!(mover & enemy, 0, "mover and enemy overlap");
        assert!(
            -SCORE_MAX <= alpha && alpha < beta && beta <= SCORE_MAX,
            "invalid window ({alpha}, {beta})"
        );
        let n = self.reset_empties(mover, enemy);
        self.search(mover, enemy, alpha, beta, n)
    }

    /// Best move and its perfect-play score.
    ///
    /// Fails with [`SearchError::NoLegalMove`] when the mover must pass.
    pub fn solve_with_move(
        &mut self,
        mover: u64,
        enemy: u64,
    ) -> Result<(Square, i32), SearchError> {
        assert_eq!(mover & enemy, 0, "mover and enemy overlap");
        let moves = calc_moves(mover, enemy);
        if moves == 0 {
            return Err(SearchError::NoLegalMove);
        }
        let n = self.reset_empties(mover, enemy);
        let pos = Position::new(mover, enemy);
        let slot = n as usize;
        let hints = SortHints {
            parity: self.empties.parity(),
            ..SortHints::default()
        };
        let count = self.sorter.sort(slot, &self.tables, pos, moves, hints);

        let beta = SCORE_MAX;
        let mut alpha = -SCORE_MAX;
        let mut best = (self.sorter.get(slot, 0).square, NO_SCORE);
        for i in 0..count {
            let mv = self.sorter.get(slot, i);
            let child = mv.apply(pos);
            let e = mv.square.index() as u8;
            self.empties.remove(e);
            let v = -self.search(child.mover, child.enemy, -beta, -alpha, n - 1);
            self.empties.restore(e);
            if v > best.1 {
                best = (mv.square, v);
                if v >= beta {
                    break;
                }
                alpha = alpha.max(v);
            }
        }
        trace!("solve_with_move: {} {} after {} nodes", best.0, best.1, self.nodes);
        Ok(best)
    }

    fn reset_empties(&mut self, mover: u64, enemy: u64) -> u32 {
        self.empties = ListOfEmpties::from_empty_mask(!(mover | enemy), &self.tables);
        self.empties.len()
    }

    fn search(&mut self, mover: u64, enemy: u64, alpha: i32, beta: i32, n: u32) -> i32 {
        debug_assert!(alpha < beta, "window ({alpha}, {beta})");
        debug_assert_eq!(n, self.empties.len());
        match n {
            0 => {
                self.nodes += 1;
                self.terminal_score(mover, enemy)
            }
            1 => {
                let a = Square::new(self.empties.first());
                self.solve1(mover, enemy, a)
            }
            2 => {
                let a = self.empties.first();
                let b = self.empties.next(a);
                self.solve2(mover, enemy, alpha, beta, Square::new(a), Square::new(b))
            }
            3 => {
                let a = self.empties.first();
                let b = self.empties.next(a);
                let c = self.empties.next(b);
                self.solve3(
                    mover,
                    enemy,
                    alpha,
                    beta,
                    [Square::new(a), Square::new(b), Square::new(c)],
                )
            }
            _ if n < self.config.parity_threshold => {
                self.search_plain(mover, enemy, alpha, beta, n)
            }
            _ if n < self.config.sort_threshold => self.search_parity(mover, enemy, alpha, beta, n),
            _ => self.search_sorted(mover, enemy, alpha, beta, n),
        }
    }

    /// Neither side moved here: hand the move over, or score the game
    fn pass(&mut self, mover: u64, enemy: u64, alpha: i32, beta: i32, n: u32) -> i32 {
        if has_moves(enemy, mover) {
            -self.search(enemy, mover, -beta, -alpha, n)
        } else {
            self.terminal_score(mover, enemy)
        }
    }

    // =========================================================================
    // Closed forms
    // =========================================================================

    /// Last empty square. The board is full afterwards, so the score is
    /// `2 * disks - 64` for whoever fills it.
    fn solve1(&mut self, mover: u64, enemy: u64, sq: Square) -> i32 {
        self.nodes += 1;
        let flips = self.tables.flips(mover, enemy, sq);
        if flips != 0 {
            return 2 * (popcount(mover) + popcount(flips) + 1) - SCORE_MAX;
        }
        let flips = self.tables.flips(enemy, mover, sq);
        if flips != 0 {
            return SCORE_MAX - 2 * (popcount(enemy) + popcount(flips) + 1);
        }
        self.terminal_score(mover, enemy)
    }

    fn solve2(
        &mut self,
        mover: u64,
        enemy: u64,
        alpha: i32,
        beta: i32,
        a: Square,
        b: Square,
    ) -> i32 {
        self.nodes += 1;
        let mut best = NO_SCORE;

        let flips = self.tables.flips(mover, enemy, a);
        if flips != 0 {
            best = -self.solve1(enemy & !flips, mover | flips | a.bit(), b);
            if best >= beta {
                return best;
            }
        }
        let flips = self.tables.flips(mover, enemy, b);
        if flips != 0 {
            best = best.max(-self.solve1(enemy & !flips, mover | flips | b.bit(), a));
        }
        if best != NO_SCORE {
            return best;
        }

        if self.tables.flips(enemy, mover, a) | self.tables.flips(enemy, mover, b) != 0 {
            -self.solve2(enemy, mover, -beta, -alpha, a, b)
        } else {
            self.terminal_score(mover, enemy)
        }
    }

    fn solve3(
        &mut self,
        mover: u64,
        enemy: u64,
        mut alpha: i32,
        beta: i32,
        sqs: [Square; 3],
    ) -> i32 {
        self.nodes += 1;
        let [a, b, c] = self.order3(sqs);
        let mut best = NO_SCORE;

        for (sq, x, y) in [(a, b, c), (b, a, c), (c, a, b)] {
            let flips = self.tables.flips(mover, enemy, sq);
            if flips == 0 {
                continue;
            }
            let v = -self.solve2(enemy & !flips, mover | flips | sq.bit(), -beta, -alpha, x, y);
            if v > best {
                best = v;
                if v >= beta {
                    return v;
                }
                alpha = alpha.max(v);
            }
        }
        if best != NO_SCORE {
            return best;
        }

        let enemy_can_move = [a, b, c]
            .iter()
            .any(|&sq| self.tables.flips(enemy, mover, sq) != 0);
        if enemy_can_move {
            -self.solve3(enemy, mover, -beta, -alpha, [a, b, c])
        } else {
            self.terminal_score(mover, enemy)
        }
    }

    /// A square alone in its quadrant is tried first
    fn order3(&self, [a, b, c]: [Square; 3]) -> [Square; 3] {
        let region = |sq| self.tables.parity_region(sq);
        if region(a) == region(b) && region(b) != region(c) {
            [c, a, b]
        } else if region(a) == region(c) && region(a) != region(b) {
            [b, a, c]
        } else {
            [a, b, c]
        }
    }

    // =========================================================================
    // Iterating nodes
    // =========================================================================

    /// Try one listed empty square; `None` when it is not a legal move
    #[inline]
    fn try_square(
        &mut self,
        mover: u64,
        enemy: u64,
        alpha: i32,
        beta: i32,
        n: u32,
        e: u8,
    ) -> Option<i32> {
        let sq = Square::new(e);
        let flips = self.tables.flips(mover, enemy, sq);
        if flips == 0 {
            return None;
        }
        self.empties.remove(e);
        let v = -self.search(enemy & !flips, mover | flips | sq.bit(), -beta, -alpha, n - 1);
        self.empties.restore(e);
        Some(v)
    }

    fn search_plain(&mut self, mover: u64, enemy: u64, mut alpha: i32, beta: i32, n: u32) -> i32 {
        self.nodes += 1;
        let mut best = NO_SCORE;
        let mut e = self.empties.first();
        while e != SENTINEL {
            if let Some(v) = self.try_square(mover, enemy, alpha, beta, n, e) {
                if v > best {
                    best = v;
                    if v >= beta {
                        return v;
                    }
                    alpha = alpha.max(v);
                }
            }
            e = self.empties.next(e);
        }
        if best == NO_SCORE {
            return self.pass(mover, enemy, alpha, beta, n);
        }
        best
    }

    /// Squares in quadrants with an odd number of empties first
    fn search_parity(&mut self, mover: u64, enemy: u64, mut alpha: i32, beta: i32, n: u32) -> i32 {
        self.nodes += 1;
        let parity = self.empties.parity();
        let mut best = NO_SCORE;
        for odd in [true, false] {
            let mut e = self.empties.first();
            while e != SENTINEL {
                if (parity & self.empties.region(e) != 0) == odd {
                    if let Some(v) = self.try_square(mover, enemy, alpha, beta, n, e) {
                        if v > best {
                            best = v;
                            if v >= beta {
                                return v;
                            }
                            alpha = alpha.max(v);
                        }
                    }
                }
                e = self.empties.next(e);
            }
        }
        if best == NO_SCORE {
            return self.pass(mover, enemy, alpha, beta, n);
        }
        best
    }

    fn search_sorted(
        &mut self,
        mover: u64,
        enemy: u64,
        mut alpha: i32,
        mut beta: i32,
        n: u32,
    ) -> i32 {
        self.nodes += 1;
        let hashing = n >= self.config.hash_threshold;

        if hashing {
            if let Some(bound) = self.tt.find(mover, enemy) {
                if bound.min >= beta {
                    return bound.min;
                }
                if bound.max <= alpha {
                    return bound.max;
                }
                if bound.is_exact() {
                    return bound.min;
                }
                alpha = alpha.max(bound.min);
                beta = beta.min(bound.max);
            }
        }

        let moves = calc_moves(mover, enemy);
        if moves == 0 {
            return self.pass(mover, enemy, alpha, beta, n);
        }

        let pos = Position::new(mover, enemy);
        let slot = n as usize;
        let hints = SortHints {
            parity: self.empties.parity(),
            hash_move: None,
            etc: hashing.then_some(EtcProbe {
                table: &self.tt,
                beta,
            }),
        };
        let count = self.sorter.sort(slot, &self.tables, pos, moves, hints);

        let window_alpha = alpha;
        let negascout = n >= self.config.negascout_threshold;
        let mut best = NO_SCORE;
        for i in 0..count {
            let mv = self.sorter.get(slot, i);
            let child = mv.apply(pos);
            let e = mv.square.index() as u8;
            self.empties.remove(e);
            let v = if i == 0 || !negascout {
                -self.search(child.mover, child.enemy, -beta, -alpha, n - 1)
            } else {
                let probe = -self.search(child.mover, child.enemy, -alpha - 1, -alpha, n - 1);
                if probe > alpha && probe < beta {
                    -self.search(child.mover, child.enemy, -beta, -alpha, n - 1)
                } else {
                    probe
                }
            };
            self.empties.restore(e);

            if v > best {
                best = v;
                if v >= beta {
                    break;
                }
                alpha = alpha.max(v);
            }
        }

        if hashing {
            self.tt.store(mover, enemy, window_alpha, beta, best);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::bitboard::flips_by_rays;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::sync::OnceLock;

    fn tables() -> Arc<MoveTables> {
        static TABLES: OnceLock<Arc<MoveTables>> = OnceLock::new();
        TABLES.get_or_init(|| Arc::new(MoveTables::new())).clone()
    }

    fn solver_with(config: SearchConfig) -> Solver {
        Solver::new(tables(), Arc::new(config))
    }

    fn solver() -> Solver {
        solver_with(SearchConfig::default())
    }

    fn random(seed: u64, empties: u32) -> Position {
        Position::random(&mut Xoshiro256PlusPlus::seed_from_u64(seed), empties)
    }

    /// Plain minimax over ray flips
    fn minimax(mover: u64, enemy: u64, winner_gets_empties: bool) -> i32 {
        let moves = calc_moves(mover, enemy);
        if moves == 0 {
            if calc_moves(enemy, mover) == 0 {
                return final_score(mover, enemy, winner_gets_empties);
            }
            return -minimax(enemy, mover, winner_gets_empties);
        }
        Square::iter_mask(moves)
            .map(|sq| {
                let flips = flips_by_rays(mover, enemy, sq);
                let child = Position::new(mover, enemy).play_flips(sq, flips);
                -minimax(child.mover, child.enemy, winner_gets_empties)
            })
            .max()
            .unwrap()
    }

    #[test]
    fn test_terminal_score_example() {
        // One black disk, 63 white, black to move: nobody can move
        let mut solver = solver();
        let (mover, enemy) = (1u64, !1u64);
        assert_eq!(solver.terminal_score(mover, enemy), -62);
        assert_eq!(solver.solve(mover, enemy), -62);
    }

    #[test]
    fn test_final_score_winner_gets_empties() {
        // A lone disk: the game is over with 63 empties
        assert_eq!(final_score(1, 0, true), 64);
        assert_eq!(final_score(1, 0, false), 1);
        assert_eq!(final_score(0, 1, true), -64);
        assert_eq!(final_score(0b11, 0b1100, true), 0);
    }

    #[test]
    fn test_solve_respects_winner_gets_empties() {
        let pos = Position::new(1, 0);
        assert_eq!(solver().solve(pos.mover, pos.enemy), 64);
        let config = SearchConfig {
            winner_gets_empties: false,
            ..SearchConfig::default()
        };
        assert_eq!(solver_with(config).solve(pos.mover, pos.enemy), 1);
    }

    #[test]
    fn test_solve1_formula() {
        let mut solver = solver();
        let mut checked = 0;
        for seed in 0..40 {
            let pos = random(seed, 1);
            let sq = Square::lowest(pos.empties());
            let flips = flips_by_rays(pos.mover, pos.enemy, sq);
            if flips == 0 {
                continue;
            }
            let k = popcount(flips);
            let expected = 2 * (popcount(pos.mover) + k + 1) - 64;
            assert_eq!(solver.solve(pos.mover, pos.enemy), expected);
            assert_eq!(minimax(pos.mover, pos.enemy, true), expected);
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_matches_minimax_small() {
        let mut solver = solver();
        for empties in 1..=8 {
            for seed in 0..6 {
                let pos = random(seed * 31 + u64::from(empties), empties);
                assert_eq!(
                    solver.solve(pos.mover, pos.enemy),
                    minimax(pos.mover, pos.enemy, true),
                    "seed {seed}, {empties} empties"
                );
            }
        }
    }

    #[test]
    fn test_matches_minimax_without_empties_rule() {
        let config = SearchConfig {
            winner_gets_empties: false,
            ..SearchConfig::default()
        };
        let mut solver = solver_with(config);
        for seed in 0..6 {
            let pos = random(seed, 7);
            assert_eq!(
                solver.solve(pos.mover, pos.enemy),
                minimax(pos.mover, pos.enemy, false)
            );
        }
    }

    #[test]
    fn test_node_types_agree() {
        // Same values whatever the thresholds select
        let variants = [
            SearchConfig::default(),
            SearchConfig {
                parity_threshold: 4,
                sort_threshold: 4,
                hash_threshold: 4,
                negascout_threshold: 4,
                ..SearchConfig::default()
            },
            SearchConfig {
                parity_threshold: 20,
                sort_threshold: 20,
                hash_threshold: 20,
                negascout_threshold: 20,
                ..SearchConfig::default()
            },
            SearchConfig {
                etc_enabled: false,
                tt_min_bits: 0,
                tt_max_bits: 0,
                ..SearchConfig::default()
            },
        ];
        let positions: Vec<Position> = (0..5).map(|s| random(100 + s, 10)).collect();
        let reference: Vec<i32> = {
            let mut solver = solver();
            positions.iter().map(|p| solver.solve(p.mover, p.enemy)).collect()
        };
        for config in variants {
            let mut solver = solver_with(config);
            for (pos, &expected) in positions.iter().zip(&reference) {
                assert_eq!(solver.solve(pos.mover, pos.enemy), expected);
            }
        }
    }

    #[test]
    fn test_fail_soft_contract() {
        let mut solver = solver();
        for seed in 0..6 {
            let pos = random(200 + seed, 13);
            let t = solver.solve(pos.mover, pos.enemy);
            let windows = [
                (-64, -20),
                (-10, -8),
                (-2, 2),
                (t - 1, t + 1),
                (t, t + 1),
                (t - 1, t),
                (10, 30),
                (40, 64),
            ];
            for (alpha, beta) in windows {
                if !(-64 <= alpha && alpha < beta && beta <= 64) {
                    continue;
                }
                let v = solver.solve_window(pos.mover, pos.enemy, alpha, beta);
                if t >= beta {
                    assert!(v >= beta, "t={t} v={v} ({alpha},{beta})");
                    assert!(v <= t);
                } else if t <= alpha {
                    assert!(v <= alpha, "t={t} v={v} ({alpha},{beta})");
                    assert!(v >= t);
                } else {
                    assert_eq!(v, t, "({alpha},{beta})");
                }
            }
        }
    }

    #[test]
    fn test_solve_with_move() {
        let mut solver = solver();
        for seed in 0..5 {
            let pos = random(300 + seed, 11);
            let score = solver.solve(pos.mover, pos.enemy);
            let (sq, best) = solver.solve_with_move(pos.mover, pos.enemy).unwrap();
            assert_eq!(best, score);
            let child = pos.play(sq).unwrap();
            assert_eq!(-solver.solve(child.mover, child.enemy), score);
        }
    }

    #[test]
    fn test_solve_with_move_requires_move() {
        let mut solver = solver();
        assert_eq!(
            solver.solve_with_move(1, !1),
            Err(SearchError::NoLegalMove)
        );
    }

    #[test]
    fn test_pass_position() {
        // White has no move, black fills the corner
        let board: crate::board::Board = "
            XXXXXXXX
            XXXXXXXX
            XXXXXXXX
            XXXXXXXX
            XXXXXXXX
            XXXXXXXX
            XXXXXXXO
            XXXXXXO. O"
            .parse()
            .unwrap();
        let pos = board.position();
        assert_eq!(pos.moves(), 0);
        let score = solver().solve(pos.mover, pos.enemy);
        assert_eq!(score, minimax(pos.mover, pos.enemy, true));
        assert_eq!(score, -64);
    }

    #[test]
    fn test_clear_and_nodes() {
        let mut solver = solver();
        let pos = random(9, 14);
        let first = solver.solve(pos.mover, pos.enemy);
        assert!(solver.nodes() > 0);
        assert!(solver.tt_stats().used > 0);

        solver.clear();
        solver.reset_nodes();
        assert_eq!(solver.tt_stats().used, 0);
        assert_eq!(solver.solve(pos.mover, pos.enemy), first);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Narrow windows agree with the full window
        #[test]
        fn prop_fail_soft(seed in any::<u64>(), alpha in -64i32..64, width in 1i32..12) {
            let beta = (alpha + width).min(64);
            let pos = random(seed, 10);
            let mut solver = solver();
            let t = solver.solve(pos.mover, pos.enemy);
            solver.clear();
            let v = solver.solve_window(pos.mover, pos.enemy, alpha, beta);
            if t >= beta {
                prop_assert!(v >= beta);
            } else if t <= alpha {
                prop_assert!(v <= alpha);
            } else {
                prop_assert_eq!(v, t);
            }
        }
    }
}
