//! Move ordering
//!
//! The sorter owns one pre-allocated move list per search slot (the
//! number of empties for the solver, the remaining depth for the midgame
//! searcher). A child frame always uses a smaller slot than its parent,
//! so lists are reused across sibling calls without allocation.
//!
//! Each move is scored from:
//! - a static square value (corners high, X and C squares low)
//! - a bonus for playing into a quadrant with an odd number of empties
//! - the opponent's potential mobility after the move
//! - the opponent's log-scaled mobility after the move
//! - a bonus for the hash move
//! - an enhanced transposition cutoff bonus when the child is already
//!   known to refute the opponent

use crate::board::bitboard::{popcount, potential_mobility};
use crate::board::{MoveTables, Position, Square};
use crate::config::SearchConfig;

use super::tt::SolverTable;

/// Capacity of one move list. Moves are a subset of the empties.
pub const MAX_MOVES: usize = 64;

/// Number of slots: one per possible empty count
const SLOTS: usize = 65;

const HASH_MOVE_BONUS: i32 = 1 << 21;
const ETC_BONUS: i32 = 1 << 20;

#[rustfmt::skip]
const SQUARE_VALUE: [i32; 64] = [
     60, -10,  20,  10,  10,  20, -10,  60,
    -10, -30,  -5,  -5,  -5,  -5, -30, -10,
     20,  -5,  15,   3,   3,  15,  -5,  20,
     10,  -5,   3,   3,   3,   3,  -5,  10,
     10,  -5,   3,   3,   3,   3,  -5,  10,
     20,  -5,  15,   3,   3,  15,  -5,  20,
    -10, -30,  -5,  -5,  -5,  -5, -30, -10,
     60, -10,  20,  10,  10,  20, -10,  60,
];

/// `round(4 * log2(1 + k))`
const MOBILITY_PENALTY: [i32; 33] = [
    0, 4, 6, 8, 9, 10, 11, 12, 13, 13, 14, 14, 15, 15, 16, 16, 16, 17, 17, 17, 18, 18, 18, 18,
    19, 19, 19, 19, 19, 20, 20, 20, 20,
];

/// A scored legal move with its flips and the opponent's replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub square: Square,
    pub score: i32,
    pub flips: u64,
    /// Legal moves of the opponent after this move
    pub enemy_moves: u64,
}

impl Move {
    const NONE: Self = Self {
        square: Square::new(0),
        score: 0,
        flips: 0,
        enemy_moves: 0,
    };

    /// Position after the move, opponent to move
    #[inline]
    pub fn apply(&self, pos: Position) -> Position {
        pos.play_flips(self.square, self.flips)
    }
}

/// Solver table probe for enhanced transposition cutoffs
#[derive(Clone, Copy)]
pub struct EtcProbe<'a> {
    pub table: &'a SolverTable,
    /// Beta of the node being sorted
    pub beta: i32,
}

/// Per-node information the scores depend on.
#[derive(Clone, Copy, Default)]
pub struct SortHints<'a> {
    /// Region parity of the empties (see `ListOfEmpties::calc_parity`)
    pub parity: u8,
    pub hash_move: Option<Square>,
    pub etc: Option<EtcProbe<'a>>,
}

#[derive(Clone)]
struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    fn new() -> Self {
        Self {
            moves: [Move::NONE; MAX_MOVES],
            len: 0,
        }
    }

    /// Insert keeping scores descending; equal scores keep insertion order
    #[inline]
    fn insert(&mut self, mv: Move) {
        let mut j = self.len;
        while j > 0 && self.moves[j - 1].score < mv.score {
            self.moves[j] = self.moves[j - 1];
            j -= 1;
        }
        self.moves[j] = mv;
        self.len += 1;
    }
}

/// Depth-indexed move lists and the ordering weights.
pub struct MoveSorter {
    lists: Vec<MoveList>,
    square_weight: i32,
    parity_weight: i32,
    potential_mobility_weight: i32,
    mobility_weight: i32,
    parity_sort_max_empties: u32,
    etc_enabled: bool,
    etc_max_empties: u32,
}

impl MoveSorter {
    #[must_use]
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            lists: vec![MoveList::new(); SLOTS],
            square_weight: config.square_weight,
            parity_weight: config.parity_weight,
            potential_mobility_weight: config.potential_mobility_weight,
            mobility_weight: config.mobility_weight,
            parity_sort_max_empties: config.parity_sort_max_empties,
            etc_enabled: config.etc_enabled,
            etc_max_empties: config.etc_max_empties,
        }
    }

    /// Score every move in `moves` and sort them into list `slot`, best
    /// first. Returns the number of moves.
    pub fn sort(
        &mut self,
        slot: usize,
        tables: &MoveTables,
        pos: Position,
        moves: u64,
        hints: SortHints<'_>,
    ) -> usize {
        let empties = pos.empty_count();
        let use_parity = empties <= self.parity_sort_max_empties;
        let etc = hints
            .etc
            .filter(|_| self.etc_enabled && empties < self.etc_max_empties);

        let list = &mut self.lists[slot];
        list.len = 0;
        for sq in Square::iter_mask(moves) {
            let flips = tables.flips(pos.mover, pos.enemy, sq);
            debug_assert_ne!(flips, 0, "{sq} is not a legal move");
            let child = pos.play_flips(sq, flips);
            let enemy_moves = child.moves();

            let mut score = self.square_weight * SQUARE_VALUE[sq.index()];
            if use_parity && hints.parity & tables.parity_region(sq) != 0 {
                score += self.parity_weight;
            }
            score -= self.potential_mobility_weight
                * potential_mobility(child.enemy, child.empties());
            let replies = popcount(enemy_moves).min(32) as usize;
            score -= self.mobility_weight * MOBILITY_PENALTY[replies];
            if hints.hash_move == Some(sq) {
                score += HASH_MOVE_BONUS;
            }
            if let Some(probe) = etc {
                // The child refutes the opponent outright at (-beta, -alpha)
                if let Some(bound) = probe.table.find(child.mover, child.enemy) {
                    if bound.max <= -probe.beta {
                        score += ETC_BONUS;
                    }
                }
            }

            list.insert(Move {
                square: sq,
                score,
                flips,
                enemy_moves,
            });
        }
        list.len
    }

    /// Number of moves sorted into `slot`
    #[inline]
    pub fn len(&self, slot: usize) -> usize {
        self.lists[slot].len
    }

    /// The `i`-th best move of `slot`
    #[inline]
    pub fn get(&self, slot: usize, i: usize) -> Move {
        debug_assert!(i < self.lists[slot].len);
        self.lists[slot].moves[i]
    }

    /// Sorted moves of `slot`
    pub fn moves(&self, slot: usize) -> &[Move] {
        let list = &self.lists[slot];
        &list.moves[..list.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::bitboard::flips_by_rays;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn setup() -> (MoveTables, MoveSorter) {
        (MoveTables::new(), MoveSorter::new(&SearchConfig::default()))
    }

    fn random(seed: u64, empties: u32) -> Position {
        Position::random(&mut Xoshiro256PlusPlus::seed_from_u64(seed), empties)
    }

    #[test]
    fn test_sort_contains_every_move_once() {
        let (tables, mut sorter) = setup();
        let pos = random(3, 30);
        let n = sorter.sort(30, &tables, pos, pos.moves(), SortHints::default());
        assert_eq!(n, pos.moves().count_ones() as usize);
        let mask = sorter.moves(30).iter().fold(0, |acc, m| acc | m.square.bit());
        assert_eq!(mask, pos.moves());
    }

    #[test]
    fn test_sort_descending() {
        let (tables, mut sorter) = setup();
        for seed in 0..20 {
            let pos = random(seed, 24);
            sorter.sort(24, &tables, pos, pos.moves(), SortHints::default());
            let scores: Vec<i32> = sorter.moves(24).iter().map(|m| m.score).collect();
            assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
        }
    }

    #[test]
    fn test_sort_deterministic() {
        let (tables, mut sorter) = setup();
        let pos = random(11, 18);
        let hints = SortHints {
            parity: 0b0101,
            ..SortHints::default()
        };
        sorter.sort(18, &tables, pos, pos.moves(), hints);
        let first: Vec<Move> = sorter.moves(18).to_vec();
        // Sorting another slot in between must not disturb anything
        sorter.sort(17, &tables, pos, pos.moves(), SortHints::default());
        sorter.sort(18, &tables, pos, pos.moves(), hints);
        assert_eq!(sorter.moves(18), first.as_slice());
    }

    #[test]
    fn test_moves_carry_flips_and_replies() {
        let (tables, mut sorter) = setup();
        let pos = random(5, 40);
        sorter.sort(40, &tables, pos, pos.moves(), SortHints::default());
        for i in 0..sorter.len(40) {
            let mv = sorter.get(40, i);
            assert_eq!(mv.flips, flips_by_rays(pos.mover, pos.enemy, mv.square));
            let child = mv.apply(pos);
            assert_eq!(mv.enemy_moves, child.moves());
            assert_eq!(child.empty_count(), 39);
        }
    }

    #[test]
    fn test_hash_move_first() {
        let (tables, mut sorter) = setup();
        let pos = random(8, 30);
        sorter.sort(30, &tables, pos, pos.moves(), SortHints::default());
        let worst = sorter.get(30, sorter.len(30) - 1).square;

        let hints = SortHints {
            hash_move: Some(worst),
            ..SortHints::default()
        };
        sorter.sort(30, &tables, pos, pos.moves(), hints);
        assert_eq!(sorter.get(30, 0).square, worst);
    }

    #[test]
    fn test_corner_preferred_at_start_of_ties() {
        let (tables, mut sorter) = setup();
        // Black can take A1 or play B3-ish squares; corner must lead
        let board: crate::board::Board = "
            .OX.....
            ........
            ........
            ...OX...
            ...XO...
            ........
            ........
            ........ X"
            .parse()
            .unwrap();
        let pos = board.position();
        let a1: Square = "A1".parse().unwrap();
        assert_ne!(pos.moves() & a1.bit(), 0);
        sorter.sort(0, &tables, pos, pos.moves(), SortHints::default());
        assert_eq!(sorter.get(0, 0).square, a1);
    }

    #[test]
    fn test_etc_bonus_promotes_refuting_move() {
        let (tables, mut sorter) = setup();
        let mut table = SolverTable::new(4, 8);
        let pos = (0..)
            .map(|seed| random(seed, 10))
            .find(|p| p.moves().count_ones() >= 3)
            .unwrap();

        sorter.sort(10, &tables, pos, pos.moves(), SortHints::default());
        let last = sorter.get(10, sorter.len(10) - 1);
        let child = last.apply(pos);
        // The opponent is known to score at most -20 after this move
        table.store(child.mover, child.enemy, 10, 12, -20);

        let beta = 20;
        let hints = SortHints {
            etc: Some(EtcProbe {
                table: &table,
                beta,
            }),
            ..SortHints::default()
        };
        sorter.sort(10, &tables, pos, pos.moves(), hints);
        assert_eq!(sorter.get(10, 0).square, last.square);

        // Not a cutoff for a higher beta
        let hints = SortHints {
            etc: Some(EtcProbe {
                table: &table,
                beta: 30,
            }),
            ..SortHints::default()
        };
        sorter.sort(10, &tables, pos, pos.moves(), hints);
        assert_eq!(sorter.get(10, sorter.len(10) - 1).square, last.square);
    }

    #[test]
    fn test_etc_disabled_by_config() {
        let tables = MoveTables::new();
        let config = SearchConfig {
            etc_enabled: false,
            ..SearchConfig::default()
        };
        let mut sorter = MoveSorter::new(&config);
        let mut table = SolverTable::new(4, 8);
        let pos = (0..)
            .map(|seed| random(seed, 10))
            .find(|p| p.moves().count_ones() >= 3)
            .unwrap();

        sorter.sort(10, &tables, pos, pos.moves(), SortHints::default());
        let plain: Vec<Move> = sorter.moves(10).to_vec();
        let child = plain[plain.len() - 1].apply(pos);
        table.store(child.mover, child.enemy, 10, 12, -20);

        let hints = SortHints {
            etc: Some(EtcProbe {
                table: &table,
                beta: 20,
            }),
            ..SortHints::default()
        };
        sorter.sort(10, &tables, pos, pos.moves(), hints);
        assert_eq!(sorter.moves(10), plain.as_slice());
    }

    #[test]
    fn test_mobility_penalty_table_monotone() {
        assert!(MOBILITY_PENALTY.windows(2).all(|w| w[0] <= w[1]));
    }
}
