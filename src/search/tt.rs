//! Transposition tables for caching search results
//!
//! Two tables live here:
//! - [`SolverTable`]: used by the exact solver. One bucket per number of
//!   empty squares, each slot holding a `[min, max]` window the fail-soft
//!   value of that exact position is known to lie in.
//! - [`TranspositionTable`]: used by the midgame searcher. Depth-aware,
//!   with a bound type and a best move for move ordering.
//!
//! Both index with [`position_hash`], a 64-bit mixing hash, so positions
//! that differ by a shifted disk do not collide into neighbouring slots.
//!
//! # Example
//!
//! ```
//! use othello::board::Position;
//! use othello::search::SolverTable;
//!
//! let mut tt = SolverTable::new(8, 12);
//! let pos = Position::start();
//!
//! // Result 10 against window (-4, 4) failed high: value is at least 10
//! tt.store(pos.mover, pos.enemy, -4, 4, 10);
//! let bound = tt.find(pos.mover, pos.enemy).unwrap();
//! assert_eq!((bound.min, bound.max), (10, 64));
//! assert!(bound.cuts(-4, 4));
//! ```

use crate::board::Square;

/// Hash of a position.
///
/// Both masks are multiplied by distinct odd constants, combined, and
/// passed through the 64-bit finalizer of MurmurHash3.
#[inline]
pub fn position_hash(mover: u64, enemy: u64) -> u64 {
    let mut h = mover.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ enemy.rotate_left(32).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h = h.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    h ^= h >> 33;
    h
}

// =============================================================================
// SolverTable: bounded windows for the exact solver
// =============================================================================

/// Window the exact value of a position is known to lie in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub min: i32,
    pub max: i32,
}

impl Bound {
    /// The bound alone settles a search with window `(alpha, beta)`
    #[inline]
    pub fn cuts(&self, alpha: i32, beta: i32) -> bool {
        self.min >= beta || self.max <= alpha || self.min == self.max
    }

    #[inline]
    pub fn is_exact(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Clone, Copy)]
struct SolverEntry {
    mover: u64,
    enemy: u64,
    min: i8,
    max: i8,
}

impl SolverEntry {
    /// Matches no reachable position since real masks are disjoint
    const SENTINEL: Self = Self {
        mover: u64::MAX,
        enemy: u64::MAX,
        min: -64,
        max: 64,
    };

    #[inline]
    fn is_used(&self) -> bool {
        self.mover != u64::MAX
    }
}

/// Per-empty-count hash tables of `[min, max]` windows.
///
/// Each bucket is a direct-mapped array: a store on a different key
/// overwrites the slot. Buckets are allocated on first store.
pub struct SolverTable {
    buckets: Vec<Vec<SolverEntry>>,
    min_bits: u32,
    max_bits: u32,
}

impl SolverTable {
    /// Create a table whose bucket for `n` empties holds
    /// `2^clamp(n + 4, min_bits, max_bits)` slots.
    #[must_use]
    pub fn new(min_bits: u32, max_bits: u32) -> Self {
        debug_assert!(min_bits <= max_bits);
        Self {
            buckets: vec![Vec::new(); 65],
            min_bits,
            max_bits,
        }
    }

    /// Slots in the bucket for `empties` empty squares
    pub fn bucket_size(&self, empties: u32) -> usize {
        1 << (empties + 4).clamp(self.min_bits, self.max_bits)
    }

    #[inline]
    fn slot(&self, empties: usize, hash: u64) -> usize {
        (hash as usize) & (self.buckets[empties].len() - 1)
    }

    /// Stored window for exactly this position
    #[must_use]
    pub fn find(&self, mover: u64, enemy: u64) -> Option<Bound> {
        let empties = (!(mover | enemy)).count_ones() as usize;
        if self.buckets[empties].is_empty() {
            return None;
        }
        let entry = &self.buckets[empties][self.slot(empties, position_hash(mover, enemy))];
        if entry.mover == mover && entry.enemy == enemy {
            Some(Bound {
                min: i32::from(entry.min),
                max: i32::from(entry.max),
            })
        } else {
            None
        }
    }

    /// Record the result of a fail-soft search with window `(alpha, beta)`.
    ///
    /// A different position in the slot is replaced by a fresh `[-64, 64]`
    /// entry first. Then `result >= beta` raises `min`, `result <= alpha`
    /// lowers `max`, and anything in between is exact.
    pub fn store(&mut self, mover: u64, enemy: u64, alpha: i32, beta: i32, result: i32) {
        debug_assert!((-64..=64).contains(&result));
        let empties = (!(mover | enemy)).count_ones();
        if self.buckets[empties as usize].is_empty() {
            let size = self.bucket_size(empties);
            self.buckets[empties as usize] = vec![SolverEntry::SENTINEL; size];
        }
        let slot = self.slot(empties as usize, position_hash(mover, enemy));
        let entry = &mut self.buckets[empties as usize][slot];

        if entry.mover != mover || entry.enemy != enemy {
            *entry = SolverEntry {
                mover,
                enemy,
                ..SolverEntry::SENTINEL
            };
        }

        let result = result as i8;
        if i32::from(result) >= beta {
            entry.min = entry.min.max(result);
        } else if i32::from(result) <= alpha {
            entry.max = entry.max.min(result);
        } else {
            entry.min = result;
            entry.max = result;
        }
        debug_assert!(entry.min <= entry.max, "bound crossed: {entry:?}");
    }

    /// Reset every allocated slot to the sentinel
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.fill(SolverEntry::SENTINEL);
        }
    }

    #[must_use]
    pub fn stats(&self) -> TTStats {
        let size: usize = self.buckets.iter().map(Vec::len).sum();
        let used = self
            .buckets
            .iter()
            .flat_map(|b| b.iter())
            .filter(|e| e.is_used())
            .count();
        TTStats::new(size, used)
    }
}

// =============================================================================
// TranspositionTable: depth-aware table for the midgame searcher
// =============================================================================

/// Entry type for score interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Exact score - the search completed inside the window
    Exact,
    /// Lower bound - score >= stored value (beta cutoff)
    LowerBound,
    /// Upper bound - score <= stored value (alpha fail-low)
    UpperBound,
}

/// Midgame transposition table entry
#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    /// Hash of the position
    pub hash: u64,
    /// Remaining search depth for this entry
    pub depth: u8,
    /// Score in centidisks
    pub score: i32,
    pub entry_type: EntryType,
    /// Best move found for this position
    pub best_move: Option<Square>,
}

/// Transposition table for the midgame searcher.
///
/// Uses a simple direct-mapped approach where each hash maps to exactly
/// one slot. Collisions are handled by a depth-preferred replacement policy.
pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    size: usize,
}

impl TranspositionTable {
    /// Create a new transposition table with the given size in megabytes.
    ///
    /// # Example
    ///
    /// ```
    /// use othello::search::TranspositionTable;
    ///
    /// let tt = TranspositionTable::new(4);
    /// assert_eq!(tt.stats().used, 0);
    /// ```
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TTEntry>>();
        let size = ((size_mb * 1024 * 1024) / entry_size).max(1024);

        Self {
            entries: vec![None; size],
            size,
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash as usize) % self.size
    }

    /// Probe the table for a usable score.
    ///
    /// # Arguments
    ///
    /// * `hash` - [`position_hash`] of the position
    /// * `depth` - Remaining depth (entry must be at least this deep)
    /// * `alpha` - Current alpha bound
    /// * `beta` - Current beta bound
    ///
    /// # Returns
    ///
    /// The stored score when it is exact, or a bound that already cuts
    /// the window. `None` otherwise; use [`Self::get_best_move`] for ordering.
    #[must_use]
    pub fn probe(&self, hash: u64, depth: u8, alpha: i32, beta: i32) -> Option<i32> {
        let entry = self.entries[self.index(hash)]?;
        if entry.hash != hash || entry.depth < depth {
            return None;
        }
        match entry.entry_type {
            EntryType::Exact => Some(entry.score),
            EntryType::LowerBound if entry.score >= beta => Some(entry.score),
            EntryType::UpperBound if entry.score <= alpha => Some(entry.score),
            _ => None,
        }
    }

    /// Best move from a previous search of this position, at any depth
    #[must_use]
    pub fn get_best_move(&self, hash: u64) -> Option<Square> {
        self.entries[self.index(hash)].and_then(|e| {
            if e.hash == hash {
                e.best_move
            } else {
                None
            }
        })
    }

    /// Store a search result.
    ///
    /// An entry is replaced if the slot is empty, holds the same
    /// position, or the new search is at least as deep.
    pub fn store(
        &mut self,
        hash: u64,
        depth: u8,
        score: i32,
        entry_type: EntryType,
        best_move: Option<Square>,
    ) {
        let idx = self.index(hash);

        let should_replace = match &self.entries[idx] {
            None => true,
            Some(e) => e.hash == hash || e.depth <= depth,
        };

        if should_replace {
            self.entries[idx] = Some(TTEntry {
                hash,
                depth,
                score,
                entry_type,
                best_move,
            });
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }

    #[must_use]
    pub fn stats(&self) -> TTStats {
        let used = self.entries.iter().filter(|e| e.is_some()).count();
        TTStats::new(self.size, used)
    }
}

/// Statistics about transposition table usage.
#[derive(Debug, Clone, Copy)]
pub struct TTStats {
    /// Total number of slots in the table
    pub size: usize,
    /// Number of slots currently occupied
    pub used: usize,
    /// Percentage of table in use (0-100)
    pub usage_percent: u8,
}

impl TTStats {
    fn new(size: usize, used: usize) -> Self {
        let usage_percent = if size == 0 {
            0
        } else {
            (used as f64 / size as f64 * 100.0) as u8
        };
        Self {
            size,
            used,
            usage_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    // =========================================================================
    // position_hash
    // =========================================================================

    #[test]
    fn test_hash_distinguishes_roles() {
        let pos = Position::start();
        assert_ne!(
            position_hash(pos.mover, pos.enemy),
            position_hash(pos.enemy, pos.mover)
        );
    }

    #[test]
    fn test_hash_spreads_shifted_positions() {
        use std::collections::HashSet;

        // Single disks shifted one square at a time
        let hashes: Vec<u64> = (0..64).map(|i| position_hash(1 << i, 0)).collect();
        let full: HashSet<u64> = hashes.iter().copied().collect();
        assert_eq!(full.len(), 64);

        // and they should not crowd into a few low-bit slots
        let slots: HashSet<u64> = hashes.iter().map(|h| h & 1023).collect();
        assert!(slots.len() > 48, "only {} distinct slots", slots.len());
    }

    // =========================================================================
    // SolverTable
    // =========================================================================

    #[test]
    fn test_solver_find_miss() {
        let tt = SolverTable::new(8, 12);
        let pos = Position::start();
        assert!(tt.find(pos.mover, pos.enemy).is_none());
    }

    #[test]
    fn test_solver_store_exact() {
        let mut tt = SolverTable::new(8, 12);
        let pos = Position::start();
        tt.store(pos.mover, pos.enemy, -10, 10, 4);
        let bound = tt.find(pos.mover, pos.enemy).unwrap();
        assert_eq!(bound, Bound { min: 4, max: 4 });
        assert!(bound.is_exact());
        assert!(bound.cuts(-64, 64));
    }

    #[test]
    fn test_solver_fail_high_raises_min() {
        let mut tt = SolverTable::new(8, 12);
        let pos = Position::start();
        tt.store(pos.mover, pos.enemy, 0, 2, 6);
        let bound = tt.find(pos.mover, pos.enemy).unwrap();
        assert!(bound.min >= 6);
        assert_eq!(bound.max, 64);

        // A weaker fail-high never lowers min
        tt.store(pos.mover, pos.enemy, -4, -2, 0);
        assert_eq!(tt.find(pos.mover, pos.enemy).unwrap().min, 6);
    }

    #[test]
    fn test_solver_fail_low_lowers_max() {
        let mut tt = SolverTable::new(8, 12);
        let pos = Position::start();
        tt.store(pos.mover, pos.enemy, 0, 2, -8);
        assert_eq!(tt.find(pos.mover, pos.enemy).unwrap(), Bound { min: -64, max: -8 });

        tt.store(pos.mover, pos.enemy, -20, -18, -20);
        assert_eq!(tt.find(pos.mover, pos.enemy).unwrap().max, -20);

        // A looser fail-low never raises max
        tt.store(pos.mover, pos.enemy, 10, 12, 4);
        assert_eq!(tt.find(pos.mover, pos.enemy).unwrap().max, -20);
    }

    #[test]
    fn test_solver_bounds_combine() {
        let mut tt = SolverTable::new(8, 12);
        let pos = Position::start();
        tt.store(pos.mover, pos.enemy, 0, 2, 2);
        tt.store(pos.mover, pos.enemy, 10, 12, 8);
        let bound = tt.find(pos.mover, pos.enemy).unwrap();
        assert_eq!(bound, Bound { min: 2, max: 8 });
        assert!(!bound.cuts(4, 6));
        assert!(bound.cuts(8, 10));
        assert!(bound.cuts(-2, 2));
    }

    #[test]
    fn test_solver_other_key_overwrites() {
        let mut tt = SolverTable::new(0, 0);
        // A single slot per bucket: two positions with the same empties collide
        let a = Position::start();
        let b = a.play(sq("D3")).unwrap().pass();
        let c = a.play(sq("C4")).unwrap().pass();
        assert_eq!(b.empty_count(), c.empty_count());

        tt.store(b.mover, b.enemy, -64, 64, 12);
        tt.store(c.mover, c.enemy, 0, 4, 10);
        assert!(tt.find(b.mover, b.enemy).is_none());
        // Fresh entry starts from [-64, 64] before narrowing
        assert_eq!(tt.find(c.mover, c.enemy).unwrap(), Bound { min: 10, max: 64 });
    }

    #[test]
    fn test_solver_buckets_by_empties() {
        let tt = SolverTable::new(8, 14);
        assert_eq!(tt.bucket_size(0), 256);
        assert_eq!(tt.bucket_size(6), 1024);
        assert_eq!(tt.bucket_size(30), 16384);
    }

    #[test]
    fn test_solver_clear_and_stats() {
        let mut tt = SolverTable::new(8, 8);
        let pos = Position::start();
        tt.store(pos.mover, pos.enemy, -1, 1, 0);
        let stats = tt.stats();
        assert_eq!(stats.used, 1);
        assert_eq!(stats.size, 256);

        tt.clear();
        assert!(tt.find(pos.mover, pos.enemy).is_none());
        assert_eq!(tt.stats().used, 0);
    }

    // =========================================================================
    // TranspositionTable
    // =========================================================================

    #[test]
    fn test_tt_store_probe_exact() {
        let mut tt = TranspositionTable::new(1);
        let hash = 0x123456789ABCDEF0;

        tt.store(hash, 5, 100, EntryType::Exact, Some(sq("D3")));

        assert_eq!(tt.probe(hash, 5, -1000, 1000), Some(100));
        assert_eq!(tt.get_best_move(hash), Some(sq("D3")));
    }

    #[test]
    fn test_tt_depth_requirement() {
        let mut tt = TranspositionTable::new(1);
        let hash = 0x123456789ABCDEF0;

        tt.store(hash, 3, 100, EntryType::Exact, Some(sq("C4")));

        // Deeper search should not use shallow entry's score
        assert!(tt.probe(hash, 5, -1000, 1000).is_none());
        // but the move is still there for ordering
        assert_eq!(tt.get_best_move(hash), Some(sq("C4")));
    }

    #[test]
    fn test_tt_bounds() {
        let mut tt = TranspositionTable::new(1);

        tt.store(0x111, 5, 200, EntryType::LowerBound, None);
        assert_eq!(tt.probe(0x111, 5, -1000, 150), Some(200));
        assert!(tt.probe(0x111, 5, -1000, 300).is_none());

        tt.store(0x222, 5, 50, EntryType::UpperBound, None);
        assert_eq!(tt.probe(0x222, 5, 100, 1000), Some(50));
        assert!(tt.probe(0x222, 5, 30, 1000).is_none());
    }

    #[test]
    fn test_tt_hash_mismatch() {
        let mut tt = TranspositionTable::new(1);
        let size = tt.size as u64;
        tt.store(7, 5, 100, EntryType::Exact, Some(sq("F5")));

        // Same slot, different hash
        assert!(tt.probe(7 + size, 5, -1000, 1000).is_none());
        assert!(tt.get_best_move(7 + size).is_none());
    }

    #[test]
    fn test_tt_replacement_policy() {
        let mut tt = TranspositionTable::new(1);
        let size = tt.size as u64;

        tt.store(7, 5, 100, EntryType::Exact, None);
        // Shallower entry for another position does not evict
        tt.store(7 + size, 3, 200, EntryType::Exact, None);
        assert_eq!(tt.probe(7, 5, -1000, 1000), Some(100));

        // Same or deeper does
        tt.store(7 + size, 5, 200, EntryType::Exact, None);
        assert_eq!(tt.probe(7 + size, 5, -1000, 1000), Some(200));
        assert!(tt.probe(7, 5, -1000, 1000).is_none());
    }

    #[test]
    fn test_tt_same_position_always_replaces() {
        let mut tt = TranspositionTable::new(1);
        let hash = 0xABCDEF;

        tt.store(hash, 5, 100, EntryType::Exact, None);
        tt.store(hash, 3, 200, EntryType::Exact, None);
        assert!(tt.probe(hash, 5, -1000, 1000).is_none());
        assert_eq!(tt.probe(hash, 3, -1000, 1000), Some(200));
    }

    #[test]
    fn test_tt_clear_and_stats() {
        let mut tt = TranspositionTable::new(1);
        assert_eq!(tt.stats().used, 0);

        tt.store(0x111, 5, 100, EntryType::Exact, None);
        tt.store(0x222, 5, 100, EntryType::Exact, None);
        let stats = tt.stats();
        assert_eq!(stats.used, 2);
        assert!(stats.size >= 1024);

        tt.clear();
        assert!(tt.probe(0x111, 5, -1000, 1000).is_none());
        assert_eq!(tt.stats().used, 0);
    }

    #[test]
    fn test_tt_minimum_size() {
        let tt = TranspositionTable::new(0);
        assert_eq!(tt.size, 1024);
    }
}
