//! Linked list of empty squares
//!
//! A circular doubly linked list over a fixed arena of 65 nodes: one per
//! square plus a sentinel that is both head and tail. During search a
//! square is unlinked when played and relinked when the move is undone.
//! Because relinks happen in exact reverse order of unlinks (the call
//! stack guarantees it), a removed node's stale `next`/`prev` are still
//! the right place to reinsert it.
//!
//! ```
//! use othello::board::{MoveTables, Position};
//! use othello::search::ListOfEmpties;
//!
//! let tables = MoveTables::new();
//! let empties = ListOfEmpties::from_empty_mask(Position::start().empties(), &tables);
//! assert_eq!(empties.len(), 60);
//! // Corners come first
//! assert_eq!(empties.iter().next().unwrap().to_string(), "A1");
//! ```

use crate::board::{MoveTables, Square};

/// Index of the sentinel node
pub const SENTINEL: u8 = 64;

/// Converts square text to its index at compile time
const fn named(name: &str) -> u8 {
    let b = name.as_bytes();
    (b'8' - b[1]) * 8 + (b'H' - b[0])
}

/// Squares in iteration priority: corners, then edges away from the
/// X and C squares, then the interior, then the squares next to corners.
#[rustfmt::skip]
const PRESORTED: [u8; 64] = [
    named("A1"), named("H1"), named("A8"), named("H8"),
    named("C1"), named("F1"), named("A3"), named("H3"),
    named("A6"), named("H6"), named("C8"), named("F8"),
    named("C3"), named("F3"), named("C6"), named("F6"),
    named("D1"), named("E1"), named("A4"), named("H4"),
    named("A5"), named("H5"), named("D8"), named("E8"),
    named("D3"), named("E3"), named("C4"), named("F4"),
    named("C5"), named("F5"), named("D6"), named("E6"),
    named("D2"), named("E2"), named("B4"), named("G4"),
    named("B5"), named("G5"), named("D7"), named("E7"),
    named("C2"), named("F2"), named("B3"), named("G3"),
    named("B6"), named("G6"), named("C7"), named("F7"),
    named("B1"), named("G1"), named("A2"), named("H2"),
    named("A7"), named("H7"), named("B8"), named("G8"),
    named("B2"), named("G2"), named("B7"), named("G7"),
    named("D4"), named("E4"), named("D5"), named("E5"),
];

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    next: u8,
    prev: u8,
    region: u8,
}

/// Empty squares of the position being searched.
#[derive(Debug, Clone)]
pub struct ListOfEmpties {
    nodes: [Node; 65],
    len: u32,
    parity: u8,
}

impl ListOfEmpties {
    /// Empty list: the sentinel points to itself
    pub fn new() -> Self {
        let mut nodes = [Node::default(); 65];
        nodes[SENTINEL as usize] = Node {
            next: SENTINEL,
            prev: SENTINEL,
            region: 0,
        };
        Self {
            nodes,
            len: 0,
            parity: 0,
        }
    }

    /// List of the squares in `empty`, in presorted order
    pub fn from_empty_mask(empty: u64, tables: &MoveTables) -> Self {
        let mut list = Self::new();
        for &index in &PRESORTED {
            let sq = Square::new(index);
            if empty & sq.bit() != 0 {
                list.add(sq, tables.parity_region(sq));
            }
        }
        list
    }

    /// Append a square at the tail. Setup only.
    pub fn add(&mut self, sq: Square, region: u8) {
        let index = sq.index() as u8;
        let tail = self.nodes[SENTINEL as usize].prev;
        self.nodes[index as usize] = Node {
            next: SENTINEL,
            prev: tail,
            region,
        };
        self.nodes[tail as usize].next = index;
        self.nodes[SENTINEL as usize].prev = index;
        self.len += 1;
        self.parity ^= region;
    }

    /// First listed square, or [`SENTINEL`] when empty
    #[inline]
    pub fn first(&self) -> u8 {
        self.nodes[SENTINEL as usize].next
    }

    /// Square after `index`, or [`SENTINEL`] at the end
    #[inline]
    pub fn next(&self, index: u8) -> u8 {
        self.nodes[index as usize].next
    }

    #[inline]
    pub fn region(&self, index: u8) -> u8 {
        self.nodes[index as usize].region
    }

    /// Unlink a listed square. The node keeps its links so an enclosing
    /// iteration can continue from it.
    #[inline]
    pub fn remove(&mut self, index: u8) {
        debug_assert!(index < SENTINEL);
        let Node { next, prev, region } = self.nodes[index as usize];
        self.nodes[prev as usize].next = next;
        self.nodes[next as usize].prev = prev;
        self.len -= 1;
        self.parity ^= region;
    }

    /// Relink the most recently removed square at its old slot
    #[inline]
    pub fn restore(&mut self, index: u8) {
        debug_assert!(index < SENTINEL);
        let Node { next, prev, region } = self.nodes[index as usize];
        self.nodes[prev as usize].next = index;
        self.nodes[next as usize].prev = index;
        self.len += 1;
        self.parity ^= region;
    }

    /// Number of listed squares
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Region parity kept up to date by `add`, `remove` and `restore`
    #[inline]
    pub fn parity(&self) -> u8 {
        self.parity
    }

    /// XOR of the region tags of all listed squares. A set bit marks a
    /// quadrant with an odd number of empties.
    pub fn calc_parity(&self) -> u8 {
        self.iter_indices().fold(0, |acc, i| acc ^ self.region(i))
    }

    /// Listed squares as a bitboard
    pub fn mask(&self) -> u64 {
        self.iter().fold(0, |acc, sq| acc | sq.bit())
    }

    pub fn iter(&self) -> impl Iterator<Item = Square> + '_ {
        self.iter_indices().map(Square::new)
    }

    fn iter_indices(&self) -> impl Iterator<Item = u8> + '_ {
        let mut cursor = self.first();
        std::iter::from_fn(move || {
            if cursor == SENTINEL {
                return None;
            }
            let current = cursor;
            cursor = self.next(cursor);
            Some(current)
        })
    }
}

impl Default for ListOfEmpties {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    fn tables() -> MoveTables {
        MoveTables::new()
    }

    #[test]
    fn test_presorted_is_permutation() {
        let mut seen = 0u64;
        for &i in &PRESORTED {
            assert!(i < 64);
            seen |= 1 << i;
        }
        assert_eq!(seen, u64::MAX);
    }

    #[test]
    fn test_named_matches_parse() {
        assert_eq!(named("H8"), 0);
        assert_eq!(named("A1"), 63);
        assert_eq!(u64::from(named("D3")), "D3".parse::<Square>().unwrap().index() as u64);
    }

    #[test]
    fn test_new_is_empty() {
        let list = ListOfEmpties::new();
        assert!(list.is_empty());
        assert_eq!(list.first(), SENTINEL);
        assert_eq!(list.calc_parity(), 0);
    }

    #[test]
    fn test_from_mask_contains_exactly_empties() {
        let tables = tables();
        let empty = Position::start().empties();
        let list = ListOfEmpties::from_empty_mask(empty, &tables);
        assert_eq!(list.len(), 60);
        assert_eq!(list.mask(), empty);
    }

    #[test]
    fn test_corners_first() {
        let tables = tables();
        let list = ListOfEmpties::from_empty_mask(u64::MAX, &tables);
        let first: Vec<String> = list.iter().take(4).map(|s| s.to_string()).collect();
        assert_eq!(first, ["A1", "H1", "A8", "H8"]);
    }

    #[test]
    fn test_remove_restore_lifo() {
        let tables = tables();
        let mut list = ListOfEmpties::from_empty_mask(0xFF, &tables);
        let before: Vec<u8> = list.iter_indices().collect();

        let a = list.first();
        let b = list.next(a);
        list.remove(a);
        list.remove(b);
        assert_eq!(list.len(), 6);
        assert_eq!(list.mask(), 0xFF & !(1 << a) & !(1 << b));
        list.restore(b);
        list.restore(a);

        let after: Vec<u8> = list.iter_indices().collect();
        assert_eq!(before, after);
        assert_eq!(list.len(), 8);
    }

    #[test]
    fn test_iteration_continues_from_removed_node() {
        let tables = tables();
        let mut list = ListOfEmpties::from_empty_mask(0x0F, &tables);
        let mut visited = Vec::new();
        let mut e = list.first();
        while e != SENTINEL {
            list.remove(e);
            visited.push(e);
            assert_eq!(list.len(), 3);
            list.restore(e);
            e = list.next(e);
        }
        assert_eq!(visited.len(), 4);
    }

    #[test]
    fn test_parity_tracks_quadrants() {
        let tables = tables();
        // Three empties in the H8 quadrant, one in the A1 quadrant
        let empty = (1 << 0) | (1 << 1) | (1 << 9) | (1 << 63);
        let mut list = ListOfEmpties::from_empty_mask(empty, &tables);
        let low = tables.parity_region(Square::new(0));
        let high = tables.parity_region(Square::new(63));
        assert_eq!(list.calc_parity(), low ^ high);
        assert_eq!(list.parity(), list.calc_parity());

        list.remove(1);
        assert_eq!(list.calc_parity(), high);
        assert_eq!(list.parity(), list.calc_parity());
        list.restore(1);
        assert_eq!(list.parity(), low ^ high);
    }

    #[test]
    fn test_circular_links() {
        let tables = tables();
        let list = ListOfEmpties::from_empty_mask(0b111, &tables);
        let last = list.nodes[SENTINEL as usize].prev;
        assert_eq!(list.next(last), SENTINEL);
        assert_eq!(list.nodes[list.first() as usize].prev, SENTINEL);
    }
}
