//! Precomputed flip tables ("kindergarten" bitboards)
//!
//! Each of the four lines through a square is resolved by one table lookup:
//!
//! 1. Mask the line out of `mover` and `enemy`.
//! 2. Multiply by a constant so the line bits land, in order, in the top
//!    byte, then shift down. This gives an 8-bit pattern per side.
//! 3. Combine both patterns into a base-3 index (`BASE3[m] + 2 * BASE3[e]`).
//! 4. Look up the flipped disks.
//!
//! Rows and columns are all the same 8-square problem, so they share one
//! line table and differ only in how the result is deposited back onto the
//! board. Diagonals get per-square tables whose entries are already full
//! board masks.
//!
//! # Example
//!
//! ```
//! use othello::board::{bitboard, MoveTables, Square};
//!
//! let tables = MoveTables::new();
//! let d5: Square = "D5".parse().unwrap();
//! let e4: Square = "E4".parse().unwrap();
//! let d4: Square = "D4".parse().unwrap();
//! let e5: Square = "E5".parse().unwrap();
//! let (black, white) = (d5.bit() | e4.bit(), d4.bit() | e5.bit());
//!
//! let d3: Square = "D3".parse().unwrap();
//! assert_eq!(tables.flips(black, white, d3), d4.bit());
//! assert_eq!(tables.flips(black, white, d3), bitboard::flips_by_rays(black, white, d3));
//! ```

use super::bitboard::FILE_H;
use super::Square;

/// Number of base-3 line patterns for 8 squares
const LINE_PATTERNS: usize = 6561;

/// Moves a column (one bit per byte at bit 0) into the top byte, row order
const COLUMN_MAGIC: u64 = 0x0102_0408_1020_4080;
/// Sums every byte into the top byte; on a diagonal each byte holds a
/// distinct column bit, so the sum is a column-ordered pattern
const DIAGONAL_MAGIC: u64 = 0x0101_0101_0101_0101;

/// Quadrant tag of each square, one bit per quadrant
#[rustfmt::skip]
const PARITY_REGION: [u8; 64] = [
    1, 1, 1, 1, 2, 2, 2, 2,
    1, 1, 1, 1, 2, 2, 2, 2,
    1, 1, 1, 1, 2, 2, 2, 2,
    1, 1, 1, 1, 2, 2, 2, 2,
    4, 4, 4, 4, 8, 8, 8, 8,
    4, 4, 4, 4, 8, 8, 8, 8,
    4, 4, 4, 4, 8, 8, 8, 8,
    4, 4, 4, 4, 8, 8, 8, 8,
];

/// One diagonal through a square with its private flip table.
#[derive(Debug, Clone)]
pub struct DiagonalTable {
    /// Squares on the diagonal
    mask: u64,
    /// Lowest column the diagonal touches
    first_col: u8,
    /// Flip masks indexed by the base-3 pattern of the diagonal
    flips: Box<[u64]>,
}

impl DiagonalTable {
    /// Pattern of `bits` along the diagonal, bit 0 = `first_col`
    #[inline]
    fn pattern(&self, bits: u64) -> usize {
        ((((bits & self.mask).wrapping_mul(DIAGONAL_MAGIC)) >> 56) >> self.first_col) as usize
    }

    /// Number of squares on the diagonal
    pub fn len(&self) -> u32 {
        self.mask.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

/// Static descriptor of one square.
#[derive(Debug, Clone)]
pub struct SquareInfo {
    pub square: Square,
    /// Quadrant bit (1, 2, 4 or 8) used for parity ordering
    pub parity_region: u8,
    /// Diagonal in the `+9` direction (row and column both grow)
    pub diagonal: DiagonalTable,
    /// Diagonal in the `+7` direction (row grows, column shrinks)
    pub anti_diagonal: DiagonalTable,
}

/// All move-generation tables, built once and shared read-only.
pub struct MoveTables {
    /// Base-3 value of each 8-bit pattern
    base3: [u16; 256],
    /// Flipped line pattern for `[position in line][base-3 index]`
    line_flips: Box<[[u8; LINE_PATTERNS]; 8]>,
    /// Row-ordered pattern spread onto column 0
    column_spread: [u64; 256],
    squares: Vec<SquareInfo>,
}

impl MoveTables {
    /// Build every table.
    #[must_use]
    pub fn new() -> Self {
        let base3 = build_base3();
        let line_flips = build_line_flips();

        let mut column_spread = [0u64; 256];
        for (pattern, spread) in column_spread.iter_mut().enumerate() {
            for row in 0..8 {
                if pattern & (1 << row) != 0 {
                    *spread |= 1u64 << (8 * row);
                }
            }
        }

        let squares = (0..64u8)
            .map(|index| {
                let square = Square::new(index);
                SquareInfo {
                    square,
                    parity_region: PARITY_REGION[index as usize],
                    diagonal: build_diagonal(square, 1, &line_flips),
                    anti_diagonal: build_diagonal(square, -1, &line_flips),
                }
            })
            .collect();

        Self {
            base3,
            line_flips,
            column_spread,
            squares,
        }
    }

    /// Descriptor for a square
    #[inline]
    pub fn square(&self, sq: Square) -> &SquareInfo {
        &self.squares[sq.index()]
    }

    /// All 64 descriptors, indexed by square
    pub fn squares(&self) -> &[SquareInfo] {
        &self.squares
    }

    /// Parity region tag for a square
    #[inline]
    pub fn parity_region(&self, sq: Square) -> u8 {
        self.squares[sq.index()].parity_region
    }

    #[inline]
    fn index(&self, mover_pattern: usize, enemy_pattern: usize) -> usize {
        self.base3[mover_pattern] as usize + 2 * self.base3[enemy_pattern] as usize
    }

    /// Disks flipped when `mover` plays `sq`.
    ///
    /// Unchecked: the square must be empty and the masks disjoint. An
    /// illegal square yields 0, which callers must test.
    #[inline]
    pub fn flips(&self, mover: u64, enemy: u64, sq: Square) -> u64 {
        debug_assert_eq!(mover & enemy, 0, "mover and enemy overlap");
        debug_assert_eq!((mover | enemy) & sq.bit(), 0, "square {sq} is occupied");

        let row = sq.row() as usize;
        let col = sq.col() as usize;

        // Row
        let shift = 8 * row;
        let idx = self.index(
            ((mover >> shift) & 0xFF) as usize,
            ((enemy >> shift) & 0xFF) as usize,
        );
        let mut flips = u64::from(self.line_flips[col][idx]) << shift;

        // Column
        let idx = self.index(column_pattern(mover, col), column_pattern(enemy, col));
        flips |= self.column_spread[self.line_flips[row][idx] as usize] << col;

        // Diagonals
        let info = &self.squares[sq.index()];
        let diag = &info.diagonal;
        flips |= diag.flips[self.index(diag.pattern(mover), diag.pattern(enemy))];
        let anti = &info.anti_diagonal;
        flips |= anti.flips[self.index(anti.pattern(mover), anti.pattern(enemy))];

        flips
    }
}

impl Default for MoveTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Row-ordered pattern of column `col`
#[inline]
fn column_pattern(bits: u64, col: usize) -> usize {
    ((((bits >> col) & FILE_H).wrapping_mul(COLUMN_MAGIC)) >> 56) as usize
}

fn build_base3() -> [u16; 256] {
    let mut base3 = [0u16; 256];
    for (pattern, value) in base3.iter_mut().enumerate() {
        let mut power = 1u16;
        for bit in 0..8 {
            if pattern & (1 << bit) != 0 {
                *value += power;
            }
            power *= 3;
        }
    }
    base3
}

/// Decode a base-3 index into cells: 0 empty, 1 mover, 2 enemy
fn decode_line(mut index: usize) -> [u8; 8] {
    let mut cells = [0u8; 8];
    for cell in &mut cells {
        *cell = (index % 3) as u8;
        index /= 3;
    }
    cells
}

/// Flipped cells when the mover plays at `pos` on an 8-cell line
fn line_flip_pattern(cells: &[u8; 8], pos: usize) -> u8 {
    if cells[pos] != 0 {
        return 0;
    }
    let mut flips = 0u8;
    for step in [-1i32, 1] {
        let mut run = 0u8;
        let mut p = pos as i32 + step;
        while (0..8).contains(&p) {
            match cells[p as usize] {
                2 => run |= 1 << p,
                1 => {
                    flips |= run;
                    break;
                }
                _ => break,
            }
            p += step;
        }
    }
    flips
}

fn build_line_flips() -> Box<[[u8; LINE_PATTERNS]; 8]> {
    let mut table = Box::new([[0u8; LINE_PATTERNS]; 8]);
    for index in 0..LINE_PATTERNS {
        let cells = decode_line(index);
        for (pos, row) in table.iter_mut().enumerate() {
            row[index] = line_flip_pattern(&cells, pos);
        }
    }
    table
}

/// Diagonal through `sq` whose column moves by `col_step` per row.
///
/// Squares that do not exist on a short diagonal read as empty in the
/// shared line table, which never brackets across them, so each entry can
/// be taken straight from `line_flips`.
fn build_diagonal(
    sq: Square,
    col_step: i8,
    line_flips: &[[u8; LINE_PATTERNS]; 8],
) -> DiagonalTable {
    let mut mask = 0u64;
    let mut col_to_square = [None; 8];
    for dir in [-1i8, 1] {
        let mut r = sq.row() as i8;
        let mut c = sq.col() as i8;
        while (0..8).contains(&r) && (0..8).contains(&c) {
            let s = Square::from_row_col(r as u8, c as u8);
            mask |= s.bit();
            col_to_square[c as usize] = Some(s);
            r += dir;
            c += dir * col_step;
        }
    }

    let first_col = (0..8).find(|&c| col_to_square[c].is_some()).unwrap_or(0) as u8;
    let len = mask.count_ones() as usize;
    let pos = sq.col() as usize;
    let shift = 3usize.pow(u32::from(first_col));

    let flips = (0..3usize.pow(len as u32))
        .map(|local| {
            let pattern = line_flips[pos][local * shift];
            col_to_square
                .iter()
                .enumerate()
                .filter(|(c, _)| pattern & (1 << c) != 0)
                .filter_map(|(_, s)| s.map(Square::bit))
                .fold(0u64, |acc, bit| acc | bit)
        })
        .collect();

    DiagonalTable {
        mask,
        first_col,
        flips,
    }
}
