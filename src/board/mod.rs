//! Board representation for Othello

pub mod bitboard;
pub mod board;
pub mod tables;


use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

// Re-exports
pub use board::{Board, Position};
pub use tables::{MoveTables, SquareInfo};

/// Board size (8x8)
pub const BOARD_SIZE: usize = 8;
pub const TOTAL_CELLS: usize = BOARD_SIZE * BOARD_SIZE; // 64

/// Disk colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// Get opponent color
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// One of the 64 board squares.
///
/// The index is the bit number in a bitboard: `row = index >> 3`,
/// `col = index & 7`. Text notation letters columns from the high bit
/// down, so bit 63 is `A1` and bit 0 is `H8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    #[inline]
    pub const fn new(index: u8) -> Self {
        debug_assert!(index < 64);
        Self(index)
    }

    #[inline]
    pub const fn from_row_col(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8);
        Self(row * 8 + col)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn row(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub const fn col(self) -> u8 {
        self.0 & 7
    }

    /// Single-bit mask for this square
    #[inline]
    pub const fn bit(self) -> u64 {
        1u64 << self.0
    }

    /// Lowest set square of a non-empty mask
    #[inline]
    pub fn lowest(bits: u64) -> Self {
        debug_assert!(bits != 0);
        Self(bits.trailing_zeros() as u8)
    }

    /// Iterate over the squares set in a mask, lowest bit first
    pub fn iter_mask(bits: u64) -> SquareIter {
        SquareIter { bits }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = (b'H' - self.col()) as char;
        let digit = (b'8' - self.row()) as char;
        write!(f, "{letter}{digit}")
    }
}

impl FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseError::InvalidSquare(s.to_string()));
        }
        let letter = bytes[0].to_ascii_uppercase();
        let digit = bytes[1];
        if !(b'A'..=b'H').contains(&letter) || !(b'1'..=b'8').contains(&digit) {
            return Err(ParseError::InvalidSquare(s.to_string()));
        }
        Ok(Square::from_row_col(b'8' - digit, b'H' - letter))
    }
}

/// Iterator over set bits of a bitboard as squares
pub struct SquareIter {
    bits: u64,
}

impl Iterator for SquareIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        let sq = Square::lowest(self.bits);
        self.bits &= self.bits - 1;
        Some(sq)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bits.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SquareIter {}
