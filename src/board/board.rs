//! Positions and boards
//!
//! [`Position`] is the search-facing value: the side to move and its
//! opponent as two disjoint bitboards. [`Board`] adds colors so positions
//! can be read from and written to text.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use super::bitboard::{calc_moves, empties, flips_by_rays, popcount};
use super::{Color, Square, TOTAL_CELLS};
use crate::error::{MoveError, ParseError};

/// Side to move (`mover`) and opponent (`enemy`) disks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub mover: u64,
    pub enemy: u64,
}

impl Position {
    #[inline]
    pub fn new(mover: u64, enemy: u64) -> Self {
        debug_assert_eq!(mover & enemy, 0, "mover and enemy overlap");
        Self { mover, enemy }
    }

    /// Standard opening position, black to move
    pub fn start() -> Self {
        Board::start().position()
    }

    #[inline]
    pub fn empties(&self) -> u64 {
        empties(self.mover, self.enemy)
    }

    #[inline]
    pub fn empty_count(&self) -> u32 {
        self.empties().count_ones()
    }

    #[inline]
    pub fn moves(&self) -> u64 {
        calc_moves(self.mover, self.enemy)
    }

    /// Same disks, other side to move
    #[inline]
    pub fn pass(&self) -> Self {
        Self {
            mover: self.enemy,
            enemy: self.mover,
        }
    }

    /// Neither side can move
    pub fn is_game_over(&self) -> bool {
        self.moves() == 0 && calc_moves(self.enemy, self.mover) == 0
    }

    /// Mover disks minus enemy disks
    #[inline]
    pub fn disk_difference(&self) -> i32 {
        popcount(self.mover) - popcount(self.enemy)
    }

    /// Play a move for the mover and return the position with the
    /// opponent to move.
    pub fn play(&self, sq: Square) -> Result<Self, MoveError> {
        if (self.mover | self.enemy) & sq.bit() != 0 {
            return Err(MoveError::Occupied(sq));
        }
        let flips = flips_by_rays(self.mover, self.enemy, sq);
        if flips == 0 {
            return Err(MoveError::NoFlips(sq));
        }
        Ok(self.play_flips(sq, flips))
    }

    /// Position reached by random legal play from the start until
    /// `empties` squares remain. The result is never a finished game
    /// unless `empties` is 0, and the side to move can play.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, empties: u32) -> Self {
        let empties = empties.min(60);
        loop {
            let mut pos = Self::start();
            while pos.empty_count() > empties {
                let moves = pos.moves();
                if moves == 0 {
                    if pos.pass().moves() == 0 {
                        break;
                    }
                    pos = pos.pass();
                    continue;
                }
                let pick = rng.random_range(0..moves.count_ones()) as usize;
                if let Some(sq) = Square::iter_mask(moves).nth(pick) {
                    pos = pos.play_flips(sq, flips_by_rays(pos.mover, pos.enemy, sq));
                }
            }
            if pos.empty_count() != empties {
                continue;
            }
            if pos.moves() != 0 || empties == 0 {
                return pos;
            }
            if pos.pass().moves() != 0 {
                return pos.pass();
            }
        }
    }

    /// Apply a precomputed, non-zero flip mask. Unchecked.
    #[inline]
    pub fn play_flips(&self, sq: Square, flips: u64) -> Self {
        debug_assert_ne!(flips, 0);
        Self {
            mover: self.enemy & !flips,
            enemy: self.mover | flips | sq.bit(),
        }
    }
}

/// Board with colors and side to move.
///
/// # Example
///
/// ```
/// use othello::board::{Board, Color};
///
/// let board: Board = "
///     ........
///     ........
///     ........
///     ...OX...
///     ...XO...
///     ........
///     ........
///     ........ X"
///     .parse()
///     .unwrap();
/// assert_eq!(board, Board::start());
/// assert_eq!(board.to_move, Color::Black);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    pub black: u64,
    pub white: u64,
    pub to_move: Color,
}

impl Board {
    pub fn new(black: u64, white: u64, to_move: Color) -> Self {
        debug_assert_eq!(black & white, 0, "black and white overlap");
        Self {
            black,
            white,
            to_move,
        }
    }

    pub fn start() -> Self {
        let sq = |row, col| Square::from_row_col(row, col).bit();
        // D5, E4 black; D4, E5 white
        Self::new(sq(3, 4) | sq(4, 3), sq(4, 4) | sq(3, 3), Color::Black)
    }

    /// Disks of one color
    #[inline]
    pub fn disks(&self, color: Color) -> u64 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    /// Color occupying a square, if any
    pub fn get(&self, sq: Square) -> Option<Color> {
        if self.black & sq.bit() != 0 {
            Some(Color::Black)
        } else if self.white & sq.bit() != 0 {
            Some(Color::White)
        } else {
            None
        }
    }

    /// Search-facing view from the side to move
    pub fn position(&self) -> Position {
        Position::new(self.disks(self.to_move), self.disks(self.to_move.opponent()))
    }

    fn from_position(position: Position, to_move: Color) -> Self {
        match to_move {
            Color::Black => Self::new(position.mover, position.enemy, to_move),
            Color::White => Self::new(position.enemy, position.mover, to_move),
        }
    }

    /// Play a move for the side to move. The turn passes to the opponent
    /// even if the opponent then has no legal reply.
    pub fn play(&self, sq: Square) -> Result<Self, MoveError> {
        let next = self.position().play(sq)?;
        Ok(Self::from_position(next, self.to_move.opponent()))
    }

    /// Hand the move to the other side
    pub fn pass(&self) -> Self {
        Self {
            to_move: self.to_move.opponent(),
            ..*self
        }
    }

    pub fn legal_moves(&self) -> u64 {
        self.position().moves()
    }

    pub fn disk_count(&self, color: Color) -> u32 {
        self.disks(color).count_ones()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::start()
    }
}

impl FromStr for Board {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let chars: Vec<(usize, char)> = text
            .chars()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .collect();
        if chars.len() != TOTAL_CELLS && chars.len() != TOTAL_CELLS + 1 {
            return Err(ParseError::InvalidLength(chars.len()));
        }

        let mut black = 0u64;
        let mut white = 0u64;
        for (k, &(index, ch)) in chars.iter().take(TOTAL_CELLS).enumerate() {
            let bit = Square::new((TOTAL_CELLS - 1 - k) as u8).bit();
            match ch {
                '*' | 'X' | 'x' => black |= bit,
                'O' | 'o' | '0' => white |= bit,
                '.' | '_' | '-' => {}
                _ => return Err(ParseError::InvalidChar { ch, index }),
            }
        }

        let to_move = match chars.get(TOTAL_CELLS) {
            None => Color::Black,
            Some(&(_, 'x' | '*' | 'X')) => Color::Black,
            Some(&(_, 'o' | 'O' | '0')) => Color::White,
            Some(&(index, ch)) => return Err(ParseError::InvalidChar { ch, index }),
        };

        Ok(Self::new(black, white, to_move))
    }
}

impl fmt::Display for Board {
    /// Eight rows of eight, A1 first, then the side to move
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in 0..TOTAL_CELLS {
            let sq = Square::new((TOTAL_CELLS - 1 - k) as u8);
            let ch = match self.get(sq) {
                Some(Color::Black) => 'X',
                Some(Color::White) => 'O',
                None => '.',
            };
            write!(f, "{ch}")?;
            if k % 8 == 7 {
                writeln!(f)?;
            }
        }
        let side = match self.to_move {
            Color::Black => 'X',
            Color::White => 'O',
        };
        write!(f, "{side}")
    }
}
