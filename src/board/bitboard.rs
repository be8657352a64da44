//! Bit-geometry primitives on raw `u64` bitboards
//!
//! Bit `i` is square `i` (`row = i >> 3`, `col = i & 7`). Everything here is
//! branch-free word arithmetic except the ray walker, which exists for the
//! checked play API and as a reference for the table-driven flips.

use super::Square;

/// Column 0 (letter H)
pub const FILE_H: u64 = 0x0101_0101_0101_0101;
/// Column 7 (letter A)
pub const FILE_A: u64 = 0x8080_8080_8080_8080;
/// Row 0 (digit 8)
pub const RANK_8: u64 = 0x0000_0000_0000_00FF;
/// Row 7 (digit 1)
pub const RANK_1: u64 = 0xFF00_0000_0000_0000;

/// Column masks indexed by `col`
pub const FILE_MASKS: [u64; 8] = [
    FILE_H,
    FILE_H << 1,
    FILE_H << 2,
    FILE_H << 3,
    FILE_H << 4,
    FILE_H << 5,
    FILE_H << 6,
    FILE_H << 7,
];

/// Row masks indexed by `row`
pub const RANK_MASKS: [u64; 8] = [
    RANK_8,
    RANK_8 << 8,
    RANK_8 << 16,
    RANK_8 << 24,
    RANK_8 << 32,
    RANK_8 << 40,
    RANK_8 << 48,
    RANK_8 << 56,
];

/// Everything except the two edge columns
pub const INNER_FILES: u64 = !(FILE_A | FILE_H);

pub const CORNERS: u64 = 0x8100_0000_0000_0081;
/// Squares diagonally adjacent to a corner
pub const X_SQUARES: u64 = 0x0042_0000_0000_4200;
/// Edge squares orthogonally adjacent to a corner
pub const C_SQUARES: u64 = 0x4281_0000_0000_8142;

/// Row/column steps of the eight rays
const RAYS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Number of set bits
#[inline]
pub fn popcount(bits: u64) -> i32 {
    bits.count_ones() as i32
}

/// Empty squares of a position
#[inline]
pub fn empties(mover: u64, enemy: u64) -> u64 {
    !(mover | enemy)
}

/// Legal move mask for `mover`.
///
/// Each direction smears the mover's disks through contiguous enemy disks
/// with doubling shifts, then one more step lands on the candidate squares.
/// Horizontal and diagonal directions only propagate through the inner six
/// columns so nothing wraps around the A/H edges.
#[inline]
pub fn calc_moves(mover: u64, enemy: u64) -> u64 {
    debug_assert_eq!(mover & enemy, 0, "mover and enemy overlap");
    let inner = enemy & INNER_FILES;
    let moves = smear_moves(mover, inner, 1)
        | smear_moves(mover, enemy, 8)
        | smear_moves(mover, inner, 7)
        | smear_moves(mover, inner, 9);
    moves & empties(mover, enemy)
}

/// Moves along one axis, both senses, for runs of up to six enemy disks.
#[inline]
fn smear_moves(mover: u64, enemy: u64, dir: u32) -> u64 {
    let dir2 = dir + dir;

    let mut up = enemy & (mover << dir);
    up |= enemy & (up << dir);
    let pairs_up = enemy & (enemy << dir);
    up |= pairs_up & (up << dir2);
    up |= pairs_up & (up << dir2);

    let mut down = enemy & (mover >> dir);
    down |= enemy & (down >> dir);
    let pairs_down = enemy & (enemy >> dir);
    down |= pairs_down & (down >> dir2);
    down |= pairs_down & (down >> dir2);

    (up << dir) | (down >> dir)
}

/// Whether `mover` has any legal move
#[inline]
pub fn has_moves(mover: u64, enemy: u64) -> bool {
    calc_moves(mover, enemy) != 0
}

/// Disks flipped by playing `sq`, found by walking the eight rays.
///
/// Returns 0 when the square is occupied or brackets nothing.
pub fn flips_by_rays(mover: u64, enemy: u64, sq: Square) -> u64 {
    if (mover | enemy) & sq.bit() != 0 {
        return 0;
    }
    let mut flips = 0u64;
    for (dr, dc) in RAYS {
        let mut run = 0u64;
        let mut r = sq.row() as i8 + dr;
        let mut c = sq.col() as i8 + dc;
        while (0..8).contains(&r) && (0..8).contains(&c) {
            let bit = Square::from_row_col(r as u8, c as u8).bit();
            if enemy & bit != 0 {
                run |= bit;
            } else {
                if mover & bit != 0 {
                    flips |= run;
                }
                break;
            }
            r += dr;
            c += dc;
        }
    }
    flips
}

/// All squares on the eight rays out of `sq`, excluding `sq` itself
pub fn rays_from(sq: Square) -> u64 {
    let mut rays = 0u64;
    for (dr, dc) in RAYS {
        let mut r = sq.row() as i8 + dr;
        let mut c = sq.col() as i8 + dc;
        while (0..8).contains(&r) && (0..8).contains(&c) {
            rays |= Square::from_row_col(r as u8, c as u8).bit();
            r += dr;
            c += dc;
        }
    }
    rays
}

/// Squares adjacent (in any of the 8 directions) to a set bit
#[inline]
pub fn neighbors(bits: u64) -> u64 {
    let east = bits << 1 & !FILE_H;
    let west = bits >> 1 & !FILE_A;
    let vertical = bits << 8 | bits >> 8;
    let diag = (bits << 9 & !FILE_H) | (bits >> 9 & !FILE_A);
    let anti = (bits << 7 & !FILE_A) | (bits >> 7 & !FILE_H);
    east | west | vertical | diag | anti
}

/// Empty squares next to `bits`: the potential mobility of whoever
/// plays against `bits`.
#[inline]
pub fn potential_mobility(bits: u64, empty: u64) -> i32 {
    popcount(neighbors(bits) & empty)
}

/// Transpose across the `sq 0 .. sq 63` diagonal (swap row and column)
#[inline]
pub fn transpose(mut x: u64) -> u64 {
    const K1: u64 = 0x5500_5500_5500_5500;
    const K2: u64 = 0x3333_0000_3333_0000;
    const K4: u64 = 0x0F0F_0F0F_0000_0000;
    let mut t = K4 & (x ^ (x << 28));
    x ^= t ^ (t >> 28);
    t = K2 & (x ^ (x << 14));
    x ^= t ^ (t >> 14);
    t = K1 & (x ^ (x << 7));
    x ^ t ^ (t >> 7)
}

/// Apply one of the 8 board symmetries.
///
/// Bit 0 of `r` reverses all bits (180 degree rotation), bit 1 reverses
/// byte order (vertical mirror) and bit 2 transposes.
#[inline]
pub fn reflect(bits: u64, r: usize) -> u64 {
    debug_assert!(r < 8);
    let mut b = bits;
    if r & 1 != 0 {
        b = b.reverse_bits();
    }
    if r & 2 != 0 {
        b = b.swap_bytes();
    }
    if r & 4 != 0 {
        b = transpose(b);
    }
    b
}

/// Lexicographically minimal `(mover, enemy)` over all 8 reflections,
/// together with the reflection index that produced it.
pub fn canonical(mover: u64, enemy: u64) -> (u64, u64, usize) {
    let mut best = (mover, enemy, 0);
    for r in 1..8 {
        let candidate = (reflect(mover, r), reflect(enemy, r));
        if candidate < (best.0, best.1) {
            best = (candidate.0, candidate.1, r);
        }
    }
    best
}
