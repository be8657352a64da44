//! Feature weights for the heuristic evaluator
//!
//! All values are centidisks. The evaluation must stay antisymmetric:
//! `eval(a, b) == -eval(b, a)`, so every feature is scored as
//! "mine minus theirs" with the same weight on both sides.

/// Evaluation weights
pub struct EvalWeight;

impl EvalWeight {
    /// Each occupied corner
    pub const CORNER: i32 = 800;
    /// Disk diagonally next to an empty corner
    pub const X_SQUARE: i32 = 300;
    /// Disk on an edge next to an empty corner
    pub const C_SQUARE: i32 = 100;

    /// Each legal move
    pub const MOBILITY: i32 = 60;
    /// Each empty square next to an opponent disk
    pub const POTENTIAL_MOBILITY: i32 = 20;

    /// Per disk of difference when the board is full; scaled down linearly
    /// with the number of empties so it only matters late
    pub const DISK: i32 = 40;
}

/// Disk weight for a position with `empties` empty squares
///
/// Reaches [`EvalWeight::DISK`] on a full board and 0 at the opening.
#[inline]
#[must_use]
pub fn disk_weight(empties: i32) -> i32 {
    EvalWeight::DISK * (60 - empties).clamp(0, 60) / 60
}
