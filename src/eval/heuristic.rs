//! Hand-tuned evaluation of Othello positions
//!
//! Features, each scored as mover minus opponent:
//! - Mobility (legal moves)
//! - Potential mobility (empty squares next to opponent disks)
//! - Corners, and disks next to empty corners
//! - Disk difference, weighted up as the board fills
//!
//! A finished game scores its exact result in centidisks.

use crate::board::bitboard::{calc_moves, popcount, potential_mobility, CORNERS};
use crate::search::solver::final_score;

use super::weights::{disk_weight, EvalWeight};
use super::Evaluator;

/// Corner, its X-square and its two C-squares
const CORNER_AREAS: [(u64, u64, u64); 4] = [
    (1 << 0, 1 << 9, (1 << 1) | (1 << 8)),
    (1 << 7, 1 << 14, (1 << 6) | (1 << 15)),
    (1 << 56, 1 << 49, (1 << 48) | (1 << 57)),
    (1 << 63, 1 << 54, (1 << 55) | (1 << 62)),
];

/// Built-in evaluator
#[derive(Debug, Clone, Copy)]
pub struct HeuristicEvaluator {
    winner_gets_empties: bool,
}

impl HeuristicEvaluator {
    /// `winner_gets_empties` only affects finished games
    #[must_use]
    pub fn new(winner_gets_empties: bool) -> Self {
        Self {
            winner_gets_empties,
        }
    }
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Evaluator for HeuristicEvaluator {
    fn eval(&self, mover: u64, enemy: u64) -> i32 {
        evaluate(mover, enemy, self.winner_gets_empties)
    }
}

/// Evaluate a position for the side to move.
///
/// # Arguments
/// * `mover` - Disks of the side to move
/// * `enemy` - Disks of the opponent
/// * `winner_gets_empties` - Scoring rule for finished games
///
/// # Returns
/// Centidisks; positive favours `mover`
#[must_use]
pub fn evaluate(mover: u64, enemy: u64, winner_gets_empties: bool) -> i32 {
    let my_moves = calc_moves(mover, enemy);
    let opp_moves = calc_moves(enemy, mover);
    if my_moves == 0 && opp_moves == 0 {
        return 100 * final_score(mover, enemy, winner_gets_empties);
    }

    let empty = !(mover | enemy);
    let mobility = EvalWeight::MOBILITY * (popcount(my_moves) - popcount(opp_moves));
    let potential = EvalWeight::POTENTIAL_MOBILITY
        * (potential_mobility(enemy, empty) - potential_mobility(mover, empty));
    let disks = disk_weight(popcount(empty)) * (popcount(mover) - popcount(enemy));

    mobility + potential + corner_score(mover, empty) - corner_score(enemy, empty) + disks
}

/// Corners held minus risky squares next to empty corners
fn corner_score(disks: u64, empty: u64) -> i32 {
    let mut score = EvalWeight::CORNER * popcount(disks & CORNERS);
    for &(corner, x_square, c_squares) in &CORNER_AREAS {
        if empty & corner != 0 {
            score -= EvalWeight::X_SQUARE * popcount(disks & x_square);
            score -= EvalWeight::C_SQUARE * popcount(disks & c_squares);
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::bitboard::X_SQUARES;
    use crate::board::{Board, Position, Square};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_corner_areas_match_masks() {
        let corners = CORNER_AREAS.iter().fold(0, |acc, a| acc | a.0);
        let x_squares = CORNER_AREAS.iter().fold(0, |acc, a| acc | a.1);
        assert_eq!(corners, CORNERS);
        assert_eq!(x_squares, X_SQUARES);
    }

    #[test]
    fn test_start_position_is_even() {
        let pos = Position::start();
        assert_eq!(evaluate(pos.mover, pos.enemy, true), 0);
    }

    #[test]
    fn test_evaluate_antisymmetric() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for empties in [50, 40, 30, 20, 10] {
            let pos = Position::random(&mut rng, empties);
            assert_eq!(
                evaluate(pos.mover, pos.enemy, true),
                -evaluate(pos.enemy, pos.mover, true),
                "{empties} empties"
            );
        }
    }

    #[test]
    fn test_corner_is_valuable() {
        let base = Position::start();
        let with_corner = Position::new(base.mover | sq("A1").bit(), base.enemy);
        let before = evaluate(base.mover, base.enemy, true);
        assert!(evaluate(with_corner.mover, with_corner.enemy, true) > before);
    }

    #[test]
    fn test_x_square_penalised_only_next_to_empty_corner() {
        let empty = !sq("B2").bit();
        let x = sq("B2").bit();
        assert_eq!(corner_score(x, empty), -EvalWeight::X_SQUARE);
        let held = corner_score(x | sq("A1").bit(), empty & !sq("A1").bit());
        assert_eq!(held, EvalWeight::CORNER);
    }

    #[test]
    fn test_finished_game_scores_exactly() {
        // White wiped out with 4 squares left
        let board: Board = format!("{}{}", "X".repeat(60), "....").parse().unwrap();
        let pos = board.position();
        assert!(pos.is_game_over());
        assert_eq!(evaluate(pos.mover, pos.enemy, true), 6400);
        assert_eq!(evaluate(pos.mover, pos.enemy, false), 6000);
        assert_eq!(evaluate(pos.enemy, pos.mover, true), -6400);
    }

    #[test]
    fn test_closure_and_struct_share_trait() {
        fn score<E: Evaluator>(e: &E) -> i32 {
            let pos = Position::start();
            e.eval(pos.mover, pos.enemy)
        }
        assert_eq!(score(&HeuristicEvaluator::default()), 0);
        assert_eq!(score(&|_: u64, _: u64| 42), 42);
    }
}
