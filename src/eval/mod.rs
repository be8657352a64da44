//! Evaluation for the midgame searcher
//!
//! The searcher consumes any [`Evaluator`]: a pure function of the
//! position returning a score in centidisks (1/100 of a disk) from the
//! mover's point of view. Closures work directly:
//!
//! ```
//! use othello::eval::Evaluator;
//!
//! let disk_count = |mover: u64, enemy: u64| {
//!     100 * (mover.count_ones() as i32 - enemy.count_ones() as i32)
//! };
//! assert_eq!(disk_count.eval(0b111, 0b1), 200);
//! ```
//!
//! [`HeuristicEvaluator`] is the built-in hand-tuned evaluator.

pub mod heuristic;
pub mod weights;

pub use heuristic::HeuristicEvaluator;
pub use weights::EvalWeight;

/// Static evaluation of a position.
///
/// Implementations must be side-effect-free and safe to share between
/// searchers on different threads.
pub trait Evaluator: Send + Sync {
    /// Score in centidisks for `mover`, who is about to play
    fn eval(&self, mover: u64, enemy: u64) -> i32;
}

impl<F> Evaluator for F
where
    F: Fn(u64, u64) -> i32 + Send + Sync,
{
    #[inline]
    fn eval(&self, mover: u64, enemy: u64) -> i32 {
        self(mover, enemy)
    }
}
