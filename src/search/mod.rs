//! Search for the Othello engine
//!
//! Contains:
//! - Empty-square list threaded through the exact solver
//! - Transposition tables for the solver and the midgame search
//! - Move sorter with parity, mobility and ETC scoring
//! - Exact endgame solver
//! - Depth-limited midgame search with Multi-ProbCut

pub mod empties;
pub mod midgame;
pub mod mpc;
pub mod solver;
pub mod sorter;
pub mod tt;

pub use empties::{ListOfEmpties, SENTINEL};
pub use midgame::{MoveScore, Searcher, SCORE_WIN};
pub use mpc::{MpcBucket, MpcCut, MpcTable};
pub use solver::{final_score, Solver, SCORE_MAX};
pub use sorter::{EtcProbe, Move, MoveSorter, SortHints};
pub use tt::{position_hash, Bound, EntryType, SolverTable, TTEntry, TTStats, TranspositionTable};
