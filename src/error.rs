//! Error types for the Othello engine
//!
//! Errors are split by where they are raised:
//! - [`ParseError`]: malformed board or square text
//! - [`MoveError`]: illegal move at the checked play API
//! - [`SearchError`]: search entry point preconditions and aborts
//! - [`ConfigError`]: loading configuration or MPC tables
//!
//! Search-internal invariant failures are assertions, not errors.

use thiserror::Error;

use crate::board::Square;

/// Malformed board or square text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Board text did not contain 64 squares (plus optional side to move)
    #[error("board text must have 64 squares and an optional side to move, found {0} characters")]
    InvalidLength(usize),
    /// Unrecognized character in board text
    #[error("invalid board character {ch:?} at position {index}")]
    InvalidChar { ch: char, index: usize },
    /// Square text was not a column letter A-H followed by a row digit 1-8
    #[error("invalid square {0:?}")]
    InvalidSquare(String),
}

/// Illegal move requested through the checked play API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Target square already holds a disk
    #[error("square {0} is occupied")]
    Occupied(Square),
    /// Placing a disk on the square flips nothing
    #[error("move {0} flips no disks")]
    NoFlips(Square),
}

/// Failure at a search entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A move was requested but the side to move has no legal move
    #[error("the side to move has no legal move")]
    NoLegalMove,
    /// The abort flag was raised while the search was running
    #[error("search aborted")]
    Aborted,
}

/// Failure while loading configuration or coefficient data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid MPC table: {0}")]
    Json(#[from] serde_json::Error),
    /// Structurally valid but inconsistent settings
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
