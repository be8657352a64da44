//! Search tuning parameters
//!
//! Every threshold and move-ordering weight used by the solver and the
//! midgame searcher lives in one immutable [`SearchConfig`], built once
//! and shared through an `Arc`. Missing TOML keys take their defaults.
//!
//! ```
//! use othello::config::SearchConfig;
//!
//! let config = SearchConfig::from_toml_str("handoff_empties = 14").unwrap();
//! assert_eq!(config.handoff_empties, 14);
//! assert_eq!(config.sort_threshold, SearchConfig::default().sort_threshold);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest per-bucket table size exponent accepted for the solver table
const MAX_TABLE_BITS: u32 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Winner of a finished game is also credited the empty squares
    pub winner_gets_empties: bool,

    // Exact solver node selection, by number of empties
    pub parity_threshold: u32,
    pub sort_threshold: u32,
    pub hash_threshold: u32,
    pub negascout_threshold: u32,

    /// Enhanced transposition cutoff probing in the move sorter
    pub etc_enabled: bool,
    pub etc_max_empties: u32,
    /// Parity bonus only applies at or below this many empties
    pub parity_sort_max_empties: u32,

    // Move ordering weights
    pub square_weight: i32,
    pub parity_weight: i32,
    pub potential_mobility_weight: i32,
    pub mobility_weight: i32,

    /// Solver table bucket size is `2^clamp(empties + 4, tt_min_bits, tt_max_bits)`
    pub tt_min_bits: u32,
    pub tt_max_bits: u32,

    /// Midgame search switches to the exact solver at or below this many empties
    pub handoff_empties: u32,
    pub midgame_tt_mb: usize,
    pub iid_min_depth: u32,
    pub iid_reduction: u32,

    pub mpc_enabled: bool,
    pub mpc_min_depth: u32,
    /// Multiplier applied to each regression sigma
    pub mpc_width: f64,

    // Engine
    pub engine_solve_empties: u32,
    pub engine_depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            winner_gets_empties: true,
            parity_threshold: 5,
            sort_threshold: 6,
            hash_threshold: 6,
            negascout_threshold: 10,
            etc_enabled: true,
            etc_max_empties: 12,
            parity_sort_max_empties: 20,
            square_weight: 1,
            parity_weight: 12,
            potential_mobility_weight: 4,
            mobility_weight: 24,
            tt_min_bits: 8,
            tt_max_bits: 14,
            handoff_empties: 12,
            midgame_tt_mb: 8,
            iid_min_depth: 4,
            iid_reduction: 2,
            mpc_enabled: true,
            mpc_min_depth: 2,
            mpc_width: 1.0,
            engine_solve_empties: 16,
            engine_depth: 8,
        }
    }
}

impl SearchConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the threshold ordering the solver relies on.
    ///
    /// The closed-form solvers cover 1 to 3 empties, so plain iteration
    /// must start at 4 or later. Hashing and negascout only happen in
    /// sorted nodes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.parity_threshold < 4 {
            return invalid(format!(
                "parity_threshold must be at least 4, got {}",
                self.parity_threshold
            ));
        }
        if self.sort_threshold < self.parity_threshold {
            return invalid(format!(
                "sort_threshold ({}) must not be below parity_threshold ({})",
                self.sort_threshold, self.parity_threshold
            ));
        }
        if self.hash_threshold < self.sort_threshold {
            return invalid(format!(
                "hash_threshold ({}) must not be below sort_threshold ({})",
                self.hash_threshold, self.sort_threshold
            ));
        }
        if self.negascout_threshold < self.sort_threshold {
            return invalid(format!(
                "negascout_threshold ({}) must not be below sort_threshold ({})",
                self.negascout_threshold, self.sort_threshold
            ));
        }
        if self.tt_min_bits > self.tt_max_bits || self.tt_max_bits > MAX_TABLE_BITS {
            return invalid(format!(
                "need tt_min_bits <= tt_max_bits <= {MAX_TABLE_BITS}, got {}..{}",
                self.tt_min_bits, self.tt_max_bits
            ));
        }
        if self.iid_reduction == 0 {
            return invalid("iid_reduction must be positive".to_string());
        }
        if self.mpc_min_depth < 2 {
            return invalid(format!(
                "mpc_min_depth must be at least 2, got {}",
                self.mpc_min_depth
            ));
        }
        if !self.mpc_width.is_finite() || self.mpc_width < 0.0 {
            return invalid(format!("mpc_width must be finite and >= 0, got {}", self.mpc_width));
        }
        Ok(())
    }
}
