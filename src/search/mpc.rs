//! Multi-ProbCut coefficients
//!
//! A shallow search at `shallow_depth` predicts a deep search at `depth`
//! through the regression `shallow ~ a * deep + b` with residual `sigma`
//! (centidisks). Coefficients are fitted offline; this module only loads
//! and looks them up. Buckets are keyed by deep depth and an inclusive
//! range of empty squares.
//!
//! JSON layout:
//!
//! ```json
//! { "buckets": [
//!     { "depth": 6, "min_empties": 20, "max_empties": 40,
//!       "cuts": [ { "shallow_depth": 2, "a": 0.98, "b": 4.0, "sigma": 310.0 } ] }
//! ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Deepest depth the built-in table covers
const DEFAULT_MAX_DEPTH: u32 = 24;

/// One shallow probe for a deep search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MpcCut {
    pub shallow_depth: u32,
    pub a: f64,
    pub b: f64,
    pub sigma: f64,
}

impl MpcCut {
    /// Shallow window for a deep window `(alpha, beta)`, `width` sigmas wide
    pub fn shallow_window(&self, alpha: i32, beta: i32, width: f64) -> (i32, i32) {
        let margin = width * self.sigma;
        let lo = (self.a * f64::from(alpha) + self.b - margin).floor();
        let hi = (self.a * f64::from(beta) + self.b + margin).ceil();
        (saturate(lo), saturate(hi))
    }
}

fn saturate(x: f64) -> i32 {
    x.clamp(f64::from(i32::MIN / 2), f64::from(i32::MAX / 2)) as i32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpcBucket {
    pub depth: u32,
    pub min_empties: u32,
    pub max_empties: u32,
    pub cuts: Vec<MpcCut>,
}

/// Regression coefficients per (deep depth, empties) bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpcTable {
    buckets: Vec<MpcBucket>,
}

impl MpcTable {
    /// Table with no probes; MPC never cuts.
    pub fn empty() -> Self {
        Self {
            buckets: Vec::new(),
        }
    }

    pub fn from_buckets(buckets: Vec<MpcBucket>) -> Result<Self, ConfigError> {
        let table = Self { buckets };
        table.validate()?;
        Ok(table)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let table: Self = serde_json::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for bucket in &self.buckets {
            if bucket.min_empties > bucket.max_empties {
                return Err(ConfigError::Invalid(format!(
                    "MPC bucket for depth {} has empty range {}..={}",
                    bucket.depth, bucket.min_empties, bucket.max_empties
                )));
            }
            for cut in &bucket.cuts {
                if cut.shallow_depth >= bucket.depth {
                    return Err(ConfigError::Invalid(format!(
                        "MPC shallow depth {} is not below depth {}",
                        cut.shallow_depth, bucket.depth
                    )));
                }
                let finite = cut.a.is_finite() && cut.b.is_finite() && cut.sigma.is_finite();
                if !finite || cut.a <= 0.0 || cut.sigma < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "MPC cut for depth {} has invalid coefficients {cut:?}",
                        bucket.depth
                    )));
                }
            }
        }
        Ok(())
    }

    /// Probes for a deep search of `depth` plies with `empties` empty squares.
    /// The first matching bucket wins; no match means no probes.
    pub fn cutoffs(&self, depth: u32, empties: u32) -> &[MpcCut] {
        self.buckets
            .iter()
            .find(|b| b.depth == depth && (b.min_empties..=b.max_empties).contains(&empties))
            .map_or(&[], |b| b.cuts.as_slice())
    }

    pub fn buckets(&self) -> &[MpcBucket] {
        &self.buckets
    }
}

impl Default for MpcTable {
    /// Conservative built-in table: one probe at half depth with an
    /// unbiased slope and a sigma growing with depth.
    fn default() -> Self {
        let buckets = (2..=DEFAULT_MAX_DEPTH)
            .map(|depth| MpcBucket {
                depth,
                min_empties: 0,
                max_empties: 64,
                cuts: vec![MpcCut {
                    shallow_depth: depth / 2,
                    a: 1.0,
                    b: 0.0,
                    sigma: 150.0 + 40.0 * f64::from(depth),
                }],
            })
            .collect();
        Self { buckets }
    }
}
