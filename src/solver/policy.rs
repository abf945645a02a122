//! Tracking policies and the solver's output report

use crate::error::{Error, Result};
use crate::hist::Island;
use crate::solver::history::Query;
use crate::storage::BlockLayout;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Inferred access pattern for the index or time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Policy {
    FullTracking,
    HotRanges,
    RecentTracking,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::FullTracking => "FULL_TRACKING",
            Policy::HotRanges => "HOT_RANGES",
            Policy::RecentTracking => "RECENT_TRACKING",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Policy {
    type Err = ();

    /// Case-insensitive match against the policy names.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FULL_TRACKING" => Ok(Policy::FullTracking),
            "HOT_RANGES" => Ok(Policy::HotRanges),
            "RECENT_TRACKING" => Ok(Policy::RecentTracking),
            _ => Err(()),
        }
    }
}

/// Parameters attached to the inferred policies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyParams {
    /// Islands of the index-range-length histogram, set with
    /// [`Policy::HotRanges`].
    pub hot_ranges: Option<Vec<Island>>,
    /// Window size for [`Policy::RecentTracking`]: the dominant relative
    /// time-range length.
    pub recent_window: Option<f64>,
}

/// Everything the solver hands to the orchestrator: block-shape parameters,
/// observed extremes, policies, and the replayable query list.
#[derive(Debug, Clone, Serialize)]
pub struct SolverReport {
    /// Vectors per block.
    pub p: i64,
    /// Time-series length per vector slot.
    pub l: i32,
    pub i_min: i32,
    pub i_max: i32,
    pub j_min: i64,
    pub j_max: i64,
    pub i_policy: Policy,
    pub j_policy: Policy,
    pub policy_params: PolicyParams,
    pub queries: Vec<Query>,
}

impl SolverReport {
    /// Lay out a store of `total_vectors` vectors with the solved shape.
    ///
    /// `P` and `L` come from modal range lengths and can be non-positive on
    /// a degenerate history; reject those here rather than letting the
    /// unsigned conversion wrap them into huge shapes.
    pub fn block_layout(&self, total_vectors: usize) -> Result<BlockLayout> {
        if self.p <= 0 || self.l <= 0 {
            return Err(Error::Config(format!(
                "solved block shape is degenerate: P={} L={}",
                self.p, self.l
            )));
        }
        BlockLayout::new(total_vectors, self.p as usize, self.l as usize)
    }
}
