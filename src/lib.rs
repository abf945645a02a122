//! vecstore: storage-layout simulator for time-indexed vector data
//!
//! Two coupled subsystems:
//!
//! - **Policy solver**: analyzes a historical query log with equi-width
//!   histograms, infers index/time tracking policies, and derives the
//!   block-shape parameters `P` (vectors per block) and `L` (series length).
//! - **Block store**: persists batches of fixed-dimension vectors into
//!   fixed-size binary blocks and serves positional reads by block id,
//!   mixing a common and a remainder block shape in one file.
//!
//! # Example
//!
//! ```no_run
//! use vecstore::prelude::*;
//!
//! # fn example() -> vecstore::error::Result<()> {
//! let report = HistogramSolver::new("history.log", 64).solve()?;
//! let mut store = PersistentStore::open(&StoreConfig {
//!     total_vectors: 1000,
//!     vectors_per_block: report.p as usize,
//!     series_length: report.l as usize,
//!     storage_dir: "storage".into(),
//!     disabled: false,
//! })?;
//! let _block = store.get(0)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod hist;
pub mod solver;
pub mod storage;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::hist::{Histogram, Island};
    pub use crate::solver::{HistogramSolver, Policy, Query, SolverReport};
    pub use crate::storage::{Block, BlockHeader, BlockLayout, BlockShape, PersistentStore, StoreConfig, Vector};
}
