//! Offline policy solver over a historical query log

pub mod histogram_solver;
pub mod history;
pub mod policy;

pub use histogram_solver::HistogramSolver;
pub use history::{parse_line, HistoryLine, Query};
pub use policy::{Policy, PolicyParams, SolverReport};
