//! Dual raw/binned frequency distributions over numeric samples

pub mod bin;
pub mod histogram;
pub mod islands;

pub use bin::Bin;
pub use histogram::{Histogram, HistogramOptions, Sample};
pub use islands::{is_flat_enough, islands, left_derivatives, local_maxima, right_derivatives, Island};
