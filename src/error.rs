//! Error types for vecstore

use thiserror::Error;

/// Result type alias for vecstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vecstore
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing construction parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Block encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A read whose offset lies beyond the store's current extent
    #[error("Out-of-range read: block {id} at offset {offset}")]
    OutOfRange { id: u64, offset: u64 },

    /// Histogram construction over an empty sample sequence
    #[error("Empty sample sequence for histogram '{0}'")]
    EmptySamples(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
