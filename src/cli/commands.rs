//! CLI commands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vecstore CLI
#[derive(Parser)]
#[command(name = "vecstore")]
#[command(about = "Histogram-driven block layout simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a query history log and print the solver report
    Solve {
        /// Path to the history log
        #[arg(short = 'H', long)]
        history: PathBuf,
        /// Cache unit size hint for the shape strategy
        #[arg(short, long, default_value = "64")]
        cache_unit: usize,
    },
    /// Solve, then lay out an empty store to verify the block shape
    Layout {
        /// Path to the history log
        #[arg(short = 'H', long)]
        history: PathBuf,
        /// Total expected vector count (N)
        #[arg(short = 'n', long)]
        total_vectors: usize,
        /// Cache unit size hint for the shape strategy
        #[arg(short, long, default_value = "64")]
        cache_unit: usize,
    },
}
