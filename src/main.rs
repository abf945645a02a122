//! vecstore: Main entry point

use anyhow::Result;
use clap::Parser;
use vecstore::cli::{Cli, Commands};
use vecstore::solver::HistogramSolver;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            history,
            cache_unit,
        } => {
            let report = HistogramSolver::new(&history, cache_unit).solve()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Layout {
            history,
            total_vectors,
            cache_unit,
        } => {
            let report = HistogramSolver::new(&history, cache_unit).solve()?;
            let layout = report.block_layout(total_vectors)?;
            println!(
                "P={} L={} P_S={} L_S={} block_size={}",
                layout.p, layout.l, layout.p_s, layout.l_s, layout.block_size
            );
            Ok(())
        }
    }
}
