//! Command implementations for the cruise codec CLI
//!
//! Each subcommand lives in its own module; [`shared`] holds logging,
//! configuration, discovery and progress helpers common to all of them.

pub mod check;
pub mod convert;
pub mod export;
pub mod inspect;
pub mod shared;

pub use shared::RunStats;

use crate::Result;
use crate::cli::args::Commands;

/// Dispatch to the handler for the chosen subcommand
pub async fn run(command: Commands) -> Result<RunStats> {
    match command {
        Commands::Inspect(args) => inspect::run_inspect(&args).await,
        Commands::Convert(args) => convert::run_convert(&args).await,
        Commands::Check(args) => check::run_check(&args).await,
        Commands::Export(args) => export::run_export(&args).await,
    }
}
