use clap::{CommandFactory, Parser};
use colored::*;
use cruise_codec::cli::{args::Args, commands};
use std::error::Error as _;
use std::process;

fn main() {
    let args = Args::parse();

    // Without a subcommand, show help and exit cleanly
    let Some(command) = args.command else {
        let _ = Args::command().print_help();
        println!();
        process::exit(0);
    };

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to install CTRL+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(command) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(cruise_codec::Error::processing_interrupted(
                    "Interrupted by user",
                ))
            }
        }
    });

    match result {
        Ok(stats) if stats.files_failed > 0 => process::exit(2),
        Ok(_) => process::exit(0),
        Err(error) => {
            eprintln!("{} {}", "Error:".bright_red().bold(), error);
            let mut source = error.source();
            while let Some(cause) = source {
                eprintln!("  {} {}", "caused by:".dimmed(), cause);
                source = cause.source();
            }
            process::exit(1);
        }
    }
}
