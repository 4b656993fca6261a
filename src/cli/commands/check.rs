//! Check command: validate many files concurrently
//!
//! Every discovered file is read on the blocking pool with at most
//! `workers` reads in flight. Failures are collected rather than aborting
//! the run, then reported together.

use crate::app::services::formats::{CodecContext, open_path};
use crate::cli::args::{CheckArgs, OutputFormat};
use crate::cli::commands::shared::{
    RunStats, create_progress_bar, discover_files, prepare_context, setup_logging,
};
use crate::{Error, Result};
use colored::*;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tokio::task;
use tracing::{debug, warn};

/// Outcome of checking one file
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub path: PathBuf,
    pub format: Option<String>,
    pub rows: usize,
    pub error: Option<String>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Read one file and describe the result
pub fn check_file(ctx: &CodecContext, path: PathBuf) -> CheckOutcome {
    let result = open_path(ctx, &path)
        .and_then(|(format, dataset)| Ok((format, dataset.as_datafile().length()?)));
    match result {
        Ok((format, rows)) => {
            debug!("{}: {} rows as {}", path.display(), rows, format);
            CheckOutcome {
                path,
                format: Some(format.to_string()),
                rows,
                error: None,
            }
        }
        Err(e) => {
            warn!("{}: {}", path.display(), e);
            CheckOutcome {
                path,
                format: None,
                rows: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Run the check command
pub async fn run_check(args: &CheckArgs) -> Result<RunStats> {
    setup_logging(&args.common)?;
    let ctx = prepare_context(&args.common)?;
    let start = Instant::now();

    let files = discover_files(&args.paths)?;
    if files.is_empty() {
        return Err(Error::file_not_found(
            args.paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }

    let show_progress = args.common.show_progress() && args.output_format == OutputFormat::Human;
    let progress = show_progress.then(|| create_progress_bar(files.len() as u64, "Checking"));
    let workers = ctx.config.workers.max(1);

    let mut outcomes: Vec<CheckOutcome> = stream::iter(files)
        .map(|path| {
            let ctx = ctx.clone();
            let fallback = path.clone();
            let progress = progress.clone();
            async move {
                let outcome = task::spawn_blocking(move || check_file(&ctx, path))
                    .await
                    .unwrap_or_else(|e| CheckOutcome {
                        path: fallback,
                        format: None,
                        rows: 0,
                        error: Some(format!("check task failed: {}", e)),
                    });
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                outcome
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    let mut stats = RunStats::default();
    for outcome in &outcomes {
        if outcome.is_ok() {
            stats.files_read += 1;
            stats.rows += outcome.rows;
        } else {
            stats.files_failed += 1;
        }
    }
    stats.processing_time = start.elapsed();

    match args.output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcomes).map_err(|e| {
                Error::configuration(format!("Failed to serialize report: {}", e))
            })?;
            println!("{}", json);
        }
        OutputFormat::Human if !args.common.quiet => print_summary(&outcomes, &stats),
        OutputFormat::Human => {}
    }

    Ok(stats)
}

fn print_summary(outcomes: &[CheckOutcome], stats: &RunStats) {
    for outcome in outcomes.iter().filter(|o| !o.is_ok()) {
        println!(
            "  {} {}: {}",
            "FAIL".bright_red(),
            outcome.path.display(),
            outcome.error.as_deref().unwrap_or_default()
        );
    }

    let headline = format!(
        "{} of {} files valid ({} rows) in {:.2?}",
        stats.files_read,
        outcomes.len(),
        stats.rows,
        stats.processing_time
    );
    if stats.files_failed == 0 {
        println!("{}", headline.bright_green());
    } else {
        println!("{}", headline.bright_yellow());
    }
}
