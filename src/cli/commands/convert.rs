//! Convert command: read one file and write it in the format its target suffix names

use crate::app::services::formats::{Format, open_path, save_path, select_codec};
use crate::cli::args::ConvertArgs;
use crate::cli::commands::shared::{RunStats, prepare_context, setup_logging};
use crate::Result;
use colored::*;
use std::time::Instant;
use tracing::info;

/// Run the convert command
pub async fn run_convert(args: &ConvertArgs) -> Result<RunStats> {
    setup_logging(&args.common)?;
    args.validate()?;
    let ctx = prepare_context(&args.common)?;
    let start = Instant::now();

    // Fail on an unknown target suffix before reading anything
    let target = target_format(args)?;

    let (source, dataset) = open_path(&ctx, &args.input)?;
    info!(
        "Converting {} ({}) to {} ({})",
        args.input.display(),
        source,
        args.output.display(),
        target
    );

    let mut stats = RunStats {
        files_read: 1,
        rows: dataset.as_datafile().length()?,
        ..Default::default()
    };

    save_path(&ctx, &args.output, &dataset)?;
    stats.record_output(&args.output);
    stats.processing_time = start.elapsed();

    if args.common.show_progress() {
        println!(
            "{} {} -> {} ({}, {})",
            "Converted".bright_green(),
            args.input.display(),
            args.output.display(),
            target,
            RunStats::format_size(stats.total_output_size())
        );
    }

    Ok(stats)
}

fn target_format(args: &ConvertArgs) -> Result<Format> {
    let filename = args
        .output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    select_codec(&filename)
}
