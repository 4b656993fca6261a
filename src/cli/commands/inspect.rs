//! Inspect command: describe data files without converting them

use crate::app::models::DataFile;
use crate::app::services::formats::{Dataset, Format, open_path};
use crate::cli::args::{InspectArgs, OutputFormat};
use crate::cli::commands::shared::{RunStats, prepare_context, setup_logging};
use crate::{Error, Result};
use colored::*;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Machine-readable description of one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub format: String,
    pub members: Vec<String>,
    pub stamp: String,
    pub rows: usize,
    pub expocodes: Vec<String>,
    pub globals: Vec<(String, Option<String>)>,
    pub columns: Vec<ColumnReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub units: Option<String>,
    pub present: usize,
    pub woce_flags: bool,
    pub igoss_flags: bool,
}

impl FileReport {
    /// Summarize a dataset read from `path`
    pub fn build(path: &Path, format: Format, dataset: &Dataset) -> Result<Self> {
        let file = dataset.as_datafile();
        let members = match dataset {
            Dataset::File(_) => Vec::new(),
            Dataset::Collection(collection) => collection
                .member_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        };

        Ok(Self {
            path: path.display().to_string(),
            format: format.to_string(),
            members,
            stamp: file.stamp.clone(),
            rows: file.length()?,
            expocodes: file.expocodes()?,
            globals: file
                .globals()
                .iter()
                .map(|g| (g.name().to_string(), g.value.as_ref().map(|v| v.to_string())))
                .collect(),
            columns: column_reports(file),
        })
    }
}

fn column_reports(file: &DataFile) -> Vec<ColumnReport> {
    file.sorted_columns()
        .into_iter()
        .map(|column| ColumnReport {
            name: column.name().to_string(),
            units: column.parameter().units.clone(),
            present: column.values().iter().filter(|v| v.is_some()).count(),
            woce_flags: column.is_flagged_woce(),
            igoss_flags: column.is_flagged_igoss(),
        })
        .collect()
}

/// Run the inspect command
pub async fn run_inspect(args: &InspectArgs) -> Result<RunStats> {
    setup_logging(&args.common)?;
    let ctx = prepare_context(&args.common)?;
    let start = Instant::now();
    let mut stats = RunStats::default();
    let mut reports = Vec::new();

    for path in &args.files {
        info!("Inspecting {}", path.display());
        let (format, dataset) = open_path(&ctx, path)?;
        let report = FileReport::build(path, format, &dataset)?;
        stats.files_read += 1;
        stats.rows += report.rows;

        if args.output_format == OutputFormat::Human {
            print_report(&report, args.columns);
        }
        reports.push(report);
    }

    if args.output_format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&reports)
            .map_err(|e| Error::configuration(format!("Failed to serialize report: {}", e)))?;
        println!("{}", json);
    }

    stats.processing_time = start.elapsed();
    Ok(stats)
}

fn print_report(report: &FileReport, show_columns: bool) {
    println!("{}", report.path.bold());
    println!("  {:<10} {}", "Format".bright_cyan(), report.format);
    println!("  {:<10} {}", "Stamp".bright_cyan(), report.stamp);
    println!("  {:<10} {}", "Expocodes".bright_cyan(), report.expocodes.join(", "));
    println!("  {:<10} {}", "Rows".bright_cyan(), report.rows);
    if !report.members.is_empty() {
        println!(
            "  {:<10} {} ({})",
            "Members".bright_cyan(),
            report.members.len(),
            report.members.join(", ")
        );
    }
    for (name, value) in &report.globals {
        println!(
            "  {:<10} {} = {}",
            "Global".bright_cyan(),
            name,
            value.as_deref().unwrap_or("-")
        );
    }

    if show_columns {
        for column in &report.columns {
            let mut flags = Vec::new();
            if column.woce_flags {
                flags.push("WOCE");
            }
            if column.igoss_flags {
                flags.push("IGOSS");
            }
            println!(
                "    {:<12} {:<10} {:>6}/{} {}",
                column.name,
                column.units.as_deref().unwrap_or(""),
                column.present,
                report.rows,
                flags.join("+").dimmed()
            );
        }
    } else {
        let names: Vec<&str> = report.columns.iter().map(|c| c.name.as_str()).collect();
        println!("  {:<10} {}", "Columns".bright_cyan(), names.join(" "));
    }
}
