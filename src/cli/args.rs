//! Command-line argument definitions for cruise codec
//!
//! Defines the `cruise-codec` CLI with the clap derive API: one subcommand
//! per task plus a shared block of configuration and logging options.

use crate::config::UnitPolicy;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polars::prelude::ParquetCompression;
use std::path::{Path, PathBuf};

/// CLI arguments for the cruise data codec
///
/// Reads, validates and converts hydrographic bottle and CTD files between
/// the WOCE, Exchange and netCDF encodings.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cruise-codec",
    version,
    about = "Read, validate and convert oceanographic cruise data files",
    long_about = "Reads hydrographic bottle, CTD and summary files in the WOCE fixed-width, \
                  Exchange CSV and netCDF encodings (including zipped CTD collections), \
                  validates values against a parameter registry and converts between encodings. \
                  The output format is chosen from the output filename suffix."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show the format, stamp, parameters and row count of data files
    Inspect(InspectArgs),
    /// Convert a file to the format implied by the output suffix
    Convert(ConvertArgs),
    /// Validate many files concurrently and report failures
    Check(CheckArgs),
    /// Export the flattened columns of a file to Parquet, CSV or JSON
    Export(ExportArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Path to configuration file
    ///
    /// TOML configuration file with stamp pieces, unit policy, registry path and
    /// worker count. If not specified, looks for ~/.config/cruise-codec/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Parameter registry CSV replacing the built-in table
    #[arg(
        long = "registry",
        value_name = "FILE",
        help = "Parameter registry CSV file"
    )]
    pub registry: Option<PathBuf>,

    /// How declared units that disagree with the registry are treated
    #[arg(
        long = "unit-policy",
        value_enum,
        help = "Treatment of unit mismatches (reject or warn)"
    )]
    pub unit_policy: Option<UnitPolicyArg>,

    /// Number of parallel workers
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Number of files processed concurrently"
    )]
    pub workers: Option<usize>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// Files to inspect
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// List every column with its unit and flag schemes
    #[arg(long = "columns", help = "List columns with units and flag schemes")]
    pub columns: bool,

    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Source file; its suffix selects the reader
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Target file; its suffix selects the writer
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Force overwrite of an existing output file
    #[arg(long = "force", help = "Overwrite the output file if it exists")]
    pub force_overwrite: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the check command
#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// Files, directories or glob patterns to check
    ///
    /// Directories are walked recursively; only files with a recognized
    /// suffix are checked.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the export command
#[derive(Debug, Clone, Parser)]
pub struct ExportArgs {
    /// Source data file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination table file
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Table format; defaults to the output file extension
    #[arg(long = "format", value_enum, help = "Table format (parquet, csv, json)")]
    pub format: Option<ExportFormat>,

    /// Parquet compression algorithm
    #[arg(
        long = "compression",
        value_enum,
        default_value = "snappy",
        help = "Parquet compression algorithm"
    )]
    pub compression: Compression,

    /// Force overwrite of an existing output file
    #[arg(long = "force", help = "Overwrite the output file if it exists")]
    pub force_overwrite: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Output format options for machine-readable results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// CLI spelling of [`UnitPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitPolicyArg {
    Reject,
    Warn,
}

impl From<UnitPolicyArg> for UnitPolicy {
    fn from(arg: UnitPolicyArg) -> Self {
        match arg {
            UnitPolicyArg::Reject => UnitPolicy::Reject,
            UnitPolicyArg::Warn => UnitPolicy::Warn,
        }
    }
}

/// Table formats produced by `export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Parquet,
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess the table format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "parquet" | "pq" => Some(Self::Parquet),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parquet compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    Snappy,
    Zstd,
    Lz4,
    #[value(name = "none")]
    Uncompressed,
}

impl Compression {
    pub fn to_polars_compression(self) -> ParquetCompression {
        match self {
            Compression::Snappy => ParquetCompression::Snappy,
            Compression::Zstd => ParquetCompression::Zstd(None),
            Compression::Lz4 => ParquetCompression::Lz4Raw,
            Compression::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl Args {
    /// Get the command if one was specified
    pub fn get_command(&self) -> Option<&Commands> {
        self.command.as_ref()
    }
}

impl Commands {
    /// The shared option block of whichever subcommand was chosen
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Inspect(args) => &args.common,
            Commands::Convert(args) => &args.common,
            Commands::Check(args) => &args.common,
            Commands::Export(args) => &args.common,
        }
    }
}

impl CommonArgs {
    /// Validate the shared arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(Error::configuration(
                    "Number of workers must be greater than 0",
                ));
            }
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.is_file() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        if let Some(registry) = &self.registry {
            if !registry.is_file() {
                return Err(Error::configuration(format!(
                    "Registry file does not exist: {}",
                    registry.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ConvertArgs {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        check_output_path(&self.output, self.force_overwrite)
    }
}

impl ExportArgs {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        self.resolved_format()?;
        check_output_path(&self.output, self.force_overwrite)
    }

    /// The explicit `--format`, else the one implied by the output extension
    pub fn resolved_format(&self) -> Result<ExportFormat> {
        self.format
            .or_else(|| ExportFormat::from_path(&self.output))
            .ok_or_else(|| {
                Error::configuration(format!(
                    "Cannot infer export format from '{}', use --format",
                    self.output.display()
                ))
            })
    }
}

fn check_output_path(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(Error::configuration(format!(
            "Output file already exists: {} (use --force to overwrite)",
            output.display()
        )));
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(Error::configuration(format!(
                "Output directory does not exist: {}",
                parent.display()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_convert() {
        let args = Args::try_parse_from([
            "cruise-codec",
            "convert",
            "in_hy1.csv",
            "out_hy.txt",
            "--unit-policy",
            "warn",
            "-vv",
        ])
        .unwrap();

        match args.get_command() {
            Some(Commands::Convert(convert)) => {
                assert_eq!(convert.input, PathBuf::from("in_hy1.csv"));
                assert_eq!(convert.output, PathBuf::from("out_hy.txt"));
                assert_eq!(convert.common.unit_policy, Some(UnitPolicyArg::Warn));
                assert_eq!(convert.common.get_log_level(), "debug");
            }
            other => panic!("expected convert, got {:?}", other),
        }
    }

    #[test]
    fn test_no_command() {
        let args = Args::try_parse_from(["cruise-codec"]).unwrap();
        assert!(args.get_command().is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Args::try_parse_from(["cruise-codec", "check", "data", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_levels() {
        let mut common = CommonArgs::default();
        assert_eq!(common.get_log_level(), "warn");
        common.verbose = 1;
        assert_eq!(common.get_log_level(), "info");
        common.verbose = 5;
        assert_eq!(common.get_log_level(), "trace");
        common.quiet = true;
        assert_eq!(common.get_log_level(), "error");
        assert!(!common.show_progress());
    }

    #[test]
    fn test_common_validation() {
        let mut common = CommonArgs::default();
        assert!(common.validate().is_ok());

        common.workers = Some(0);
        assert!(common.validate().is_err());

        common.workers = Some(4);
        common.registry = Some(PathBuf::from("/nonexistent/registry.csv"));
        assert!(common.validate().is_err());
    }

    #[test]
    fn test_convert_refuses_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out_hy.txt");
        std::fs::write(&output, "existing").unwrap();

        let mut args = ConvertArgs {
            input: temp_dir.path().join("in_hy1.csv"),
            output,
            force_overwrite: false,
            common: CommonArgs::default(),
        };
        assert!(args.validate().is_err());

        args.force_overwrite = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_export_format_inference() {
        let mut args = ExportArgs {
            input: PathBuf::from("x_hy1.csv"),
            output: PathBuf::from("table.parquet"),
            format: None,
            compression: Compression::Snappy,
            force_overwrite: false,
            common: CommonArgs::default(),
        };
        assert_eq!(args.resolved_format().unwrap(), ExportFormat::Parquet);

        args.output = PathBuf::from("table.dat");
        assert!(args.resolved_format().is_err());

        args.format = Some(ExportFormat::Json);
        assert_eq!(args.resolved_format().unwrap(), ExportFormat::Json);
    }

    #[test]
    fn test_unit_policy_conversion() {
        assert_eq!(UnitPolicy::from(UnitPolicyArg::Warn), UnitPolicy::Warn);
        assert_eq!(UnitPolicy::from(UnitPolicyArg::Reject), UnitPolicy::Reject);
    }
}
