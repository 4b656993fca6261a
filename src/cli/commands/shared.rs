//! Shared components for CLI commands
//!
//! Logging setup, layered configuration, registry selection, input
//! discovery and progress bars used by every subcommand.

use crate::app::services::formats::{CodecContext, select_codec};
use crate::app::services::parameter_registry::{ParameterRegistry, StandardRegistry};
use crate::cli::args::CommonArgs;
use crate::config::CodecConfig;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run statistics reported by every command
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Number of files read successfully
    pub files_read: usize,
    /// Number of files written
    pub files_written: usize,
    /// Number of files that failed to read or write
    pub files_failed: usize,
    /// Number of data rows seen across all files
    pub rows: usize,
    /// Total processing time
    #[serde(skip)]
    pub processing_time: std::time::Duration,
    /// Output file sizes in bytes
    pub output_sizes: Vec<(String, u64)>,
}

impl RunStats {
    /// Calculate total output size in bytes
    pub fn total_output_size(&self) -> u64 {
        self.output_sizes.iter().map(|(_, size)| size).sum()
    }

    /// Record a written file and its size on disk
    pub fn record_output(&mut self, path: &Path) {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        self.files_written += 1;
        self.output_sizes.push((path.display().to_string(), size));
    }

    /// Format output size in human-readable format
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// Set up structured logging for a command
pub fn setup_logging(args: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cruise_codec={}", log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // A subscriber installed earlier (tests, embedding) wins
    if let Err(e) = result {
        debug!("Logging already initialized: {}", e);
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
pub fn load_configuration(args: &CommonArgs) -> Result<CodecConfig> {
    info!("Loading configuration");

    let default_config_path = if args.config_file.is_none() {
        CodecConfig::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    if let Some(config_path) = config_file {
        info!("Using config file: {}", config_path.display());
    } else {
        info!("No config file found, using defaults and environment variables");
    }

    let mut config = CodecConfig::load_layered(config_file)?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut CodecConfig, args: &CommonArgs) {
    if let Some(registry) = &args.registry {
        config.registry_path = Some(registry.clone());
    }
    if let Some(policy) = args.unit_policy {
        config.unit_policy = policy.into();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
}

/// Build the codec context: registry from the configured CSV or the built-in table
pub fn build_context(config: CodecConfig) -> Result<CodecContext> {
    let registry: Arc<dyn ParameterRegistry> = match &config.registry_path {
        Some(path) => Arc::new(StandardRegistry::from_csv_path(path)?),
        None => Arc::new(StandardRegistry::builtin()),
    };
    Ok(CodecContext::new(registry, Arc::new(config)))
}

/// Configuration and registry for a command in one step
pub fn prepare_context(args: &CommonArgs) -> Result<CodecContext> {
    args.validate()?;
    let config = load_configuration(args)?;
    build_context(config)
}

/// Expand files, directories and glob patterns into recognized data files
///
/// Explicit files are kept even when their suffix is unknown so that the
/// caller reports them; walked and globbed paths are filtered by suffix.
pub fn discover_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    use walkdir::WalkDir;

    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            for entry in WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if path.is_file() && is_recognized(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            let pattern = input.to_string_lossy();
            let paths = glob::glob(&pattern).map_err(|e| {
                Error::configuration(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
            let before = files.len();
            for path in paths.filter_map(|p| p.ok()) {
                if path.is_file() && is_recognized(&path) {
                    files.push(path);
                }
            }
            if files.len() == before {
                warn!("No data files match {}", input.display());
            }
        }
    }

    // Sort files for consistent processing order
    files.sort();
    files.dedup();

    debug!("Discovered {} data files", files.len());
    for file in &files {
        debug!("  Found: {}", file.display());
    }

    Ok(files)
}

fn is_recognized(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| select_codec(name).is_ok())
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} ETA: {eta}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitPolicy;
    use crate::cli::args::UnitPolicyArg;
    use tempfile::TempDir;

    #[test]
    fn test_run_stats_default() {
        let stats = RunStats::default();
        assert_eq!(stats.files_read, 0);
        assert_eq!(stats.total_output_size(), 0);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(RunStats::format_size(500), "500 B");
        assert_eq!(RunStats::format_size(1536), "1.50 KB");
        assert_eq!(RunStats::format_size(1048576), "1.00 MB");
    }

    #[test]
    fn test_record_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out_hy.txt");
        std::fs::write(&path, "0123456789").unwrap();

        let mut stats = RunStats::default();
        stats.record_output(&path);
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.total_output_size(), 10);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = CodecConfig::default();
        let args = CommonArgs {
            unit_policy: Some(UnitPolicyArg::Warn),
            workers: Some(3),
            ..Default::default()
        };
        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.unit_policy, UnitPolicy::Warn);
        assert_eq!(config.workers, 3);
        assert!(config.registry_path.is_none());
    }

    #[test]
    fn test_build_context_with_missing_registry() {
        let config = CodecConfig::default().with_registry_path("/nonexistent/registry.csv");
        assert!(build_context(config).is_err());
    }

    #[test]
    fn test_discover_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("cruise");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("a_hy1.csv"), "").unwrap();
        std::fs::write(nested.join("b_ct1.zip"), "").unwrap();
        std::fs::write(nested.join("notes.md"), "").unwrap();

        let files = discover_files(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![nested.join("a_hy1.csv"), nested.join("b_ct1.zip")]);

        let pattern = nested.join("*_hy1.csv");
        let globbed = discover_files(&[pattern]).unwrap();
        assert_eq!(globbed, vec![nested.join("a_hy1.csv")]);
    }

    #[test]
    fn test_discover_keeps_explicit_files() {
        let temp_dir = TempDir::new().unwrap();
        let odd = temp_dir.path().join("station.xyz");
        std::fs::write(&odd, "").unwrap();

        let files = discover_files(std::slice::from_ref(&odd)).unwrap();
        assert_eq!(files, vec![odd]);
    }
}
