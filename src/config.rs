//! Configuration management and validation.
//!
//! Provides the settings that shape codec behaviour: the provenance stamp
//! written into new files, how unit disagreements are treated, an optional
//! parameter registry file, and CLI concurrency. Configuration is layered:
//! TOML file, then `CRUISE_CODEC_*` environment variables, then CLI flags.

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DIVISION, DEFAULT_INITIALS, DEFAULT_INSTITUTION,
    ENV_PREFIX,
};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a declared unit that disagrees with the registry is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPolicy {
    /// Fail the read with `UnitMismatch`
    #[default]
    Reject,
    /// Emit a warning event and keep the registry unit
    Warn,
}

impl std::str::FromStr for UnitPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(UnitPolicy::Reject),
            "warn" => Ok(UnitPolicy::Warn),
            other => Err(Error::configuration(format!(
                "Unknown unit policy '{}', expected 'reject' or 'warn'",
                other
            ))),
        }
    }
}

/// Pieces of the provenance stamp (`YYYYMMDD` + institution + division + initials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    pub institution: String,
    pub division: String,
    pub initials: String,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            institution: DEFAULT_INSTITUTION.to_string(),
            division: DEFAULT_DIVISION.to_string(),
            initials: DEFAULT_INITIALS.to_string(),
        }
    }
}

/// Top-level codec configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Stamp written into files that carry none
    pub stamp: StampConfig,

    /// Treatment of unit disagreements while reading
    pub unit_policy: UnitPolicy,

    /// Optional CSV file replacing the built-in parameter registry
    pub registry_path: Option<PathBuf>,

    /// Number of files processed concurrently by the CLI
    pub workers: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            stamp: StampConfig::default(),
            unit_policy: UnitPolicy::Reject,
            registry_path: None,
            workers: num_cpus::get(),
        }
    }
}

impl CodecConfig {
    pub fn with_unit_policy(mut self, policy: UnitPolicy) -> Self {
        self.unit_policy = policy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = Some(path.into());
        self
    }

    pub fn with_stamp(
        mut self,
        institution: impl Into<String>,
        division: impl Into<String>,
        initials: impl Into<String>,
    ) -> Self {
        self.stamp = StampConfig {
            institution: institution.into(),
            division: division.into(),
            initials: initials.into(),
        };
        self
    }

    /// Stamp for a file written today
    pub fn stamp(&self) -> String {
        self.stamp_for(chrono::Local::now().date_naive())
    }

    /// Stamp for a file written on `date`
    pub fn stamp_for(&self, date: NaiveDate) -> String {
        format!(
            "{}{}{}{}",
            date.format("%Y%m%d"),
            self.stamp.institution,
            self.stamp.division,
            self.stamp.initials
        )
    }

    /// Default configuration file location (`<config dir>/cruise-codec/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Unable to determine user config directory"))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read config file '{}'", path.display()),
                e,
            )
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Configuration { message } => {
                Error::configuration(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Invalid TOML configuration: {}", e)))
    }

    /// Load file (if any), then apply environment overrides
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Apply `CRUISE_CODEC_*` overrides using the supplied variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("INSTITUTION") {
            self.stamp.institution = value;
        }
        if let Some(value) = var("DIVISION") {
            self.stamp.division = value;
        }
        if let Some(value) = var("INITIALS") {
            self.stamp.initials = value;
        }
        if let Some(value) = var("UNIT_POLICY") {
            self.unit_policy = value.parse()?;
        }
        if let Some(value) = var("REGISTRY") {
            self.registry_path = Some(PathBuf::from(value));
        }
        if let Some(value) = var("WORKERS") {
            self.workers = value.trim().parse().map_err(|_| {
                Error::configuration(format!("{ENV_PREFIX}WORKERS is not a number: '{value}'"))
            })?;
        }
        Ok(())
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::configuration(
                "Number of workers must be greater than 0",
            ));
        }
        if self.workers > 256 {
            return Err(Error::configuration("Number of workers cannot exceed 256"));
        }

        let pieces = [
            ("institution", &self.stamp.institution),
            ("division", &self.stamp.division),
            ("initials", &self.stamp.initials),
        ];
        for (label, piece) in pieces {
            if piece.is_empty() || !piece.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::configuration(format!(
                    "Stamp {} must be non-empty and alphanumeric, got '{}'",
                    label, piece
                )));
            }
        }

        if let Some(path) = &self.registry_path {
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "Registry file does not exist: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = CodecConfig::default();
        assert_eq!(config.unit_policy, UnitPolicy::Reject);
        assert!(config.workers > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stamp_format() {
        let config = CodecConfig::default().with_stamp("WHO", "PCE", "ABC");
        let date = NaiveDate::from_ymd_opt(2009, 3, 7).unwrap();
        assert_eq!(config.stamp_for(date), "20090307WHOPCEABC");
    }

    #[test]
    fn test_builders() {
        let config = CodecConfig::default()
            .with_unit_policy(UnitPolicy::Warn)
            .with_workers(3);
        assert_eq!(config.unit_policy, UnitPolicy::Warn);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_toml_parsing_partial() {
        let config = CodecConfig::from_toml_str(
            r#"
unit_policy = "warn"
workers = 2

[stamp]
initials = "JFS"
"#,
        )
        .unwrap();

        assert_eq!(config.unit_policy, UnitPolicy::Warn);
        assert_eq!(config.workers, 2);
        assert_eq!(config.stamp.initials, "JFS");
        assert_eq!(config.stamp.institution, DEFAULT_INSTITUTION);
    }

    #[test]
    fn test_toml_parsing_invalid() {
        let result = CodecConfig::from_toml_str("unit_policy = \"ignore\"");
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "workers = 5").unwrap();
        let config = CodecConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.workers, 5);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CRUISE_CODEC_INITIALS", "XYZ"),
            ("CRUISE_CODEC_UNIT_POLICY", "WARN"),
            ("CRUISE_CODEC_WORKERS", "7"),
        ]
        .into_iter()
        .collect();

        let mut config = CodecConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.stamp.initials, "XYZ");
        assert_eq!(config.unit_policy, UnitPolicy::Warn);
        assert_eq!(config.workers, 7);
    }

    #[test]
    fn test_env_overrides_bad_workers() {
        let mut config = CodecConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "CRUISE_CODEC_WORKERS").then(|| "many".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(CodecConfig::default().with_workers(0).validate().is_err());
        assert!(
            CodecConfig::default()
                .with_stamp("S I O", "CCH", "DO")
                .validate()
                .is_err()
        );
        assert!(
            CodecConfig::default()
                .with_registry_path("/nonexistent/registry.csv")
                .validate()
                .is_err()
        );
    }
}
