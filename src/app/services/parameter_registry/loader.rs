//! Parameter registry loading from CSV tables
//!
//! The table has one row per parameter:
//! `name,full_name,display_order,units,format,bound_lower,bound_upper,netcdf_name,aliases`
//! where `aliases` is a `;`-separated list and empty cells mean "none".

use super::StandardRegistry;
use super::parameter::{Parameter, ValueFormat};
use crate::{Error, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One row of a registry CSV file
#[derive(Debug, Deserialize)]
struct ParameterRecord {
    name: String,
    #[serde(default)]
    full_name: Option<String>,
    display_order: i32,
    #[serde(default)]
    units: Option<String>,
    format: String,
    #[serde(default)]
    bound_lower: Option<f64>,
    #[serde(default)]
    bound_upper: Option<f64>,
    #[serde(default)]
    netcdf_name: Option<String>,
    #[serde(default)]
    aliases: Option<String>,
}

impl ParameterRecord {
    fn into_parameter(self) -> Result<Parameter> {
        if self.name.is_empty() {
            return Err(Error::registry("Parameter with empty name"));
        }
        let format: ValueFormat = self.format.parse()?;
        let mut parameter = Parameter::new(self.name, self.display_order, format);

        if let Some(full_name) = self.full_name.filter(|s| !s.is_empty()) {
            parameter = parameter.with_full_name(full_name);
        }
        if let Some(units) = self.units.filter(|s| !s.is_empty()) {
            parameter = parameter.with_units(units);
        }
        if let Some(netcdf_name) = self.netcdf_name.filter(|s| !s.is_empty()) {
            parameter = parameter.with_netcdf_name(netcdf_name);
        }

        match (self.bound_lower, self.bound_upper) {
            (Some(lower), Some(upper)) if lower <= upper => {
                parameter = parameter.with_bounds(lower, upper);
            }
            (None, None) => {}
            _ => {
                return Err(Error::registry(format!(
                    "Parameter '{}' needs both bounds with lower <= upper",
                    parameter.name
                )));
            }
        }

        for alias in self
            .aliases
            .as_deref()
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|a| !a.is_empty())
        {
            parameter = parameter.with_alias(alias);
        }

        Ok(parameter)
    }
}

impl StandardRegistry {
    /// Load a registry table from a CSV file
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        info!("Loading parameter registry from {}", path.display());
        let file = std::fs::File::open(path).map_err(|e| {
            Error::io(
                format!("Failed to open registry file '{}'", path.display()),
                e,
            )
        })?;
        Self::from_csv_reader(file).map_err(|e| match e {
            Error::CsvParsing {
                message, source, ..
            } => Error::csv_parsing(path.display().to_string(), message, source),
            other => other,
        })
    }

    /// Load a registry table from any CSV byte source
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut registry = Self::new();
        for (index, record) in csv_reader.deserialize::<ParameterRecord>().enumerate() {
            let record = record.map_err(|e| {
                Error::csv_parsing(
                    "registry",
                    format!("Invalid registry row {}", index + 1),
                    Some(e),
                )
            })?;
            registry.insert(record.into_parameter()?)?;
        }

        debug!("Registry loaded with {} parameters", registry.len());
        Ok(registry)
    }
}
