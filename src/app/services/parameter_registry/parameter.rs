//! Parameter definitions and printf-style value formats

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Storage and rendering class of a parameter's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatKind {
    /// Fixed-point decimal (`%8.4f`)
    Float,
    /// Integral number (`%6d`)
    Integer,
    /// Free text (`%11s`)
    Text,
}

/// A value format such as `8.4f`, `6d` or `11s`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueFormat {
    pub kind: FormatKind,
    pub width: usize,
    pub precision: usize,
}

impl ValueFormat {
    pub fn float(width: usize, precision: usize) -> Self {
        Self {
            kind: FormatKind::Float,
            width,
            precision,
        }
    }

    pub fn integer(width: usize) -> Self {
        Self {
            kind: FormatKind::Integer,
            width,
            precision: 0,
        }
    }

    pub fn text(width: usize) -> Self {
        Self {
            kind: FormatKind::Text,
            width,
            precision: 0,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind != FormatKind::Text
    }
}

impl FromStr for ValueFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_start_matches('%');
        let invalid = || Error::registry(format!("Invalid value format '{}'", s));

        let (body, kind) = match s.chars().last() {
            Some('f') => (&s[..s.len() - 1], FormatKind::Float),
            Some('d') => (&s[..s.len() - 1], FormatKind::Integer),
            Some('s') => (&s[..s.len() - 1], FormatKind::Text),
            _ => return Err(invalid()),
        };

        let (width, precision) = match body.split_once('.') {
            Some((w, p)) => (w, p.parse::<usize>().map_err(|_| invalid())?),
            None => (body, 0),
        };
        let width = if width.is_empty() {
            0
        } else {
            width.parse::<usize>().map_err(|_| invalid())?
        };

        if kind != FormatKind::Float && precision != 0 {
            return Err(invalid());
        }

        Ok(Self {
            kind,
            width,
            precision,
        })
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FormatKind::Float => write!(f, "{}.{}f", self.width, self.precision),
            FormatKind::Integer => write!(f, "{}d", self.width),
            FormatKind::Text => write!(f, "{}s", self.width),
        }
    }
}

/// A measured or descriptive quantity known to the registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Canonical WHP mnemonic, e.g. `CTDSAL`
    pub name: String,

    /// Human-readable description
    pub full_name: String,

    /// Position in canonical column order
    pub display_order: i32,

    /// Expected unit string, `None` for unitless identifiers
    pub units: Option<String>,

    pub format: ValueFormat,

    /// Inclusive physically valid range
    pub bounds: Option<(f64, f64)>,

    /// Variable name in netCDF files
    pub netcdf_name: Option<String>,

    /// Alternate names resolving to this parameter
    pub aliases: Vec<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, display_order: i32, format: ValueFormat) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            display_order,
            units: None,
            format,
            bounds: None,
            netcdf_name: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some((lower, upper));
        self
    }

    pub fn with_netcdf_name(mut self, name: impl Into<String>) -> Self {
        self.netcdf_name = Some(name.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Number of decimal places written for this parameter
    pub fn precision(&self) -> usize {
        self.format.precision
    }

    pub fn is_numeric(&self) -> bool {
        self.format.is_numeric()
    }

    /// Expected unit, empty for unitless parameters
    pub fn units_str(&self) -> &str {
        self.units.as_deref().unwrap_or("")
    }

    /// netCDF variable name, falling back to the lowercased mnemonic
    pub fn netcdf_name(&self) -> String {
        self.netcdf_name
            .clone()
            .unwrap_or_else(|| self.name.to_ascii_lowercase())
    }

    /// Whether `value` lies within the valid range (always true when unbounded)
    pub fn in_bounds(&self, value: f64) -> bool {
        match self.bounds {
            Some((lower, upper)) => value >= lower && value <= upper,
            None => true,
        }
    }
}
