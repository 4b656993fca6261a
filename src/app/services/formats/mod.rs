//! Format codecs for cruise data files
//!
//! Each encoding implements [`FileCodec`], the capability to read bytes into
//! a [`DataFile`] and write one back, for a given [`FileKind`]. Zip-bundled
//! collections reuse the member-level codecs through [`zip_collection`], and
//! [`dispatcher`] maps filenames onto the resulting [`Format`] table.

use crate::app::models::DataFile;
use crate::app::services::parameter_registry::{ParameterRegistry, StandardRegistry};
use crate::config::CodecConfig;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

pub mod dispatcher;
pub mod exchange;
pub mod netcdf;
pub mod primitives;
pub mod woce;
pub mod zip_collection;

#[cfg(test)]
pub mod tests;

// Re-export key types for convenience
pub use dispatcher::{Dataset, Format, open_path, save_path, select_codec};
pub use exchange::ExchangeCodec;
pub use netcdf::NetCdfCodec;
pub use woce::WoceCodec;

/// What a file describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Bottle,
    Ctd,
    Summary,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Bottle => f.write_str("bottle"),
            FileKind::Ctd => f.write_str("CTD"),
            FileKind::Summary => f.write_str("summary"),
        }
    }
}

/// How a file is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Woce,
    Exchange,
    NetCdf,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Woce => f.write_str("WOCE"),
            Encoding::Exchange => f.write_str("Exchange"),
            Encoding::NetCdf => f.write_str("netCDF"),
        }
    }
}

/// Registry and configuration handed to every codec call
#[derive(Debug, Clone)]
pub struct CodecContext {
    pub registry: Arc<dyn ParameterRegistry>,
    pub config: Arc<CodecConfig>,
}

impl CodecContext {
    pub fn new(registry: Arc<dyn ParameterRegistry>, config: Arc<CodecConfig>) -> Self {
        Self { registry, config }
    }

    /// Stamp to write: the file's own, or a fresh one from configuration
    pub fn stamp_for(&self, file: &DataFile) -> String {
        if file.stamp.trim().is_empty() {
            self.config.stamp()
        } else {
            file.stamp.trim().to_string()
        }
    }
}

impl Default for CodecContext {
    fn default() -> Self {
        Self::new(
            Arc::new(StandardRegistry::builtin()),
            Arc::new(CodecConfig::default()),
        )
    }
}

/// Read/write capability implemented once per encoding
pub trait FileCodec: Send + Sync {
    fn encoding(&self) -> Encoding;

    /// Parse one file of `kind`
    fn read_file(&self, ctx: &CodecContext, kind: FileKind, bytes: &[u8]) -> Result<DataFile>;

    /// Serialize one file of `kind`
    fn write_file(&self, ctx: &CodecContext, kind: FileKind, file: &DataFile) -> Result<Vec<u8>>;

    fn unsupported(&self, kind: FileKind, direction: &str) -> Error {
        Error::not_supported(format!("{} {} {}", direction, self.encoding(), kind))
    }
}

/// The member-level codec for an encoding
pub fn codec_for(encoding: Encoding) -> &'static dyn FileCodec {
    match encoding {
        Encoding::Woce => &WoceCodec,
        Encoding::Exchange => &ExchangeCodec,
        Encoding::NetCdf => &NetCdfCodec,
    }
}
