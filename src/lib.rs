//! Cruise Codec Library
//!
//! A Rust library for reading and writing oceanographic cruise data (bottle
//! and CTD casts) in the encodings used by hydrographic data offices.
//!
//! This library provides tools for:
//! - A columnar data model with per-value WOCE and IGOSS quality flags
//! - Fixed-width WOCE text (bottle, CTD and sum files)
//! - Delimited Exchange text (bottle files and zipped CTD casts)
//! - netCDF classic array files bundled in zip archives
//! - Merging casts into collections and splitting them back out
//! - Sentinel, unit and range validation against a parameter registry

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod formats;
        pub mod parameter_registry;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Column, DataFile, DataFileCollection, Value};
pub use app::services::formats::{CodecContext, Dataset, Format, select_codec};
pub use app::services::parameter_registry::{Parameter, ParameterRegistry, StandardRegistry};
pub use config::CodecConfig;

/// Result type alias for cruise codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cruise data reading, writing and validation
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Path does not exist or is not a regular file
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Filename matches no known format suffix
    #[error("Unrecognized format: {filename}")]
    UnrecognizedFormat { filename: String },

    /// Format/direction combination is not implemented
    #[error("Not supported: {operation}")]
    NotSupported { operation: String },

    /// Parameter name unknown to the registry
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    /// Parameter occurs twice in one file
    #[error("Duplicate parameter: {name}")]
    DuplicateParameter { name: String },

    /// Declared units disagree with the registry
    #[error("Unit mismatch for {parameter}: expected '{expected}', found '{found}'")]
    UnitMismatch {
        parameter: String,
        expected: String,
        found: String,
    },

    /// Value outside the physically valid range of its parameter
    #[error("Value {value} of {parameter} at row {row} outside [{lower}, {upper}]")]
    RangeError {
        parameter: String,
        row: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },

    /// Flag token that cannot be attached to a value
    #[error("Malformed flag for {parameter} at row {row}: {message}")]
    MalformedFlag {
        parameter: String,
        row: usize,
        message: String,
    },

    /// Value token that does not parse for its parameter format
    #[error("Malformed value for {parameter} at row {row}: '{value}'")]
    MalformedValue {
        parameter: String,
        row: usize,
        value: String,
    },

    /// Columns within one data file disagree in length
    #[error("Row count mismatch: {parameter} has {found} rows, expected {expected}")]
    RowCountMismatch {
        parameter: String,
        expected: usize,
        found: usize,
    },

    /// Member cannot be merged into a collection
    #[error("Merge conflict: {message}")]
    MergeConflict { message: String },

    /// Required column is absent
    #[error("Missing column: {name}")]
    MissingColumn { name: String },

    /// Stamp line missing or malformed
    #[error("Malformed stamp: {message}")]
    MalformedStamp { message: String },

    /// Header section missing or malformed
    #[error("Malformed header: {message}")]
    MalformedHeader { message: String },

    /// Data section row malformed
    #[error("Malformed data at line {line}: {message}")]
    MalformedData { line: usize, message: String },

    /// Footer or data terminator missing or malformed
    #[error("Malformed footer: {message}")]
    MalformedFooter { message: String },

    /// Failure inside one member of a collection archive
    #[error("Member '{member}': {source}")]
    Member {
        member: String,
        #[source]
        source: Box<Error>,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Zip archive error
    #[error("Zip archive error: {message}")]
    Zip {
        message: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Parameter registry error
    #[error("Parameter registry error: {message}")]
    Registry { message: String },

    /// Tabular export error
    #[error("Export error: {message}")]
    Export {
        message: String,
        #[source]
        source: polars::error::PolarsError,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an unrecognized format error
    pub fn unrecognized_format(filename: impl Into<String>) -> Self {
        Self::UnrecognizedFormat {
            filename: filename.into(),
        }
    }

    /// Create a not supported error
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
        }
    }

    /// Create an unknown parameter error
    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    /// Create a duplicate parameter error
    pub fn duplicate_parameter(name: impl Into<String>) -> Self {
        Self::DuplicateParameter { name: name.into() }
    }

    /// Create a unit mismatch error
    pub fn unit_mismatch(
        parameter: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnitMismatch {
            parameter: parameter.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a range error
    pub fn range(parameter: impl Into<String>, row: usize, value: f64, bounds: (f64, f64)) -> Self {
        Self::RangeError {
            parameter: parameter.into(),
            row,
            value,
            lower: bounds.0,
            upper: bounds.1,
        }
    }

    /// Create a malformed flag error
    pub fn malformed_flag(
        parameter: impl Into<String>,
        row: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedFlag {
            parameter: parameter.into(),
            row,
            message: message.into(),
        }
    }

    /// Create a malformed value error
    pub fn malformed_value(
        parameter: impl Into<String>,
        row: usize,
        value: impl Into<String>,
    ) -> Self {
        Self::MalformedValue {
            parameter: parameter.into(),
            row,
            value: value.into(),
        }
    }

    /// Create a row count mismatch error
    pub fn row_count_mismatch(parameter: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::RowCountMismatch {
            parameter: parameter.into(),
            expected,
            found,
        }
    }

    /// Create a merge conflict error
    pub fn merge_conflict(message: impl Into<String>) -> Self {
        Self::MergeConflict {
            message: message.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(name: impl Into<String>) -> Self {
        Self::MissingColumn { name: name.into() }
    }

    /// Create a malformed stamp error
    pub fn malformed_stamp(message: impl Into<String>) -> Self {
        Self::MalformedStamp {
            message: message.into(),
        }
    }

    /// Create a malformed header error
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    /// Create a malformed data error
    pub fn malformed_data(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedData {
            line,
            message: message.into(),
        }
    }

    /// Create a malformed footer error
    pub fn malformed_footer(message: impl Into<String>) -> Self {
        Self::MalformedFooter {
            message: message.into(),
        }
    }

    /// Wrap an error with the archive member it came from
    pub fn member(member: impl Into<String>, source: Error) -> Self {
        Self::Member {
            member: member.into(),
            source: Box::new(source),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a registry error
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// The innermost error, looking through member wrappers
    pub fn root(&self) -> &Error {
        match self {
            Self::Member { source, .. } => source.root(),
            other => other,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Zip {
            message: "Zip archive operation failed".to_string(),
            source: error,
        }
    }
}

impl From<polars::error::PolarsError> for Error {
    fn from(error: polars::error::PolarsError) -> Self {
        Self::Export {
            message: "DataFrame operation failed".to_string(),
            source: error,
        }
    }
}
