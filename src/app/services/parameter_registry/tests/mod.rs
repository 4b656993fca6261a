//! Shared test utilities and fixtures for parameter registry tests

use std::path::Path;

pub mod registry_tests;

/// Registry CSV with two parameters, one aliased
pub const SAMPLE_REGISTRY_CSV: &str = "\
name,full_name,display_order,units,format,bound_lower,bound_upper,netcdf_name,aliases
# comment rows are skipped
CTDPRS,CTD Pressure,1,DBAR,8.1f,0,11000,pressure,
CTDNOBS,Observations,2,,6d,,,,NUMBER;NOBS
";

/// Write registry CSV content into a file under `dir`
pub fn write_registry_file(dir: &Path, content: &str) -> std::io::Result<std::path::PathBuf> {
    let path = dir.join("registry.csv");
    std::fs::write(&path, content)?;
    Ok(path)
}
