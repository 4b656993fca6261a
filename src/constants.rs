//! Application constants for cruise codec
//!
//! This module contains the fill values, file suffixes, flag codes and
//! format keywords shared by every codec.

// =============================================================================
// Fill Values and Sentinels
// =============================================================================

/// Numeric fill value written for absent data
pub const FILL_VALUE: f64 = -999.0;

/// Distance from the fill value within which a parsed number counts as absent
pub const FILL_TOLERANCE: f64 = 1e-9;

/// Textual sentinel: -999 optionally followed by a fraction of zeros or nines
pub const SENTINEL_PATTERN: &str = r"^-999(\.[09]*)?$";

/// Fill token used for text parameters
pub const TEXT_FILL: &str = "-999";

// =============================================================================
// Flag Column Naming
// =============================================================================

/// Suffix of Exchange WOCE flag column names
pub const FLAG_WOCE_SUFFIX: &str = "_FLAG_W";

/// Suffix of Exchange IGOSS flag column names
pub const FLAG_IGOSS_SUFFIX: &str = "_FLAG_I";

/// WOCE fixed-width quality word columns
pub const QUALT_WOCE: &str = "QUALT1";
pub const QUALT_IGOSS: &str = "QUALT2";

/// WOCE quality flag codes shared by bottle and CTD data
pub mod woce_flags {
    /// Sample drawn or value not received
    pub const NOT_RECEIVED: u8 = 1;

    /// Acceptable measurement
    pub const ACCEPTABLE: u8 = 2;

    /// Questionable measurement
    pub const QUESTIONABLE: u8 = 3;

    /// Bad measurement
    pub const BAD: u8 = 4;

    /// Not reported
    pub const NOT_REPORTED: u8 = 5;

    /// Sample not drawn / no data
    pub const NO_DATA: u8 = 9;

    /// Flags that may accompany an absent value
    pub const ABSENT_CODES: &[u8] = &[NOT_RECEIVED, NOT_REPORTED, NO_DATA];
}

/// Highest valid single-digit flag
pub const MAX_FLAG: u8 = 9;

// =============================================================================
// Format Keywords
// =============================================================================

/// Exchange data terminator line
pub const END_DATA: &str = "END_DATA";

/// Exchange file kind identifiers
pub const EXCHANGE_BOTTLE_ID: &str = "BOTTLE";
pub const EXCHANGE_CTD_ID: &str = "CTD";

/// Exchange CTD header count keyword
pub const NUMBER_HEADERS: &str = "NUMBER_HEADERS";

/// Stamp shape: eight digit date followed by word characters
pub const STAMP_PATTERN: &str = r"^\d{8}\w+$";

/// netCDF `data_type` attribute values
pub const NETCDF_BOTTLE_TYPE: &str = "WOCE BOTTLE";
pub const NETCDF_CTD_TYPE: &str = "WOCE CTD";

/// netCDF row dimension name
pub const NETCDF_LEVELS_DIM: &str = "N_LEVELS";

// =============================================================================
// Parameter Names
// =============================================================================

pub mod params {
    pub const EXPOCODE: &str = "EXPOCODE";
    pub const SECT_ID: &str = "SECT_ID";
    pub const STNNBR: &str = "STNNBR";
    pub const CASTNO: &str = "CASTNO";
    pub const SAMPNO: &str = "SAMPNO";
    pub const BTLNBR: &str = "BTLNBR";
    pub const DATE: &str = "DATE";
    pub const TIME: &str = "TIME";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const DEPTH: &str = "DEPTH";
    pub const BEGIN_DATE: &str = "_BEGIN_DATE";
    pub const END_DATE: &str = "_END_DATE";

    /// Parameters a single CTD cast carries in its header rather than as columns
    pub const CAST_HEADER_PARAMS: &[&str] = &[
        EXPOCODE, SECT_ID, STNNBR, CASTNO, DATE, TIME, LATITUDE, LONGITUDE, DEPTH,
    ];
}

// =============================================================================
// File Suffixes
// =============================================================================

pub const SUFFIX_SUMMARY_WOCE: &str = "su.txt";
pub const SUFFIX_BOTTLE_WOCE: &str = "hy.txt";
pub const SUFFIX_BOTTLE_EXCHANGE: &str = "hy1.csv";
pub const SUFFIX_BOTTLE_NETCDF_ZIP: &str = "nc_hyd.zip";
pub const SUFFIX_CTD_WOCE_ZIP: &str = "ct.zip";
pub const SUFFIX_CTD_EXCHANGE_ZIP: &str = "ct1.zip";
pub const SUFFIX_CTD_NETCDF_ZIP: &str = "nc_ctd.zip";

/// Member suffixes used when naming archive entries
pub const MEMBER_SUFFIX_CTD_EXCHANGE: &str = "_ct1.csv";
pub const MEMBER_SUFFIX_CTD_WOCE: &str = "_ct.txt";
pub const MEMBER_SUFFIX_BOTTLE_NETCDF: &str = "_hy1.nc";
pub const MEMBER_SUFFIX_CTD_NETCDF: &str = "_ctd.nc";

// =============================================================================
// Defaults
// =============================================================================

/// Default stamp pieces when no configuration is present
pub const DEFAULT_INSTITUTION: &str = "SIO";
pub const DEFAULT_DIVISION: &str = "CCH";
pub const DEFAULT_INITIALS: &str = "DO";

/// Default configuration file name under the user config directory
pub const CONFIG_DIR_NAME: &str = "cruise-codec";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CRUISE_CODEC_";

/// Build the Exchange flag column name for a parameter
pub fn woce_flag_column(parameter: &str) -> String {
    format!("{parameter}{FLAG_WOCE_SUFFIX}")
}

/// Build the IGOSS flag column name for a parameter
pub fn igoss_flag_column(parameter: &str) -> String {
    format!("{parameter}{FLAG_IGOSS_SUFFIX}")
}

/// Split a flag column name into its base parameter and flag kind
pub fn split_flag_column(name: &str) -> Option<(&str, FlagKind)> {
    if let Some(base) = name.strip_suffix(FLAG_WOCE_SUFFIX) {
        Some((base, FlagKind::Woce))
    } else {
        name.strip_suffix(FLAG_IGOSS_SUFFIX)
            .map(|base| (base, FlagKind::Igoss))
    }
}

/// The two independent quality flag schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Woce,
    Igoss,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_column_names() {
        assert_eq!(woce_flag_column("CTDSAL"), "CTDSAL_FLAG_W");
        assert_eq!(igoss_flag_column("CTDSAL"), "CTDSAL_FLAG_I");
    }

    #[test]
    fn test_split_flag_column() {
        assert_eq!(
            split_flag_column("CTDSAL_FLAG_W"),
            Some(("CTDSAL", FlagKind::Woce))
        );
        assert_eq!(
            split_flag_column("OXYGEN_FLAG_I"),
            Some(("OXYGEN", FlagKind::Igoss))
        );
        assert_eq!(split_flag_column("CTDSAL"), None);
    }

    #[test]
    fn test_absent_codes() {
        assert!(woce_flags::ABSENT_CODES.contains(&woce_flags::NO_DATA));
        assert!(!woce_flags::ABSENT_CODES.contains(&woce_flags::ACCEPTABLE));
    }
}
