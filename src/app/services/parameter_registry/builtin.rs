//! Built-in parameter table
//!
//! Covers the identifiers, positions and core measurements found in bottle,
//! CTD and sum files, plus the underscore-prefixed descriptive fields that
//! only appear in sum files and WOCE headers.

use super::parameter::{Parameter, ValueFormat};

/// The standard parameter set in display order
pub fn builtin_parameters() -> Vec<Parameter> {
    let float = ValueFormat::float;
    let int = ValueFormat::integer;
    let text = ValueFormat::text;

    vec![
        Parameter::new("EXPOCODE", 1, text(11))
            .with_full_name("ExpoCode")
            .with_netcdf_name("expocode"),
        Parameter::new("SECT_ID", 2, text(11))
            .with_full_name("Section ID")
            .with_netcdf_name("section_id"),
        Parameter::new("STNNBR", 3, text(8))
            .with_full_name("Station Number")
            .with_netcdf_name("station"),
        Parameter::new("CASTNO", 4, int(8))
            .with_full_name("Cast Number")
            .with_bounds(0.0, 9999.0)
            .with_netcdf_name("cast"),
        Parameter::new("SAMPNO", 5, text(7))
            .with_full_name("Sample Number")
            .with_netcdf_name("sample"),
        Parameter::new("BTLNBR", 6, text(7))
            .with_full_name("Bottle Number")
            .with_netcdf_name("bottle"),
        Parameter::new("DATE", 7, text(8))
            .with_full_name("Date (YYYYMMDD)")
            .with_netcdf_name("woce_date"),
        Parameter::new("TIME", 8, text(4))
            .with_full_name("Time (HHMM)")
            .with_netcdf_name("woce_time"),
        Parameter::new("LATITUDE", 9, float(9, 4))
            .with_full_name("Latitude")
            .with_bounds(-90.0, 90.0)
            .with_netcdf_name("latitude"),
        Parameter::new("LONGITUDE", 10, float(10, 4))
            .with_full_name("Longitude")
            .with_bounds(-180.0, 180.0)
            .with_netcdf_name("longitude"),
        Parameter::new("DEPTH", 11, int(6))
            .with_full_name("Bottom Depth")
            .with_units("METERS")
            .with_bounds(0.0, 11000.0)
            .with_netcdf_name("depth"),
        Parameter::new("CTDPRS", 12, float(8, 1))
            .with_full_name("CTD Pressure")
            .with_units("DBAR")
            .with_bounds(0.0, 11000.0)
            .with_netcdf_name("pressure"),
        Parameter::new("CTDTMP", 13, float(8, 4))
            .with_full_name("CTD Temperature")
            .with_units("ITS-90")
            .with_bounds(-2.0, 35.0)
            .with_netcdf_name("temperature"),
        Parameter::new("CTDSAL", 14, float(8, 4))
            .with_full_name("CTD Salinity")
            .with_units("PSS-78")
            .with_bounds(0.0, 42.0)
            .with_netcdf_name("salinity"),
        Parameter::new("CTDOXY", 15, float(8, 1))
            .with_full_name("CTD Oxygen")
            .with_units("UMOL/KG")
            .with_bounds(0.0, 500.0)
            .with_netcdf_name("oxygen"),
        Parameter::new("CTDNOBS", 16, int(6))
            .with_full_name("CTD Number of Observations")
            .with_bounds(0.0, 1_000_000.0)
            .with_netcdf_name("ctd_nobs")
            .with_alias("NUMBER"),
        Parameter::new("THETA", 17, float(8, 4))
            .with_full_name("Potential Temperature")
            .with_units("DEG C")
            .with_bounds(-2.0, 35.0)
            .with_netcdf_name("theta"),
        Parameter::new("SALNTY", 18, float(8, 4))
            .with_full_name("Bottle Salinity")
            .with_units("PSS-78")
            .with_bounds(0.0, 42.0)
            .with_netcdf_name("bottle_salinity"),
        Parameter::new("OXYGEN", 19, float(8, 1))
            .with_full_name("Bottle Oxygen")
            .with_units("UMOL/KG")
            .with_bounds(0.0, 500.0)
            .with_netcdf_name("bottle_oxygen"),
        Parameter::new("SILCAT", 20, float(8, 2))
            .with_full_name("Silicate")
            .with_units("UMOL/KG")
            .with_bounds(0.0, 300.0)
            .with_netcdf_name("silicate"),
        Parameter::new("NITRAT", 21, float(8, 2))
            .with_full_name("Nitrate")
            .with_units("UMOL/KG")
            .with_bounds(0.0, 100.0)
            .with_netcdf_name("nitrate"),
        Parameter::new("NITRIT", 22, float(8, 2))
            .with_full_name("Nitrite")
            .with_units("UMOL/KG")
            .with_bounds(0.0, 10.0)
            .with_netcdf_name("nitrite"),
        Parameter::new("PHSPHT", 23, float(8, 2))
            .with_full_name("Phosphate")
            .with_units("UMOL/KG")
            .with_bounds(0.0, 10.0)
            .with_netcdf_name("phosphate"),
        // Sum file and header-only fields
        Parameter::new("_CAST_TYPE", 101, text(3)).with_full_name("Cast Type"),
        Parameter::new("_CODE", 102, text(2)).with_full_name("Event Code"),
        Parameter::new("_NAV", 103, text(3)).with_full_name("Navigation System"),
        Parameter::new("_UNC_DEPTH", 104, int(6))
            .with_full_name("Uncorrected Depth")
            .with_bounds(0.0, 11000.0),
        Parameter::new("_ABOVE_BOTTOM", 105, int(6))
            .with_full_name("Height Above Bottom")
            .with_bounds(0.0, 11000.0),
        Parameter::new("_WIRE_OUT", 106, int(6))
            .with_full_name("Wire Out")
            .with_bounds(0.0, 20000.0),
        Parameter::new("_MAX_PRESSURE", 107, int(6))
            .with_full_name("Maximum Pressure")
            .with_bounds(0.0, 11000.0),
        Parameter::new("_NUM_BOTTLES", 108, int(4))
            .with_full_name("Number of Bottles")
            .with_bounds(0.0, 999.0),
        Parameter::new("_PARAMETERS", 109, text(16)).with_full_name("Parameters Sampled"),
        Parameter::new("_COMMENTS", 110, text(20)).with_full_name("Comments"),
        Parameter::new("_BEGIN_DATE", 111, text(6)).with_full_name("Cruise Begin Date"),
        Parameter::new("_END_DATE", 112, text(6)).with_full_name("Cruise End Date"),
    ]
}
