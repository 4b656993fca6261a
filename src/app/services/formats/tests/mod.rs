//! Shared fixtures for codec tests

use crate::app::services::formats::CodecContext;
use crate::config::{CodecConfig, UnitPolicy};
use crate::StandardRegistry;
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub mod dispatcher_tests;
pub mod netcdf_tests;
pub mod summary_tests;

/// Context with the builtin registry and default (rejecting) unit policy
pub fn ctx() -> CodecContext {
    CodecContext::default()
}

/// Context that only warns on unit mismatches
pub fn lenient_ctx() -> CodecContext {
    CodecContext::new(
        Arc::new(StandardRegistry::builtin()),
        Arc::new(CodecConfig::default().with_unit_policy(UnitPolicy::Warn)),
    )
}

pub const EXCHANGE_BOTTLE: &str = "\
BOTTLE,20080101SIOCCHDOJFS
#Test cruise, two samples
EXPOCODE,SECT_ID,STNNBR,CASTNO,SAMPNO,DATE,CTDPRS,CTDTMP,CTDSAL,CTDSAL_FLAG_W,SALNTY,SALNTY_FLAG_W
,,,,,,DBAR,ITS-90,PSS-78,,PSS-78,
33RR20070322,I8S,1,1,1,20070322,2.0,3.2850,34.5400,2,34.5412,2
33RR20070322,I8S,1,1,2,20070322,100.0,2.1000,-999.0000,9,-999.0000,9
END_DATA
";

pub const EXCHANGE_CTD: &str = "\
CTD,20080101SIOCCHDOJFS
#Example cast
NUMBER_HEADERS = 6
EXPOCODE = 33RR20070322
SECT_ID = I8S
STNNBR = 1
CASTNO = 1
DATE = 20070322
CTDPRS,CTDPRS_FLAG_W,CTDTMP,CTDTMP_FLAG_W,CTDSAL,CTDSAL_FLAG_W
DBAR,,ITS-90,,PSS-78,
2.0,2,3.2850,2,34.5400,2
4.0,2,3.2800,2,-999.0000,9
END_DATA
";

/// CTD cast whose pressure also carries IGOSS flags
pub const EXCHANGE_CTD_IGOSS: &str = "\
CTD,20080101SIOCCHDOJFS
NUMBER_HEADERS = 6
EXPOCODE = 33RR20070322
SECT_ID = I8S
STNNBR = 1
CASTNO = 1
DATE = 20070322
CTDPRS,CTDPRS_FLAG_W,CTDPRS_FLAG_I,CTDTMP,CTDTMP_FLAG_W,CTDSAL,CTDSAL_FLAG_W
DBAR,,,ITS-90,,PSS-78,
2.0,2,1,3.2850,2,34.5400,2
4.0,2,3,3.2800,2,-999.0000,9
END_DATA
";

pub const WOCE_BOTTLE: &str = "\
EXPOCODE 33RR20070322 WHP-ID I8S CRUISE DATES 032207 TO 041507 20080101SIOCCHDOJFS
  STNNBR  CASTNO  SAMPNO  CTDPRS  CTDTMP  SALNTY  QUALT1
                            DBAR  ITS-90  PSS-78       *
                                 ******* *******       *
       1       1       1     2.0  3.2850 34.5412      22
       1       1       2   100.0  2.1000  -999.0      29

NOTE: salinity from autosal
";

/// A WOCE CTD cast for `station`; `qualt` is the QUALT1 word of the second row
pub fn woce_ctd(station: &str, qualt: &str) -> String {
    format!(
        "\
EXPOCODE 33RR20070322 WHP-ID I8S DATE 032207 20080101SIOCCHDOJFS
STNNBR {station} CASTNO 1 NO.RECORDS=3
INSTRUMENT NO. 1 SAMPLING RATE 24.0 HZ
  CTDPRS  CTDTMP  CTDSAL  CTDOXY  QUALT1
    DBAR  ITS-90  PSS-78 UMOL/KG       *
         ******* ******* *******       *
     2.0  3.2850 34.5400   250.0     222
     4.0  3.2800 34.5410   249.8 {qualt:>7}
     6.0  3.2700 34.5420  -999.0     229
"
    )
}

pub const WOCE_SUMMARY: &str = "\
I8S     R/V Example     15 Feb 2007 - 13 Mar 2007  20070502CCHDOSCD
SHIP/CRS     WOCE                 CAST         UTC EVENT         POSITION             UNC HT ABOVE WIRE   MAX  NO. OF
EXPOCODE     SECT   STNNBR CASTNO TYPE DATE   TIME  CODE LATITUDE   LONGITUDE   NAV DEPTH   BOTTOM  OUT PRESS BOTTLES PARAMETERS                              COMMENTS
---------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------
33RR20070204 I8S         1      1  ROS 021507 1424    BE 65 48.65 S  84 33.00 E GPS   450                             test
33RR20070204 I8S         1      1  ROS 021507 1442    BO 65 48.65 S  84 33.01 E GPS   450        6  435   439      16 1-8,23-24,27,43
33RR20070204 I8S         2      1  ROS 021507 1705    BE 65 46.09 S  84 32.09 E GPS  1257            11
";

/// Zip archive holding `members` in order, stored with deflate
pub fn zip_members(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, bytes) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
