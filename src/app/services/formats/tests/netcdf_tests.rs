use super::{EXCHANGE_BOTTLE, EXCHANGE_CTD, EXCHANGE_CTD_IGOSS, ctx};
use crate::app::models::Value;
use crate::app::services::formats::netcdf::mapping::{from_netcdf, to_netcdf};
use crate::app::services::formats::netcdf::{NcAttribute, NcFile, NcValues, NcVariable};
use crate::app::services::formats::{ExchangeCodec, FileCodec, FileKind, NetCdfCodec};
use crate::{DataFile, Error};

fn exchange(kind: FileKind, text: &str) -> DataFile {
    ExchangeCodec
        .read_file(&ctx(), kind, text.as_bytes())
        .unwrap()
}

#[test]
fn test_ctd_member_round_trip() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let bytes = NetCdfCodec.write_file(&ctx(), FileKind::Ctd, &file).unwrap();
    assert_eq!(&bytes[..4], b"CDF\x01");

    let back = NetCdfCodec.read_file(&ctx(), FileKind::Ctd, &bytes).unwrap();
    assert_eq!(back, file);
}

#[test]
fn test_bottle_member_round_trip() {
    let file = exchange(FileKind::Bottle, EXCHANGE_BOTTLE);
    let bytes = NetCdfCodec
        .write_file(&ctx(), FileKind::Bottle, &file)
        .unwrap();
    let back = NetCdfCodec
        .read_file(&ctx(), FileKind::Bottle, &bytes)
        .unwrap();
    assert_eq!(back, file);
}

#[test]
fn test_write_is_deterministic() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let first = NetCdfCodec.write_file(&ctx(), FileKind::Ctd, &file).unwrap();
    let second = NetCdfCodec.write_file(&ctx(), FileKind::Ctd, &file).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_variable_layout() {
    let file = exchange(FileKind::Bottle, EXCHANGE_BOTTLE);
    let nc = to_netcdf(&ctx(), FileKind::Bottle, &file).unwrap();

    assert_eq!(
        nc.attribute("data_type").and_then(NcValues::as_text).as_deref(),
        Some("WOCE BOTTLE")
    );
    let salinity = nc.variable("bottle_salinity").unwrap();
    assert_eq!(
        salinity.attribute("whp_name").and_then(NcValues::as_text).as_deref(),
        Some("SALNTY")
    );
    assert_eq!(salinity.data, NcValues::Double(vec![34.5412, -999.0]));

    let flags = nc.variable("bottle_salinity_FLAG_W").unwrap();
    assert_eq!(flags.data, NcValues::Byte(vec![2, 9]));

    let expocode = nc.variable("expocode").unwrap();
    assert_eq!(expocode.dimensions.len(), 2);
    assert!(nc.variable("temperature_FLAG_W").is_none());
}

#[test]
fn test_wrong_data_type() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let bytes = NetCdfCodec.write_file(&ctx(), FileKind::Ctd, &file).unwrap();
    assert!(matches!(
        NetCdfCodec.read_file(&ctx(), FileKind::Bottle, &bytes),
        Err(Error::MalformedHeader { .. })
    ));
}

#[test]
fn test_zero_rows_not_supported() {
    let mut file = DataFile::new();
    file.stamp = "20080101SIOCCHDOJFS".to_string();
    assert!(matches!(
        NetCdfCodec.write_file(&ctx(), FileKind::Ctd, &file),
        Err(Error::NotSupported { .. })
    ));
}

#[test]
fn test_summary_not_supported() {
    assert!(matches!(
        NetCdfCodec.read_file(&ctx(), FileKind::Summary, b"CDF\x01"),
        Err(Error::NotSupported { .. })
    ));
}

#[test]
fn test_bad_flag_value() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let mut nc = to_netcdf(&ctx(), FileKind::Ctd, &file).unwrap();
    let flags = nc
        .variables
        .iter_mut()
        .find(|v| v.name == "salinity_FLAG_W")
        .unwrap();
    flags.data = NcValues::Byte(vec![2, 12]);

    assert!(matches!(
        from_netcdf(&ctx(), FileKind::Ctd, &nc),
        Err(Error::MalformedFlag { .. })
    ));
}

#[test]
fn test_orphan_flag_variable() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let mut nc = to_netcdf(&ctx(), FileKind::Ctd, &file).unwrap();
    nc.variables.retain(|v| v.name != "salinity");

    assert!(matches!(
        from_netcdf(&ctx(), FileKind::Ctd, &nc),
        Err(Error::MalformedFlag { .. })
    ));
}

#[test]
fn test_unknown_attributes_and_variables_are_skipped() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let mut nc = to_netcdf(&ctx(), FileKind::Ctd, &file).unwrap();
    nc.attributes
        .push(NcAttribute::new("Conventions", NcValues::text("COARDS")));
    let levels = nc.variables[0].dimensions[0];
    nc.variables.push(NcVariable {
        name: "woce_time_seconds".to_string(),
        dimensions: vec![levels],
        attributes: Vec::new(),
        data: NcValues::Int(vec![0, 60]),
    });

    let back = from_netcdf(&ctx(), FileKind::Ctd, &nc).unwrap();
    assert_eq!(back, file);
}

#[test]
fn test_fill_value_becomes_absent() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let nc = to_netcdf(&ctx(), FileKind::Ctd, &file).unwrap();
    let bytes = nc.encode().unwrap();
    let decoded = NcFile::decode(&bytes).unwrap();
    let back = from_netcdf(&ctx(), FileKind::Ctd, &decoded).unwrap();

    let salinity = back.column("CTDSAL").unwrap();
    assert_eq!(salinity.get(0), Some(&Value::Number(34.54)));
    assert_eq!(salinity.get(1), None);
    assert_eq!(salinity.flag_woce(1), Some(9));
}

#[test]
fn test_igoss_flag_variable_round_trip() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD_IGOSS);
    let nc = to_netcdf(&ctx(), FileKind::Ctd, &file).unwrap();
    let flags = nc.variable("pressure_FLAG_I").unwrap();
    assert_eq!(flags.data, NcValues::Byte(vec![1, 3]));
    assert!(nc.variable("salinity_FLAG_I").is_none());

    let bytes = NetCdfCodec.write_file(&ctx(), FileKind::Ctd, &file).unwrap();
    let back = NetCdfCodec.read_file(&ctx(), FileKind::Ctd, &bytes).unwrap();
    assert_eq!(back.column("CTDPRS").unwrap().flags_igoss(), &[Some(1), Some(3)]);
    assert_eq!(back, file);
}

#[test]
fn test_variables_must_be_indexed_by_levels_only() {
    let file = exchange(FileKind::Ctd, EXCHANGE_CTD);
    let nc = to_netcdf(&ctx(), FileKind::Ctd, &file).unwrap();
    let levels = nc.variable("salinity").unwrap().dimensions[0];

    let mut wide = nc.clone();
    let salinity = wide.variables.iter_mut().find(|v| v.name == "salinity").unwrap();
    salinity.dimensions = vec![levels, levels];
    assert!(matches!(
        from_netcdf(&ctx(), FileKind::Ctd, &wide),
        Err(Error::MalformedHeader { .. })
    ));

    let mut scalar_flags = nc;
    let flags = scalar_flags
        .variables
        .iter_mut()
        .find(|v| v.name == "salinity_FLAG_W")
        .unwrap();
    flags.dimensions = Vec::new();
    assert!(matches!(
        from_netcdf(&ctx(), FileKind::Ctd, &scalar_flags),
        Err(Error::MalformedHeader { .. })
    ));
}
