use super::{EXCHANGE_BOTTLE, WOCE_BOTTLE, ctx};
use crate::app::services::formats::{
    Dataset, Encoding, FileKind, Format, open_path, save_path, select_codec,
};
use crate::Error;
use tempfile::TempDir;

#[test]
fn test_every_suffix_selects_its_format() {
    let cases = [
        ("i8s_su.txt", Format::SummaryWoce),
        ("33RR20070322hy.txt", Format::BottleWoce),
        ("325020_hy1.csv", Format::BottleExchange),
        ("i8s_nc_hyd.zip", Format::BottleNetCdfZip),
        ("i8s_nc_ctd.zip", Format::CtdNetCdfZip),
        ("i8s_ct1.zip", Format::CtdExchangeZip),
        ("i8sct.zip", Format::CtdWoceZip),
    ];
    for (filename, expected) in cases {
        assert_eq!(select_codec(filename).unwrap(), expected, "{}", filename);
    }
    assert_eq!(Format::all().count(), cases.len());
}

#[test]
fn test_unknown_suffix() {
    match select_codec("station.xyz") {
        Err(Error::UnrecognizedFormat { filename }) => assert_eq!(filename, "station.xyz"),
        other => panic!("expected UnrecognizedFormat, got {:?}", other),
    }
}

#[test]
fn test_suffix_match_is_case_sensitive() {
    assert!(select_codec("325020_HY1.CSV").is_err());
    assert!(select_codec("i8s_CT1.zip").is_err());
}

#[test]
fn test_format_properties() {
    assert_eq!(Format::CtdExchangeZip.kind(), FileKind::Ctd);
    assert_eq!(Format::CtdExchangeZip.encoding(), Encoding::Exchange);
    assert!(Format::CtdExchangeZip.is_collection());
    assert!(!Format::BottleExchange.is_collection());
    assert_eq!(Format::BottleNetCdfZip.suffix(), "nc_hyd.zip");
    assert_eq!(
        Format::BottleExchange.to_string(),
        "Exchange bottle (hy1.csv)"
    );
    assert_eq!(
        Format::CtdWoceZip.to_string(),
        "WOCE CTD archive (ct.zip)"
    );
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nothing_hy1.csv");
    assert!(matches!(
        open_path(&ctx(), &missing),
        Err(Error::FileNotFound { .. })
    ));
    assert!(matches!(
        open_path(&ctx(), dir.path()),
        Err(Error::FileNotFound { .. })
    ));
}

#[test]
fn test_open_and_save_by_suffix() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("x_hy1.csv");
    std::fs::write(&source, EXCHANGE_BOTTLE).unwrap();

    let (format, dataset) = open_path(&ctx(), &source).unwrap();
    assert_eq!(format, Format::BottleExchange);
    assert!(matches!(dataset, Dataset::File(_)));
    assert_eq!(dataset.member_count(), 1);

    let target = dir.path().join("x_hy.txt");
    assert_eq!(
        save_path(&ctx(), &target, &dataset).unwrap(),
        Format::BottleWoce
    );
    let (format, woce) = open_path(&ctx(), &target).unwrap();
    assert_eq!(format, Format::BottleWoce);
    assert_eq!(
        woce.as_datafile().column("SALNTY"),
        dataset.as_datafile().column("SALNTY")
    );
}

#[test]
fn test_save_to_unknown_suffix() {
    let dir = TempDir::new().unwrap();
    let dataset = Format::BottleWoce
        .read(&ctx(), WOCE_BOTTLE.as_bytes())
        .unwrap();
    let target = dir.path().join("out.dat");
    assert!(matches!(
        save_path(&ctx(), &target, &dataset),
        Err(Error::UnrecognizedFormat { .. })
    ));
    assert!(!target.exists());
}

#[test]
fn test_collection_written_as_single_file_uses_unified_view() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("casts_ct.zip");
    let casts = super::zip_members(&[
        ("a_ct.txt", super::woce_ctd("1", "222").as_bytes()),
        ("b_ct.txt", super::woce_ctd("2", "222").as_bytes()),
    ]);
    std::fs::write(&archive, casts).unwrap();

    let (format, dataset) = open_path(&ctx(), &archive).unwrap();
    assert_eq!(format, Format::CtdWoceZip);
    assert_eq!(dataset.member_count(), 2);

    let bytes = Format::CtdExchangeZip.write(&ctx(), &dataset).unwrap();
    let back = Format::CtdExchangeZip.read(&ctx(), &bytes).unwrap();
    assert_eq!(back.member_count(), 2);
    assert_eq!(
        back.as_datafile().length().unwrap(),
        dataset.as_datafile().length().unwrap()
    );
}
