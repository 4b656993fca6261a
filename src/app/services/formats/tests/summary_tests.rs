use super::{WOCE_SUMMARY, ctx};
use crate::app::models::Value;
use crate::app::services::formats::{FileCodec, FileKind, WoceCodec};
use crate::{DataFile, Error};

fn read(text: &str) -> crate::Result<DataFile> {
    WoceCodec.read_file(&ctx(), FileKind::Summary, text.as_bytes())
}

#[test]
fn test_read_summary() {
    let file = read(WOCE_SUMMARY).unwrap();

    assert_eq!(file.stamp, "20070502CCHDOSCD");
    assert_eq!(file.length().unwrap(), 3);
    assert!(file.header.starts_with("I8S     R/V Example"));
    assert!(file.header.ends_with("-----\n"));
    assert!(!file.has_column("_UNC_DEPTH"));

    assert_eq!(file.value_at("EXPOCODE", 0), Some(&Value::from("33RR20070204")));
    assert_eq!(file.value_at("DATE", 1), Some(&Value::from("20070215")));
    assert_eq!(file.value_at("_CODE", 1), Some(&Value::from("BO")));
    assert_eq!(file.value_at("DEPTH", 2), Some(&Value::Number(1257.0)));
    assert_eq!(file.value_at("_NUM_BOTTLES", 1), Some(&Value::Number(16.0)));
    assert_eq!(file.value_at("_NUM_BOTTLES", 0), None);
    assert_eq!(
        file.value_at("_PARAMETERS", 1),
        Some(&Value::from("1-8,23-24,27,43"))
    );

    let latitude = file.value_at("LATITUDE", 0).and_then(Value::as_f64).unwrap();
    assert!((latitude + 65.810_833).abs() < 1e-5);
    let longitude = file.value_at("LONGITUDE", 2).and_then(Value::as_f64).unwrap();
    assert!((longitude - 84.534_833).abs() < 1e-5);
}

#[test]
fn test_summary_round_trip() {
    let file = read(WOCE_SUMMARY).unwrap();
    let first = WoceCodec
        .write_file(&ctx(), FileKind::Summary, &file)
        .unwrap();
    let text = String::from_utf8(first.clone()).unwrap();
    assert!(text.starts_with(&file.header));

    let reread = read(&text).unwrap();
    assert_eq!(reread, file);
    let second = WoceCodec
        .write_file(&ctx(), FileKind::Summary, &reread)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_expocode_slash_is_normalized() {
    let text = WOCE_SUMMARY.replacen("33RR20070204 I8S         1", "33RR/0070204 I8S         1", 1);
    let file = read(&text).unwrap();
    assert_eq!(file.value_at("EXPOCODE", 0), Some(&Value::from("33RR_0070204")));
}

#[test]
fn test_bad_date_is_malformed_data() {
    let text = WOCE_SUMMARY.replacen("021507 1424", "991507 1424", 1);
    match read(&text) {
        Err(Error::MalformedData { line, .. }) => assert_eq!(line, 5),
        other => panic!("expected MalformedData, got {:?}", other),
    }
}

#[test]
fn test_missing_separator() {
    let text: String = WOCE_SUMMARY
        .lines()
        .filter(|l| !l.starts_with("---"))
        .map(|l| format!("{}\n", l))
        .collect();
    assert!(matches!(read(&text), Err(Error::MalformedHeader { .. })));
}

#[test]
fn test_write_without_header_uses_default_layout() {
    let mut file = read(WOCE_SUMMARY).unwrap();
    file.header.clear();
    let text = String::from_utf8(
        WoceCodec
            .write_file(&ctx(), FileKind::Summary, &file)
            .unwrap(),
    )
    .unwrap();

    assert!(text.starts_with("CRUISE SUMMARY 20070502CCHDOSCD\n"));
    let reread = read(&text).unwrap();
    assert!(reread.has_column("_UNC_DEPTH"));
    for name in ["EXPOCODE", "DATE", "LATITUDE", "LONGITUDE", "DEPTH", "_PARAMETERS"] {
        assert_eq!(reread.column(name), file.column(name), "column {}", name);
    }
}

#[test]
fn test_round_trip_with_non_breaking_space_before_stamp() {
    let text = WOCE_SUMMARY.replacen("  20070502CCHDOSCD", "\u{a0}20070502CCHDOSCD", 1);
    let file = read(&text).unwrap();
    assert_eq!(file.stamp, "20070502CCHDOSCD");

    let written = WoceCodec
        .write_file(&ctx(), FileKind::Summary, &file)
        .unwrap();
    let written = String::from_utf8(written).unwrap();
    assert!(written.starts_with(&file.header));
    assert!(written.lines().next().unwrap().ends_with("\u{a0}20070502CCHDOSCD"));
    assert_eq!(read(&written).unwrap(), file);
}

#[test]
fn test_unstamped_first_line_is_header() {
    let first_line = "I8S     R/V Example     LEG 1 WHP-ID I8S,S4";
    let original = WOCE_SUMMARY.lines().next().unwrap();
    let text = WOCE_SUMMARY.replacen(original, first_line, 1);

    let file = read(&text).unwrap();
    assert!(file.stamp.is_empty());
    assert!(file.header.starts_with(&format!("{}\n", first_line)));
    assert_eq!(file.length().unwrap(), 3);

    let written = String::from_utf8(
        WoceCodec
            .write_file(&ctx(), FileKind::Summary, &file)
            .unwrap(),
    )
    .unwrap();
    let stamped = written.lines().next().unwrap();
    assert!(stamped.starts_with(&format!("{}  ", first_line)));

    let reread = read(&written).unwrap();
    assert!(!reread.stamp.is_empty());
    assert!(stamped.ends_with(&reread.stamp));
    for name in ["EXPOCODE", "DATE", "LATITUDE", "_PARAMETERS"] {
        assert_eq!(reread.column(name), file.column(name), "column {}", name);
    }
}
