//! WOCE CTD cast (`ct.txt`, one member of a `ct.zip` archive)

use super::columnar::{read_block, write_block};
use super::record_token;
use crate::app::models::DataFile;
use crate::app::services::formats::CodecContext;
use crate::app::services::formats::primitives::{
    LineCursor, check_stamp, decode_text, iso_date_to_woce, parse_value, terminated,
    woce_date_to_iso,
};
use crate::constants::params;
use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static RECORD_ONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^EXPOCODE\s+(\S+)\s+WHP-?ID\s+(\S+)\s+DATE\s+(\d{6})(?:\s+(\w+))?\s*$")
        .expect("CTD record 1 pattern is valid")
});

static RECORD_TWO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^STNNBR\s+(\S+)\s+CASTNO\s+(\S+)\s+NO\.\s*RECORDS\s*=\s*(\d+)\s*$")
        .expect("CTD record 2 pattern is valid")
});

const DEFAULT_INSTRUMENT_LINE: &str = "INSTRUMENT NO. -999 SAMPLING RATE -999 HZ";

/// Globals a CTD cast keeps in records 1 and 2
const HEADER_PARAMS: [&str; 5] = [
    params::EXPOCODE,
    params::SECT_ID,
    params::DATE,
    params::STNNBR,
    params::CASTNO,
];

pub fn read(ctx: &CodecContext, bytes: &[u8]) -> Result<DataFile> {
    let text = decode_text(bytes)?;
    let mut cursor = LineCursor::new(text);
    let mut file = DataFile::new();

    let line = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_stamp("empty file"))?;
    let first = RECORD_ONE
        .captures(line)
        .ok_or_else(|| Error::malformed_stamp(format!("unrecognized CTD record 1: '{}'", line)))?;

    let line = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header("missing CTD record 2"))?;
    let second = RECORD_TWO
        .captures(line)
        .ok_or_else(|| Error::malformed_header(format!("unrecognized CTD record 2: '{}'", line)))?;
    let declared: usize = second[3]
        .parse()
        .map_err(|_| Error::malformed_header(format!("bad record count '{}'", &second[3])))?;

    let date = woce_date_to_iso(&first[3])?;
    let tokens = [&first[1], &first[2], date.as_str(), &second[1], &second[2]];
    for (name, token) in HEADER_PARAMS.iter().zip(tokens) {
        let parameter = ctx.registry.lookup(name)?;
        let value = parse_value(&parameter, 0, token)?;
        file.set_global(parameter, value);
    }
    if let Some(stamp) = first.get(4) {
        file.stamp = check_stamp(stamp.as_str())?;
    }

    let instrument = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header("missing instrument record"))?;
    file.header = terminated(instrument);

    let rows = read_block(ctx, &mut cursor, &mut file)?;
    if rows != declared {
        return Err(Error::malformed_header(format!(
            "NO.RECORDS={} but {} data rows",
            declared, rows
        )));
    }
    file.footer = cursor.rest();

    debug!(
        "Read WOCE CTD cast: {} columns, {} rows",
        file.column_count(),
        rows
    );
    Ok(file)
}

pub fn write(ctx: &CodecContext, file: &DataFile) -> Result<Vec<u8>> {
    let mut data = file.clone();
    let mut tokens = Vec::with_capacity(HEADER_PARAMS.len());
    for name in HEADER_PARAMS {
        tokens.push(record_token(ctx, &data, name)?);
        data.remove_column(name);
    }

    for global in data.take_globals() {
        if !HEADER_PARAMS.contains(&global.name()) {
            warn!(
                "WOCE CTD records have no place for {}; value dropped",
                global.name()
            );
        }
    }
    let rows = data.check_row_alignment()?;

    let date = match file.value_at(params::DATE, 0) {
        Some(date) => iso_date_to_woce(&date.to_string())?,
        None => return Err(Error::missing_column(params::DATE)),
    };
    let instrument = file
        .header
        .lines()
        .find(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .unwrap_or(DEFAULT_INSTRUMENT_LINE);

    let mut out = format!(
        "EXPOCODE {} WHP-ID {} DATE {} {}\n",
        tokens[0],
        tokens[1],
        date,
        ctx.stamp_for(file)
    );
    out.push_str(&format!(
        "STNNBR {} CASTNO {} NO.RECORDS={}\n",
        tokens[3], tokens[4], rows
    ));
    out.push_str(instrument);
    out.push('\n');
    out.push_str(&write_block(&data.sorted_columns(), rows));
    out.push_str(&file.footer);
    Ok(out.into_bytes())
}
