//! WOCE bottle file (`hy.txt`)

use super::columnar::{read_block, write_block};
use super::record_token;
use crate::app::models::{DataFile, Value};
use crate::app::services::formats::CodecContext;
use crate::app::services::formats::primitives::{
    LineCursor, check_stamp, decode_text, iso_date_to_woce, parse_value,
};
use crate::constants::params;
use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static RECORD_ONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^EXPOCODE\s+(\S+)\s+WHP-?ID\s+(\S+)\s+CRUISE DATES\s+(\d{6}) TO (\d{6})(?:\s+(\w+))?\s*$",
    )
    .expect("bottle record pattern is valid")
});

/// Globals carried by record 1, in the order they are stored
const RECORD_ONE_PARAMS: [&str; 4] = [
    params::EXPOCODE,
    params::SECT_ID,
    params::BEGIN_DATE,
    params::END_DATE,
];

pub fn read(ctx: &CodecContext, bytes: &[u8]) -> Result<DataFile> {
    let text = decode_text(bytes)?;
    let mut cursor = LineCursor::new(text);
    let mut file = DataFile::new();

    let line = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_stamp("empty file"))?;
    let captures = RECORD_ONE.captures(line).ok_or_else(|| {
        Error::malformed_stamp(format!("unrecognized bottle record 1: '{}'", line))
    })?;

    for (index, name) in RECORD_ONE_PARAMS.iter().enumerate() {
        let parameter = ctx.registry.lookup(name)?;
        let value = parse_value(&parameter, 0, &captures[index + 1])?;
        file.set_global(parameter, value);
    }
    if let Some(stamp) = captures.get(5) {
        file.stamp = check_stamp(stamp.as_str())?;
    }

    let rows = read_block(ctx, &mut cursor, &mut file)?;
    for required in [params::STNNBR, params::CASTNO] {
        if !file.has_column(required) {
            return Err(Error::malformed_header(format!(
                "bottle parameter record lacks {}",
                required
            )));
        }
    }
    file.footer = cursor.rest();

    debug!(
        "Read WOCE bottle file: {} columns, {} rows",
        file.column_count(),
        rows
    );
    Ok(file)
}

pub fn write(ctx: &CodecContext, file: &DataFile) -> Result<Vec<u8>> {
    let expocode = record_token(ctx, file, params::EXPOCODE)?;
    let section = record_token(ctx, file, params::SECT_ID)?;
    let (begin, end) = cruise_dates(file)?;

    let mut data = file.clone();
    for name in RECORD_ONE_PARAMS {
        data.remove_column(name);
    }
    for global in data.take_globals() {
        if !RECORD_ONE_PARAMS.contains(&global.name()) {
            data.set_global(global.parameter, global.value);
        }
    }
    let data = data.globals_to_columns()?;
    let rows = data.check_row_alignment()?;
    data.require_column(params::STNNBR)?;
    data.require_column(params::CASTNO)?;

    if !file.header.trim().is_empty() {
        warn!("WOCE bottle files have no header section; header text dropped");
    }

    let mut out = format!(
        "EXPOCODE {} WHP-ID {} CRUISE DATES {} TO {} {}\n",
        expocode,
        section,
        begin,
        end,
        ctx.stamp_for(file)
    );
    out.push_str(&write_block(&data.sorted_columns(), rows));
    out.push_str(&file.footer);
    Ok(out.into_bytes())
}

/// `MMDDYY` cruise begin and end, from the header globals or the DATE column
fn cruise_dates(file: &DataFile) -> Result<(String, String)> {
    let global_text = |name: &str| {
        file.global_value(name)
            .map(|v| v.to_string())
            .filter(|s| !s.trim().is_empty())
    };
    if let (Some(begin), Some(end)) = (
        global_text(params::BEGIN_DATE),
        global_text(params::END_DATE),
    ) {
        return Ok((begin, end));
    }

    let dates: Vec<String> = match file.column(params::DATE) {
        Some(column) => column
            .values()
            .iter()
            .flatten()
            .map(Value::to_string)
            .collect(),
        None => file
            .global_value(params::DATE)
            .map(|v| vec![v.to_string()])
            .unwrap_or_default(),
    };
    match (dates.iter().min(), dates.iter().max()) {
        (Some(first), Some(last)) => Ok((iso_date_to_woce(first)?, iso_date_to_woce(last)?)),
        _ => Err(Error::missing_column(params::DATE)),
    }
}
