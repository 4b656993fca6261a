//! WOCE cruise summary (`su.txt`)
//!
//! One row per cast event. Field spans are taken from the column-name line
//! just above the dashed separator, so the layout is whatever the header
//! says it is.

use crate::app::models::DataFile;
use crate::app::services::formats::CodecContext;
use crate::app::services::formats::primitives::{
    LineCursor, check_stamp, decode_text, format_value, is_stamp, iso_date_to_woce, parse_value,
    validate_number, woce_date_to_iso,
};
use crate::app::services::parameter_registry::Parameter;
use crate::constants::params;
use crate::{Error, Result};
use regex::Regex;
use std::ops::Range;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-+\s*$").expect("separator pattern is valid"));

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+").expect("token pattern is valid"));

/// Positional meaning of the summary fields
const FIELDS: [&str; 19] = [
    params::EXPOCODE,
    params::SECT_ID,
    params::STNNBR,
    params::CASTNO,
    "_CAST_TYPE",
    params::DATE,
    params::TIME,
    "_CODE",
    params::LATITUDE,
    params::LONGITUDE,
    "_NAV",
    UNCORRECTED_DEPTH,
    params::DEPTH,
    "_ABOVE_BOTTOM",
    "_WIRE_OUT",
    "_MAX_PRESSURE",
    "_NUM_BOTTLES",
    "_PARAMETERS",
    "_COMMENTS",
];

const UNCORRECTED_DEPTH: &str = "_UNC_DEPTH";

const MIN_FIELDS: usize = 12;

const DEFAULT_HEADER: &str = "\
SHIP/CRS       WOCE                        CAST         UTC  EVENT   POSITION                  UNC    COR    ABOVE  WIRE   MAX    NO. OF
EXPOCODE       SECT   STNNBR CASTNO TYPE DATE   TIME CODE LATITUDE   LONGITUDE    NAV DEPTH  DEPTH  BOTTOM WIRE   PRESS  BOTTLES PARAMETERS       COMMENTS
";

/// Parameter names for a header with `spans` columns
///
/// Older files carry a single depth column; the uncorrected depth is only
/// present when the header has room for every field.
fn field_names(spans: usize) -> Vec<&'static str> {
    let names = FIELDS.iter().copied();
    if spans >= FIELDS.len() {
        names.collect()
    } else {
        names.filter(|n| *n != UNCORRECTED_DEPTH).take(spans).collect()
    }
}

fn column_spans(names_line: &str) -> Vec<Range<usize>> {
    let starts: Vec<usize> = TOKEN
        .find_iter(names_line)
        .enumerate()
        .map(|(i, m)| if i == 0 { 0 } else { m.start() })
        .collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, start)| *start..starts.get(i + 1).copied().unwrap_or(usize::MAX))
        .collect()
}

fn cut<'a>(line: &'a str, span: &Range<usize>) -> &'a str {
    let end = span.end.min(line.len());
    let start = span.start.min(end);
    line.get(start..end).unwrap_or("").trim()
}

pub fn read(ctx: &CodecContext, bytes: &[u8]) -> Result<DataFile> {
    let text = decode_text(bytes)?;
    let mut cursor = LineCursor::new(text);
    let mut file = DataFile::new();

    let first = cursor
        .next_raw()
        .ok_or_else(|| Error::malformed_header("empty file"))?;
    match first.split_whitespace().last() {
        Some(token) if is_stamp(token) => file.stamp = check_stamp(token)?,
        _ => debug!("Summary record 1 carries no stamp"),
    }

    let mut header = first.to_string();
    let mut names_line = "";
    loop {
        let raw = cursor
            .next_raw()
            .ok_or_else(|| Error::malformed_header("missing dashed separator line"))?;
        header.push_str(raw);
        let line = raw.trim_end_matches(['\r', '\n']);
        if SEPARATOR.is_match(line) {
            break;
        }
        names_line = line;
    }
    file.header = header;

    let spans = column_spans(names_line);
    if spans.len() < MIN_FIELDS {
        return Err(Error::malformed_header(format!(
            "{} summary columns, need at least {}",
            spans.len(),
            MIN_FIELDS
        )));
    }
    if spans.len() > FIELDS.len() {
        warn!(
            "Summary header has {} columns; extra columns are ignored",
            spans.len()
        );
    }
    let parameters = field_names(spans.len())
        .into_iter()
        .map(|name| ctx.registry.lookup(name))
        .collect::<Result<Vec<Arc<Parameter>>>>()?;
    for parameter in &parameters {
        file.ensure_column(parameter);
    }

    let mut row = 0;
    while let Some(line) = cursor.peek() {
        if line.trim().is_empty() {
            break;
        }
        cursor.next_line();
        let line_number = cursor.line_number();
        if !line.is_ascii() {
            return Err(Error::malformed_data(
                line_number,
                "non-ASCII characters in a fixed-width row",
            ));
        }

        for (parameter, span) in parameters.iter().zip(&spans) {
            let token = cut(line, span);
            let value = match parameter.name.as_str() {
                params::EXPOCODE => parse_value(parameter, row, &token.replace('/', "_"))?,
                params::DATE if !token.is_empty() => {
                    let date = woce_date_to_iso(token)
                        .map_err(|e| Error::malformed_data(line_number, e.to_string()))?;
                    parse_value(parameter, row, &date)?
                }
                params::LATITUDE | params::LONGITUDE if !token.is_empty() => {
                    let degrees = parse_coordinate(token).ok_or_else(|| {
                        Error::malformed_data(
                            line_number,
                            format!("unreadable {} '{}'", parameter.name, token),
                        )
                    })?;
                    validate_number(parameter, row, degrees)?
                }
                _ => parse_value(parameter, row, token)?,
            };
            if let Some(column) = file.column_mut(&parameter.name) {
                column.set(row, value, None, None);
            }
        }
        row += 1;
    }
    file.footer = cursor.rest();

    debug!("Read WOCE summary: {} casts", row);
    Ok(file)
}

pub fn write(ctx: &CodecContext, file: &DataFile) -> Result<Vec<u8>> {
    let rows = file.check_row_alignment()?;
    let stamp = ctx.stamp_for(file);

    let header = if file.header.trim().is_empty() {
        format!("CRUISE SUMMARY {}\n{}{}\n", stamp, DEFAULT_HEADER, dashes())
    } else {
        restamp(&file.header, &stamp)
    };

    let lines: Vec<&str> = header.lines().collect();
    let separator = lines
        .iter()
        .position(|l| SEPARATOR.is_match(l))
        .filter(|i| *i > 0)
        .ok_or_else(|| Error::malformed_header("stored summary header has no separator"))?;
    let spans = column_spans(lines[separator - 1]);
    if spans.len() < MIN_FIELDS {
        return Err(Error::malformed_header(format!(
            "{} summary columns, need at least {}",
            spans.len(),
            MIN_FIELDS
        )));
    }
    let parameters = field_names(spans.len())
        .into_iter()
        .map(|name| ctx.registry.lookup(name))
        .collect::<Result<Vec<Arc<Parameter>>>>()?;

    let mut out = header.clone();
    for row in 0..rows {
        let mut line = String::new();
        for (parameter, span) in parameters.iter().zip(&spans) {
            let text = render(parameter, file, row)?;
            if span.end == usize::MAX {
                line.push_str(&text);
                continue;
            }
            let width = span.end - span.start;
            if text.len() > width {
                return Err(Error::not_supported(format!(
                    "{} value '{}' wider than its {} character summary column",
                    parameter.name, text, width
                )));
            }
            line.push_str(&format!("{:<w$}", text, w = width));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str(&file.footer);
    Ok(out.into_bytes())
}

fn render(parameter: &Parameter, file: &DataFile, row: usize) -> Result<String> {
    let Some(value) = file.value_at(&parameter.name, row) else {
        return Ok(String::new());
    };
    match (parameter.name.as_str(), value.as_f64()) {
        (params::DATE, _) => iso_date_to_woce(&value.to_string()),
        (params::LATITUDE, Some(degrees)) => Ok(format_coordinate(degrees, 2, ('N', 'S'))),
        (params::LONGITUDE, Some(degrees)) => Ok(format_coordinate(degrees, 3, ('E', 'W'))),
        _ => Ok(format_value(parameter, Some(value))),
    }
}

/// Replace the trailing stamp token of the header's first line, or append
/// one when the line has none
fn restamp(header: &str, stamp: &str) -> String {
    let (first, rest) = header.split_once('\n').unwrap_or((header, ""));
    let first = first.trim_end();
    let keep = first
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let (kept, last) = first.split_at(keep);
    if is_stamp(last) {
        format!("{}{}\n{}", kept, stamp, rest)
    } else if first.is_empty() {
        format!("{}\n{}", stamp, rest)
    } else {
        format!("{}  {}\n{}", first, stamp, rest)
    }
}

fn dashes() -> String {
    let width = DEFAULT_HEADER
        .lines()
        .map(str::len)
        .max()
        .unwrap_or(0);
    "-".repeat(width)
}

/// `DD MM.mm H`, `DD.dddd H` or signed decimal degrees
fn parse_coordinate(token: &str) -> Option<f64> {
    let parts: Vec<&str> = token.split_whitespace().collect();
    let (magnitude, hemisphere) = match parts.as_slice() {
        [degrees, minutes, hemisphere] => {
            let degrees: f64 = degrees.parse().ok()?;
            let minutes: f64 = minutes.parse().ok()?;
            (degrees + minutes / 60.0, Some(*hemisphere))
        }
        [degrees, hemisphere] => (degrees.parse().ok()?, Some(*hemisphere)),
        [degrees] => (degrees.parse().ok()?, None),
        _ => return None,
    };
    match hemisphere {
        None => Some(magnitude),
        Some("N") | Some("E") => Some(magnitude),
        Some("S") | Some("W") => Some(-magnitude),
        Some(_) => None,
    }
}

fn format_coordinate(degrees: f64, width: usize, (positive, negative): (char, char)) -> String {
    let hemisphere = if degrees < 0.0 { negative } else { positive };
    let total_minutes = (degrees.abs() * 60.0 * 100.0).round() / 100.0;
    let whole = (total_minutes / 60.0).floor();
    let minutes = total_minutes - whole * 60.0;
    format!(
        "{:>w$} {:05.2} {}",
        whole as i64,
        minutes,
        hemisphere,
        w = width
    )
}
