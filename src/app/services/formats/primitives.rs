//! Parsing and formatting primitives shared by every codec
//!
//! Sentinel detection, value and flag parsing with range checks, unit
//! policy, stamp checks, WOCE date conversion and a line cursor that keeps
//! the raw text of header and footer sections.

use super::CodecContext;
use crate::app::models::Value;
use crate::app::services::parameter_registry::{FormatKind, Parameter};
use crate::config::UnitPolicy;
use crate::constants::{
    FILL_TOLERANCE, FILL_VALUE, MAX_FLAG, SENTINEL_PATTERN, STAMP_PATTERN, TEXT_FILL, woce_flags,
};
use crate::{Error, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static SENTINEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SENTINEL_PATTERN).expect("sentinel pattern is valid"));

static STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STAMP_PATTERN).expect("stamp pattern is valid"));

/// True for `-999`, `-999.0`, `-999.00`, `-999.9` ...
pub fn is_sentinel(token: &str) -> bool {
    SENTINEL.is_match(token.trim())
}

fn is_fill_number(value: f64) -> bool {
    (value - FILL_VALUE).abs() < FILL_TOLERANCE
}

/// Parse one field for `parameter`; empty and sentinel fields are absent
pub fn parse_value(parameter: &Parameter, row: usize, token: &str) -> Result<Option<Value>> {
    let token = token.trim();
    if token.is_empty() || is_sentinel(token) {
        return Ok(None);
    }

    match parameter.format.kind {
        FormatKind::Text => Ok(Some(Value::Text(token.to_string()))),
        FormatKind::Float | FormatKind::Integer => {
            let number: f64 = token
                .parse()
                .map_err(|_| Error::malformed_value(&parameter.name, row, token))?;
            if !number.is_finite() {
                return Err(Error::malformed_value(&parameter.name, row, token));
            }
            validate_number(parameter, row, number)
        }
    }
}

/// Apply fill, integrality and range rules to an already decoded number
pub fn validate_number(parameter: &Parameter, row: usize, number: f64) -> Result<Option<Value>> {
    if is_fill_number(number) {
        return Ok(None);
    }
    if parameter.format.kind == FormatKind::Integer && number.fract() != 0.0 {
        return Err(Error::malformed_value(
            &parameter.name,
            row,
            number.to_string(),
        ));
    }
    if let Some(bounds) = parameter.bounds {
        if !parameter.in_bounds(number) {
            return Err(Error::range(&parameter.name, row, number, bounds));
        }
    }
    Ok(Some(Value::Number(number)))
}

/// Parse a single-digit flag; empty is absent
pub fn parse_flag(parameter: &str, row: usize, token: &str) -> Result<Option<u8>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }
    match token.parse::<u8>() {
        Ok(flag) if flag <= MAX_FLAG && token.len() == 1 => Ok(Some(flag)),
        _ => Err(Error::malformed_flag(
            parameter,
            row,
            format!("'{}' is not a flag digit", token),
        )),
    }
}

/// A WOCE flag on an absent value must say the value is missing
pub fn check_flag_for_value(
    parameter: &str,
    row: usize,
    value: Option<&Value>,
    flag_woce: Option<u8>,
) -> Result<()> {
    if let (None, Some(flag)) = (value, flag_woce) {
        if !woce_flags::ABSENT_CODES.contains(&flag) {
            return Err(Error::malformed_flag(
                parameter,
                row,
                format!("flag {} given for a missing value", flag),
            ));
        }
    }
    Ok(())
}

/// Compare declared units with the registry according to the unit policy
pub fn check_units(ctx: &CodecContext, parameter: &Parameter, declared: &str) -> Result<()> {
    let declared = declared.trim();
    let expected = parameter.units_str();
    if declared == expected {
        return Ok(());
    }
    match ctx.config.unit_policy {
        UnitPolicy::Reject => Err(Error::unit_mismatch(&parameter.name, expected, declared)),
        UnitPolicy::Warn => {
            warn!(
                "Unit mismatch for {}: expected '{}', found '{}'",
                parameter.name, expected, declared
            );
            Ok(())
        }
    }
}

/// Accept a stamp, warning when it lacks the `YYYYMMDD` prefix
/// Whether `token` looks like a `YYYYMMDD` provenance stamp
pub fn is_stamp(token: &str) -> bool {
    STAMP.is_match(token.trim())
}

pub fn check_stamp(stamp: &str) -> Result<String> {
    let stamp = stamp.trim();
    if stamp.is_empty() || !stamp.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::malformed_stamp(format!("invalid stamp '{}'", stamp)));
    }
    if !STAMP.is_match(stamp) {
        warn!("Stamp '{}' does not start with a YYYYMMDD date", stamp);
    }
    Ok(stamp.to_string())
}

/// Text written for an absent value of `parameter`
pub fn fill_token(parameter: &Parameter) -> String {
    match parameter.format.kind {
        FormatKind::Float => format!("{:.*}", parameter.format.precision, FILL_VALUE),
        FormatKind::Integer | FormatKind::Text => TEXT_FILL.to_string(),
    }
}

/// Unpadded text of a value in the parameter's format
pub fn format_value(parameter: &Parameter, value: Option<&Value>) -> String {
    match value {
        None => fill_token(parameter),
        Some(Value::Text(s)) => s.clone(),
        Some(Value::Number(n)) => match parameter.format.kind {
            FormatKind::Float => format!("{:.*}", parameter.format.precision, n),
            FormatKind::Integer => format!("{}", n.round() as i64),
            FormatKind::Text => n.to_string(),
        },
    }
}

/// Minimum field width: the declared format width or the fill, whichever is wider
pub fn field_width(parameter: &Parameter) -> usize {
    parameter.format.width.max(fill_token(parameter).len())
}

/// Flag digit to write; absent flags are written as 9
pub fn flag_char(flag: Option<u8>) -> char {
    char::from(b'0' + flag.unwrap_or(woce_flags::NO_DATA).min(MAX_FLAG))
}

/// `MMDDYY` to `YYYYMMDD`
pub fn woce_date_to_iso(token: &str) -> Result<String> {
    NaiveDate::parse_from_str(token.trim(), "%m%d%y")
        .map(|d| d.format("%Y%m%d").to_string())
        .map_err(|_| Error::malformed_header(format!("invalid MMDDYY date '{}'", token)))
}

/// `YYYYMMDD` to `MMDDYY`
pub fn iso_date_to_woce(token: &str) -> Result<String> {
    NaiveDate::parse_from_str(token.trim(), "%Y%m%d")
        .map(|d| d.format("%m%d%y").to_string())
        .map_err(|_| Error::malformed_header(format!("invalid YYYYMMDD date '{}'", token)))
}

/// Decode UTF-8 text input
pub fn decode_text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::malformed_header(format!("input is not UTF-8 text: {}", e)))
}

/// Line-by-line reader that can hand back the untouched remainder
#[derive(Debug)]
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    position: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n').collect(),
            position: 0,
        }
    }

    /// Next line without its line terminator
    pub fn next_line(&mut self) -> Option<&'a str> {
        let raw = self.next_raw()?;
        Some(strip_newline(raw))
    }

    /// Next line including its terminator
    pub fn next_raw(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.position).copied()?;
        self.position += 1;
        Some(line)
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.position).map(|l| strip_newline(l))
    }

    /// 1-based number of the line most recently returned
    pub fn line_number(&self) -> usize {
        self.position
    }

    /// All unread text, verbatim
    pub fn rest(&mut self) -> String {
        let rest = self.lines[self.position..].concat();
        self.position = self.lines.len();
        rest
    }
}

fn strip_newline(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Ensure text is empty or ends in a newline
pub fn terminated(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}
