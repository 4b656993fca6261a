//! Fixed-width parameter block shared by WOCE bottle and CTD files
//!
//! Three header lines (names, units, asterisks) followed by right-justified
//! rows. Columns marked with `*` carry one digit each in the `QUALT1`
//! (WOCE) and `QUALT2` (IGOSS) quality words.

use crate::app::models::{Column, DataFile};
use crate::app::services::formats::CodecContext;
use crate::app::services::formats::primitives::{
    LineCursor, check_flag_for_value, check_units, field_width, flag_char, format_value,
    parse_value,
};
use crate::app::services::parameter_registry::Parameter;
use crate::constants::{FlagKind, MAX_FLAG, QUALT_IGOSS, QUALT_WOCE};
use crate::{Error, Result};
use regex::Regex;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+").expect("token pattern is valid"));

#[derive(Debug)]
enum Slot {
    Value {
        parameter: Arc<Parameter>,
        flagged: bool,
    },
    Quality(FlagKind),
}

#[derive(Debug)]
struct Field {
    span: Range<usize>,
    slot: Slot,
}

/// Read the names/units/asterisk lines and the data rows into `file`
///
/// Returns the number of rows read. Reading stops at the first blank line
/// or at end of input; the blank line is left unread for the footer.
pub fn read_block(
    ctx: &CodecContext,
    cursor: &mut LineCursor<'_>,
    file: &mut DataFile,
) -> Result<usize> {
    let names = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header("missing parameter line"))?;
    let units = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header("missing units line"))?;
    let asterisks = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header("missing asterisk line"))?;

    let fields = resolve_fields(ctx, names, units, asterisks, file)?;
    let flagged: Vec<String> = fields
        .iter()
        .filter_map(|f| match &f.slot {
            Slot::Value {
                parameter,
                flagged: true,
            } => Some(parameter.name.clone()),
            _ => None,
        })
        .collect();

    let mut row = 0;
    while let Some(line) = cursor.peek() {
        if line.trim().is_empty() {
            break;
        }
        cursor.next_line();
        if !line.is_ascii() {
            return Err(Error::malformed_data(
                cursor.line_number(),
                "non-ASCII characters in a fixed-width row",
            ));
        }

        let mut woce_word: Option<Vec<Option<u8>>> = None;
        let mut igoss_word: Option<Vec<Option<u8>>> = None;
        for field in &fields {
            if let Slot::Quality(kind) = field.slot {
                let word = quality_word(kind, row, cut(line, &field.span), flagged.len())?;
                match kind {
                    FlagKind::Woce => woce_word = Some(word),
                    FlagKind::Igoss => igoss_word = Some(word),
                }
            }
        }

        let mut flag_index = 0;
        for field in &fields {
            let Slot::Value { parameter, flagged } = &field.slot else {
                continue;
            };
            let value = parse_value(parameter, row, cut(line, &field.span))?;
            let (flag_woce, flag_igoss) = if *flagged {
                let index = flag_index;
                flag_index += 1;
                let pick = |word: &Option<Vec<Option<u8>>>| {
                    word.as_ref().and_then(|w| w.get(index).copied().flatten())
                };
                (pick(&woce_word), pick(&igoss_word))
            } else {
                (None, None)
            };
            check_flag_for_value(&parameter.name, row, value.as_ref(), flag_woce)?;
            if let Some(column) = file.column_mut(&parameter.name) {
                column.set(row, value, flag_woce, flag_igoss);
            }
        }
        row += 1;
    }

    let has_quality = |kind: FlagKind| {
        fields
            .iter()
            .any(|f| matches!(f.slot, Slot::Quality(k) if k == kind))
    };
    for name in &flagged {
        if let Some(column) = file.column_mut(name) {
            column.pad_to(row);
            for kind in [FlagKind::Woce, FlagKind::Igoss] {
                if has_quality(kind) && row > 0 {
                    let mut flags = match kind {
                        FlagKind::Woce => column.flags_woce().to_vec(),
                        FlagKind::Igoss => column.flags_igoss().to_vec(),
                    };
                    flags.resize(row, None);
                    column.replace_flags(kind, flags);
                }
            }
        }
    }
    for field in &fields {
        if let Slot::Value { parameter, .. } = &field.slot {
            if let Some(column) = file.column_mut(&parameter.name) {
                column.pad_to(row);
            }
        }
    }

    Ok(row)
}

fn resolve_fields(
    ctx: &CodecContext,
    names: &str,
    units: &str,
    asterisks: &str,
    file: &mut DataFile,
) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    let mut start = 0;

    for token in TOKEN.find_iter(names) {
        let span = start..token.end();
        start = token.end();
        let name = token.as_str();

        let slot = match name {
            QUALT_WOCE => Slot::Quality(FlagKind::Woce),
            QUALT_IGOSS => Slot::Quality(FlagKind::Igoss),
            _ => {
                let parameter = ctx.registry.lookup(name)?;
                if file.has_column(&parameter.name) || file.global(&parameter.name).is_some() {
                    return Err(Error::duplicate_parameter(&parameter.name));
                }
                check_units(ctx, &parameter, cut(units, &span))?;
                file.add_column(Column::new(parameter.clone()))?;
                Slot::Value {
                    parameter,
                    flagged: cut(asterisks, &span).contains('*'),
                }
            }
        };
        fields.push(Field { span, slot });
    }

    if fields.is_empty() {
        return Err(Error::malformed_header("empty parameter line"));
    }
    Ok(fields)
}

/// Text of `line` within `span`, trimmed; short lines yield what they have
fn cut<'a>(line: &'a str, span: &Range<usize>) -> &'a str {
    let end = span.end.min(line.len());
    let start = span.start.min(end);
    line.get(start..end).unwrap_or("").trim()
}

fn quality_word(kind: FlagKind, row: usize, word: &str, expected: usize) -> Result<Vec<Option<u8>>> {
    let name = match kind {
        FlagKind::Woce => QUALT_WOCE,
        FlagKind::Igoss => QUALT_IGOSS,
    };
    if word.is_empty() {
        return Ok(vec![None; expected]);
    }
    if word.len() != expected {
        return Err(Error::malformed_flag(
            name,
            row,
            format!(
                "quality word '{}' has {} digits for {} flagged columns",
                word,
                word.len(),
                expected
            ),
        ));
    }
    word.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if d <= u32::from(MAX_FLAG) => Ok(Some(d as u8)),
            _ => Err(Error::malformed_flag(
                name,
                row,
                format!("'{}' is not a flag digit", c),
            )),
        })
        .collect()
}

/// Render `columns` as a fixed-width block, rows terminated by newlines
pub fn write_block(columns: &[&Column], rows: usize) -> String {
    let flagged: Vec<&Column> = columns.iter().copied().filter(|c| c.is_flagged()).collect();
    let with_woce = flagged.iter().any(|c| c.is_flagged_woce());
    let with_igoss = flagged.iter().any(|c| c.is_flagged_igoss());

    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            let parameter = column.parameter();
            let longest = (0..rows)
                .map(|row| format_value(parameter, column.get(row)).len())
                .max()
                .unwrap_or(0);
            1 + column
                .name()
                .len()
                .max(parameter.units_str().len())
                .max(field_width(parameter))
                .max(longest)
        })
        .collect();
    let quality_width = 1 + QUALT_WOCE.len().max(flagged.len());

    let mut names = String::new();
    let mut units = String::new();
    let mut stars = String::new();
    for (column, width) in columns.iter().zip(&widths) {
        names.push_str(&format!("{:>w$}", column.name(), w = *width));
        units.push_str(&format!("{:>w$}", column.parameter().units_str(), w = *width));
        let mark = if column.is_flagged() {
            "*".repeat(width - 1)
        } else {
            String::new()
        };
        stars.push_str(&format!("{:>w$}", mark, w = *width));
    }
    for (present, name) in [(with_woce, QUALT_WOCE), (with_igoss, QUALT_IGOSS)] {
        if present {
            names.push_str(&format!("{:>w$}", name, w = quality_width));
            units.push_str(&format!("{:>w$}", "*", w = quality_width));
            stars.push_str(&format!("{:>w$}", "*", w = quality_width));
        }
    }

    let mut out = String::new();
    for line in [names, units, stars] {
        out.push_str(line.trim_end());
        out.push('\n');
    }

    for row in 0..rows {
        let mut line = String::new();
        for (column, width) in columns.iter().zip(&widths) {
            let value = format_value(column.parameter(), column.get(row));
            line.push_str(&format!("{:>w$}", value, w = *width));
        }
        if with_woce {
            let word: String = flagged.iter().map(|c| flag_char(c.flag_woce(row))).collect();
            line.push_str(&format!("{:>w$}", word, w = quality_width));
        }
        if with_igoss {
            let word: String = flagged.iter().map(|c| flag_char(c.flag_igoss(row))).collect();
            line.push_str(&format!("{:>w$}", word, w = quality_width));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}
