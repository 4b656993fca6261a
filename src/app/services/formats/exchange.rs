//! Exchange codec: comma-delimited bottle files and CTD cast members
//!
//! ```text
//! BOTTLE,20080101SIOCCHDOJFS
//! #comment lines
//! NUMBER_HEADERS = 3          (CTD only, counts itself)
//! EXPOCODE = 33RR20070322     (CTD only)
//! STNNBR = 1
//! CTDPRS,CTDPRS_FLAG_W,...
//! DBAR,,...
//!     2.0,2,...
//! END_DATA
//! ```

use super::primitives::{
    LineCursor, check_flag_for_value, check_stamp, check_units, decode_text, field_width,
    flag_char, format_value, parse_flag, parse_value, terminated,
};
use super::{CodecContext, Encoding, FileCodec, FileKind};
use crate::app::models::{Column, DataFile};
use crate::app::services::parameter_registry::Parameter;
use crate::constants::{
    END_DATA, EXCHANGE_BOTTLE_ID, EXCHANGE_CTD_ID, FlagKind, NUMBER_HEADERS, igoss_flag_column,
    params, split_flag_column, woce_flag_column,
};
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static NUMBER_HEADERS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^NUMBER_HEADERS\s*=\s*(\d+)\s*$").expect("header count pattern is valid")
});

static HEADER_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w+)\s*=\s*(.*?)\s*$").expect("header assignment pattern is valid")
});

/// Exchange text codec
#[derive(Debug, Clone, Copy, Default)]
pub struct ExchangeCodec;

/// Where a value column and its flags sit among the delimited fields
#[derive(Debug)]
struct FieldLayout {
    parameter: Arc<Parameter>,
    value_index: usize,
    woce_index: Option<usize>,
    igoss_index: Option<usize>,
}

impl FileCodec for ExchangeCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Exchange
    }

    fn read_file(&self, ctx: &CodecContext, kind: FileKind, bytes: &[u8]) -> Result<DataFile> {
        let identifier = identifier_for(kind).ok_or_else(|| self.unsupported(kind, "read"))?;
        let text = decode_text(bytes)?;
        let mut cursor = LineCursor::new(text);
        let mut file = DataFile::new();

        file.stamp = read_stamp_line(&mut cursor, identifier)?;
        file.header = read_comment_header(&mut cursor);
        if kind == FileKind::Ctd {
            read_ctd_headers(ctx, &mut cursor, &mut file)?;
        }

        let layouts = read_column_header(ctx, &mut cursor, &mut file)?;
        if kind == FileKind::Bottle {
            check_bottle_identifier(&file)?;
        }

        let rows = read_data(&mut cursor, &layouts, &mut file)?;
        file.footer = cursor.rest();
        mark_declared_flags(&layouts, rows, &mut file);
        file.check_row_alignment()?;

        debug!(
            "Read Exchange {} file: {} columns, {} rows",
            kind,
            file.column_count(),
            rows
        );
        Ok(file)
    }

    fn write_file(&self, ctx: &CodecContext, kind: FileKind, file: &DataFile) -> Result<Vec<u8>> {
        let identifier = identifier_for(kind).ok_or_else(|| self.unsupported(kind, "write"))?;
        let rows = file.check_row_alignment()?;
        let mut out = String::new();

        out.push_str(&format!("{},{}\n", identifier, ctx.stamp_for(file)));
        for line in file.header.lines() {
            if line.starts_with('#') {
                out.push_str(line);
            } else {
                out.push('#');
                out.push_str(line);
            }
            out.push('\n');
        }

        // Bottle files have no header block for globals; they become columns
        let mut owned = None;
        let data: &DataFile = match kind {
            FileKind::Ctd => {
                out.push_str(&format!(
                    "{} = {}\n",
                    NUMBER_HEADERS,
                    file.globals().len() + 1
                ));
                for global in file.globals() {
                    out.push_str(&format!(
                        "{} = {}\n",
                        global.name(),
                        format_value(&global.parameter, global.value.as_ref())
                    ));
                }
                file
            }
            _ => {
                if file.globals().is_empty() {
                    file
                } else {
                    &*owned.insert(file.globals_to_columns()?)
                }
            }
        };

        let columns = data.sorted_columns();
        let mut names = Vec::new();
        let mut units = Vec::new();
        for column in &columns {
            names.push(column.name().to_string());
            units.push(column.parameter().units_str().to_string());
            if column.is_flagged_woce() {
                names.push(woce_flag_column(column.name()));
                units.push(String::new());
            }
            if column.is_flagged_igoss() {
                names.push(igoss_flag_column(column.name()));
                units.push(String::new());
            }
        }
        out.push_str(&names.join(","));
        out.push('\n');
        out.push_str(&units.join(","));
        out.push('\n');

        let widths: Vec<usize> = columns
            .iter()
            .map(|c| field_width(c.parameter()))
            .collect();
        for row in 0..rows {
            let mut fields = Vec::with_capacity(names.len());
            for (column, width) in columns.iter().zip(&widths) {
                let value = format_value(column.parameter(), column.get(row));
                fields.push(format!("{:>width$}", value, width = *width));
                if column.is_flagged_woce() {
                    fields.push(flag_char(column.flag_woce(row)).to_string());
                }
                if column.is_flagged_igoss() {
                    fields.push(flag_char(column.flag_igoss(row)).to_string());
                }
            }
            out.push_str(&fields.join(","));
            out.push('\n');
        }

        out.push_str(END_DATA);
        out.push('\n');
        out.push_str(&file.footer);
        Ok(out.into_bytes())
    }
}

fn identifier_for(kind: FileKind) -> Option<&'static str> {
    match kind {
        FileKind::Bottle => Some(EXCHANGE_BOTTLE_ID),
        FileKind::Ctd => Some(EXCHANGE_CTD_ID),
        FileKind::Summary => None,
    }
}

fn read_stamp_line(cursor: &mut LineCursor<'_>, identifier: &str) -> Result<String> {
    let line = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_stamp("empty file"))?;
    let (found, stamp) = line
        .split_once(',')
        .ok_or_else(|| Error::malformed_stamp(format!("expected '{},<stamp>'", identifier)))?;
    if found.trim() != identifier {
        return Err(Error::malformed_stamp(format!(
            "expected file type {}, found '{}'",
            identifier,
            found.trim()
        )));
    }
    check_stamp(stamp)
}

fn read_comment_header(cursor: &mut LineCursor<'_>) -> String {
    let mut header = String::new();
    while cursor.peek().is_some_and(|line| line.starts_with('#')) {
        if let Some(raw) = cursor.next_raw() {
            header.push_str(&terminated(raw.trim_end_matches(['\r', '\n'])));
        }
    }
    header
}

fn read_ctd_headers(
    ctx: &CodecContext,
    cursor: &mut LineCursor<'_>,
    file: &mut DataFile,
) -> Result<()> {
    let line = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header(format!("missing {}", NUMBER_HEADERS)))?;
    let count: usize = NUMBER_HEADERS_LINE
        .captures(line)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| {
            Error::malformed_header(format!("expected '{} = n', found '{}'", NUMBER_HEADERS, line))
        })?;
    if count == 0 {
        return Err(Error::malformed_header(format!(
            "{} must count itself",
            NUMBER_HEADERS
        )));
    }

    for _ in 1..count {
        let line = cursor
            .next_line()
            .ok_or_else(|| Error::malformed_header("fewer header lines than declared"))?;
        let captures = HEADER_ASSIGNMENT
            .captures(line)
            .ok_or_else(|| Error::malformed_header(format!("expected 'KEY = value', found '{}'", line)))?;
        let parameter = ctx.registry.lookup(&captures[1])?;
        if file.global(&parameter.name).is_some() {
            return Err(Error::duplicate_parameter(&parameter.name));
        }
        let value = parse_value(&parameter, 0, &captures[2])?;
        file.set_global(parameter, value);
    }
    Ok(())
}

fn read_column_header(
    ctx: &CodecContext,
    cursor: &mut LineCursor<'_>,
    file: &mut DataFile,
) -> Result<Vec<FieldLayout>> {
    let names_line = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header("missing parameter line"))?;
    let units_line = cursor
        .next_line()
        .ok_or_else(|| Error::malformed_header("missing units line"))?;

    let names: Vec<&str> = names_line.split(',').map(str::trim).collect();
    let units: Vec<&str> = units_line.split(',').map(str::trim).collect();
    if names.len() != units.len() {
        return Err(Error::malformed_header(format!(
            "{} parameters but {} units",
            names.len(),
            units.len()
        )));
    }
    if names.iter().any(|n| n.is_empty()) {
        return Err(Error::malformed_header("empty parameter name"));
    }

    let mut layouts: Vec<FieldLayout> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for (index, name) in names.iter().enumerate() {
        if split_flag_column(name).is_some() {
            continue;
        }
        let parameter = ctx.registry.lookup(name)?;
        if by_name.contains_key(&parameter.name) || file.global(&parameter.name).is_some() {
            return Err(Error::duplicate_parameter(&parameter.name));
        }
        check_units(ctx, &parameter, units[index])?;
        by_name.insert(parameter.name.clone(), layouts.len());
        layouts.push(FieldLayout {
            parameter,
            value_index: index,
            woce_index: None,
            igoss_index: None,
        });
    }

    for (index, name) in names.iter().enumerate() {
        let Some((base, kind)) = split_flag_column(name) else {
            continue;
        };
        let canonical = ctx
            .registry
            .lookup(base)
            .map(|p| p.name.clone())
            .unwrap_or_else(|_| base.to_string());
        let layout = by_name
            .get(&canonical)
            .and_then(|i| layouts.get_mut(*i))
            .ok_or_else(|| Error::malformed_flag(*name, 0, "flag column without a value column"))?;
        let slot = match kind {
            FlagKind::Woce => &mut layout.woce_index,
            FlagKind::Igoss => &mut layout.igoss_index,
        };
        if slot.is_some() {
            return Err(Error::duplicate_parameter(*name));
        }
        *slot = Some(index);
    }

    for layout in &layouts {
        file.add_column(Column::new(layout.parameter.clone()))?;
    }
    Ok(layouts)
}

fn check_bottle_identifier(file: &DataFile) -> Result<()> {
    let has = |name: &str| file.has_column(name) || file.global(name).is_some();
    let keyed = has(params::EXPOCODE) && has(params::STNNBR) && has(params::CASTNO);
    if keyed && !has(params::SAMPNO) && !has(params::BTLNBR) {
        return Err(Error::malformed_header(
            "bottle file needs SAMPNO or BTLNBR to identify rows",
        ));
    }
    Ok(())
}

fn read_data(
    cursor: &mut LineCursor<'_>,
    layouts: &[FieldLayout],
    file: &mut DataFile,
) -> Result<usize> {
    let field_count = layouts
        .iter()
        .map(|l| {
            1 + usize::from(l.woce_index.is_some()) + usize::from(l.igoss_index.is_some())
        })
        .sum::<usize>();
    let mut row = 0;

    loop {
        let line = cursor.next_line().ok_or_else(|| {
            Error::malformed_footer(format!("missing {} terminator", END_DATA))
        })?;
        if line.trim() == END_DATA {
            return Ok(row);
        }
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != field_count {
            return Err(Error::malformed_data(
                cursor.line_number(),
                format!("expected {} fields, found {}", field_count, fields.len()),
            ));
        }

        for layout in layouts {
            let name = &layout.parameter.name;
            let value = parse_value(&layout.parameter, row, fields[layout.value_index])?;
            let flag_woce = match layout.woce_index {
                Some(i) => parse_flag(name, row, fields[i])?,
                None => None,
            };
            let flag_igoss = match layout.igoss_index {
                Some(i) => parse_flag(name, row, fields[i])?,
                None => None,
            };
            check_flag_for_value(name, row, value.as_ref(), flag_woce)?;

            if let Some(column) = file.column_mut(name) {
                column.set(row, value, flag_woce, flag_igoss);
            }
        }
        row += 1;
    }
}

/// A flag column named in the header stays flagged even when every entry is blank
fn mark_declared_flags(layouts: &[FieldLayout], rows: usize, file: &mut DataFile) {
    for layout in layouts {
        let Some(column) = file.column_mut(&layout.parameter.name) else {
            continue;
        };
        column.pad_to(rows);
        for (declared, kind) in [
            (layout.woce_index.is_some(), FlagKind::Woce),
            (layout.igoss_index.is_some(), FlagKind::Igoss),
        ] {
            let current = match kind {
                FlagKind::Woce => column.flags_woce(),
                FlagKind::Igoss => column.flags_igoss(),
            };
            if declared && rows > 0 && current.len() < rows {
                let mut flags = current.to_vec();
                flags.resize(rows, None);
                column.replace_flags(kind, flags);
            }
        }
    }
}
