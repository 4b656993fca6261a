//! Mapping between a DataFile and the classic netCDF layout of a cruise member

use super::classic::{NcAttribute, NcFile, NcValues, NcVariable};
use crate::app::models::DataFile;
use crate::app::services::formats::primitives::{
    check_flag_for_value, check_stamp, check_units, format_value, parse_value, validate_number,
};
use crate::app::services::formats::{CodecContext, FileKind};
use crate::app::services::parameter_registry::FormatKind;
use crate::constants::{
    FILL_VALUE, FlagKind, MAX_FLAG, NETCDF_BOTTLE_TYPE, NETCDF_CTD_TYPE, NETCDF_LEVELS_DIM,
    igoss_flag_column, split_flag_column, woce_flag_column,
};
use crate::{Error, Result};
use tracing::debug;

const ATTR_DATA_TYPE: &str = "data_type";
const ATTR_STAMP: &str = "stamp";
const ATTR_HEADER: &str = "header";
const ATTR_FOOTER: &str = "footer";
const ATTR_WHP_NAME: &str = "whp_name";
const ATTR_UNITS: &str = "units";
const ATTR_FILL: &str = "_FillValue";

/// Stored in flag variables for an absent flag
const ABSENT_FLAG: i8 = -1;

fn data_type(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Ctd => NETCDF_CTD_TYPE,
        _ => NETCDF_BOTTLE_TYPE,
    }
}

pub fn to_netcdf(ctx: &CodecContext, kind: FileKind, file: &DataFile) -> Result<NcFile> {
    let rows = file.check_row_alignment()?;
    if rows == 0 {
        return Err(Error::not_supported(
            "netCDF member without data rows (record dimensions are not written)",
        ));
    }

    let mut nc = NcFile::default();
    let levels = nc.add_dimension(NETCDF_LEVELS_DIM, rows);

    nc.attributes = vec![
        NcAttribute::new(ATTR_DATA_TYPE, NcValues::text(data_type(kind))),
        NcAttribute::new(ATTR_STAMP, NcValues::text(&ctx.stamp_for(file))),
        NcAttribute::new(ATTR_HEADER, NcValues::text(&file.header)),
        NcAttribute::new(ATTR_FOOTER, NcValues::text(&file.footer)),
    ];
    for global in file.globals() {
        let text = match &global.value {
            Some(value) => format_value(&global.parameter, Some(value)),
            None => String::new(),
        };
        nc.attributes
            .push(NcAttribute::new(global.name(), NcValues::text(&text)));
    }

    for column in file.sorted_columns() {
        let parameter = column.parameter();
        let name = parameter.netcdf_name();
        let mut attributes = vec![NcAttribute::new(ATTR_WHP_NAME, NcValues::text(&parameter.name))];
        if !parameter.units_str().is_empty() {
            attributes.push(NcAttribute::new(ATTR_UNITS, NcValues::text(parameter.units_str())));
        }

        let variable = match parameter.format.kind {
            FormatKind::Text => {
                let texts: Vec<String> = (0..rows)
                    .map(|row| column.get(row).map(|v| v.to_string()).unwrap_or_default())
                    .collect();
                let strlen = texts.iter().map(String::len).max().unwrap_or(0).max(1);
                let width = nc.add_dimension(format!("{}_STRLEN", name), strlen);
                let mut chars = Vec::with_capacity(rows * strlen);
                for text in &texts {
                    chars.extend_from_slice(text.as_bytes());
                    chars.resize(chars.len() + strlen - text.len(), 0);
                }
                NcVariable {
                    name: name.clone(),
                    dimensions: vec![levels, width],
                    attributes,
                    data: NcValues::Char(chars),
                }
            }
            FormatKind::Float | FormatKind::Integer => {
                attributes.push(NcAttribute::new(ATTR_FILL, NcValues::Double(vec![FILL_VALUE])));
                let values = (0..rows)
                    .map(|row| column.get(row).and_then(|v| v.as_f64()).unwrap_or(FILL_VALUE))
                    .collect();
                NcVariable {
                    name: name.clone(),
                    dimensions: vec![levels],
                    attributes,
                    data: NcValues::Double(values),
                }
            }
        };
        nc.variables.push(variable);

        for (flagged, kind) in [
            (column.is_flagged_woce(), FlagKind::Woce),
            (column.is_flagged_igoss(), FlagKind::Igoss),
        ] {
            if !flagged {
                continue;
            }
            let (variable_name, whp_name) = match kind {
                FlagKind::Woce => (woce_flag_column(&name), woce_flag_column(&parameter.name)),
                FlagKind::Igoss => (igoss_flag_column(&name), igoss_flag_column(&parameter.name)),
            };
            let flags = (0..rows)
                .map(|row| {
                    let flag = match kind {
                        FlagKind::Woce => column.flag_woce(row),
                        FlagKind::Igoss => column.flag_igoss(row),
                    };
                    flag.map(|f| f as i8).unwrap_or(ABSENT_FLAG)
                })
                .collect();
            nc.variables.push(NcVariable {
                name: variable_name,
                dimensions: vec![levels],
                attributes: vec![NcAttribute::new(ATTR_WHP_NAME, NcValues::text(&whp_name))],
                data: NcValues::Byte(flags),
            });
        }
    }

    Ok(nc)
}

pub fn from_netcdf(ctx: &CodecContext, kind: FileKind, nc: &NcFile) -> Result<DataFile> {
    let expected = data_type(kind);
    let found = nc
        .attribute(ATTR_DATA_TYPE)
        .and_then(NcValues::as_text)
        .unwrap_or_default();
    if found != expected {
        return Err(Error::malformed_header(format!(
            "data_type '{}' where '{}' was expected",
            found, expected
        )));
    }

    let levels = nc
        .dimensions
        .iter()
        .position(|d| d.name == NETCDF_LEVELS_DIM)
        .ok_or_else(|| Error::malformed_header(format!("missing {} dimension", NETCDF_LEVELS_DIM)))?;
    let rows = nc.dimensions[levels].len;

    let mut file = DataFile::new();
    let text_attribute = |name: &str| nc.attribute(name).and_then(NcValues::as_text);
    if let Some(stamp) = text_attribute(ATTR_STAMP).filter(|s| !s.is_empty()) {
        file.stamp = check_stamp(&stamp)?;
    }
    file.header = text_attribute(ATTR_HEADER).unwrap_or_default();
    file.footer = text_attribute(ATTR_FOOTER).unwrap_or_default();

    for attribute in &nc.attributes {
        if [ATTR_DATA_TYPE, ATTR_STAMP, ATTR_HEADER, ATTR_FOOTER].contains(&attribute.name.as_str()) {
            continue;
        }
        let Ok(parameter) = ctx.registry.lookup(&attribute.name) else {
            debug!("Skipping netCDF attribute {}", attribute.name);
            continue;
        };
        let text = attribute.value.as_text().unwrap_or_default();
        let value = parse_value(&parameter, 0, &text)?;
        file.set_global(parameter, value);
    }

    let whp_name = |variable: &NcVariable| {
        variable
            .attribute(ATTR_WHP_NAME)
            .and_then(NcValues::as_text)
    };

    for variable in &nc.variables {
        let Some(name) = whp_name(variable) else {
            debug!("Skipping netCDF variable {} without whp_name", variable.name);
            continue;
        };
        if split_flag_column(&name).is_some() {
            continue;
        }
        require_levels(variable, levels)?;

        let parameter = ctx.registry.lookup(&name)?;
        if file.has_column(&parameter.name) || file.global(&parameter.name).is_some() {
            return Err(Error::duplicate_parameter(&parameter.name));
        }
        let units = variable
            .attribute(ATTR_UNITS)
            .and_then(NcValues::as_text)
            .unwrap_or_default();
        check_units(ctx, &parameter, &units)?;

        let column = file.ensure_column(&parameter);
        match &variable.data {
            NcValues::Char(chars) => {
                let strlen = if rows == 0 { 0 } else { chars.len() / rows };
                for row in 0..rows {
                    let cell = NcValues::Char(chars[row * strlen..(row + 1) * strlen].to_vec());
                    let text = cell.as_text().unwrap_or_default();
                    column.set(row, parse_value(&parameter, row, &text)?, None, None);
                }
            }
            numeric => {
                let numbers = numeric.as_f64s().unwrap_or_default();
                for (row, number) in numbers.into_iter().enumerate() {
                    let value = match parameter.format.kind {
                        FormatKind::Text => parse_value(&parameter, row, &number.to_string())?,
                        _ => validate_number(&parameter, row, number)?,
                    };
                    column.set(row, value, None, None);
                }
            }
        }
        column.pad_to(rows);
    }

    for variable in &nc.variables {
        let Some(name) = whp_name(variable) else {
            continue;
        };
        let Some((base, kind)) = split_flag_column(&name) else {
            continue;
        };
        require_levels(variable, levels)?;
        let canonical = ctx
            .registry
            .lookup(base)
            .map(|p| p.name.clone())
            .unwrap_or_else(|_| base.to_string());
        let numbers = variable.data.as_f64s().ok_or_else(|| {
            Error::malformed_flag(&canonical, 0, format!("flag variable {} is not numeric", variable.name))
        })?;
        let flags = numbers
            .iter()
            .enumerate()
            .map(|(row, flag)| match *flag {
                f if f == f64::from(ABSENT_FLAG) => Ok(None),
                f if f >= 0.0 && f <= f64::from(MAX_FLAG) && f.fract() == 0.0 => Ok(Some(f as u8)),
                f => Err(Error::malformed_flag(
                    &canonical,
                    row,
                    format!("{} is not a flag digit", f),
                )),
            })
            .collect::<Result<Vec<Option<u8>>>>()?;

        let column = file.column_mut(&canonical).ok_or_else(|| {
            Error::malformed_flag(&canonical, 0, "flag variable without a value variable")
        })?;
        column.replace_flags(kind, flags);
    }

    for column in file.sorted_columns() {
        if !column.is_flagged_woce() {
            continue;
        }
        for row in 0..rows {
            check_flag_for_value(column.name(), row, column.get(row), column.flag_woce(row))?;
        }
    }

    file.check_row_alignment()?;
    Ok(file)
}

/// Text variables are `[N_LEVELS, STRLEN]`, everything else `[N_LEVELS]`
fn require_levels(variable: &NcVariable, levels: usize) -> Result<()> {
    let indexed = match variable.data {
        NcValues::Char(_) => matches!(variable.dimensions.as_slice(), [first, _] if *first == levels),
        _ => variable.dimensions.as_slice() == [levels],
    };
    if indexed {
        Ok(())
    } else {
        Err(Error::malformed_header(format!(
            "variable {} is not indexed by {} alone",
            variable.name, NETCDF_LEVELS_DIM
        )))
    }
}
