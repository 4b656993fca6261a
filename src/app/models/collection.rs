//! DataFileCollection: named members folded into one unified DataFile
//!
//! Each merged member appends its rows to the unified file. Globals of a
//! member (a CTD cast's EXPOCODE, STNNBR, ...) are broadcast into columns so
//! the unified view is purely columnar. A [`MemberLayout`] per member records
//! everything needed to rebuild that member exactly in [`DataFileCollection::split`].

use super::column::Column;
use super::datafile::{DataFile, GlobalValue};
use super::value::Value;
use crate::constants::params;
use crate::{Error, Result};
use std::collections::HashSet;
use std::ops::Range;
use tracing::debug;

/// Which flag schemes a member column used
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub name: String,
    pub flagged_woce: bool,
    pub flagged_igoss: bool,
}

/// Shape of one member inside the unified file
#[derive(Debug, Clone, PartialEq)]
pub struct MemberLayout {
    pub name: String,
    pub rows: Range<usize>,
    pub columns: Vec<ColumnLayout>,
    pub globals: Vec<GlobalValue>,
    pub stamp: String,
    pub header: String,
    pub footer: String,
}

/// (EXPOCODE, STNNBR, CASTNO) of a row, absent parts as empty strings
type CastIdentity = (String, String, String);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFileCollection {
    unified: DataFile,
    members: Vec<MemberLayout>,
    expocode_order: Vec<String>,
    casts: HashSet<CastIdentity>,
    rows: usize,
}

impl DataFileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one member into the unified view
    ///
    /// Everything is validated before the collection is touched, so a
    /// rejected member leaves the collection as it was.
    pub fn merge(&mut self, name: impl Into<String>, file: DataFile) -> Result<()> {
        let name = name.into();
        if self.members.iter().any(|m| m.name == name) {
            return Err(Error::merge_conflict(format!(
                "member '{}' is already part of the collection",
                name
            )));
        }

        let rows = file.check_row_alignment()?;
        for global in file.globals() {
            if file.has_column(global.name()) {
                return Err(Error::duplicate_parameter(global.name()));
            }
        }

        let expocodes = expocode_runs(&file, rows)?;
        self.check_expocode_order(&name, &expocodes)?;
        let casts = cast_identities(&file, rows);
        if let Some(cast) = casts.iter().find(|c| self.casts.contains(*c)) {
            return Err(Error::merge_conflict(format!(
                "member '{}' repeats cast EXPOCODE={} STNNBR={} CASTNO={}",
                name, cast.0, cast.1, cast.2
            )));
        }

        let start = self.rows;
        let end = start + rows;
        let mut column_layouts = Vec::new();

        for column in file.sorted_columns() {
            column_layouts.push(ColumnLayout {
                name: column.name().to_string(),
                flagged_woce: column.is_flagged_woce(),
                flagged_igoss: column.is_flagged_igoss(),
            });
            let target = self.unified.ensure_column(column.parameter());
            target.pad_to(start);
            for row in 0..rows {
                target.set(
                    start + row,
                    column.get(row).cloned(),
                    column.flag_woce(row),
                    column.flag_igoss(row),
                );
            }
        }

        for global in file.globals() {
            let target = self.unified.ensure_column(&global.parameter);
            target.pad_to(start);
            for row in 0..rows {
                target.set(start + row, global.value.clone(), None, None);
            }
        }

        for header in self.unified.column_headers() {
            if let Some(column) = self.unified.column_mut(&header) {
                column.pad_to(end);
            }
        }

        if self.members.is_empty() {
            self.unified.stamp = file.stamp.clone();
            self.unified.header = file.header.clone();
            self.unified.footer = file.footer.clone();
        }

        for code in expocodes {
            if self.expocode_order.last() != Some(&code) {
                self.expocode_order.push(code);
            }
        }
        self.casts.extend(casts);
        self.rows = end;

        debug!("Merged member '{}' with {} rows", name, rows);
        self.members.push(MemberLayout {
            name,
            rows: start..end,
            columns: column_layouts,
            globals: file.globals().to_vec(),
            stamp: file.stamp,
            header: file.header,
            footer: file.footer,
        });
        Ok(())
    }

    /// An EXPOCODE may continue the most recent run but never reopen an earlier one
    fn check_expocode_order(&self, name: &str, runs: &[String]) -> Result<()> {
        let mut seen: Vec<&String> = self.expocode_order.iter().collect();
        for code in runs {
            let continues = seen.last() == Some(&code);
            if !continues && seen.contains(&code) {
                return Err(Error::merge_conflict(format!(
                    "member '{}' interleaves EXPOCODE {} with later cruises",
                    name, code
                )));
            }
            if !continues {
                seen.push(code);
            }
        }
        Ok(())
    }

    /// Rebuild every member in collection order
    pub fn split(&self) -> Vec<(String, DataFile)> {
        self.members
            .iter()
            .map(|layout| (layout.name.clone(), self.member_file(layout)))
            .collect()
    }

    fn member_file(&self, layout: &MemberLayout) -> DataFile {
        let mut file = DataFile::new();
        for column_layout in &layout.columns {
            if let Some(column) = self.unified.column(&column_layout.name) {
                // Names are unique within a layout
                let _ = file.add_column(column.slice(
                    layout.rows.clone(),
                    column_layout.flagged_woce,
                    column_layout.flagged_igoss,
                ));
            }
        }
        for global in &layout.globals {
            file.set_global(global.parameter.clone(), global.value.clone());
        }
        file.stamp = layout.stamp.clone();
        file.header = layout.header.clone();
        file.footer = layout.footer.clone();
        file
    }

    /// Member stamps in member order
    pub fn stamps(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.stamp.as_str()).collect()
    }

    pub fn members(&self) -> &[MemberLayout] {
        &self.members
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The merged columnar view of all members
    pub fn unified(&self) -> &DataFile {
        &self.unified
    }

    pub fn into_unified(self) -> DataFile {
        self.unified
    }

    /// Partition a file into one member per cast
    ///
    /// A new member starts whenever (EXPOCODE, STNNBR, CASTNO) changes between
    /// rows. Cast header parameters that are constant and unflagged within a
    /// cast become member globals.
    pub fn from_casts(file: &DataFile) -> Result<Self> {
        let rows = file.check_row_alignment()?;
        let mut collection = Self::new();

        for segment in cast_segments(file, rows) {
            let mut member = DataFile::new();
            for global in file.globals() {
                member.set_global(global.parameter.clone(), global.value.clone());
            }

            for column in file.sorted_columns() {
                let slice = column.slice(
                    segment.clone(),
                    column.is_flagged_woce(),
                    column.is_flagged_igoss(),
                );
                if promotes_to_global(&slice) {
                    member.set_global(slice.parameter().clone(), slice.get(0).cloned());
                } else {
                    member.add_column(slice)?;
                }
            }

            member.stamp = file.stamp.clone();
            member.header = file.header.clone();
            member.footer = file.footer.clone();

            let identity = row_identity(file, segment.start);
            let name = cast_member_stem(&identity.0, &identity.1, &identity.2);
            collection.merge(name, member)?;
        }

        Ok(collection)
    }
}

impl DataFile {
    /// Split into one collection member per cast
    pub fn split_on_cast(&self) -> Result<DataFileCollection> {
        DataFileCollection::from_casts(self)
    }
}

/// Archive member stem for a cast: `<EXPO>_<STN:05>_<CAST:05>`
pub fn cast_member_stem(expocode: &str, station: &str, cast: &str) -> String {
    format!("{}_{:0>5}_{:0>5}", expocode, station, cast)
}

/// Stable text form of an identifying value; integral numbers lose their fraction
pub fn identity_token(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Text(s)) => s.trim().to_string(),
        None => String::new(),
    }
}

fn row_identity(file: &DataFile, row: usize) -> CastIdentity {
    (
        identity_token(file.value_at(params::EXPOCODE, row)),
        identity_token(file.value_at(params::STNNBR, row)),
        identity_token(file.value_at(params::CASTNO, row)),
    )
}

fn has_key(file: &DataFile, name: &str) -> bool {
    file.has_column(name) || file.global(name).is_some()
}

/// Contiguous EXPOCODE runs of a member; a run may not reappear later in the same member
fn expocode_runs(file: &DataFile, rows: usize) -> Result<Vec<String>> {
    if !has_key(file, params::EXPOCODE) {
        return Ok(Vec::new());
    }
    if rows == 0 {
        return Ok(file
            .global_value(params::EXPOCODE)
            .map(|v| vec![identity_token(Some(v))])
            .unwrap_or_default());
    }

    let mut runs: Vec<String> = Vec::new();
    for row in 0..rows {
        let code = identity_token(file.value_at(params::EXPOCODE, row));
        if code.is_empty() || runs.last() == Some(&code) {
            continue;
        }
        if runs.contains(&code) {
            return Err(Error::merge_conflict(format!(
                "EXPOCODE {} is interleaved with other cruises inside one member",
                code
            )));
        }
        runs.push(code);
    }
    Ok(runs)
}

/// Distinct cast identities of a member, empty when it carries no station/cast keys
fn cast_identities(file: &DataFile, rows: usize) -> HashSet<CastIdentity> {
    if !has_key(file, params::STNNBR) && !has_key(file, params::CASTNO) {
        return HashSet::new();
    }
    if rows == 0 {
        return HashSet::from([row_identity(file, 0)]);
    }
    (0..rows).map(|row| row_identity(file, row)).collect()
}

fn cast_segments(file: &DataFile, rows: usize) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut start = 0;
    for row in 1..rows {
        if row_identity(file, row) != row_identity(file, row - 1) {
            segments.push(start..row);
            start = row;
        }
    }
    if rows > 0 {
        segments.push(start..rows);
    }
    segments
}

fn promotes_to_global(column: &Column) -> bool {
    params::CAST_HEADER_PARAMS.contains(&column.name())
        && !column.is_flagged()
        && !column.is_empty()
        && column.is_global()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::parameter_registry::{ParameterRegistry, StandardRegistry};

    fn cast(registry: &StandardRegistry, expocode: &str, station: &str, pressures: &[f64]) -> DataFile {
        let mut file = DataFile::new();
        file.set_global(registry.lookup("EXPOCODE").unwrap(), Some(Value::from(expocode)));
        file.set_global(registry.lookup("STNNBR").unwrap(), Some(Value::from(station)));
        file.set_global(registry.lookup("CASTNO").unwrap(), Some(Value::Number(1.0)));
        let column = file.ensure_column(&registry.lookup("CTDPRS").unwrap());
        for p in pressures {
            column.push(Some(Value::Number(*p)), Some(2), None);
        }
        file.stamp = format!("20080101SIOCCHDO{}", station);
        file
    }

    #[test]
    fn test_merge_appends_rows_and_broadcasts_globals() {
        let registry = StandardRegistry::builtin();
        let mut collection = DataFileCollection::new();
        collection.merge("a", cast(&registry, "X1", "1", &[1.0, 2.0])).unwrap();
        collection.merge("b", cast(&registry, "X1", "2", &[3.0])).unwrap();

        let unified = collection.unified();
        assert_eq!(unified.length().unwrap(), 3);
        assert_eq!(unified.column("STNNBR").unwrap().get(2), Some(&Value::from("2")));
        assert_eq!(unified.expocodes().unwrap(), vec!["X1"]);
        assert_eq!(collection.stamps(), vec!["20080101SIOCCHDO1", "20080101SIOCCHDO2"]);
    }

    #[test]
    fn test_merge_pads_missing_columns() {
        let registry = StandardRegistry::builtin();
        let mut collection = DataFileCollection::new();
        collection.merge("a", cast(&registry, "X1", "1", &[1.0])).unwrap();

        let mut other = cast(&registry, "X1", "2", &[5.0]);
        other
            .ensure_column(&registry.lookup("CTDTMP").unwrap())
            .push(Some(Value::Number(3.0)), None, None);
        collection.merge("b", other).unwrap();

        let temperature = collection.unified().column("CTDTMP").unwrap();
        assert_eq!(temperature.len(), 2);
        assert_eq!(temperature.get(0), None);
        assert_eq!(collection.unified().length().unwrap(), 2);
    }

    #[test]
    fn test_split_restores_members() {
        let registry = StandardRegistry::builtin();
        let first = cast(&registry, "X1", "1", &[1.0, 2.0]);
        let second = cast(&registry, "X1", "2", &[3.0]);

        let mut collection = DataFileCollection::new();
        collection.merge("a", first.clone()).unwrap();
        collection.merge("b", second.clone()).unwrap();

        let members = collection.split();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0], ("a".to_string(), first));
        assert_eq!(members[1], ("b".to_string(), second));

        let mut rebuilt = DataFileCollection::new();
        for (name, file) in members {
            rebuilt.merge(name, file).unwrap();
        }
        assert_eq!(rebuilt, collection);
    }

    #[test]
    fn test_merge_rejects_interleaved_expocodes() {
        let registry = StandardRegistry::builtin();
        let mut collection = DataFileCollection::new();
        collection.merge("a", cast(&registry, "X1", "1", &[1.0])).unwrap();
        collection.merge("b", cast(&registry, "X2", "1", &[1.0])).unwrap();

        let result = collection.merge("c", cast(&registry, "X1", "2", &[1.0]));
        assert!(matches!(result, Err(Error::MergeConflict { .. })));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.unified().length().unwrap(), 2);
    }

    #[test]
    fn test_merge_rejects_repeated_cast() {
        let registry = StandardRegistry::builtin();
        let mut collection = DataFileCollection::new();
        collection.merge("a", cast(&registry, "X1", "1", &[1.0])).unwrap();
        let result = collection.merge("b", cast(&registry, "X1", "1", &[2.0]));
        assert!(matches!(result, Err(Error::MergeConflict { .. })));
    }

    #[test]
    fn test_merge_rejects_duplicate_member_name() {
        let registry = StandardRegistry::builtin();
        let mut collection = DataFileCollection::new();
        collection.merge("a", cast(&registry, "X1", "1", &[1.0])).unwrap();
        let result = collection.merge("a", cast(&registry, "X1", "2", &[1.0]));
        assert!(matches!(result, Err(Error::MergeConflict { .. })));
    }

    #[test]
    fn test_merge_rejects_misaligned_member() {
        let registry = StandardRegistry::builtin();
        let mut file = cast(&registry, "X1", "1", &[1.0, 2.0]);
        file.ensure_column(&registry.lookup("CTDTMP").unwrap())
            .push(Some(Value::Number(1.0)), None, None);

        let mut collection = DataFileCollection::new();
        let result = collection.merge("a", file);
        assert!(matches!(result, Err(Error::RowCountMismatch { .. })));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_from_casts_splits_on_identity_change() {
        let registry = StandardRegistry::builtin();
        let mut file = DataFile::new();
        let expocode = registry.lookup("EXPOCODE").unwrap();
        let station = registry.lookup("STNNBR").unwrap();
        let pressure = registry.lookup("CTDPRS").unwrap();
        for (stn, p) in [("1", 1.0), ("1", 2.0), ("2", 1.0)] {
            file.ensure_column(&expocode).push(Some(Value::from("X1")), None, None);
            file.ensure_column(&station).push(Some(Value::from(stn)), None, None);
            file.ensure_column(&pressure).push(Some(Value::Number(p)), Some(2), None);
        }

        let collection = file.split_on_cast().unwrap();
        assert_eq!(
            collection.member_names(),
            vec!["X1_00001_00000", "X1_00002_00000"]
        );

        let members = collection.split();
        let (_, first) = &members[0];
        assert_eq!(first.length().unwrap(), 2);
        assert_eq!(first.global_value("STNNBR"), Some(&Value::from("1")));
        assert!(first.column("CTDPRS").unwrap().is_flagged_woce());
        assert!(!first.has_column("EXPOCODE"));
    }

    #[test]
    fn test_identity_token() {
        assert_eq!(identity_token(Some(&Value::Number(3.0))), "3");
        assert_eq!(identity_token(Some(&Value::Number(2.5))), "2.5");
        assert_eq!(identity_token(Some(&Value::from(" 12 "))), "12");
        assert_eq!(identity_token(None), "");
    }

    #[test]
    fn test_cast_member_stem() {
        assert_eq!(cast_member_stem("33RR20070322", "12", "1"), "33RR20070322_00012_00001");
    }
}
