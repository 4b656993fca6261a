//! DataFile: one cast or bottle file as a set of aligned columns

use super::column::Column;
use super::value::Value;
use crate::app::services::parameter_registry::{FormatKind, Parameter};
use crate::constants::{igoss_flag_column, params, woce_flag_column};
use crate::{Error, Result};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A single-valued parameter carried by the whole file (e.g. a CTD cast's EXPOCODE)
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalValue {
    pub parameter: Arc<Parameter>,
    pub value: Option<Value>,
}

impl GlobalValue {
    pub fn name(&self) -> &str {
        &self.parameter.name
    }
}

/// One series of the flattened export view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportSeries {
    Values(Vec<Option<Value>>),
    Flags(Vec<Option<u8>>),
}

/// Columns keyed by canonical parameter name plus free-text metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFile {
    columns: HashMap<String, Column>,
    globals: Vec<GlobalValue>,

    /// Provenance line, e.g. `20080101SIOCCHDOJFS`
    pub stamp: String,

    /// Free-text preamble
    pub header: String,

    /// Free-text trailer
    pub footer: String,
}

impl DataFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; a second column for the same parameter is rejected
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        let name = column.name().to_string();
        if self.columns.contains_key(&name) {
            return Err(Error::duplicate_parameter(name));
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Column for `parameter`, created empty if missing
    pub fn ensure_column(&mut self, parameter: &Arc<Parameter>) -> &mut Column {
        self.columns
            .entry(parameter.name.clone())
            .or_insert_with(|| Column::new(parameter.clone()))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::missing_column(name))
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        self.columns.remove(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in display order
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.values().collect();
        columns.sort_by(|a, b| a.display_cmp(b));
        columns
    }

    /// Parameter names in display order
    pub fn column_headers(&self) -> Vec<String> {
        self.sorted_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Set or replace a global, keeping first-insertion order
    pub fn set_global(&mut self, parameter: Arc<Parameter>, value: Option<Value>) {
        match self
            .globals
            .iter_mut()
            .find(|g| g.parameter.name == parameter.name)
        {
            Some(existing) => existing.value = value,
            None => self.globals.push(GlobalValue { parameter, value }),
        }
    }

    pub fn global(&self, name: &str) -> Option<&GlobalValue> {
        self.globals.iter().find(|g| g.name() == name)
    }

    pub fn global_value(&self, name: &str) -> Option<&Value> {
        self.global(name).and_then(|g| g.value.as_ref())
    }

    pub fn globals(&self) -> &[GlobalValue] {
        &self.globals
    }

    pub fn take_globals(&mut self) -> Vec<GlobalValue> {
        std::mem::take(&mut self.globals)
    }

    /// Value of `name` at `row`, from the column or else the global
    pub fn value_at(&self, name: &str, row: usize) -> Option<&Value> {
        match self.columns.get(name) {
            Some(column) => column.get(row),
            None => self.global_value(name),
        }
    }

    /// Copy with every global turned into a constant column over all rows
    pub fn globals_to_columns(&self) -> Result<DataFile> {
        let rows = self.check_row_alignment()?;
        let mut data = self.clone();
        for global in data.take_globals() {
            if data.has_column(global.name()) {
                return Err(Error::duplicate_parameter(global.name()));
            }
            let mut column = Column::new(global.parameter.clone());
            for _ in 0..rows {
                column.push(global.value.clone(), None, None);
            }
            data.add_column(column)?;
        }
        Ok(data)
    }

    /// Verify every column has the same length and return it
    ///
    /// Columns are checked in display order; the first one sets the expected
    /// length and the first disagreeing parameter is reported.
    pub fn check_row_alignment(&self) -> Result<usize> {
        let columns = self.sorted_columns();
        let Some(first) = columns.first() else {
            return Ok(0);
        };
        let expected = first.len();
        for column in &columns[1..] {
            if column.len() != expected {
                return Err(Error::row_count_mismatch(
                    column.name(),
                    expected,
                    column.len(),
                ));
            }
        }
        Ok(expected)
    }

    /// Validated row count
    pub fn length(&self) -> Result<usize> {
        self.check_row_alignment()
    }

    /// EXPOCODEs in first-appearance order without repeats
    pub fn expocodes(&self) -> Result<Vec<String>> {
        self.check_row_alignment()?;

        if let Some(column) = self.columns.get(params::EXPOCODE) {
            let mut seen = Vec::new();
            for value in column.values().iter().flatten() {
                let code = value.to_string();
                if !seen.contains(&code) {
                    seen.push(code);
                }
            }
            return Ok(seen);
        }

        match self.global(params::EXPOCODE) {
            Some(global) => Ok(global.value.iter().map(|v| v.to_string()).collect()),
            None => Err(Error::missing_column(params::EXPOCODE)),
        }
    }

    /// Decimal places per column in display order
    pub fn precisions(&self) -> Result<Vec<usize>> {
        self.check_row_alignment()?;
        Ok(self
            .sorted_columns()
            .iter()
            .map(|c| c.parameter().precision())
            .collect())
    }

    /// Flattened view: values per parameter plus `_FLAG_W`/`_FLAG_I` series when flagged
    pub fn to_hash(&self) -> BTreeMap<String, ExportSeries> {
        let mut hash = BTreeMap::new();
        for column in self.columns.values() {
            let name = column.name();
            hash.insert(
                name.to_string(),
                ExportSeries::Values(column.values().to_vec()),
            );
            if column.is_flagged_woce() {
                hash.insert(
                    woce_flag_column(name),
                    ExportSeries::Flags(padded_flags(column.flags_woce(), column.len())),
                );
            }
            if column.is_flagged_igoss() {
                hash.insert(
                    igoss_flag_column(name),
                    ExportSeries::Flags(padded_flags(column.flags_igoss(), column.len())),
                );
            }
        }
        hash
    }

    /// The export view as a typed DataFrame, columns in display order
    ///
    /// Globals are broadcast over every row so that each frame is self-describing.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = self.check_row_alignment()?;
        let mut frame_columns = Vec::new();

        for global in &self.globals {
            if self.columns.contains_key(global.name()) {
                continue;
            }
            let values = vec![global.value.clone(); rows];
            frame_columns.push(value_series(&global.parameter, &values).into_column());
        }

        for column in self.sorted_columns() {
            frame_columns.push(value_series(column.parameter(), column.values()).into_column());
            if column.is_flagged_woce() {
                frame_columns.push(
                    flag_series(&woce_flag_column(column.name()), column.flags_woce(), rows)
                        .into_column(),
                );
            }
            if column.is_flagged_igoss() {
                frame_columns.push(
                    flag_series(&igoss_flag_column(column.name()), column.flags_igoss(), rows)
                        .into_column(),
                );
            }
        }

        Ok(DataFrame::new(frame_columns)?)
    }
}

fn padded_flags(flags: &[Option<u8>], len: usize) -> Vec<Option<u8>> {
    let mut flags = flags.to_vec();
    flags.resize(len.max(flags.len()), None);
    flags
}

fn value_series(parameter: &Parameter, values: &[Option<Value>]) -> Series {
    let name = parameter.name.as_str();
    match parameter.format.kind {
        FormatKind::Text => {
            let text: Vec<Option<String>> = values
                .iter()
                .map(|v| v.as_ref().map(|v| v.to_string()))
                .collect();
            Series::new(name.into(), text)
        }
        FormatKind::Float | FormatKind::Integer => {
            let numbers: Vec<Option<f64>> = values
                .iter()
                .map(|v| v.as_ref().and_then(Value::as_f64))
                .collect();
            Series::new(name.into(), numbers)
        }
    }
}

fn flag_series(name: &str, flags: &[Option<u8>], rows: usize) -> Series {
    let flags: Vec<Option<i32>> = padded_flags(flags, rows)
        .into_iter()
        .take(rows)
        .map(|f| f.map(i32::from))
        .collect();
    Series::new(name.into(), flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::parameter_registry::{ParameterRegistry, StandardRegistry};

    fn registry() -> StandardRegistry {
        StandardRegistry::builtin()
    }

    fn file_with(columns: &[(&str, Vec<Option<Value>>)]) -> DataFile {
        let registry = registry();
        let mut file = DataFile::new();
        for (name, values) in columns {
            let parameter = registry.lookup(name).unwrap();
            let column = file.ensure_column(&parameter);
            for value in values {
                column.push(value.clone(), None, None);
            }
        }
        file
    }

    #[test]
    fn test_column_headers_follow_display_order() {
        let file = file_with(&[
            ("CTDTMP", vec![Some(Value::Number(1.0))]),
            ("CTDPRS", vec![Some(Value::Number(2.0))]),
            ("EXPOCODE", vec![Some(Value::from("X"))]),
        ]);
        assert_eq!(file.column_headers(), vec!["EXPOCODE", "CTDPRS", "CTDTMP"]);
    }

    #[test]
    fn test_add_column_rejects_duplicates() {
        let registry = registry();
        let mut file = DataFile::new();
        let parameter = registry.lookup("CTDPRS").unwrap();
        file.add_column(Column::new(parameter.clone())).unwrap();
        let result = file.add_column(Column::new(parameter));
        assert!(matches!(result, Err(Error::DuplicateParameter { .. })));
    }

    #[test]
    fn test_expocodes_deduplicated_in_order() {
        let file = file_with(&[(
            "EXPOCODE",
            vec![
                Some(Value::from("B")),
                Some(Value::from("A")),
                Some(Value::from("B")),
                None,
            ],
        )]);
        assert_eq!(file.expocodes().unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn test_expocodes_missing_column() {
        let file = file_with(&[("CTDPRS", vec![Some(Value::Number(1.0))])]);
        assert!(matches!(file.expocodes(), Err(Error::MissingColumn { .. })));
    }

    #[test]
    fn test_expocodes_from_global() {
        let registry = registry();
        let mut file = DataFile::new();
        file.set_global(
            registry.lookup("EXPOCODE").unwrap(),
            Some(Value::from("33RR20070322")),
        );
        assert_eq!(file.expocodes().unwrap(), vec!["33RR20070322"]);
    }

    #[test]
    fn test_row_alignment_checked_before_queries() {
        let file = file_with(&[
            ("EXPOCODE", vec![Some(Value::from("A")), Some(Value::from("A"))]),
            ("CTDPRS", vec![Some(Value::Number(1.0))]),
        ]);

        match file.length() {
            Err(Error::RowCountMismatch {
                parameter,
                expected,
                found,
            }) => {
                assert_eq!(parameter, "CTDPRS");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected RowCountMismatch, got {:?}", other),
        }
        assert!(matches!(file.expocodes(), Err(Error::RowCountMismatch { .. })));
        assert!(matches!(file.precisions(), Err(Error::RowCountMismatch { .. })));
    }

    #[test]
    fn test_precisions_in_display_order() {
        let file = file_with(&[
            ("CTDTMP", vec![None]),
            ("CTDPRS", vec![None]),
            ("SILCAT", vec![None]),
        ]);
        assert_eq!(file.precisions().unwrap(), vec![1, 4, 2]);
    }

    #[test]
    fn test_to_hash_includes_flag_keys_only_when_flagged() {
        let registry = registry();
        let mut file = DataFile::new();
        let salinity = file.ensure_column(&registry.lookup("CTDSAL").unwrap());
        salinity.push(Some(Value::Number(34.5)), Some(2), None);
        let pressure = file.ensure_column(&registry.lookup("CTDPRS").unwrap());
        pressure.push(Some(Value::Number(10.0)), None, None);

        let hash = file.to_hash();
        let keys: Vec<&String> = hash.keys().collect();
        assert_eq!(keys, vec!["CTDPRS", "CTDSAL", "CTDSAL_FLAG_W"]);
        assert_eq!(hash["CTDSAL_FLAG_W"], ExportSeries::Flags(vec![Some(2)]));
    }

    #[test]
    fn test_set_global_replaces_in_place() {
        let registry = registry();
        let mut file = DataFile::new();
        file.set_global(registry.lookup("EXPOCODE").unwrap(), Some(Value::from("A")));
        file.set_global(registry.lookup("STNNBR").unwrap(), Some(Value::from("1")));
        file.set_global(registry.lookup("EXPOCODE").unwrap(), Some(Value::from("B")));

        let names: Vec<&str> = file.globals().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["EXPOCODE", "STNNBR"]);
        assert_eq!(file.global_value("EXPOCODE"), Some(&Value::from("B")));
    }

    #[test]
    fn test_globals_to_columns() {
        let registry = registry();
        let mut file = file_with(&[("CTDPRS", vec![Some(Value::Number(1.0)), None])]);
        file.set_global(registry.lookup("STNNBR").unwrap(), Some(Value::from("7")));

        let flat = file.globals_to_columns().unwrap();
        assert!(flat.globals().is_empty());
        assert_eq!(
            flat.column("STNNBR").unwrap().values(),
            &[Some(Value::from("7")), Some(Value::from("7"))]
        );
    }

    #[test]
    fn test_to_dataframe_shape() {
        let registry = registry();
        let mut file = DataFile::new();
        file.set_global(registry.lookup("EXPOCODE").unwrap(), Some(Value::from("A")));
        let temperature = file.ensure_column(&registry.lookup("CTDTMP").unwrap());
        temperature.push(Some(Value::Number(2.5)), Some(2), None);
        temperature.push(None, Some(9), None);

        let frame = file.to_dataframe().unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 3);
    }
}
