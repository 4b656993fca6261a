//! Column: one parameter's values with parallel WOCE and IGOSS flags

use super::value::Value;
use crate::app::services::parameter_registry::Parameter;
use crate::constants::FlagKind;
use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

/// Ordered, indexable sequence of optional values for one parameter
///
/// Flag sequences are independent of the value sequence. An empty flag
/// sequence means the column does not use that flag scheme at all; a
/// non-empty one may still hold absent entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    parameter: Arc<Parameter>,
    values: Vec<Option<Value>>,
    flags_woce: Vec<Option<u8>>,
    flags_igoss: Vec<Option<u8>>,
}

impl Column {
    pub fn new(parameter: Arc<Parameter>) -> Self {
        Self {
            parameter,
            values: Vec::new(),
            flags_woce: Vec::new(),
            flags_igoss: Vec::new(),
        }
    }

    pub fn parameter(&self) -> &Arc<Parameter> {
        &self.parameter
    }

    pub fn name(&self) -> &str {
        &self.parameter.name
    }

    /// Value at `index`; out of range and absent are both `None`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Write a value and any supplied flags at `index`, extending with absent entries
    pub fn set(
        &mut self,
        index: usize,
        value: Option<Value>,
        flag_woce: Option<u8>,
        flag_igoss: Option<u8>,
    ) {
        set_extending(&mut self.values, index, value);
        if let Some(flag) = flag_woce {
            set_extending(&mut self.flags_woce, index, Some(flag));
        }
        if let Some(flag) = flag_igoss {
            set_extending(&mut self.flags_igoss, index, Some(flag));
        }
    }

    /// Append a row
    pub fn push(&mut self, value: Option<Value>, flag_woce: Option<u8>, flag_igoss: Option<u8>) {
        let index = self.values.len();
        self.set(index, value, flag_woce, flag_igoss);
    }

    /// Highest written index + 1
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn flags_woce(&self) -> &[Option<u8>] {
        &self.flags_woce
    }

    pub fn flags_igoss(&self) -> &[Option<u8>] {
        &self.flags_igoss
    }

    pub fn flag_woce(&self, index: usize) -> Option<u8> {
        self.flags_woce.get(index).copied().flatten()
    }

    pub fn flag_igoss(&self, index: usize) -> Option<u8> {
        self.flags_igoss.get(index).copied().flatten()
    }

    pub fn is_flagged_woce(&self) -> bool {
        !self.flags_woce.is_empty()
    }

    pub fn is_flagged_igoss(&self) -> bool {
        !self.flags_igoss.is_empty()
    }

    pub fn is_flagged(&self) -> bool {
        self.is_flagged_woce() || self.is_flagged_igoss()
    }

    /// Compare by registry display order, then by name
    pub fn display_cmp(&self, other: &Column) -> Ordering {
        self.parameter
            .display_order
            .cmp(&other.parameter.display_order)
            .then_with(|| self.parameter.name.cmp(&other.parameter.name))
    }

    /// True when every value equals the first (vacuously true when empty)
    pub fn is_global(&self) -> bool {
        match self.values.split_first() {
            Some((first, rest)) => rest.iter().all(|v| v == first),
            None => true,
        }
    }

    /// Extend values, and any flag scheme in use, with absent entries up to `len`
    pub fn pad_to(&mut self, len: usize) {
        if self.values.len() < len {
            self.values.resize(len, None);
        }
        if self.is_flagged_woce() && self.flags_woce.len() < len {
            self.flags_woce.resize(len, None);
        }
        if self.is_flagged_igoss() && self.flags_igoss.len() < len {
            self.flags_igoss.resize(len, None);
        }
    }

    /// Copy the rows in `rows`, keeping only the requested flag schemes
    pub fn slice(&self, rows: Range<usize>, woce: bool, igoss: bool) -> Column {
        let values = rows
            .clone()
            .map(|i| self.values.get(i).cloned().flatten())
            .collect();
        let pick = |flags: &[Option<u8>]| -> Vec<Option<u8>> {
            rows.clone().map(|i| flags.get(i).copied().flatten()).collect()
        };

        Column {
            parameter: self.parameter.clone(),
            values,
            flags_woce: if woce { pick(&self.flags_woce) } else { Vec::new() },
            flags_igoss: if igoss { pick(&self.flags_igoss) } else { Vec::new() },
        }
    }

    /// Replace a whole flag sequence, e.g. one decoded from an array variable
    pub fn replace_flags(&mut self, kind: FlagKind, flags: Vec<Option<u8>>) {
        match kind {
            FlagKind::Woce => self.flags_woce = flags,
            FlagKind::Igoss => self.flags_igoss = flags,
        }
    }
}

fn set_extending<T: Clone>(sequence: &mut Vec<Option<T>>, index: usize, item: Option<T>) {
    if index >= sequence.len() {
        sequence.resize(index + 1, None);
    }
    sequence[index] = item;
}
