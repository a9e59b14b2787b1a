//! In-memory tabular datasets

use serde::Serialize;
use std::collections::BTreeMap;

use super::value::CellValue;

/// Column carrying the stable Vetro record identity
pub const IDENTITY_COLUMN: &str = "vetro_id";

/// Prefix of Vetro-internal columns that are never written back
pub const RESERVED_PREFIX: &str = "v_";

static MISSING: CellValue = CellValue::Null;

/// A single table row.
///
/// A column absent from the row is *missing*; a column present with
/// [`CellValue::Null`] is an *explicit null*. The encoder treats the two
/// differently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a column, with missing columns reading as null
    pub fn value(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&MISSING)
    }

    /// Value of a column only if the row has it
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Builder-style [`Row::set`]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Identity value as its wire string, if present and not blank.
    ///
    /// Identities are opaque keys, not numbers: text matches verbatim and a
    /// typed number uses its shortest display form. `Number(1)` and `"1"` are
    /// the same record, `"1"` and `"1.0"` are not. The returned string is
    /// also what gets sent as `vetro_id`.
    pub fn identity(&self, identity_column: &str) -> Option<String> {
        self.cells
            .get(identity_column)
            .and_then(CellValue::to_wire_string)
    }

    /// Iterate columns present on the row, in column name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An ordered table: a column schema plus rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Snapshot {
    /// Create an empty snapshot with the given schema
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns_vec: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if !columns_vec.contains(&column) {
                columns_vec.push(column);
            }
        }
        Self {
            columns: columns_vec,
            rows: Vec::new(),
        }
    }

    /// Append a row. Columns not in the schema are added to it.
    pub fn push_row(&mut self, row: Row) {
        for (column, _) in row.iter() {
            if !self.has_column(column) {
                self.columns.push(column.to_string());
            }
        }
        self.rows.push(row);
    }

    /// Builder-style [`Snapshot::push_row`]
    pub fn with_row(mut self, row: Row) -> Self {
        self.push_row(row);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
