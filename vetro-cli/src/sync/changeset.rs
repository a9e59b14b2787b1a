//! Select the rows to transmit from a diff and the edited snapshot

use std::collections::HashMap;

use super::diff::{CellChange, RecordKey};
use crate::table::{CellValue, IDENTITY_COLUMN, Row, Snapshot};

/// Strategy for choosing what gets pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    /// Only changed columns of changed records
    Selective,
    /// Every column of every edited row; blanks become explicit nulls
    Full,
}

impl std::fmt::Display for ChangeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeMode::Selective => write!(f, "Smart Sync (Changes Only)"),
            ChangeMode::Full => write!(f, "Force Push All Rows"),
        }
    }
}

/// Rows selected for transmission and the mode that selected them
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    pub mode: ChangeMode,
    pub rows: Vec<Row>,
}

impl ChangeSet {
    /// Empty means there is nothing to submit, not that something failed
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone)]
pub struct ChangeSetBuilder {
    identity_column: String,
}

impl Default for ChangeSetBuilder {
    fn default() -> Self {
        Self::new(IDENTITY_COLUMN)
    }
}

impl ChangeSetBuilder {
    pub fn new(identity_column: impl Into<String>) -> Self {
        Self {
            identity_column: identity_column.into(),
        }
    }

    pub fn build(&self, diffs: &[CellChange], edited: &Snapshot, mode: ChangeMode) -> ChangeSet {
        let rows = match mode {
            ChangeMode::Selective => self.selective_rows(diffs, edited),
            ChangeMode::Full => self.full_rows(edited),
        };

        log::debug!("Built {} change set with {} rows", mode, rows.len());
        ChangeSet { mode, rows }
    }

    /// One row per changed record, holding the identity and the new values of
    /// its changed columns. Changed-to-blank cells stay missing so the encoder
    /// omits them.
    fn selective_rows(&self, diffs: &[CellChange], edited: &Snapshot) -> Vec<Row> {
        let mut rows: Vec<Row> = Vec::new();
        let mut positions: HashMap<&RecordKey, usize> = HashMap::new();

        for change in diffs {
            let position = *positions.entry(&change.key).or_insert_with(|| {
                rows.push(self.keyed_row(&change.key, edited));
                rows.len() - 1
            });

            if change.new_value.is_blank() {
                continue;
            }
            rows[position].set(change.column.clone(), change.new_value.clone());
        }

        rows
    }

    /// Start a selective row carrying only the record's identity
    fn keyed_row(&self, key: &RecordKey, edited: &Snapshot) -> Row {
        let identity = match key {
            RecordKey::Identity(id) => Some(id.clone()),
            // Positional diffs inherit the identity of the edited row, if any
            RecordKey::RowIndex(index) => edited
                .row(*index)
                .and_then(|row| row.identity(&self.identity_column)),
        };

        let mut row = Row::new();
        if let Some(id) = identity {
            row.set(self.identity_column.clone(), CellValue::Text(id));
        }
        row
    }

    fn full_rows(&self, edited: &Snapshot) -> Vec<Row> {
        edited
            .rows()
            .iter()
            .map(|source| {
                edited
                    .columns()
                    .iter()
                    .map(|column| {
                        let value = match source.get(column) {
                            Some(value) if !value.is_blank() => value.clone(),
                            _ => CellValue::Null,
                        };
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}
