//! Convert table rows into Vetro feature payloads
//!
//! Null handling per cell:
//! - explicit null on the row -> `null` (clear the field)
//! - non-blank value -> its string form
//! - missing, or present but blank -> key omitted (leave the field alone)
//!
//! Full-mode change sets turn every blank into an explicit null before they get
//! here, so they clear fields; selective change sets never carry nulls, so
//! their payloads never do either.

use serde_json::{Map, Value};

use super::models::FeaturePayload;
use crate::table::{CellValue, IDENTITY_COLUMN, RESERVED_PREFIX, Row};

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    identity_column: String,
    reserved_prefix: String,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new(IDENTITY_COLUMN, RESERVED_PREFIX)
    }
}

impl FeatureEncoder {
    pub fn new(identity_column: impl Into<String>, reserved_prefix: impl Into<String>) -> Self {
        Self {
            identity_column: identity_column.into(),
            reserved_prefix: reserved_prefix.into(),
        }
    }

    pub fn identity_column(&self) -> &str {
        &self.identity_column
    }

    /// True for the identity column and Vetro-internal columns
    pub fn is_reserved(&self, column: &str) -> bool {
        column == self.identity_column || column.starts_with(&self.reserved_prefix)
    }

    pub fn encode(&self, rows: &[Row]) -> Vec<FeaturePayload> {
        rows.iter().map(|row| self.encode_row(row)).collect()
    }

    pub fn encode_row(&self, row: &Row) -> FeaturePayload {
        let mut properties = Map::new();

        for (column, value) in row.iter() {
            if self.is_reserved(column) {
                continue;
            }
            match value {
                CellValue::Null => {
                    properties.insert(column.to_string(), Value::Null);
                }
                value => {
                    if let Some(text) = value.to_wire_string() {
                        properties.insert(column.to_string(), Value::String(text));
                    }
                }
            }
        }

        FeaturePayload::new(row.identity(&self.identity_column), properties)
    }
}
