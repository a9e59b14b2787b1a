//! Cell-level diff between an original and an edited snapshot
//!
//! Two strategies:
//! - Identity: both snapshots carry the identity column. Rows are matched by
//!   identity; identities present on one side only are ignored.
//! - Positional: fallback when either side lacks the identity column. Rows are
//!   matched by index over the shorter of the two snapshots.
//!
//! Only columns present in both schemas are compared, and the identity column
//! itself is never diffed.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::table::{CellValue, IDENTITY_COLUMN, Row, Snapshot};

/// How a change is tied back to its record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKey {
    /// Matched by identity column value
    Identity(String),
    /// Matched by row position
    RowIndex(usize),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Identity(id) => write!(f, "{}", id),
            RecordKey::RowIndex(i) => write!(f, "row {}", i),
        }
    }
}

/// A single changed cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange {
    pub key: RecordKey,
    pub column: String,
    pub old_value: CellValue,
    pub new_value: CellValue,
}

/// Which comparison strategy a diff used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStrategy {
    Identity,
    Positional,
}

/// Computes minimal cell-level diffs between snapshots
#[derive(Debug, Clone)]
pub struct DiffEngine {
    identity_column: String,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(IDENTITY_COLUMN)
    }
}

impl DiffEngine {
    /// Create an engine keyed on the given identity column
    pub fn new(identity_column: impl Into<String>) -> Self {
        Self {
            identity_column: identity_column.into(),
        }
    }

    pub fn identity_column(&self) -> &str {
        &self.identity_column
    }

    /// Strategy that [`DiffEngine::diff`] would use for these snapshots
    pub fn strategy(&self, original: &Snapshot, edited: &Snapshot) -> DiffStrategy {
        if original.has_column(&self.identity_column) && edited.has_column(&self.identity_column) {
            DiffStrategy::Identity
        } else {
            DiffStrategy::Positional
        }
    }

    /// Compare two snapshots and return every changed cell.
    ///
    /// Ordering follows the original snapshot: rows in its order, then
    /// columns in its schema order.
    pub fn diff(&self, original: &Snapshot, edited: &Snapshot) -> Vec<CellChange> {
        let columns = self.shared_columns(original, edited);

        let changes = match self.strategy(original, edited) {
            DiffStrategy::Identity => self.diff_by_identity(original, edited, &columns),
            DiffStrategy::Positional => self.diff_by_position(original, edited, &columns),
        };

        log::debug!(
            "Diff over {} shared columns found {} changed cells",
            columns.len(),
            changes.len()
        );
        changes
    }

    /// Original schema columns also present in the edited schema
    fn shared_columns<'a>(&self, original: &'a Snapshot, edited: &Snapshot) -> Vec<&'a str> {
        original
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| *c != self.identity_column && edited.has_column(c))
            .collect()
    }

    fn diff_by_identity(
        &self,
        original: &Snapshot,
        edited: &Snapshot,
        columns: &[&str],
    ) -> Vec<CellChange> {
        // First occurrence wins when an identity is duplicated
        let mut edited_index: HashMap<String, &Row> = HashMap::new();
        for row in edited.rows() {
            if let Some(id) = row.identity(&self.identity_column) {
                edited_index.entry(id).or_insert(row);
            }
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut changes = Vec::new();

        for old_row in original.rows() {
            let Some(id) = old_row.identity(&self.identity_column) else {
                continue;
            };
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(new_row) = edited_index.get(&id) else {
                continue;
            };

            compare_rows(old_row, new_row, columns, || RecordKey::Identity(id.clone()), &mut changes);
        }

        changes
    }

    fn diff_by_position(
        &self,
        original: &Snapshot,
        edited: &Snapshot,
        columns: &[&str],
    ) -> Vec<CellChange> {
        let mut changes = Vec::new();

        for (index, (old_row, new_row)) in original.rows().iter().zip(edited.rows()).enumerate() {
            compare_rows(old_row, new_row, columns, || RecordKey::RowIndex(index), &mut changes);
        }

        changes
    }
}

fn compare_rows(
    old_row: &Row,
    new_row: &Row,
    columns: &[&str],
    key: impl Fn() -> RecordKey,
    changes: &mut Vec<CellChange>,
) {
    for column in columns {
        let old_value = old_row.value(column);
        let new_value = new_row.value(column);

        if old_value.same_as(new_value) {
            continue;
        }

        changes.push(CellChange {
            key: key(),
            column: column.to_string(),
            old_value: old_value.clone(),
            new_value: new_value.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn snapshot(columns: &[&str], rows: Vec<Row>) -> Snapshot {
        rows.into_iter()
            .fold(Snapshot::new(columns.iter().copied()), |s, r| s.with_row(r))
    }

    fn row(id: &str, name: &str) -> Row {
        Row::new().with("vetro_id", id).with("name", name)
    }

    #[test]
    fn test_single_changed_cell_by_identity() {
        let original = snapshot(&["vetro_id", "name"], vec![row("1", "A"), row("2", "B")]);
        let edited = snapshot(&["vetro_id", "name"], vec![row("1", "A"), row("2", "C")]);

        let changes = DiffEngine::default().diff(&original, &edited);

        assert_eq!(
            changes,
            vec![CellChange {
                key: RecordKey::Identity("2".to_string()),
                column: "name".to_string(),
                old_value: CellValue::text("B"),
                new_value: CellValue::text("C"),
            }]
        );
    }

    #[test]
    fn test_identity_matching_ignores_row_order() {
        let original = snapshot(&["vetro_id", "name"], vec![row("1", "A"), row("2", "B")]);
        let edited = snapshot(&["vetro_id", "name"], vec![row("2", "B"), row("1", "Z")]);

        let changes = DiffEngine::default().diff(&original, &edited);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, RecordKey::Identity("1".to_string()));
        assert_eq!(changes[0].new_value, CellValue::text("Z"));
    }

    #[test]
    fn test_one_sided_identities_are_ignored() {
        let original = snapshot(&["vetro_id", "name"], vec![row("1", "A"), row("2", "B")]);
        let edited = snapshot(&["vetro_id", "name"], vec![row("1", "A"), row("3", "C")]);

        assert!(DiffEngine::default().diff(&original, &edited).is_empty());
    }

    #[test]
    fn test_rows_without_identity_are_skipped() {
        let original = snapshot(
            &["vetro_id", "name"],
            vec![Row::new().with("name", "A"), row("2", "B")],
        );
        let edited = snapshot(
            &["vetro_id", "name"],
            vec![Row::new().with("name", "Z"), row("2", "B")],
        );

        assert!(DiffEngine::default().diff(&original, &edited).is_empty());
    }

    #[test]
    fn test_numeric_and_text_forms_are_equal() {
        let original = snapshot(
            &["vetro_id", "height"],
            vec![Row::new().with("vetro_id", 1i64).with("height", 40i64)],
        );
        let edited = snapshot(
            &["vetro_id", "height"],
            vec![Row::new().with("vetro_id", "1").with("height", "40.0")],
        );

        assert!(DiffEngine::default().diff(&original, &edited).is_empty());
    }

    #[test]
    fn test_long_integer_edit_is_detected() {
        let original = snapshot(
            &["vetro_id", "Serial"],
            vec![Row::new().with("vetro_id", "1").with("Serial", "9007199254740993")],
        );
        let edited = snapshot(
            &["vetro_id", "Serial"],
            vec![Row::new().with("vetro_id", "1").with("Serial", "9007199254740992")],
        );

        let changes = DiffEngine::default().diff(&original, &edited);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_value, CellValue::text("9007199254740992"));
    }

    #[test]
    fn test_leading_zero_edit_is_detected() {
        let original = snapshot(
            &["vetro_id", "Zip Code"],
            vec![Row::new().with("vetro_id", "1").with("Zip Code", "5401")],
        );
        let edited = snapshot(
            &["vetro_id", "Zip Code"],
            vec![Row::new().with("vetro_id", "1").with("Zip Code", "05401")],
        );

        let changes = DiffEngine::default().diff(&original, &edited);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_value, CellValue::text("05401"));
    }

    #[test]
    fn test_identity_text_is_not_normalized() {
        let original = snapshot(&["vetro_id", "name"], vec![row("1", "A")]);
        let edited = snapshot(&["vetro_id", "name"], vec![row("1.0", "B")]);

        // "1" and "1.0" are different records, so nothing matches
        assert!(DiffEngine::default().diff(&original, &edited).is_empty());
    }

    #[test]
    fn test_cleared_and_filled_cells() {
        let original = snapshot(
            &["vetro_id", "note", "owner"],
            vec![Row::new().with("vetro_id", "1").with("note", "old")],
        );
        let edited = snapshot(
            &["vetro_id", "note", "owner"],
            vec![Row::new().with("vetro_id", "1").with("owner", "ACME")],
        );

        let changes = DiffEngine::default().diff(&original, &edited);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].column, "note");
        assert_eq!(changes[0].old_value, CellValue::text("old"));
        assert_eq!(changes[0].new_value, CellValue::Null);
        assert_eq!(changes[1].column, "owner");
        assert_eq!(changes[1].old_value, CellValue::Null);
    }

    #[test]
    fn test_only_shared_columns_compared_in_original_order() {
        let original = snapshot(
            &["vetro_id", "b", "a", "only_original"],
            vec![Row::new().with("vetro_id", "1").with("a", "1").with("b", "1").with("only_original", "x")],
        );
        let edited = snapshot(
            &["vetro_id", "a", "b", "only_edited"],
            vec![Row::new().with("vetro_id", "1").with("a", "2").with("b", "2").with("only_edited", "y")],
        );

        let columns: Vec<String> = DiffEngine::default()
            .diff(&original, &edited)
            .into_iter()
            .map(|c| c.column)
            .collect();

        assert_eq!(columns, vec!["b", "a"]);
    }

    #[test]
    fn test_positional_fallback_without_identity_column() {
        let original = snapshot(
            &["name"],
            vec![Row::new().with("name", "A"), Row::new().with("name", "B"), Row::new().with("name", "C")],
        );
        let edited = snapshot(&["name"], vec![Row::new().with("name", "A"), Row::new().with("name", "X")]);

        let engine = DiffEngine::default();
        assert_eq!(engine.strategy(&original, &edited), DiffStrategy::Positional);

        let changes = engine.diff(&original, &edited);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, RecordKey::RowIndex(1));
        assert_eq!(changes[0].new_value, CellValue::text("X"));
    }

    #[test]
    fn test_positional_when_only_one_side_has_identity() {
        let original = snapshot(&["vetro_id", "name"], vec![row("1", "A")]);
        let edited = snapshot(&["name"], vec![Row::new().with("name", "B")]);

        let changes = DiffEngine::default().diff(&original, &edited);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, RecordKey::RowIndex(0));
    }

    #[test]
    fn test_duplicate_identity_uses_first_occurrence() {
        let original = snapshot(&["vetro_id", "name"], vec![row("1", "A"), row("1", "Q")]);
        let edited = snapshot(&["vetro_id", "name"], vec![row("1", "B"), row("1", "A")]);

        let changes = DiffEngine::default().diff(&original, &edited);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, CellValue::text("A"));
        assert_eq!(changes[0].new_value, CellValue::text("B"));
    }

    #[test]
    fn test_diff_does_not_touch_inputs() {
        let original = snapshot(&["vetro_id", "name"], vec![row("1", "A")]);
        let edited = snapshot(&["vetro_id", "name"], vec![row("1", "B")]);
        let before = original.clone();

        let _ = DiffEngine::default().diff(&original, &edited);
        assert_eq!(original, before);
    }

    // Property tests over snapshots sharing a fixed schema

    const COLUMNS: [&str; 4] = ["vetro_id", "name", "owner", "height"];

    fn cell_strategy() -> impl Strategy<Value = Option<CellValue>> {
        prop_oneof![
            Just(None),
            Just(Some(CellValue::Null)),
            "[a-c]{1,2}".prop_map(|s| Some(CellValue::Text(s))),
            (0i64..5).prop_map(|n| Some(CellValue::Number(n as f64))),
            // Numeric-looking text: zero padded, long integers, trailing zeros
            "0[0-9]{1,4}".prop_map(|s| Some(CellValue::Text(s))),
            "-?[1-9][0-9]{15,19}".prop_map(|s| Some(CellValue::Text(s))),
            "[0-4]\\.[05]0?".prop_map(|s| Some(CellValue::Text(s))),
        ]
    }

    fn rows_strategy() -> impl Strategy<Value = Vec<[Option<CellValue>; 3]>> {
        prop::collection::vec(
            [cell_strategy(), cell_strategy(), cell_strategy()],
            0..8,
        )
    }

    fn build(rows: &[[Option<CellValue>; 3]]) -> Snapshot {
        let mut snap = Snapshot::new(COLUMNS);
        for (i, cells) in rows.iter().enumerate() {
            let mut r = Row::new().with("vetro_id", format!("id{}", i));
            for (column, cell) in COLUMNS[1..].iter().zip(cells) {
                if let Some(value) = cell {
                    r.set(*column, value.clone());
                }
            }
            snap.push_row(r);
        }
        snap
    }

    /// Apply changes onto a copy of `base`, keyed by identity
    fn apply(base: &Snapshot, changes: &[CellChange]) -> Snapshot {
        let mut out = Snapshot::new(base.columns().iter().cloned());
        for row in base.rows() {
            let mut row = row.clone();
            let key = row.identity("vetro_id").map(RecordKey::Identity);
            for change in changes {
                if key.as_ref() == Some(&change.key) {
                    row.set(change.column.clone(), change.new_value.clone());
                }
            }
            out.push_row(row);
        }
        out
    }

    proptest! {
        #[test]
        fn diff_with_self_is_empty(rows in rows_strategy()) {
            let snap = build(&rows);
            prop_assert!(DiffEngine::default().diff(&snap, &snap).is_empty());
        }

        #[test]
        fn applying_diff_reproduces_edited(a in rows_strategy(), b in rows_strategy()) {
            let original = build(&a);
            let edited = build(&b);
            let changes = DiffEngine::default().diff(&original, &edited);
            let patched = apply(&original, &changes);

            for (patched_row, edited_row) in patched.rows().iter().zip(edited.rows()) {
                for column in COLUMNS {
                    prop_assert!(patched_row.value(column).same_as(edited_row.value(column)));
                }
            }
            prop_assert!(DiffEngine::default().diff(&patched, &edited).is_empty());
        }

        #[test]
        fn distinct_integer_text_is_a_change(a in "[1-9][0-9]{15,24}", b in "[1-9][0-9]{15,24}") {
            prop_assume!(a != b);
            let original = snapshot(&["vetro_id", "Serial"], vec![Row::new().with("vetro_id", "1").with("Serial", a)]);
            let edited = snapshot(&["vetro_id", "Serial"], vec![Row::new().with("vetro_id", "1").with("Serial", b)]);

            prop_assert_eq!(DiffEngine::default().diff(&original, &edited).len(), 1);
        }

        #[test]
        fn zero_padding_is_a_change(digits in "[1-9][0-9]{0,5}", zeros in "0{1,3}") {
            let padded = format!("{}{}", zeros, digits);
            let original = snapshot(&["vetro_id", "Zip Code"], vec![Row::new().with("vetro_id", "1").with("Zip Code", digits)]);
            let edited = snapshot(&["vetro_id", "Zip Code"], vec![Row::new().with("vetro_id", "1").with("Zip Code", padded)]);

            prop_assert_eq!(DiffEngine::default().diff(&original, &edited).len(), 1);
        }
    }
}
