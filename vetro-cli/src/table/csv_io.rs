//! Read snapshots from CSV
//!
//! The header row defines the schema. Every non-empty cell is read as text,
//! verbatim; empty cells are left missing on the row.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

use super::snapshot::{Row, Snapshot};
use super::value::CellValue;

/// Read a CSV file into a snapshot
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let snapshot = read_snapshot_from(file)
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;

    log::debug!(
        "Loaded {} rows x {} columns from {}",
        snapshot.len(),
        snapshot.columns().len(),
        path.display()
    );
    Ok(snapshot)
}

/// Read CSV data from any reader into a snapshot
pub fn read_snapshot_from<R: Read>(reader: R) -> Result<Snapshot> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut snapshot = Snapshot::new(headers.iter().cloned());

    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", line + 1))?;

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(column, cell)| (column.clone(), CellValue::text(cell)))
            .collect();

        snapshot.push_row(row);
    }

    Ok(snapshot)
}
