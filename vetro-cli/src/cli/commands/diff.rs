//! Diff command handler

use anyhow::{Context, Result};
use colored::*;

use crate::cli::{DiffArgs, OutputFormat};
use crate::sync::{CellChange, DiffEngine, DiffStrategy};
use crate::table::{IDENTITY_COLUMN, read_snapshot};

/// Print the changes between two exports
pub fn handle_diff_command(args: DiffArgs) -> Result<()> {
    let original = read_snapshot(&args.original)?;
    let edited = read_snapshot(&args.edited)?;

    let engine = DiffEngine::default();
    if engine.strategy(&original, &edited) == DiffStrategy::Positional {
        eprintln!(
            "{}",
            format!(
                "Warning: {} missing from one of the files, comparing rows by position",
                IDENTITY_COLUMN
            )
            .yellow()
        );
    }

    let changes = engine.diff(&original, &edited);
    if changes.is_empty() {
        println!("{}", "No changes detected.".green());
        return Ok(());
    }

    let shown = &changes[..changes.len().min(args.limit)];
    println!("{}", format_changes(shown, args.format)?);

    if args.format == OutputFormat::Table {
        println!();
        if shown.len() < changes.len() {
            println!(
                "{} changes detected (showing first {})",
                changes.len().to_string().bold(),
                shown.len()
            );
        } else {
            println!("{} changes detected", changes.len().to_string().bold());
        }
    }

    Ok(())
}

/// Render changes in the requested format
pub fn format_changes(changes: &[CellChange], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(changes).context("Failed to format JSON output"),
        OutputFormat::Csv => changes_to_csv(changes),
        OutputFormat::Table => Ok(changes_to_table(changes)),
    }
}

/// Table cells for one change; nulls render as `(null)`
fn cells(change: &CellChange) -> [String; 4] {
    [
        change.key.to_string(),
        change.column.clone(),
        change.old_value.to_string(),
        change.new_value.to_string(),
    ]
}

const HEADERS: [&str; 4] = ["Record", "Column", "Old Value", "New Value"];

fn changes_to_csv(changes: &[CellChange]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADERS).context("Failed to write CSV header")?;
    for change in changes {
        let record = [
            change.key.to_string(),
            change.column.clone(),
            change.old_value.to_wire_string().unwrap_or_default(),
            change.new_value.to_wire_string().unwrap_or_default(),
        ];
        wtr.write_record(&record).context("Failed to write CSV row")?;
    }
    let bytes = wtr.into_inner().context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn changes_to_table(changes: &[CellChange]) -> String {
    let rows: Vec<[String; 4]> = changes.iter().map(cells).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let pad = |text: &str, width: usize| format!("{}{}", text, " ".repeat(width - text.chars().count()));

    let header = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| pad(*h, w))
        .collect::<Vec<_>>()
        .join("  ");
    let rule = widths.map(|w| "-".repeat(w)).join("  ");

    let mut lines = vec![header.bold().to_string(), rule];
    for row in &rows {
        let line = format!(
            "{}  {}  {}  {}",
            pad(&row[0], widths[0]).cyan(),
            pad(&row[1], widths[1]),
            pad(&row[2], widths[2]).red(),
            pad(&row[3], widths[3]).green(),
        );
        lines.push(line);
    }

    lines.join("\n")
}
