//! Inspect command handler

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::cli::InspectArgs;
use crate::feature_types::FeatureType;
use crate::table::{IDENTITY_COLUMN, Snapshot, read_snapshot};

/// Summary of one export file
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub feature_type: Option<FeatureType>,
    pub row_count: usize,
    pub column_count: usize,
    pub display_columns: Vec<String>,
    pub has_identity: bool,
}

impl Inspection {
    pub fn of(path: &Path, snapshot: &Snapshot) -> Self {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let feature_type = FeatureType::detect(file_name);

        // Unknown layers show every column
        let display_columns = match feature_type {
            Some(feature_type) => feature_type.display_columns(snapshot),
            None => snapshot.columns().to_vec(),
        };

        Self {
            feature_type,
            row_count: snapshot.len(),
            column_count: snapshot.columns().len(),
            display_columns,
            has_identity: snapshot.has_column(IDENTITY_COLUMN),
        }
    }
}

pub fn handle_inspect_command(args: InspectArgs) -> Result<()> {
    let snapshot = read_snapshot(&args.file)?;
    let inspection = Inspection::of(&args.file, &snapshot);

    println!("File:         {}", args.file.display().to_string().cyan());
    match inspection.feature_type {
        Some(feature_type) => println!("Feature type: {}", feature_type.to_string().bright_green().bold()),
        None => {
            println!("Feature type: {}", "unknown".yellow());
            let known: Vec<&str> = FeatureType::ALL.iter().map(FeatureType::label).collect();
            println!("              {}", format!("recognised: {}", known.join(", ")).dimmed());
        }
    }
    println!("Rows:         {}", inspection.row_count);
    println!("Columns:      {}", inspection.column_count);

    if !inspection.has_identity {
        println!(
            "{}",
            format!(
                "Warning: no {} column; rows cannot be matched or pushed",
                IDENTITY_COLUMN
            )
            .yellow()
        );
    }

    println!();
    println!("Display columns:");
    for column in &inspection.display_columns {
        println!("  {}", column);
    }

    Ok(())
}
