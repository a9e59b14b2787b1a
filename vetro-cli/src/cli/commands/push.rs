//! Push command handler

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;
use std::io::Write;

use crate::api::{
    BatchResult, BatchUpdateClient, FeatureCollection, FeatureEncoder, HttpTransport, ResilienceConfig,
    SubmissionOutcome, Transport,
};
use crate::cli::PushArgs;
use crate::config::{MAX_BATCH_SIZE, Settings, backend_key_from_env, resolve_api_key};
use crate::sync::{ChangeMode, ChangeSet, ChangeSetBuilder, DiffEngine};
use crate::table::{Snapshot, read_snapshot};

/// Features shown by a dry run
const PREVIEW_LIMIT: usize = 5;

pub async fn handle_push_command(args: PushArgs, settings: &Settings) -> Result<()> {
    let original = read_snapshot(&args.original)?;
    let edited = read_snapshot(&args.edited)?;

    let mode = ChangeMode::from(args.mode);
    let change_set = plan_push(&original, &edited, mode);

    if change_set.is_empty() {
        println!("{}", "No changes detected to sync.".green());
        return Ok(());
    }

    println!("Mode: {}", mode.to_string().cyan());
    if mode == ChangeMode::Full {
        println!(
            "{}",
            "Warning: every row will be sent with every column. Blank cells will clear the matching values in Vetro."
                .yellow()
                .bold()
        );
    }
    println!("Ready to update {} features.", change_set.len().to_string().bold());

    let batch_size = effective_batch_size(args.batch_size, settings);
    let encoder = FeatureEncoder::default();

    if args.dry_run {
        println!();
        println!("{}", dry_run_preview(&encoder, &change_set)?);
        println!();
        println!("{}", "Dry run: nothing was sent.".dimmed());
        return Ok(());
    }

    let key = resolve_api_key(
        settings.credentials.user_api_key.as_deref(),
        backend_key_from_env().as_deref(),
        settings.credentials.key_preference,
    )?;
    log::debug!("Authenticating with the {}", key.source);

    if !args.yes {
        if !std::io::stdin().is_terminal() {
            anyhow::bail!("Refusing to push without confirmation; pass --yes to run non-interactively");
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Send {} features to Vetro?", change_set.len()))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let transport = HttpTransport::new(&settings.api_config(), &key.key)?;
    log::debug!("Pushing to {}", transport.features_url());
    let client = BatchUpdateClient::with_encoder(
        transport,
        ResilienceConfig::from_settings(&settings.submission),
        encoder,
    );

    let result = submit_change_set(&client, &change_set, batch_size).await;
    report(&result)
}

/// Diff two snapshots and select the rows to send
pub fn plan_push(original: &Snapshot, edited: &Snapshot, mode: ChangeMode) -> ChangeSet {
    let diffs = DiffEngine::default().diff(original, edited);
    log::info!("Detected {} changed cells", diffs.len());
    ChangeSetBuilder::default().build(&diffs, edited, mode)
}

fn effective_batch_size(requested: Option<u32>, settings: &Settings) -> usize {
    match requested {
        Some(size) => (size as usize).clamp(1, MAX_BATCH_SIZE),
        None => settings.batch_size(),
    }
}

/// Pretty JSON of the first features that would be sent
pub fn dry_run_preview(encoder: &FeatureEncoder, change_set: &ChangeSet) -> Result<String> {
    let rows = &change_set.rows[..change_set.len().min(PREVIEW_LIMIT)];
    let preview = FeatureCollection::new(encoder.encode(rows));
    serde_json::to_string_pretty(&preview).context("Failed to format preview")
}

/// Submit with a percentage readout on stderr when it is a terminal
pub async fn submit_change_set<T: Transport>(
    client: &BatchUpdateClient<T>,
    change_set: &ChangeSet,
    batch_size: usize,
) -> BatchResult {
    let interactive = std::io::stderr().is_terminal();

    let result = client
        .submit_with_progress(&change_set.rows, batch_size, |fraction| {
            if interactive {
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, "\rProgress: {:>3.0}%", fraction * 100.0);
                let _ = stderr.flush();
            }
        })
        .await;

    if interactive {
        eprintln!();
    }
    result
}

/// One-line summary of a submission
pub fn summary(result: &BatchResult) -> String {
    match result.outcome() {
        SubmissionOutcome::Nothing => "No features were sent.".to_string(),
        SubmissionOutcome::Complete => format!("Successfully updated {} features.", result.success_count),
        SubmissionOutcome::Partial => format!(
            "Updated {} of {} features; {} failed.",
            result.success_count, result.total_rows, result.failure_count
        ),
        SubmissionOutcome::RateLimitedStop => format!(
            "Stopped: rate limit exceeded and retry limit reached. {} updated, {} failed, {} not attempted.",
            result.success_count,
            result.failure_count,
            result.unattempted()
        ),
    }
}

fn report(result: &BatchResult) -> Result<()> {
    let outcome = result.outcome();
    let line = summary(result);

    match outcome {
        SubmissionOutcome::Nothing | SubmissionOutcome::Complete => {
            println!("{}", line.green().bold());
            return Ok(());
        }
        SubmissionOutcome::Partial => println!("{}", line.yellow().bold()),
        SubmissionOutcome::RateLimitedStop => println!("{}", line.red().bold()),
    }

    println!();
    println!("Errors:");
    for error in &result.errors {
        match error.batch_index {
            Some(index) => println!("  {} {}", format!("batch {}:", index).dimmed(), error.message),
            None => println!("  {}", error.message),
        }
    }

    anyhow::bail!("{} of {} features were not updated", result.total_rows - result.success_count, result.total_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransportOutcome;
    use crate::api::transport::testing::{ScriptedTransport, ok};
    use crate::table::Row;
    use pretty_assertions::assert_eq;

    fn no_retries() -> ResilienceConfig {
        ResilienceConfig::builder()
            .max_retries(0)
            .delay_between_batches(std::time::Duration::ZERO)
            .build()
    }

    fn snapshots() -> (Snapshot, Snapshot) {
        let mut original = Snapshot::new(["vetro_id", "Name", "Height"]);
        let mut edited = Snapshot::new(["vetro_id", "Name", "Height"]);
        for i in 0..7 {
            let row = Row::new()
                .with("vetro_id", format!("id{}", i))
                .with("Name", format!("P{}", i))
                .with("Height", "40");
            original.push_row(row.clone());
            edited.push_row(row.with("Name", format!("Pole {}", i)));
        }
        (original, edited)
    }

    #[test]
    fn test_plan_push_selective_sends_changed_columns() {
        let (original, edited) = snapshots();
        let change_set = plan_push(&original, &edited, ChangeMode::Selective);

        assert_eq!(change_set.len(), 7);
        assert!(change_set.rows.iter().all(|row| !row.contains("Height")));
    }

    #[test]
    fn test_plan_push_with_identical_files_is_empty() {
        let (original, _) = snapshots();
        assert!(plan_push(&original, &original, ChangeMode::Selective).is_empty());
    }

    #[test]
    fn test_dry_run_preview_is_capped() {
        let (original, edited) = snapshots();
        let change_set = plan_push(&original, &edited, ChangeMode::Selective);

        let preview = dry_run_preview(&FeatureEncoder::default(), &change_set).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&preview).unwrap();
        let features = parsed["features"].as_array().unwrap();

        assert_eq!(features.len(), PREVIEW_LIMIT);
        assert_eq!(features[0]["type"], "Feature");
        assert_eq!(features[0]["x-vetro"]["vetro_id"], "id0");
        assert_eq!(features[0]["properties"]["Name"], "Pole 0");
    }

    #[test]
    fn test_effective_batch_size() {
        let settings = Settings::default();
        assert_eq!(effective_batch_size(None, &settings), 10);
        assert_eq!(effective_batch_size(Some(25), &settings), 25);
        assert_eq!(effective_batch_size(Some(80), &settings), MAX_BATCH_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_change_set_reports_partial() {
        let (original, edited) = snapshots();
        let change_set = plan_push(&original, &edited, ChangeMode::Selective);

        let transport = ScriptedTransport::new(
            vec![
                ok(),
                TransportOutcome::ClientError {
                    status: 422,
                    body: "bad".into(),
                },
            ],
            ok(),
        );
        let client = BatchUpdateClient::new(transport, no_retries());

        let result = submit_change_set(&client, &change_set, 3).await;

        assert_eq!(result.outcome(), SubmissionOutcome::Partial);
        assert_eq!(summary(&result), "Updated 4 of 7 features; 3 failed.");
        assert!(report(&result).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_change_set_complete() {
        let (original, edited) = snapshots();
        let change_set = plan_push(&original, &edited, ChangeMode::Full);
        let client = BatchUpdateClient::new(ScriptedTransport::always_ok(), no_retries());

        let result = submit_change_set(&client, &change_set, 10).await;

        assert_eq!(summary(&result), "Successfully updated 7 features.");
        assert!(report(&result).is_ok());
    }

    #[test]
    fn test_rate_limited_summary() {
        let result = BatchResult {
            total_rows: 10,
            success_count: 2,
            failure_count: 2,
            rate_limited: true,
            errors: Vec::new(),
        };
        assert_eq!(
            summary(&result),
            "Stopped: rate limit exceeded and retry limit reached. 2 updated, 2 failed, 6 not attempted."
        );
    }
}
