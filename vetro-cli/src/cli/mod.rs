//! Command-line interface definitions and dispatch

pub mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{KeyPreference, Settings};
use crate::sync::ChangeMode;

#[derive(Parser, Debug)]
#[command(name = "vetro-cli")]
#[command(about = "Push spreadsheet edits of Vetro feature exports back to the Vetro API")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show cell-level changes between an original and an edited export
    Diff(DiffArgs),
    /// Send detected changes to Vetro
    Push(PushArgs),
    /// Show the feature type and display columns of an export
    Inspect(InspectArgs),
    /// Manage API key and settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Original export (as downloaded from Vetro)
    pub original: PathBuf,

    /// Edited copy of the export
    pub edited: PathBuf,

    /// Maximum number of changes to print
    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// Original export (as downloaded from Vetro)
    pub original: PathBuf,

    /// Edited copy of the export
    pub edited: PathBuf,

    /// Which rows and columns to send
    #[arg(long, value_enum, default_value_t = ModeArg::Selective)]
    pub mode: ModeArg,

    /// Features per request (1-50); defaults to the configured batch size
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub batch_size: Option<u32>,

    /// Print the first payloads instead of sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Export to inspect
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current settings (keys are masked)
    Show,
    /// Store your personal API key; prompts when KEY is omitted
    SetKey { key: Option<String> },
    /// Remove the stored personal API key
    ClearKey,
    /// Choose which key is used when both are available
    SetPreference {
        #[arg(value_enum)]
        preference: PreferenceArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Only changed columns of changed rows
    Selective,
    /// Every row and column of the edited file
    Full,
}

impl From<ModeArg> for ChangeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Selective => ChangeMode::Selective,
            ModeArg::Full => ChangeMode::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PreferenceArg {
    /// Use your key when set, else the backend key
    User,
    /// Always use the backend key
    Backend,
}

impl From<PreferenceArg> for KeyPreference {
    fn from(preference: PreferenceArg) -> Self {
        match preference {
            PreferenceArg::User => KeyPreference::UserKeyIfSet,
            PreferenceArg::Backend => KeyPreference::AlwaysBackend,
        }
    }
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings_path = match cli.config {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    log::debug!("Using settings file {}", settings_path.display());

    match cli.command {
        Commands::Diff(args) => commands::diff::handle_diff_command(args),
        Commands::Push(args) => {
            let settings = Settings::load(&settings_path)?;
            commands::push::handle_push_command(args, &settings).await
        }
        Commands::Inspect(args) => commands::inspect::handle_inspect_command(args),
        Commands::Config { command } => commands::config::handle_config_command(command, &settings_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_push_defaults() {
        let cli = Cli::try_parse_from(["vetro-cli", "push", "a.csv", "b.csv"]).unwrap();
        match cli.command {
            Commands::Push(args) => {
                assert_eq!(args.mode, ModeArg::Selective);
                assert_eq!(args.batch_size, None);
                assert!(!args.dry_run);
                assert!(!args.yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_batch_size_range_is_enforced() {
        assert!(Cli::try_parse_from(["vetro-cli", "push", "a.csv", "b.csv", "--batch-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["vetro-cli", "push", "a.csv", "b.csv", "--batch-size", "51"]).is_err());
        assert!(Cli::try_parse_from(["vetro-cli", "push", "a.csv", "b.csv", "--batch-size", "50"]).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vetro-cli", "diff", "a.csv", "b.csv", "--verbose", "--format", "json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Diff(DiffArgs { format: OutputFormat::Json, limit: 100, .. })));
    }

    #[test]
    fn test_mode_and_preference_conversions() {
        assert_eq!(ChangeMode::from(ModeArg::Full), ChangeMode::Full);
        assert_eq!(KeyPreference::from(PreferenceArg::Backend), KeyPreference::AlwaysBackend);
    }
}
