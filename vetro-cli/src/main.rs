use anyhow::Result;
use clap::Parser;

use vetro_cli::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads VETRO_API_KEY
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    cli::run(cli).await
}
