use anyhow::Context;
use clap::Parser;

use bulkmill_cli::{init_logging, Cli, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(&cli).context("Invalid configuration")?;

    init_logging(&settings.logging);

    tracing::info!(
        bulk_size = settings.bulk.size,
        console = settings.sinks.console.enabled,
        file = settings.sinks.file.enabled,
        "Starting bulkmill"
    );

    let summary = bulkmill_cli::run(&settings).await?;

    tracing::info!(
        lines = summary.lines_read,
        commands = summary.commands_published,
        skipped = summary.empty_lines_skipped,
        lossy = summary.lossy_lines,
        "Input exhausted, shutting down"
    );

    Ok(())
}
