use anyhow::Context;
use bulkmill_core::{Accumulator, Publisher};
use bulkmill_io::{CommandReader, ConsoleSink, FileSink, ReadSummary};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::config::Settings;

/// Wire reader -> accumulator -> configured sinks and run until `input` ends
pub async fn run_pipeline<R, W>(
    settings: &Settings,
    input: R,
    console: W,
) -> anyhow::Result<ReadSummary>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let config = settings.bulk_config()?;
    let mut accumulator = Accumulator::new(config);

    if settings.sinks.console.enabled {
        accumulator.add_consumer(Box::new(ConsoleSink::new(console)));
    }

    if settings.sinks.file.enabled {
        let directory = &settings.sinks.file.directory;
        let sink = FileSink::create(directory)
            .await
            .with_context(|| format!("Failed to prepare output directory {}", directory.display()))?;
        accumulator.add_consumer(Box::new(sink));
    }

    tracing::info!(
        bulk_size = accumulator.bulk_size(),
        sinks = accumulator.consumer_count(),
        "Pipeline ready"
    );

    let mut reader = CommandReader::new(input);
    reader.add_consumer(Box::new(accumulator));

    let summary = reader.run().await.context("Pipeline aborted")?;
    Ok(summary)
}

/// Run over stdin, printing bulks to stdout
pub async fn run(settings: &Settings) -> anyhow::Result<ReadSummary> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_pipeline(settings, stdin, tokio::io::stdout()).await
}
