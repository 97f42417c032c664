use bulkmill_core::{Command, Consumer, Publisher, Result, Subscribers};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Totals reported once the input is exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub lines_read: u64,
    pub commands_published: u64,
    pub empty_lines_skipped: u64,
    /// Lines that were not valid UTF-8 and were decoded lossily
    pub lossy_lines: u64,
}

/// Turns input lines into timestamped commands.
///
/// Every non-empty line is published as a [`Command`] stamped with the time it
/// was read. Once the input ends, consumers are relaxed exactly once.
/// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than
/// ending the run.
pub struct CommandReader<R> {
    input: R,
    subscribers: Subscribers,
}

impl<R: AsyncBufRead + Unpin + Send> CommandReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            subscribers: Subscribers::new(),
        }
    }

    /// Read until end of input.
    ///
    /// A consumer error stops reading and is returned as is; the end-of-input
    /// relax is not sent in that case.
    pub async fn run(self) -> Result<ReadSummary> {
        let Self {
            mut input,
            mut subscribers,
        } = self;
        let mut summary = ReadSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            summary.lines_read += 1;

            let line = trim_line_ending(&buf);
            if line.is_empty() {
                summary.empty_lines_skipped += 1;
                continue;
            }

            let body = match std::str::from_utf8(line) {
                Ok(text) => text.to_owned(),
                Err(e) => {
                    tracing::warn!(line = summary.lines_read, error = %e, "Input line is not valid UTF-8");
                    summary.lossy_lines += 1;
                    String::from_utf8_lossy(line).into_owned()
                }
            };

            subscribers.publish(&Command::now(body)).await?;
            summary.commands_published += 1;
        }

        tracing::debug!(
            lines = summary.lines_read,
            commands = summary.commands_published,
            "Input exhausted"
        );
        subscribers.notify_relax().await?;

        Ok(summary)
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl<R> Publisher for CommandReader<R> {
    fn add_consumer(&mut self, consumer: Box<dyn Consumer>) {
        self.subscribers.add(consumer);
    }

    fn consumer_count(&self) -> usize {
        self.subscribers.len()
    }
}
