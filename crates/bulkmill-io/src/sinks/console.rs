use async_trait::async_trait;
use bulkmill_core::{Command, Consumer, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

const LINE_PREFIX: &str = "bulk: ";
const ITEM_SEPARATOR: &str = ", ";

/// Prints each group on a single line: `bulk: <body1>, <body2>, ...`
pub struct ConsoleSink<W> {
    out: W,
    items_in_group: usize,
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            items_in_group: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Consumer for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    async fn receive(&mut self, command: &Command) -> Result<()> {
        let prefix = if self.items_in_group == 0 {
            LINE_PREFIX
        } else {
            ITEM_SEPARATOR
        };
        self.out.write_all(prefix.as_bytes()).await?;
        self.out.write_all(command.body().as_bytes()).await?;
        self.items_in_group += 1;
        Ok(())
    }

    async fn relax(&mut self) -> Result<()> {
        if self.items_in_group > 0 {
            self.out.write_all(b"\n").await?;
        }
        self.out.flush().await?;
        self.items_in_group = 0;
        Ok(())
    }
}
