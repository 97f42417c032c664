use async_trait::async_trait;
use bulkmill_types::{BulkConfig, Command, CommandKind, ScopePolicy};
use std::num::NonZeroUsize;

use crate::consumer::Consumer;
use crate::error::Result;
use crate::publisher::{Publisher, Subscribers};

/// Counters collected over the lifetime of an accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorStats {
    /// Every command received, scope markers included
    pub commands_received: u64,
    pub batches_flushed: u64,
    pub commands_flushed: u64,
    /// Payload dropped because its scope was still open at end of input
    pub commands_abandoned: u64,
}

/// Groups incoming commands into bulks and hands each bulk to its consumers.
///
/// Outside of any scope a bulk is flushed as soon as `bulk_size` payload
/// commands are pending. Inside a `{ ... }` scope the size limit is ignored
/// and everything is held until the outermost scope closes.
///
/// Each flush delivers one synthetic command (see [`Command::batch`]) to every
/// consumer, followed by a `relax` to every consumer.
pub struct Accumulator {
    bulk_size: NonZeroUsize,
    policy: ScopePolicy,
    scope_level: usize,
    pending: Vec<Command>,
    subscribers: Subscribers,
    stats: AccumulatorStats,
}

impl Accumulator {
    pub fn new(config: BulkConfig) -> Self {
        Self {
            bulk_size: config.bulk_size,
            policy: config.scope,
            scope_level: 0,
            pending: Vec::new(),
            subscribers: Subscribers::new(),
            stats: AccumulatorStats::default(),
        }
    }

    /// Shorthand for an accumulator with the default scope policy
    pub fn with_bulk_size(bulk_size: usize) -> Result<Self> {
        Ok(Self::new(BulkConfig::new(bulk_size)?))
    }

    pub fn bulk_size(&self) -> usize {
        self.bulk_size.get()
    }

    pub fn scope_level(&self) -> usize {
        self.scope_level
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> AccumulatorStats {
        self.stats
    }

    fn open_scope(&mut self) -> bool {
        let flush = self.scope_level != 0 && self.policy.flush_on_nested_open;
        self.scope_level += 1;
        tracing::trace!(scope_level = self.scope_level, "Scope opened");
        flush
    }

    fn close_scope(&mut self) -> bool {
        self.scope_level -= 1;
        tracing::trace!(scope_level = self.scope_level, "Scope closed");
        self.scope_level == 0
    }

    fn push_payload(&mut self, command: &Command) -> bool {
        self.pending.push(command.clone());
        self.scope_level == 0 && self.pending.len() == self.bulk_size.get()
    }

    /// Deliver pending commands as one batch. Pending is cleared even when a
    /// consumer fails.
    async fn flush(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let Some(batch) = Command::batch(&pending) else {
            return Ok(());
        };

        self.stats.batches_flushed += 1;
        self.stats.commands_flushed += pending.len() as u64;
        tracing::debug!(commands = pending.len(), body = batch.body(), "Flushing bulk");

        let published = self.subscribers.publish(&batch).await;
        let relaxed = self.subscribers.notify_relax().await;
        published.and(relaxed)
    }
}

#[async_trait]
impl Consumer for Accumulator {
    fn name(&self) -> &str {
        "accumulator"
    }

    async fn receive(&mut self, command: &Command) -> Result<()> {
        self.stats.commands_received += 1;

        let should_flush = match command.kind() {
            CommandKind::OpenScope => self.open_scope(),
            CommandKind::CloseScope if self.scope_level != 0 => self.close_scope(),
            // An unmatched close is ordinary payload
            CommandKind::CloseScope | CommandKind::Payload => self.push_payload(command),
        };

        if should_flush {
            self.flush().await?;
        }
        Ok(())
    }

    async fn relax(&mut self) -> Result<()> {
        if self.scope_level != 0 {
            tracing::warn!(
                scope_level = self.scope_level,
                pending = self.pending.len(),
                "Input ended inside an open scope"
            );
            self.scope_level = 0;
            if !self.policy.flush_unclosed_on_end {
                self.stats.commands_abandoned += self.pending.len() as u64;
                self.pending.clear();
            }
        }

        let result = self.flush().await;

        tracing::info!(
            received = self.stats.commands_received,
            batches = self.stats.batches_flushed,
            flushed = self.stats.commands_flushed,
            abandoned = self.stats.commands_abandoned,
            "Accumulator drained"
        );

        result
    }
}

impl Publisher for Accumulator {
    fn add_consumer(&mut self, consumer: Box<dyn Consumer>) {
        self.subscribers.add(consumer);
    }

    fn consumer_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_after_scope_markers() {
        let mut acc = Accumulator::with_bulk_size(2).unwrap();

        acc.receive(&Command::now("{")).await.unwrap();
        acc.receive(&Command::now("{")).await.unwrap();
        assert_eq!(acc.scope_level(), 2);
        assert_eq!(acc.pending_len(), 0);

        acc.receive(&Command::now("}")).await.unwrap();
        acc.receive(&Command::now("}")).await.unwrap();
        assert_eq!(acc.scope_level(), 0);

        // Excess close is kept as payload
        acc.receive(&Command::now("}")).await.unwrap();
        assert_eq!(acc.scope_level(), 0);
        assert_eq!(acc.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_scope_ignores_bulk_size() {
        let mut acc = Accumulator::with_bulk_size(1).unwrap();

        acc.receive(&Command::now("{")).await.unwrap();
        for body in ["a", "b", "c"] {
            acc.receive(&Command::now(body)).await.unwrap();
        }

        assert_eq!(acc.pending_len(), 3);
        assert_eq!(acc.stats().batches_flushed, 0);
    }

    #[tokio::test]
    async fn test_relax_inside_scope_drops_pending() {
        let mut acc = Accumulator::with_bulk_size(3).unwrap();

        for body in ["{", "a", "b"] {
            acc.receive(&Command::now(body)).await.unwrap();
        }
        acc.relax().await.unwrap();

        let stats = acc.stats();
        assert_eq!(stats.commands_received, 3);
        assert_eq!(stats.commands_abandoned, 2);
        assert_eq!(stats.batches_flushed, 0);
        assert_eq!(acc.scope_level(), 0);
        assert_eq!(acc.pending_len(), 0);
    }

    #[test]
    fn test_zero_bulk_size_is_rejected() {
        assert!(Accumulator::with_bulk_size(0).is_err());
    }
}
