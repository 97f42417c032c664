use bulkmill_types::Command;

use crate::consumer::Consumer;
use crate::error::{BulkError, Result};

/// Something consumers can be attached to
pub trait Publisher {
    fn add_consumer(&mut self, consumer: Box<dyn Consumer>);

    fn consumer_count(&self) -> usize;
}

/// Ordered set of consumers owned by a publisher.
///
/// Delivery follows registration order. A failing consumer does not stop
/// delivery to the ones after it; the first error is returned once every
/// consumer has been called, attributed to the consumer that raised it.
#[derive(Default)]
pub struct Subscribers {
    consumers: Vec<Box<dyn Consumer>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, consumer: Box<dyn Consumer>) {
        tracing::debug!(consumer = consumer.name(), "Consumer registered");
        self.consumers.push(consumer);
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Deliver a command to every consumer
    pub async fn publish(&mut self, command: &Command) -> Result<()> {
        let mut first_error = None;

        for consumer in self.consumers.iter_mut() {
            if let Err(e) = consumer.receive(command).await {
                tracing::warn!(consumer = consumer.name(), error = %e, "Consumer failed to receive command");
                first_error.get_or_insert_with(|| BulkError::from_consumer(consumer.name(), e));
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Tell every consumer that the current group is over
    pub async fn notify_relax(&mut self) -> Result<()> {
        let mut first_error = None;

        for consumer in self.consumers.iter_mut() {
            if let Err(e) = consumer.relax().await {
                tracing::warn!(consumer = consumer.name(), error = %e, "Consumer failed to relax");
                first_error.get_or_insert_with(|| BulkError::from_consumer(consumer.name(), e));
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.consumers.iter().map(|c| c.name()))
            .finish()
    }
}
