pub mod accumulator;
pub mod consumer;
pub mod error;
pub mod publisher;

pub use accumulator::{Accumulator, AccumulatorStats};
pub use consumer::Consumer;
pub use error::{BulkError, Result};
pub use publisher::{Publisher, Subscribers};

pub use bulkmill_types::{BulkConfig, Command, CommandKind, InvalidBulkSize, ScopePolicy};
