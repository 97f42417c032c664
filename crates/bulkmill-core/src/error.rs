use bulkmill_types::InvalidBulkSize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkError {
    #[error(transparent)]
    InvalidBulkSize(#[from] InvalidBulkSize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Consumer '{consumer}' failed: {source}")]
    Consumer {
        consumer: String,
        #[source]
        source: Box<BulkError>,
    },
}

impl BulkError {
    /// Attribute an error to the consumer that raised it.
    ///
    /// Errors already attributed further down a chain keep the innermost name.
    pub fn from_consumer(consumer: &str, error: BulkError) -> Self {
        match error {
            attributed @ BulkError::Consumer { .. } => attributed,
            other => BulkError::Consumer {
                consumer: consumer.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the consumer the error is attributed to, if any
    pub fn consumer(&self) -> Option<&str> {
        match self {
            BulkError::Consumer { consumer, .. } => Some(consumer),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BulkError>;
