use async_trait::async_trait;
use bulkmill_types::Command;

use crate::error::Result;

/// Receiving end of the pipeline.
///
/// Implemented by every sink and by the accumulator itself. Items arrive
/// through `receive` in groups; `relax` marks the end of the current group
/// and is the point where buffered output must be finalized.
#[async_trait]
pub trait Consumer: Send {
    /// Short label used in diagnostics
    fn name(&self) -> &str {
        "consumer"
    }

    /// Accept a single item of the current group
    async fn receive(&mut self, command: &Command) -> Result<()>;

    /// Finalize the current group
    ///
    /// The next `receive` after this call starts a new group.
    async fn relax(&mut self) -> Result<()>;
}
