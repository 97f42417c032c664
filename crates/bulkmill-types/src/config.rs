use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid bulk size: {0} (must be at least 1)")]
pub struct InvalidBulkSize(pub usize);

/// Settings of a single accumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfig {
    pub bulk_size: NonZeroUsize,
    #[serde(default)]
    pub scope: ScopePolicy,
}

impl BulkConfig {
    pub fn new(bulk_size: usize) -> Result<Self, InvalidBulkSize> {
        let bulk_size = NonZeroUsize::new(bulk_size).ok_or(InvalidBulkSize(bulk_size))?;
        Ok(Self {
            bulk_size,
            scope: ScopePolicy::default(),
        })
    }

    pub fn with_scope(mut self, scope: ScopePolicy) -> Self {
        self.scope = scope;
        self
    }
}

/// How malformed or nested scopes are treated.
///
/// The defaults flush the pending batch when a scope opens inside another one
/// and drop the contents of a scope that is still open at end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopePolicy {
    pub flush_on_nested_open: bool,
    pub flush_unclosed_on_end: bool,
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self {
            flush_on_nested_open: true,
            flush_unclosed_on_end: false,
        }
    }
}

impl ScopePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flush_on_nested_open(mut self, enabled: bool) -> Self {
        self.flush_on_nested_open = enabled;
        self
    }

    pub fn with_flush_unclosed_on_end(mut self, enabled: bool) -> Self {
        self.flush_unclosed_on_end = enabled;
        self
    }
}
