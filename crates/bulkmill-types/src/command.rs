use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body that opens a scope
pub const OPEN_SCOPE: &str = "{";

/// Body that closes a scope
pub const CLOSE_SCOPE: &str = "}";

/// Separator between bodies of a flushed batch
pub const BATCH_SEPARATOR: &str = ", ";

/// Classification of a command by its body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    OpenScope,
    CloseScope,
    Payload,
}

/// A single line of input together with the moment it was captured.
///
/// Commands are never merged. A flushed batch is represented by a new
/// synthetic command built with [`Command::batch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    timestamp: DateTime<Utc>,
    body: String,
}

impl Command {
    pub fn new(timestamp: DateTime<Utc>, body: impl Into<String>) -> Self {
        Self {
            timestamp,
            body: body.into(),
        }
    }

    /// Create a command stamped with the current time
    pub fn now(body: impl Into<String>) -> Self {
        Self::new(Utc::now(), body)
    }

    /// Build the synthetic command delivered for a flushed batch.
    ///
    /// Bodies are joined with [`BATCH_SEPARATOR`] and the timestamp is taken
    /// from the first command. Returns `None` for an empty slice.
    pub fn batch(commands: &[Command]) -> Option<Self> {
        let first = commands.first()?;
        let body = commands
            .iter()
            .map(|cmd| cmd.body.as_str())
            .collect::<Vec<_>>()
            .join(BATCH_SEPARATOR);

        Some(Self::new(first.timestamp, body))
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Capture time as seconds since the Unix epoch
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }

    pub fn kind(&self) -> CommandKind {
        match self.body.as_str() {
            OPEN_SCOPE => CommandKind::OpenScope,
            CLOSE_SCOPE => CommandKind::CloseScope,
            _ => CommandKind::Payload,
        }
    }

    pub fn is_open_scope_marker(&self) -> bool {
        self.kind() == CommandKind::OpenScope
    }

    pub fn is_close_scope_marker(&self) -> bool {
        self.kind() == CommandKind::CloseScope
    }
}
