pub mod command;
pub mod config;

pub use command::{Command, CommandKind, BATCH_SEPARATOR, CLOSE_SCOPE, OPEN_SCOPE};
pub use config::{BulkConfig, InvalidBulkSize, ScopePolicy};
