pub mod reader;
pub mod sinks;

pub use reader::{CommandReader, ReadSummary};
pub use sinks::{ConsoleSink, FileSink};
