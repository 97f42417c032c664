pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::{Cli, Settings, SettingsError};
pub use logging::init_logging;
pub use pipeline::{run, run_pipeline};
