use bulkmill_core::{BulkConfig, InvalidBulkSize, ScopePolicy};
use clap::Parser;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "config/bulkmill";

#[derive(Debug, Parser)]
#[command(name = "bulkmill", version, about = "Reads commands from stdin and prints them in bulks")]
pub struct Cli {
    /// Commands per bulk outside of `{ ... }` blocks
    #[arg(env = "BULKMILL_BULK_SIZE")]
    pub bulk_size: Option<u64>,

    /// TOML config file (must exist when given)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Directory for bulk<timestamp>.log files
    #[arg(long, env = "BULKMILL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not print bulks to stdout
    #[arg(long)]
    pub no_console: bool,

    /// Do not write bulk log files
    #[arg(long)]
    pub no_file: bool,

    /// Log filter, e.g. `info` or `bulkmill_core=debug`
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Bulk size is required (positional argument, BULKMILL_BULK_SIZE or [bulk] size)")]
    MissingBulkSize,

    #[error(transparent)]
    InvalidBulkSize(#[from] InvalidBulkSize),

    #[error("At least one sink must be enabled")]
    NoSinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bulk: BulkSettings,
    #[serde(default)]
    pub scope: ScopePolicy,
    #[serde(default)]
    pub sinks: SinksSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkSettings {
    pub size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SinksSettings {
    #[serde(default)]
    pub console: ConsoleSettings,
    #[serde(default)]
    pub file: FileSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub enabled: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl Settings {
    /// Load settings for a run
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. Built-in defaults
    /// 2. `--config <path>`, or `config/bulkmill.toml` if present
    /// 3. Environment variables (`BULKMILL_SINKS__FILE__DIRECTORY`, ...)
    /// 4. Command line flags
    pub fn load(cli: &Cli) -> Result<Self, SettingsError> {
        let mut builder = ConfigLoader::builder();

        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(path.as_path())),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder = builder
            .add_source(
                Environment::with_prefix("BULKMILL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("bulk.size", cli.bulk_size)?
            .set_override_option(
                "sinks.file.directory",
                cli.output_dir
                    .as_ref()
                    .map(|dir| dir.to_string_lossy().into_owned()),
            )?
            .set_override_option("logging.level", cli.log_level.clone())?;

        if cli.no_console {
            builder = builder.set_override("sinks.console.enabled", false)?;
        }
        if cli.no_file {
            builder = builder.set_override("sinks.file.enabled", false)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Check everything that can be rejected before input is read
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.bulk_config()?;
        if !self.sinks.console.enabled && !self.sinks.file.enabled {
            return Err(SettingsError::NoSinks);
        }
        Ok(())
    }

    pub fn bulk_config(&self) -> Result<BulkConfig, SettingsError> {
        let size = self.bulk.size.ok_or(SettingsError::MissingBulkSize)?;
        Ok(BulkConfig::new(size)?.with_scope(self.scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [bulk]
            size = 5

            [scope]
            flush_on_nested_open = false
            flush_unclosed_on_end = true

            [sinks.console]
            enabled = false

            [sinks.file]
            enabled = true
            directory = "/var/log/bulkmill"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.bulk.size, Some(5));
        assert!(!settings.scope.flush_on_nested_open);
        assert!(settings.scope.flush_unclosed_on_end);
        assert!(!settings.sinks.console.enabled);
        assert_eq!(settings.sinks.file.directory, PathBuf::from("/var/log/bulkmill"));
        assert_eq!(settings.logging.format, LogFormat::Json);

        let config = settings.bulk_config().unwrap();
        assert_eq!(config.bulk_size.get(), 5);
        assert!(config.scope.flush_unclosed_on_end);
    }

    #[test]
    fn test_sections_are_optional() {
        let settings: Settings = toml::from_str("[bulk]\nsize = 3\n").unwrap();

        assert!(settings.sinks.console.enabled);
        assert!(settings.sinks.file.enabled);
        assert_eq!(settings.sinks.file.directory, PathBuf::from("."));
        assert_eq!(settings.scope, ScopePolicy::default());
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.logging.format, LogFormat::Compact);
        settings.validate().unwrap();
    }

    #[test]
    fn test_missing_bulk_size() {
        let settings = Settings::default();

        assert!(matches!(settings.validate(), Err(SettingsError::MissingBulkSize)));
    }

    #[test]
    fn test_zero_bulk_size() {
        let settings: Settings = toml::from_str("[bulk]\nsize = 0\n").unwrap();

        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidBulkSize(InvalidBulkSize(0)))
        ));
    }

    #[test]
    fn test_all_sinks_disabled() {
        let toml = r#"
            [bulk]
            size = 3
            [sinks.console]
            enabled = false
            [sinks.file]
            enabled = false
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();

        assert!(matches!(settings.validate(), Err(SettingsError::NoSinks)));
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["bulkmill", "4", "--no-file", "--output-dir", "out"]);

        assert_eq!(cli.bulk_size, Some(4));
        assert!(cli.no_file);
        assert!(!cli.no_console);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_cli_rejects_non_numeric_bulk_size() {
        assert!(Cli::try_parse_from(["bulkmill", "three"]).is_err());
    }
}
