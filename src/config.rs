//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

use serde::Deserialize;

use crate::label::BadgeLayout;
use crate::label::DEFAULT_ORGANIZATION;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "badge-ledger.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "BADGE_LEDGER_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "BADGE_LEDGER";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "BADGE_LEDGER_LOG";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Label printer configuration.
    pub printer: PrinterConfig,
    /// Label layout configuration.
    pub labels: LabelConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `badge-ledger.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Create config for testing: in-memory storage, defaults elsewhere.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                path: crate::storage::IN_MEMORY_PATH.to_string(),
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path, or `:memory:`.
    pub path: String,
    /// Pool size for file-backed databases.
    pub max_connections: u32,
    /// How long a writer waits for the SQLite lock before failing.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/badge-ledger.db".to_string(),
            max_connections: 4,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Label printer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Default device address (`host` or `host:port`).
    pub device: Option<String>,
    /// TCP connect timeout.
    pub connect_timeout_ms: u64,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            device: None,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Label layout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Visitor badge layout.
    pub badge_layout: BadgeLayout,
    /// Organization line printed on employee labels.
    pub organization: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            badge_layout: BadgeLayout::default(),
            organization: DEFAULT_ORGANIZATION.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),
}
