//! Configuration loading and typed config structures for the emulator.
//!
//! The canonical configuration lives in `emulator-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a
//! loader that reads and validates the file. When no YAML file exists the
//! engine falls back to the plain-text files handled by [`crate::legacy`].
//!
//! The configuration is an immutable snapshot: it is loaded once at startup
//! and passed into the scheduler. There is no runtime reload.

use std::path::Path;
use std::time::Duration;

use emulator_types::{ChannelDefinition, ValidationError};
use serde::Deserialize;

/// Default tick period in milliseconds.
pub const DEFAULT_PERIOD_MS: u64 = 5_000;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// No channels were configured.
    #[error("no channels configured")]
    NoChannels,

    /// The tick period is zero.
    #[error("period_ms must be greater than zero")]
    ZeroPeriod,

    /// The tick period is present but not a positive integer.
    #[error("invalid period {value:?}: expected a positive number of milliseconds")]
    InvalidPeriod {
        /// The offending value.
        value: String,
    },

    /// The database port is present but not a valid port number.
    #[error("invalid database port {value:?}: {reason}")]
    InvalidPort {
        /// The offending value.
        value: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// A channel definition is malformed.
    #[error("invalid channel: {source}")]
    InvalidChannel {
        /// The underlying validation error.
        #[from]
        source: ValidationError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level emulator configuration.
///
/// Mirrors the structure of `emulator-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmulatorConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Master RNG seed. A random seed is chosen (and logged) when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Stop after this many ticks (0 = run until terminated).
    #[serde(default)]
    pub max_ticks: u64,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Channel definitions.
    #[serde(default)]
    pub channels: Vec<ChannelDefinition>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            seed: None,
            max_ticks: 0,
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            channels: Vec::new(),
        }
    }
}

impl EmulatorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `DATABASE_URL`, when set, overrides the storage connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.storage.apply_env_overrides();
        Ok(config)
    }

    /// Check everything the tick loop relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroPeriod`], [`ConfigError::NoChannels`], or
    /// [`ConfigError::InvalidChannel`] for the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        emulator_types::validate_all(&self.channels)?;
        Ok(())
    }

    /// The tick period as a [`Duration`].
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Which storage backend receives channel values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// `PostgreSQL` tables `data` and `latestinfo`.
    #[default]
    Postgres,
    /// Log every value instead of storing it (dry run).
    Log,
}

impl StorageBackend {
    /// Lowercase name for logging.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Log => "log",
        }
    }
}

/// Storage connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Full connection URL. Takes precedence over the individual fields.
    #[serde(default)]
    pub url: Option<String>,

    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,

    /// Login user.
    #[serde(default = "default_username")]
    pub username: String,

    /// Login password.
    #[serde(default = "default_password")]
    pub password: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl StorageConfig {
    /// Override the connection URL with `DATABASE_URL` when set.
    ///
    /// This allows a deployment to set the connection string via the
    /// environment without modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL") {
            self.url = Some(url);
        }
    }

    /// The connection timeout as a [`Duration`].
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: None,
            host: default_host(),
            port: default_port(),
            database: default_database(),
            username: default_username(),
            password: default_password(),
            max_connections: default_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_period_ms() -> u64 {
    DEFAULT_PERIOD_MS
}

fn default_host() -> String {
    "localhost".to_owned()
}

const fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "testdb".to_owned()
}

fn default_username() -> String {
    "postgres".to_owned()
}

fn default_password() -> String {
    "password".to_owned()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
