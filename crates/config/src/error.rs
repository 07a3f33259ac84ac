//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write configuration file
    #[error("Failed to write config file at {path}: {source}")]
    FileWrite {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize configuration
    #[error("Failed to serialize TOML config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A value that must be positive is zero
    #[error("Invalid {name}: must be positive")]
    ZeroValue {
        /// Field name
        name: &'static str,
    },

    /// Invalid backoff bounds
    #[error("Invalid backoff: initial_backoff_ms ({initial}) exceeds max_backoff_ms ({max})")]
    InvalidBackoff {
        /// Initial backoff
        initial: u64,
        /// Backoff cap
        max: u64,
    },

    /// Invalid default quorum pair
    #[error("Invalid quorum: required {required}% with buffer {buffer}% (required must be 1..=100 and required + buffer <= 100)")]
    InvalidQuorum {
        /// Required percentage
        required: u64,
        /// Buffer percentage
        buffer: u64,
    },

    /// Invalid log level
    #[error("Invalid log level: {0}. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Invalid log format
    #[error("Invalid log format: {0}. Valid values: pretty, compact, json")]
    InvalidLogFormat(String),

    /// A global tracing subscriber is already installed
    #[error("Failed to initialise logging: {0}")]
    LoggingInit(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
