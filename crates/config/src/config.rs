//! Main configuration module
//!
//! All aggregation settings are defined in one `quorumsig.toml` file.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Aggregation engine parameters
    #[serde(default)]
    pub aggregator: AggregationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns the parsed and validated configuration.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        info!("Loading configuration from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::from_str(&content)?;

        info!(
            max_rounds = config.aggregator.max_rounds,
            cache_size = config.aggregator.signature_cache_size,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Load configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        debug!("Configuration parsed successfully, validating...");
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.aggregator.validate()?;
        self.logging.validate()?;

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

// =============================================================================
// Aggregation Configuration
// =============================================================================

/// Aggregation engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Number of messages whose signature shares are cached (LRU)
    pub signature_cache_size: usize,

    /// Maximum request rounds per aggregation
    pub max_rounds: u32,

    /// How long a round waits for responses (milliseconds)
    pub round_timeout_ms: u64,

    /// Pause before the second round (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound on the pause between rounds (milliseconds)
    pub max_backoff_ms: u64,

    /// Growth factor of the pause between consecutive rounds
    pub backoff_multiplier: u32,

    /// Extra rounds spent chasing the quorum buffer once the required quorum
    /// is met
    pub buffer_extra_rounds: u32,

    /// On-chain staking balance below which a node is underfunded
    pub min_validator_balance: u64,

    /// Required quorum percentage used when a caller does not give one
    pub default_required_quorum_pct: u64,

    /// Quorum buffer percentage used when a caller does not give one
    pub default_quorum_buffer_pct: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            signature_cache_size: 1024,
            max_rounds: 5,
            round_timeout_ms: 5000,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
            backoff_multiplier: 2,
            buffer_extra_rounds: 1,
            min_validator_balance: 1,
            default_required_quorum_pct: 67,
            default_quorum_buffer_pct: 5,
        }
    }
}

impl AggregationConfig {
    /// Validate aggregation parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.signature_cache_size == 0 {
            return Err(ConfigError::ZeroValue {
                name: "signature_cache_size",
            });
        }

        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroValue { name: "max_rounds" });
        }

        if self.round_timeout_ms == 0 {
            return Err(ConfigError::ZeroValue {
                name: "round_timeout_ms",
            });
        }

        if self.backoff_multiplier == 0 {
            return Err(ConfigError::ZeroValue {
                name: "backoff_multiplier",
            });
        }

        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff {
                initial: self.initial_backoff_ms,
                max: self.max_backoff_ms,
            });
        }

        let required = self.default_required_quorum_pct;
        let buffer = self.default_quorum_buffer_pct;
        if required == 0 || required > 100 || required.saturating_add(buffer) > 100 {
            return Err(ConfigError::InvalidQuorum { required, buffer });
        }

        Ok(())
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Log format (pretty, compact, json)
    pub format: String,
}

impl LoggingConfig {
    /// Validate level and format names.
    pub fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.level.clone()));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(self.format.clone()));
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
