//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use crate::error::{ConfigError, ConfigResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber described by `config`.
///
/// `RUST_LOG` overrides the configured level. Fails if the configuration is
/// invalid or a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> ConfigResult<()> {
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    let result = match config.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init(),
        "compact" => tracing_subscriber::registry()
            .with(fmt::layer().compact())
            .with(env_filter)
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .try_init(),
    };

    result.map_err(|e| ConfigError::LoggingInit(e.to_string()))
}
