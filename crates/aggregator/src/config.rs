//! Runtime configuration for the aggregator.

use quorumsig_config::AggregationConfig;
use std::time::Duration;

/// Aggregator parameters with durations resolved.
///
/// Built from the `[aggregator]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Messages whose shares are cached
    pub signature_cache_size: usize,
    /// Maximum request rounds per aggregation
    pub max_rounds: u32,
    /// How long one round waits for responses
    pub round_timeout: Duration,
    /// Pause after the first round
    pub initial_backoff: Duration,
    /// Cap on the pause between rounds
    pub max_backoff: Duration,
    /// Growth factor of the pause
    pub backoff_multiplier: u32,
    /// Extra rounds spent reaching the buffer after the required quorum
    pub buffer_extra_rounds: u32,
    /// Balance below which an on-chain staker is underfunded
    pub min_validator_balance: u64,
    /// Required quorum percentage for requests built by the aggregator
    pub default_required_quorum_pct: u64,
    /// Buffer percentage for requests built by the aggregator
    pub default_quorum_buffer_pct: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from(&AggregationConfig::default())
    }
}

impl From<&AggregationConfig> for AggregatorConfig {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            signature_cache_size: config.signature_cache_size,
            max_rounds: config.max_rounds,
            round_timeout: Duration::from_millis(config.round_timeout_ms),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            backoff_multiplier: config.backoff_multiplier,
            buffer_extra_rounds: config.buffer_extra_rounds,
            min_validator_balance: config.min_validator_balance,
            default_required_quorum_pct: config.default_required_quorum_pct,
            default_quorum_buffer_pct: config.default_quorum_buffer_pct,
        }
    }
}

impl AggregatorConfig {
    /// Short timeouts for testing.
    pub fn fast() -> Self {
        Self {
            round_timeout: Duration::from_millis(100),
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
            ..Self::default()
        }
    }

    /// Pause before the round following `completed_rounds` rounds.
    ///
    /// backoff = initial_backoff * multiplier^(completed_rounds - 1), capped
    /// at `max_backoff`.
    pub fn backoff(&self, completed_rounds: u32) -> Duration {
        if completed_rounds == 0 {
            return Duration::ZERO;
        }
        let factor = self
            .backoff_multiplier
            .saturating_pow(completed_rounds - 1);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}
