//! Quorum percentages and threshold arithmetic.

use crate::error::{AggregationError, Result};
use quorumsig_types::threshold_weight;

/// A validated (required, buffer) quorum pair.
///
/// `required_pct` is the share of total weight that must sign. `buffer_pct`
/// is attempted on top of it on a best-effort basis, so an aggregate keeps
/// verifying if validator weights shift slightly before it is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumRules {
    required_pct: u64,
    buffer_pct: u64,
}

impl QuorumRules {
    /// Validate and build a quorum pair.
    pub fn new(required_pct: u64, buffer_pct: u64) -> Result<Self> {
        Self::validate(required_pct, buffer_pct)?;
        Ok(Self {
            required_pct,
            buffer_pct,
        })
    }

    /// Check a quorum pair.
    ///
    /// Fails if `required_pct` is zero or above 100, or if
    /// `required_pct + buffer_pct` exceeds 100.
    pub fn validate(required_pct: u64, buffer_pct: u64) -> Result<()> {
        if required_pct == 0
            || required_pct > 100
            || required_pct.saturating_add(buffer_pct) > 100
        {
            return Err(AggregationError::InvalidQuorum {
                required: required_pct,
                buffer: buffer_pct,
            });
        }
        Ok(())
    }

    /// Required quorum percentage.
    pub fn required_pct(&self) -> u64 {
        self.required_pct
    }

    /// Buffer percentage.
    pub fn buffer_pct(&self) -> u64 {
        self.buffer_pct
    }

    /// Weight that must sign: `ceil(total_weight * required_pct / 100)`.
    pub fn required_weight(&self, total_weight: u64) -> u64 {
        threshold_weight(total_weight, self.required_pct)
    }

    /// Weight the aggregator aims for, including the buffer.
    pub fn target_weight(&self, total_weight: u64) -> u64 {
        threshold_weight(total_weight, self.required_pct + self.buffer_pct)
    }
}
