//! Aggregation error types.

use quorumsig_types::SubnetId;

/// Errors returned by [`SignatureAggregator::create_signed_message`].
///
/// Per-validator failures (timeouts, declines, malformed or invalid shares)
/// never appear here; they are logged and absorbed by the retry loop.
///
/// [`SignatureAggregator::create_signed_message`]: crate::SignatureAggregator::create_signed_message
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// Quorum percentages are out of range
    #[error("invalid quorum: required {required}%, buffer {buffer}%")]
    InvalidQuorum {
        /// Required quorum percentage
        required: u64,
        /// Buffer percentage
        buffer: u64,
    },

    /// The signing subnet has no validator weight at the requested height
    #[error("no signers: validator set of subnet {subnet_id} has zero weight")]
    NoSigners {
        /// Signing subnet
        subnet_id: SubnetId,
    },

    /// Connected validators cannot reach quorum even if all of them sign
    #[error("insufficient connected stake: connected {connected}, required {required}")]
    InsufficientConnectedStake {
        /// Weight of connected validators
        connected: u64,
        /// Weight needed for quorum
        required: u64,
    },

    /// Retries or time ran out before quorum
    #[error("not enough signatures: signed weight {signed}, required {required}")]
    NotEnoughSignatures {
        /// Weight of collected shares
        signed: u64,
        /// Weight needed for quorum
        required: u64,
    },

    /// The validator-set source failed
    #[error("validator source error: {0}")]
    ValidatorSource(String),

    /// Encoding the request for validators failed
    #[error("request encoding failed: {0}")]
    Encoding(#[from] quorumsig_types::Error),

    /// Combining shares failed
    #[error("crypto error: {0}")]
    Crypto(#[from] quorumsig_crypto::CryptoError),

    /// The aggregate failed its final self-check
    #[error("aggregate verification failed: {0}")]
    AggregateVerificationFailed(String),
}

/// Result type for aggregation operations
pub type Result<T> = std::result::Result<T, AggregationError>;
