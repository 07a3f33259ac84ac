//! # QuorumSig Types
//!
//! Core type definitions shared by the aggregation engine and its
//! collaborators.
//!
//! This crate provides:
//! - [`ChainId`], [`SubnetId`], [`NodeId`], [`ValidationId`], [`MessageId`] -
//!   fixed-width identifiers
//! - [`UnsignedMessage`] and [`SignedMessage`] - the payload being attested
//!   and the aggregate-signed result
//! - [`SignerBitSet`] - which validators of a canonical set contributed
//! - [`CanonicalValidatorSet`] and [`ConnectedValidators`] - weighted,
//!   deterministically ordered validator sets
//! - [`SignatureRequest`] and [`SignatureResponse`] - the wire messages
//!   exchanged with validators
//!
//! ## Example
//!
//! ```rust
//! use quorumsig_types::{ChainId, UnsignedMessage};
//!
//! let chain: ChainId = "0x0101010101010101010101010101010101010101010101010101010101010101"
//!     .parse()
//!     .unwrap();
//! let message = UnsignedMessage::new(1, chain, b"payload".to_vec());
//!
//! // The identity is a content hash, stable across encodings
//! assert_eq!(message.id(), message.clone().id());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod bitset;
pub mod ids;
pub mod message;
pub mod serde_hex;
pub mod validator;
pub mod wire;

// Re-export main types at crate root
pub use bitset::SignerBitSet;
pub use ids::{ChainId, MessageId, NodeId, SubnetId, ValidationId};
pub use message::{SignedMessage, UnsignedMessage};
pub use validator::{threshold_weight, CanonicalValidatorSet, ConnectedValidators, Validator};
pub use wire::{SignatureRequest, SignatureResponse};

/// Result type alias for type-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with quorum types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Invalid length for a fixed-size type
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Validator weights do not fit in a u64
    #[error("validator weight overflow")]
    WeightOverflow,

    /// Signer bit refers to a validator outside the set
    #[error("signer index {index} out of range for {len} validators")]
    SignerOutOfRange {
        /// Offending index
        index: usize,
        /// Number of validators in the set
        len: usize,
    },

    /// Signers do not carry enough weight
    #[error("insufficient signed weight: {signed} < {required}")]
    InsufficientWeight {
        /// Weight of the signers
        signed: u64,
        /// Required weight
        required: u64,
    },

    /// Aggregate signature does not verify against the signers' keys
    #[error("aggregate signature verification failed")]
    InvalidAggregate,

    /// Wire encoding error
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Cryptographic error
    #[error("crypto error: {0}")]
    Crypto(#[from] quorumsig_crypto::CryptoError),
}
