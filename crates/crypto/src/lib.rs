//! # QuorumSig Crypto
//!
//! Cryptographic primitives for collecting and combining validator attestations.
//!
//! This crate provides:
//! - **BLS12-381 signatures** - per-validator signature shares over a message
//! - **Aggregation** - combining shares into one signature verifiable against
//!   the combined public keys of the signers
//! - **[`SignatureScheme`]** - the swappable capability the aggregation engine
//!   verifies and aggregates through
//!
//! ## Example
//!
//! ```rust
//! use quorumsig_crypto::{BlsPrivateKey, BlsScheme, MessageSigner, SignatureScheme};
//!
//! let keys: Vec<_> = (0..3).map(|_| BlsPrivateKey::random()).collect();
//! let message = b"cross-chain message";
//!
//! let shares: Vec<_> = keys.iter().map(|k| k.sign_bytes(message)).collect();
//! let pubkeys: Vec<_> = keys.iter().map(|k| k.public_key().to_bytes()).collect();
//!
//! let scheme = BlsScheme;
//! assert!(scheme.verify_share(&pubkeys[0], message, &shares[0]));
//!
//! let aggregate = scheme.aggregate_signatures(&shares).unwrap();
//! assert!(scheme.verify_aggregate(&pubkeys, message, &aggregate));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod bls;
pub mod scheme;

pub use bls::{BlsPrivateKey, BlsPublicKey, BlsSignature, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
pub use scheme::{BlsScheme, MessageSigner, SignatureScheme};

/// Compressed BLS public key bytes
pub type PublicKeyBytes = [u8; PUBLIC_KEY_LENGTH];

/// Compressed BLS signature bytes
pub type SignatureBytes = [u8; SIGNATURE_LENGTH];

/// Error types for cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Invalid public key bytes
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid signature bytes
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// BLS operation failed
    #[error("BLS operation failed: {0}")]
    BlsError(String),

    /// Invalid input length
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Hex decoding error
    #[error("hex decoding error: {0}")]
    HexError(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        CryptoError::HexError(e.to_string())
    }
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;
