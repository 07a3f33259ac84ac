//! Wire messages exchanged between the aggregator and validators.
//!
//! A validator receiving a [`SignatureRequest`] answers with a
//! [`SignatureResponse`] carrying either its 96-byte share or an empty
//! signature when it declines to sign. Both are JSON-encoded.

use crate::{Error, Result, UnsignedMessage};
use quorumsig_crypto::{SignatureBytes, SIGNATURE_LENGTH};
use serde::{Deserialize, Serialize};

/// Request for a validator's signature share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// Message to sign
    pub message: UnsignedMessage,
    /// Optional evidence the validator may need to decide whether to sign
    #[serde(with = "crate::serde_hex::bytes", default)]
    pub justification: Vec<u8>,
}

impl SignatureRequest {
    /// Create a request.
    pub fn new(message: UnsignedMessage, justification: Vec<u8>) -> Self {
        Self {
            message,
            justification,
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Codec)
    }

    /// Decode from bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Error::Codec)
    }
}

/// A validator's answer to a [`SignatureRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignatureResponse {
    /// Signature share, or empty if the validator declined
    #[serde(with = "crate::serde_hex::bytes", default)]
    pub signature: Vec<u8>,
}

impl SignatureResponse {
    /// Response carrying a share.
    pub fn signed(signature: SignatureBytes) -> Self {
        Self {
            signature: signature.to_vec(),
        }
    }

    /// Response declining to sign.
    pub fn declined() -> Self {
        Self::default()
    }

    /// The share, `None` for a decline.
    ///
    /// Fails if the signature is neither empty nor exactly 96 bytes.
    pub fn share(&self) -> Result<Option<SignatureBytes>> {
        if self.signature.is_empty() {
            return Ok(None);
        }
        let share: SignatureBytes =
            self.signature
                .as_slice()
                .try_into()
                .map_err(|_| Error::InvalidLength {
                    expected: SIGNATURE_LENGTH,
                    actual: self.signature.len(),
                })?;
        Ok(Some(share))
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Codec)
    }

    /// Decode from bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Error::Codec)
    }
}
