//! Unsigned and aggregate-signed messages.

use crate::{threshold_weight, CanonicalValidatorSet, ChainId, Error, MessageId, Result, SignerBitSet};
use quorumsig_crypto::{PublicKeyBytes, SignatureBytes, SignatureScheme};
use serde::{Deserialize, Serialize};

/// A message awaiting attestation.
///
/// Immutable once built. Its identity is the Keccak256 hash of [`bytes`].
///
/// [`bytes`]: UnsignedMessage::bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnsignedMessage {
    /// Network the source chain belongs to
    pub network_id: u32,
    /// Chain the message originates from
    pub source_chain_id: ChainId,
    /// Opaque payload
    #[serde(with = "crate::serde_hex::bytes")]
    pub payload: Vec<u8>,
}

impl UnsignedMessage {
    /// Create a new unsigned message.
    pub fn new(network_id: u32, source_chain_id: ChainId, payload: Vec<u8>) -> Self {
        Self {
            network_id,
            source_chain_id,
            payload,
        }
    }

    /// Deterministic encoding signed by validators.
    ///
    /// ```text
    /// network_id (u32 BE) || source_chain_id (32) || len(payload) (u32 BE) || payload
    /// ```
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + 32 + 4 + self.payload.len());
        bytes.extend_from_slice(&self.network_id.to_be_bytes());
        bytes.extend_from_slice(self.source_chain_id.as_bytes());
        bytes.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Content-hash identity of the message.
    pub fn id(&self) -> MessageId {
        MessageId::keccak256(&self.bytes())
    }
}

/// A message carrying an aggregate signature from a quorum of validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// The attested message
    pub message: UnsignedMessage,
    /// Canonical indices of the contributing validators
    pub signers: SignerBitSet,
    /// Aggregate of the contributors' shares
    #[serde(with = "crate::serde_hex::array")]
    pub signature: SignatureBytes,
}

impl SignedMessage {
    /// Create a signed message.
    pub fn new(message: UnsignedMessage, signers: SignerBitSet, signature: SignatureBytes) -> Self {
        Self {
            message,
            signers,
            signature,
        }
    }

    /// Weight of the signers within `validator_set`.
    pub fn signed_weight(&self, validator_set: &CanonicalValidatorSet) -> Result<u64> {
        let mut weight = 0u64;
        for index in self.signers.iter() {
            let validator = validator_set.get(index).ok_or(Error::SignerOutOfRange {
                index,
                len: validator_set.len(),
            })?;
            weight = weight
                .checked_add(validator.weight)
                .ok_or(Error::WeightOverflow)?;
        }
        Ok(weight)
    }

    /// Verify the signature against `validator_set`.
    ///
    /// Checks that every signer is in range, that the signers hold at least
    /// `required_pct` percent of the set's total weight, and that the
    /// aggregate verifies against their public keys.
    pub fn verify(
        &self,
        validator_set: &CanonicalValidatorSet,
        required_pct: u64,
        scheme: &dyn SignatureScheme,
    ) -> Result<()> {
        let signed = self.signed_weight(validator_set)?;
        let required = threshold_weight(validator_set.total_weight(), required_pct);
        if signed < required || signed == 0 {
            return Err(Error::InsufficientWeight { signed, required });
        }

        let public_keys: Vec<PublicKeyBytes> = self
            .signers
            .iter()
            .filter_map(|i| validator_set.get(i))
            .map(|v| v.public_key_bytes())
            .collect();

        if !scheme.verify_aggregate(&public_keys, &self.message.bytes(), &self.signature) {
            return Err(Error::InvalidAggregate);
        }

        Ok(())
    }
}
