//! # BLS12-381 Signature Shares
//!
//! Minimal-public-key BLS over BLS12-381: 48-byte G1 public keys, 96-byte G2
//! signatures. Each validator signs a message on its own; shares over the same
//! message aggregate into one signature that verifies against the signers'
//! public keys.
//!
//! Decoding rejects off-curve, out-of-subgroup and non-canonical points, so a
//! byte string maps to at most one key or share.
//!
//! ```rust
//! use quorumsig_crypto::bls::{BlsPrivateKey, BlsSignature};
//!
//! let keys: Vec<_> = (0..3).map(|_| BlsPrivateKey::random()).collect();
//! let message = b"cross-chain message";
//!
//! let shares: Vec<_> = keys.iter().map(|k| k.sign(message)).collect();
//! let aggregate = BlsSignature::aggregate(&shares.iter().collect::<Vec<_>>()).unwrap();
//!
//! let signers: Vec<_> = keys.iter().map(|k| k.public_key().to_bytes()).collect();
//! assert!(aggregate.fast_aggregate_verify(message, &signers));
//! ```

use crate::{CryptoError, PublicKeyBytes, Result, SignatureBytes};
use blst::min_pk::{AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Length of a compressed public key.
pub const PUBLIC_KEY_LENGTH: usize = 48;

/// Length of a compressed signature.
pub const SIGNATURE_LENGTH: usize = 96;

/// Proof-of-possession ciphersuite tag.
const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

// ============================================================================
// BLS Private Key
// ============================================================================

/// Validator signing key.
pub struct BlsPrivateKey {
    inner: SecretKey,
}

impl BlsPrivateKey {
    /// Fresh key from OS randomness.
    pub fn random() -> Self {
        let mut ikm = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut ikm);
        // key_gen only fails for IKM shorter than 32 bytes
        let inner = SecretKey::key_gen(&ikm, &[]).expect("32-byte IKM");
        Self { inner }
    }

    /// Public half of the key.
    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey {
            inner: self.inner.sk_to_pk(),
        }
    }

    /// Sign `message`.
    pub fn sign(&self, message: &[u8]) -> BlsSignature {
        BlsSignature {
            inner: self.inner.sign(message, DST, &[]),
        }
    }
}

impl fmt::Debug for BlsPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlsPrivateKey")
            .field("public_key", &self.public_key())
            .finish()
    }
}

// ============================================================================
// BLS Public Key
// ============================================================================

/// Validator public key.
///
/// Ordered by compressed bytes, which fixes a validator's position in a
/// canonical validator set.
#[derive(Clone)]
pub struct BlsPublicKey {
    inner: PublicKey,
}

impl BlsPublicKey {
    /// Decode and validate a compressed key.
    pub fn from_bytes(bytes: &PublicKeyBytes) -> Result<Self> {
        let inner = PublicKey::key_validate(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(format!("{:?}", e)))?;
        if inner.to_bytes() != *bytes {
            return Err(CryptoError::InvalidPublicKey("non-canonical encoding".to_string()));
        }
        Ok(Self { inner })
    }

    /// Compressed encoding.
    pub fn to_bytes(&self) -> PublicKeyBytes {
        self.inner.to_bytes()
    }
}

impl PartialEq for BlsPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsPublicKey {}

impl PartialOrd for BlsPublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlsPublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl std::hash::Hash for BlsPublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPublicKey(0x{})", hex::encode(self.to_bytes()))
    }
}

/// Hex string in human-readable formats, raw bytes otherwise.
impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let bytes = self.to_bytes();
        if serializer.is_human_readable() {
            serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
        } else {
            serializer.serialize_bytes(&bytes)
        }
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s.strip_prefix("0x").unwrap_or(&s))
                .map_err(|e| serde::de::Error::custom(CryptoError::from(e)))?
        } else {
            <Vec<u8>>::deserialize(deserializer)?
        };
        let key: PublicKeyBytes = bytes.as_slice().try_into().map_err(|_| {
            serde::de::Error::custom(CryptoError::InvalidLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            })
        })?;
        BlsPublicKey::from_bytes(&key).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// BLS Signature
// ============================================================================

/// A single share or an aggregate of shares over one message.
#[derive(Clone)]
pub struct BlsSignature {
    inner: Signature,
}

impl BlsSignature {
    /// Decode and subgroup-check a compressed signature.
    pub fn from_bytes(bytes: &SignatureBytes) -> Result<Self> {
        let inner = Signature::sig_validate(bytes, true)
            .map_err(|e| CryptoError::InvalidSignature(format!("{:?}", e)))?;
        if inner.to_bytes() != *bytes {
            return Err(CryptoError::InvalidSignature("non-canonical encoding".to_string()));
        }
        Ok(Self { inner })
    }

    /// Compressed encoding.
    pub fn to_bytes(&self) -> SignatureBytes {
        self.inner.to_bytes()
    }

    /// Check a single share against `public_key`.
    pub fn verify(&self, message: &[u8], public_key: &BlsPublicKey) -> bool {
        self.inner
            .verify(true, message, DST, &[], &public_key.inner, true)
            == BLST_ERROR::BLST_SUCCESS
    }

    /// Combine shares over the same message. Fails on an empty list.
    pub fn aggregate(signatures: &[&BlsSignature]) -> Result<Self> {
        if signatures.is_empty() {
            return Err(CryptoError::BlsError("nothing to aggregate".to_string()));
        }
        let sigs: Vec<&Signature> = signatures.iter().map(|s| &s.inner).collect();
        let aggregate = AggregateSignature::aggregate(&sigs, false)
            .map_err(|e| CryptoError::BlsError(format!("aggregation failed: {:?}", e)))?;
        Ok(Self {
            inner: aggregate.to_signature(),
        })
    }

    /// Check an aggregate against the compressed keys of every signer.
    ///
    /// False for an empty signer list or any key that fails to decode.
    pub fn fast_aggregate_verify(&self, message: &[u8], public_keys: &[PublicKeyBytes]) -> bool {
        if public_keys.is_empty() {
            return false;
        }
        let Ok(keys) = public_keys
            .iter()
            .map(BlsPublicKey::from_bytes)
            .collect::<Result<Vec<_>>>()
        else {
            return false;
        };
        let refs: Vec<&PublicKey> = keys.iter().map(|k| &k.inner).collect();
        self.inner.fast_aggregate_verify(true, message, DST, &refs) == BLST_ERROR::BLST_SUCCESS
    }
}

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsSignature {}

impl fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsSignature(0x{})", hex::encode(self.to_bytes()))
    }
}
