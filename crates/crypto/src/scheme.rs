//! Signature capability used by the aggregation engine.
//!
//! The engine never calls BLS directly. It verifies shares, aggregates them and
//! checks the result through a [`SignatureScheme`], so tests and alternative
//! backends can substitute their own implementation.

use crate::bls::{BlsPrivateKey, BlsPublicKey, BlsSignature};
use crate::{PublicKeyBytes, Result, SignatureBytes};

/// Verification and aggregation of signature shares over raw encodings.
pub trait SignatureScheme: Send + Sync {
    /// Check one validator's share against the message and its public key.
    ///
    /// Malformed keys or signatures verify as `false`.
    fn verify_share(
        &self,
        public_key: &PublicKeyBytes,
        message: &[u8],
        signature: &SignatureBytes,
    ) -> bool;

    /// Combine shares over the same message into one signature.
    fn aggregate_signatures(&self, signatures: &[SignatureBytes]) -> Result<SignatureBytes>;

    /// Check an aggregate signature against the public keys of every signer.
    fn verify_aggregate(
        &self,
        public_keys: &[PublicKeyBytes],
        message: &[u8],
        signature: &SignatureBytes,
    ) -> bool;
}

/// Produces signature shares. Implemented by validator keys.
pub trait MessageSigner {
    /// Sign `message`, returning the compressed share.
    fn sign_bytes(&self, message: &[u8]) -> SignatureBytes;
}

impl MessageSigner for BlsPrivateKey {
    fn sign_bytes(&self, message: &[u8]) -> SignatureBytes {
        self.sign(message).to_bytes()
    }
}

/// BLS12-381 implementation of [`SignatureScheme`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlsScheme;

impl SignatureScheme for BlsScheme {
    fn verify_share(
        &self,
        public_key: &PublicKeyBytes,
        message: &[u8],
        signature: &SignatureBytes,
    ) -> bool {
        let Ok(public_key) = BlsPublicKey::from_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = BlsSignature::from_bytes(signature) else {
            return false;
        };
        signature.verify(message, &public_key)
    }

    fn aggregate_signatures(&self, signatures: &[SignatureBytes]) -> Result<SignatureBytes> {
        let decoded = signatures
            .iter()
            .map(BlsSignature::from_bytes)
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&BlsSignature> = decoded.iter().collect();
        BlsSignature::aggregate(&refs).map(|sig| sig.to_bytes())
    }

    fn verify_aggregate(
        &self,
        public_keys: &[PublicKeyBytes],
        message: &[u8],
        signature: &SignatureBytes,
    ) -> bool {
        match BlsSignature::from_bytes(signature) {
            Ok(sig) => sig.fast_aggregate_verify(message, public_keys),
            Err(_) => false,
        }
    }
}
