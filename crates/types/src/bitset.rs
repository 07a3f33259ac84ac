//! Signer bitset.
//!
//! Bit `i` (byte `i / 8`, bit `i % 8`) is set iff validator `i` of the
//! canonical validator set contributed a share to the aggregate. The bitset
//! is trimmed so the last byte is never zero, giving every signer set exactly
//! one encoding.

use serde::{Deserialize, Serialize};

/// Set of contributing validator indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SignerBitSet(#[serde(with = "crate::serde_hex::bytes")] Vec<u8>);

impl SignerBitSet {
    /// Creates an empty bitset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bitset from raw bytes, dropping trailing zero bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = Self(bytes.to_vec());
        bits.trim();
        bits
    }

    /// Marks validator `index` as a signer.
    pub fn add(&mut self, index: usize) {
        let byte = index / 8;
        if byte >= self.0.len() {
            self.0.resize(byte + 1, 0);
        }
        self.0[byte] |= 1 << (index % 8);
    }

    /// Checks whether validator `index` signed.
    pub fn contains(&self, index: usize) -> bool {
        self.0
            .get(index / 8)
            .map_or(false, |byte| byte & (1 << (index % 8)) != 0)
    }

    /// Number of signers.
    pub fn count(&self) -> usize {
        self.0.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Checks whether no validator signed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Signer indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(byte_idx, byte)| {
            (0..8)
                .filter(move |bit| byte & (1 << bit) != 0)
                .map(move |bit| byte_idx * 8 + bit)
        })
    }

    /// Raw bitset bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    fn trim(&mut self) {
        while self.0.last() == Some(&0) {
            self.0.pop();
        }
    }
}

impl FromIterator<usize> for SignerBitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut bits = Self::new();
        for index in iter {
            bits.add(index);
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        let mut bits = SignerBitSet::new();
        bits.add(0);
        bits.add(9);
        assert_eq!(bits.bytes(), &[0b0000_0001, 0b0000_0010]);
        assert!(bits.contains(0));
        assert!(bits.contains(9));
        assert!(!bits.contains(1));
        assert!(!bits.contains(100));
    }

    #[test]
    fn test_iter_ascending() {
        let bits: SignerBitSet = [17, 3, 8, 3].into_iter().collect();
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![3, 8, 17]);
        assert_eq!(bits.count(), 3);
    }

    #[test]
    fn test_from_bytes_trims() {
        let bits = SignerBitSet::from_bytes(&[0b101, 0, 0]);
        assert_eq!(bits.bytes(), &[0b101]);
        assert!(SignerBitSet::from_bytes(&[0, 0]).is_empty());
    }
}
