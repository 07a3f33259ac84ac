//! Fixed-width identifiers.
//!
//! Chains, subnets, validations and messages are identified by 32-byte values;
//! nodes by 20-byte values. All of them print and parse as `0x`-prefixed hex
//! and serialize as hex strings.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Size of a 32-byte identifier
pub const ID_SIZE: usize = 32;

/// Size of a node identifier
pub const NODE_ID_SIZE: usize = 20;

macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $size]);

        impl $name {
            /// The all-zero identifier.
            pub const ZERO: Self = Self([0u8; $size]);

            /// Creates an identifier from a fixed-size array.
            #[inline]
            pub const fn new(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            /// Creates an identifier from a slice of exactly the right length.
            pub fn from_slice(slice: &[u8]) -> Result<Self> {
                let bytes: [u8; $size] = slice.try_into().map_err(|_| Error::InvalidLength {
                    expected: $size,
                    actual: slice.len(),
                })?;
                Ok(Self(bytes))
            }

            /// Parses an identifier from hex, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)?;
                Self::from_slice(&bytes)
            }

            /// Returns the hex representation with 0x prefix.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Returns the identifier as a byte slice.
            #[inline]
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Returns the identifier as a fixed-size array.
            #[inline]
            pub const fn as_fixed_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            /// Checks if this is the all-zero identifier.
            #[inline]
            pub fn is_zero(&self) -> bool {
                self == &Self::ZERO
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; $size] {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_id!(
    /// Identifier of a blockchain.
    ChainId,
    ID_SIZE
);

fixed_id!(
    /// Identifier of a subnet, the unit that owns a validator set.
    SubnetId,
    ID_SIZE
);

fixed_id!(
    /// Identifier of a single staking registration on the base chain.
    ValidationId,
    ID_SIZE
);

fixed_id!(
    /// Content-hash identity of an unsigned message.
    MessageId,
    ID_SIZE
);

fixed_id!(
    /// Identifier of a physical node on the peer network.
    NodeId,
    NODE_ID_SIZE
);

impl SubnetId {
    /// The primary network. Its validators validate every subnet's chains.
    pub const PRIMARY_NETWORK: Self = Self::ZERO;

    /// Checks if this is the primary network.
    #[inline]
    pub fn is_primary_network(&self) -> bool {
        *self == Self::PRIMARY_NETWORK
    }
}

impl MessageId {
    /// Computes the Keccak256 hash of the given data.
    pub fn keccak256(data: &[u8]) -> Self {
        let digest = Keccak256::digest(data);
        let mut bytes = [0u8; ID_SIZE];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}
