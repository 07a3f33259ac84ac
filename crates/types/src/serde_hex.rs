//! Serde helpers that encode byte strings as `0x`-prefixed hex.
//!
//! Use with `#[serde(with = "serde_hex::bytes")]` for `Vec<u8>` and
//! `#[serde(with = "serde_hex::array")]` for fixed-size arrays.

/// Hex encoding for `Vec<u8>`.
pub mod bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as a hex string.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    /// Deserialize from a hex string, with or without `0x`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

/// Hex encoding for `[u8; N]`.
pub mod array {
    use serde::{Deserializer, Serializer};

    /// Serialize as a hex string.
    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        super::bytes::serialize(bytes, serializer)
    }

    /// Deserialize from a hex string of exactly `N` bytes.
    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let bytes = super::bytes::deserialize(deserializer)?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| {
            serde::de::Error::custom(format!("expected {} bytes, got {}", N, len))
        })
    }
}
