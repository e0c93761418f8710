//! Content hashes used to address scripts, UTXOs and keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::fmt;

/// Size in bytes of every hash in the system
pub const HASH_SIZE: usize = 32;

/// A 32-byte content hash.
///
/// Script hashes are derived from compiled bytecode with [`Hash::digest`];
/// key hashes and transaction ids come from the same construction applied to
/// their respective byte representations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// All-zero hash, used as a placeholder in tests and synthetic UTXOs
    pub const fn zero() -> Self {
        Self([0u8; HASH_SIZE])
    }

    /// SHA3-256 digest of arbitrary bytes
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let array: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("invalid hash length"))?;
        Ok(Self(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = Hash::digest(b"contract bytecode");
        let b = Hash::digest(b"contract bytecode");
        assert_eq!(a, b);
        assert_ne!(a, Hash::digest(b"other bytecode"));
    }

    #[test]
    fn hex_roundtrip_through_serde() {
        let hash = Hash::digest(b"abc");
        let json = serde_json::to_string(&hash).unwrap();
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, back);
    }

    #[test]
    fn display_is_64_hex_chars() {
        assert_eq!(Hash::zero().to_string().len(), 64);
    }
}
