//! Hash primitives for chainproof
//!
//! The verifier never defines a leaf encoding of its own; it only consumes
//! 256-bit digests and needs a way to hash concatenations of them.

use crate::error::ProofError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

/// Size of a digest in bytes.
pub const HASH_SIZE: usize = 32;

/// A 256-bit digest, opaque apart from equality and concatenation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; HASH_SIZE]);

impl Hash256 {
    pub const fn zero() -> Self {
        Hash256([0u8; HASH_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Parse a hash from a byte slice of exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProofError> {
        let array: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| ProofError::InvalidHashLength(bytes.len()))?;
        Ok(Hash256(array))
    }

    /// Parse a hash from a hex string (either case).
    pub fn from_hex(hex_str: &str) -> Result<Self, ProofError> {
        let bytes = hex::decode(hex_str.trim())?;
        Self::from_slice(&bytes)
    }

    /// Uppercase hex, the way the chain's REST gateway prints hashes.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash256 {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash256::from_hex(s)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// External 256-bit hash function.
///
/// `digest` hashes the concatenation of `parts`.
pub trait Hasher256 {
    fn digest(&self, parts: &[&[u8]]) -> Hash256;

    fn hash_pair(&self, lhs: &Hash256, rhs: &Hash256) -> Hash256 {
        self.digest(&[lhs.as_ref(), rhs.as_ref()])
    }
}

/// Digest algorithms selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "sha256")]
    Sha256,
}

impl Hasher256 for HashAlgorithm {
    fn digest(&self, parts: &[&[u8]]) -> Hash256 {
        match self {
            HashAlgorithm::Sha3_256 => {
                let mut hasher = Sha3_256::new();
                for part in parts {
                    hasher.update(part);
                }
                Hash256(hasher.finalize().into())
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                Hash256(hasher.finalize().into())
            }
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha3_256 => f.write_str("sha3-256"),
            HashAlgorithm::Sha256 => f.write_str("sha256"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha3_empty_vector() {
        let hash = HashAlgorithm::Sha3_256.digest(&[]);
        assert_eq!(
            hash.to_hex(),
            "A7FFC6F8BF1ED76651C14756A061D662F580FF4DE43B49FA82D80A4B80F8434A"
        );
    }

    #[test]
    fn test_sha256_empty_vector() {
        let hash = HashAlgorithm::Sha256.digest(&[]);
        assert_eq!(
            hash.to_hex(),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn test_digest_concatenates_parts() {
        let hasher = HashAlgorithm::Sha3_256;
        assert_eq!(hasher.digest(&[b"ab", b"cd"]), hasher.digest(&[b"abcd"]));
    }

    #[test]
    fn test_hex_roundtrip_is_case_insensitive() {
        let upper = "00112233445566778899AABBCCDDEEFF00112233445566778899AABBCCDDEEFF";
        let hash = Hash256::from_hex(&upper.to_lowercase()).unwrap();
        assert_eq!(hash.to_hex(), upper);
    }

    #[test]
    fn test_invalid_length() {
        let result = Hash256::from_hex("AABB");
        assert!(matches!(result, Err(ProofError::InvalidHashLength(2))));
    }

    #[test]
    fn test_hash_algorithm_from_toml_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            hash: HashAlgorithm,
        }
        let parsed: Wrapper = toml::from_str("hash = \"sha256\"").unwrap();
        assert_eq!(parsed.hash, HashAlgorithm::Sha256);
    }
}
