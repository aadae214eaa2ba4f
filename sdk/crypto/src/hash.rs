//! Secure Hashes
//!
//! Named digest algorithms and the hashes they produce.
//!
//! ```text
//! SecureHash = (algorithm, digest bytes)   displayed as "SHA-256D:9F1C..."
//! ```
//!
//! Two hashes are only equal when both the algorithm and the bytes match, so a
//! SHA-256 digest can never stand in for a SHA-256D digest of the same length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use crate::error::CryptoError;

/// Hash algorithms known to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
    /// Double SHA-256, the platform default
    #[serde(rename = "SHA-256D")]
    Sha256D,
    #[serde(rename = "SHA-512")]
    Sha512,
    #[serde(rename = "BLAKE3")]
    Blake3,
}

impl DigestAlgorithm {
    pub const ALL: [DigestAlgorithm; 4] = [
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha256D,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Blake3,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha256D => "SHA-256D",
            DigestAlgorithm::Sha512 => "SHA-512",
            DigestAlgorithm::Blake3 => "BLAKE3",
        }
    }

    /// Output length in bytes
    pub fn digest_length(&self) -> usize {
        match self {
            DigestAlgorithm::Sha512 => 64,
            _ => 32,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// A digest tagged with the algorithm that produced it
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SecureHashRepr")]
pub struct SecureHash {
    algorithm: DigestAlgorithm,
    #[serde(with = "hex::serde")]
    bytes: Vec<u8>,
}

#[derive(Deserialize)]
struct SecureHashRepr {
    algorithm: DigestAlgorithm,
    #[serde(with = "hex::serde")]
    bytes: Vec<u8>,
}

impl TryFrom<SecureHashRepr> for SecureHash {
    type Error = CryptoError;

    fn try_from(repr: SecureHashRepr) -> Result<Self, Self::Error> {
        SecureHash::new(repr.algorithm, repr.bytes)
    }
}

impl SecureHash {
    /// Wrap raw digest bytes, checking the length against the algorithm
    pub fn new(algorithm: DigestAlgorithm, bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != algorithm.digest_length() {
            return Err(CryptoError::InvalidDigestLength {
                algorithm: algorithm.name(),
                expected: algorithm.digest_length(),
                got: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }
}

impl AsRef<[u8]> for SecureHash {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl fmt::Debug for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureHash({self})")
    }
}

impl FromStr for SecureHash {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, digest) = s
            .split_once(':')
            .ok_or_else(|| CryptoError::MalformedHash(s.to_string()))?;
        let algorithm = algorithm.parse()?;
        let bytes = hex::decode(digest).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
        SecureHash::new(algorithm, bytes)
    }
}

/// Hashes byte strings under a named algorithm
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestService;

impl DigestService {
    pub fn new() -> Self {
        Self
    }

    pub fn hash(&self, data: &[u8], algorithm: DigestAlgorithm) -> SecureHash {
        self.hash_parts(&[data], algorithm)
    }

    /// Hash the concatenation of `parts` without building the joined buffer
    pub fn hash_parts(&self, parts: &[&[u8]], algorithm: DigestAlgorithm) -> SecureHash {
        let bytes = match algorithm {
            DigestAlgorithm::Sha256 => sha256(parts).to_vec(),
            DigestAlgorithm::Sha256D => Sha256::digest(sha256(parts)).to_vec(),
            DigestAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().to_vec()
            }
            DigestAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().as_bytes().to_vec()
            }
        };
        SecureHash { algorithm, bytes }
    }
}

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = DigestService::new().hash(b"abc", DigestAlgorithm::Sha256);
        assert_eq!(
            hash.to_hex(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn test_sha256d_is_double_hash() {
        let service = DigestService::new();
        let once = service.hash(b"abc", DigestAlgorithm::Sha256);
        let twice = service.hash(once.as_bytes(), DigestAlgorithm::Sha256);
        let double = service.hash(b"abc", DigestAlgorithm::Sha256D);
        assert_eq!(double.as_bytes(), twice.as_bytes());
        assert_ne!(double, twice, "algorithm tag must differ");
    }

    #[test]
    fn test_hash_parts_matches_concatenation() {
        let service = DigestService::new();
        for algorithm in DigestAlgorithm::ALL {
            let joined = service.hash(b"helloworld", algorithm);
            let parts = service.hash_parts(&[b"hello", b"world"], algorithm);
            assert_eq!(joined, parts);
            assert_eq!(joined.as_bytes().len(), algorithm.digest_length());
        }
    }

    #[test]
    fn test_algorithm_names_roundtrip() {
        for algorithm in DigestAlgorithm::ALL {
            assert_eq!(algorithm.name().parse::<DigestAlgorithm>().unwrap(), algorithm);
        }
        assert!(matches!(
            "MD5".parse::<DigestAlgorithm>(),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_display_and_parse() {
        let hash = DigestService::new().hash(b"meridian", DigestAlgorithm::Sha256D);
        let rendered = hash.to_string();
        assert!(rendered.starts_with("SHA-256D:"));
        assert_eq!(rendered.parse::<SecureHash>().unwrap(), hash);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let result = SecureHash::new(DigestAlgorithm::Sha512, vec![0u8; 32]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidDigestLength { expected: 64, got: 32, .. })
        ));
    }

    #[test]
    fn test_serde_rejects_bad_length() {
        let json = r#"{"algorithm":"SHA-256","bytes":"abcd"}"#;
        assert!(serde_json::from_str::<SecureHash>(json).is_err());

        let hash = DigestService::new().hash(b"x", DigestAlgorithm::Blake3);
        let encoded = serde_json::to_string(&hash).unwrap();
        assert_eq!(serde_json::from_str::<SecureHash>(&encoded).unwrap(), hash);
    }
}
