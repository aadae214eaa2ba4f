//! Privacy Salt
//!
//! Per-transaction secret that keys every component group.
//!
//! ```text
//! entropy_g = H(salt || g as u32 big-endian)
//! nonce_i   = H(entropy_g || i as u32 big-endian)
//! leaf_i    = H(nonce_i || component_i)
//! ```
//!
//! Anyone holding a group's entropy can brute-force hidden leaves of that
//! group, so entropy is never shared across groups or transactions.

use meridian_crypto::{DigestAlgorithm, DigestService, SecureHash};
use rand::RngCore;

use crate::error::TransactionError;

pub const PRIVACY_SALT_MIN_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct PrivacySalt(Vec<u8>);

impl PrivacySalt {
    pub fn new(bytes: Vec<u8>) -> Result<Self, TransactionError> {
        if bytes.len() < PRIVACY_SALT_MIN_LEN {
            return Err(TransactionError::InvalidPrivacySalt(format!(
                "need at least {PRIVACY_SALT_MIN_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.iter().all(|b| *b == 0) {
            return Err(TransactionError::InvalidPrivacySalt(
                "salt must not be all zeroes".into(),
            ));
        }
        Ok(Self(bytes))
    }

    /// Generate a fresh random salt
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = vec![0u8; PRIVACY_SALT_MIN_LEN];
        loop {
            rng.fill_bytes(&mut bytes);
            if bytes.iter().any(|b| *b != 0) {
                return Self(bytes);
            }
        }
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Derive the secret entropy for one component group
    pub fn component_group_entropy(&self, group_index: u32, algorithm: DigestAlgorithm) -> SecureHash {
        DigestService::new().hash_parts(&[&self.0, &group_index.to_be_bytes()], algorithm)
    }
}

impl std::fmt::Debug for PrivacySalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivacySalt(<{} bytes>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_salt_rejected() {
        assert!(matches!(
            PrivacySalt::new(vec![1u8; 31]),
            Err(TransactionError::InvalidPrivacySalt(_))
        ));
    }

    #[test]
    fn test_zero_salt_rejected() {
        assert!(PrivacySalt::new(vec![0u8; 32]).is_err());
        assert!(PrivacySalt::new(vec![0u8; 64]).is_err());
    }

    #[test]
    fn test_longer_salt_accepted() {
        let salt = PrivacySalt::new(vec![7u8; 48]).unwrap();
        assert_eq!(salt.as_bytes().len(), 48);
    }

    #[test]
    fn test_random_salts_differ() {
        let a = PrivacySalt::random();
        let b = PrivacySalt::random();
        assert_eq!(a.as_bytes().len(), PRIVACY_SALT_MIN_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_entropy_unique_per_group_and_salt() {
        let algorithm = DigestAlgorithm::Sha256D;
        let a = PrivacySalt::new(vec![1u8; 32]).unwrap();
        let b = PrivacySalt::new(vec![2u8; 32]).unwrap();

        assert_ne!(
            a.component_group_entropy(0, algorithm),
            a.component_group_entropy(1, algorithm)
        );
        assert_ne!(
            a.component_group_entropy(0, algorithm),
            b.component_group_entropy(0, algorithm)
        );
        assert_eq!(
            a.component_group_entropy(3, algorithm),
            a.clone().component_group_entropy(3, algorithm)
        );
    }

    #[test]
    fn test_entropy_matches_definition() {
        let salt = PrivacySalt::new(vec![1u8; 32]).unwrap();
        let mut preimage = vec![1u8; 32];
        preimage.extend_from_slice(&[0, 0, 0, 5]);
        let expected = DigestService::new().hash(&preimage, DigestAlgorithm::Sha256D);
        assert_eq!(salt.component_group_entropy(5, DigestAlgorithm::Sha256D), expected);
    }

    #[test]
    fn test_debug_hides_bytes() {
        let salt = PrivacySalt::new(vec![0xAB; 32]).unwrap();
        assert_eq!(format!("{salt:?}"), "PrivacySalt(<32 bytes>)");
    }
}
