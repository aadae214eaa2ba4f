//! Hash Digest Providers
//!
//! A provider decides how leaves and nodes are hashed.
//!
//! ```text
//! Tweakable:  leaf = H(leaf_prefix || data)       node = H(node_prefix || l || r)
//! Nonce:      nonce_i = H(entropy || i)           leaf = H(nonce_i || data)
//!                                                 node = H(l || r)
//! ```
//!
//! Nonce leaves are keyed by secret entropy, so a revealed leaf hash says
//! nothing about the plaintext behind it.
//!
//! Neither provider commits to the leaf count. Nonce nodes carry no leaf/node
//! separation, so a list of interior hashes folds to the same root as the
//! leaves below them. Whoever commits to a root must commit to its size as
//! well and check proofs with [`MerkleProof::verify_sized`].
//!
//! [`MerkleProof::verify_sized`]: crate::merkle::MerkleProof::verify_sized

use crate::error::MerkleError;
use crate::hash::{DigestAlgorithm, DigestService, SecureHash};

pub const TWEAKABLE_PROVIDER_NAME: &str = "TweakableHashDigestProvider";
pub const NONCE_PROVIDER_NAME: &str = "NonceHashDigestProvider";

/// Hashing strategy for one Merkle tree
pub trait MerkleTreeHashDigestProvider: Send + Sync {
    /// Registered provider name, as carried in transaction metadata
    fn name(&self) -> &'static str;

    fn digest_algorithm(&self) -> DigestAlgorithm;

    /// Per-leaf nonce, if this provider salts its leaves
    fn leaf_nonce(&self, index: usize) -> Option<Vec<u8>>;

    fn leaf_hash(
        &self,
        index: usize,
        nonce: Option<&[u8]>,
        bytes: &[u8],
    ) -> Result<SecureHash, MerkleError>;

    fn node_hash(&self, left: &SecureHash, right: &SecureHash) -> SecureHash;

    /// Whether trees built with this provider can emit size-only proofs
    fn supports_size_proof(&self) -> bool {
        false
    }
}

/// Domain-separated hashing with fixed leaf and node prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweakableHashDigestProvider {
    algorithm: DigestAlgorithm,
    leaf_prefix: Vec<u8>,
    node_prefix: Vec<u8>,
}

impl TweakableHashDigestProvider {
    pub fn new(algorithm: DigestAlgorithm, leaf_prefix: Vec<u8>, node_prefix: Vec<u8>) -> Self {
        Self {
            algorithm,
            leaf_prefix,
            node_prefix,
        }
    }

    pub fn leaf_prefix(&self) -> &[u8] {
        &self.leaf_prefix
    }

    pub fn node_prefix(&self) -> &[u8] {
        &self.node_prefix
    }
}

impl MerkleTreeHashDigestProvider for TweakableHashDigestProvider {
    fn name(&self) -> &'static str {
        TWEAKABLE_PROVIDER_NAME
    }

    fn digest_algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn leaf_nonce(&self, _index: usize) -> Option<Vec<u8>> {
        None
    }

    fn leaf_hash(
        &self,
        _index: usize,
        _nonce: Option<&[u8]>,
        bytes: &[u8],
    ) -> Result<SecureHash, MerkleError> {
        Ok(DigestService::new().hash_parts(&[&self.leaf_prefix, bytes], self.algorithm))
    }

    fn node_hash(&self, left: &SecureHash, right: &SecureHash) -> SecureHash {
        DigestService::new().hash_parts(
            &[&self.node_prefix, left.as_bytes(), right.as_bytes()],
            self.algorithm,
        )
    }
}

/// Entropy-salted hashing for component leaves
///
/// A provider built with [`NonceHashDigestProvider::verifier`] holds no
/// entropy: it can only check proofs whose leaves carry their own nonces.
#[derive(Clone, PartialEq, Eq)]
pub struct NonceHashDigestProvider {
    algorithm: DigestAlgorithm,
    entropy: Option<SecureHash>,
}

impl NonceHashDigestProvider {
    pub fn new(algorithm: DigestAlgorithm, entropy: SecureHash) -> Self {
        Self {
            algorithm,
            entropy: Some(entropy),
        }
    }

    pub fn verifier(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            entropy: None,
        }
    }
}

// Entropy is secret material; keep it out of logs.
impl std::fmt::Debug for NonceHashDigestProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceHashDigestProvider")
            .field("algorithm", &self.algorithm)
            .field("has_entropy", &self.entropy.is_some())
            .finish()
    }
}

impl MerkleTreeHashDigestProvider for NonceHashDigestProvider {
    fn name(&self) -> &'static str {
        NONCE_PROVIDER_NAME
    }

    fn digest_algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn leaf_nonce(&self, index: usize) -> Option<Vec<u8>> {
        let entropy = self.entropy.as_ref()?;
        let index = u32::try_from(index).ok()?;
        let nonce = DigestService::new().hash_parts(
            &[entropy.as_bytes(), &index.to_be_bytes()],
            self.algorithm,
        );
        Some(nonce.as_bytes().to_vec())
    }

    fn leaf_hash(
        &self,
        index: usize,
        nonce: Option<&[u8]>,
        bytes: &[u8],
    ) -> Result<SecureHash, MerkleError> {
        let nonce = nonce.ok_or_else(|| {
            MerkleError::MalformedProof(format!("leaf {index} is missing its nonce"))
        })?;
        Ok(DigestService::new().hash_parts(&[nonce, bytes], self.algorithm))
    }

    fn node_hash(&self, left: &SecureHash, right: &SecureHash) -> SecureHash {
        DigestService::new().hash_parts(&[left.as_bytes(), right.as_bytes()], self.algorithm)
    }

    fn supports_size_proof(&self) -> bool {
        true
    }
}
