use thiserror::Error;

use crate::merkle::MerkleProofType;

/// Hashing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid {algorithm} digest length: expected {expected} bytes, got {got}")]
    InvalidDigestLength {
        algorithm: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("malformed secure hash: {0}")]
    MalformedHash(String),
}

/// Merkle tree and proof errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a merkle tree without leaves")]
    EmptyTree,

    #[error("an audit proof needs at least one leaf index")]
    EmptyIndices,

    #[error("leaf index {index} out of range for a tree of {size} leaves")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("{provider} does not support {kind} proofs")]
    UnsupportedProofKind {
        provider: &'static str,
        kind: MerkleProofType,
    },

    #[error("malformed merkle proof: {0}")]
    MalformedProof(String),
}
