//! Merkle Trees
//!
//! Binary Merkle trees over arbitrary byte leaves, with pluggable hashing.
//!
//! ```text
//!                  Root
//!                 /    \
//!              N01      H2      <- unpaired node carried up unchanged
//!             /   \      |
//!            H0   H1    H2
//!            |    |     |
//!            L0   L1    L2
//! ```
//!
//! An odd node at the end of any level is promoted to the next level as-is;
//! the proof verifier walks levels with the same rule.

pub mod proof;
pub mod provider;
pub mod tree;

pub use proof::{IndexedMerkleLeaf, MerkleProof, MerkleProofType};
pub use provider::{
    MerkleTreeHashDigestProvider, NONCE_PROVIDER_NAME, NonceHashDigestProvider,
    TWEAKABLE_PROVIDER_NAME, TweakableHashDigestProvider,
};
pub use tree::MerkleTree;
