//! Meridian Crypto SDK
//!
//! Secure hashes and the Merkle tree layer underneath transaction identity.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        Merkle Layer                            │
//! │                                                                │
//! │  ┌───────────────┐   ┌──────────────────┐   ┌───────────────┐  │
//! │  │ DigestService │──▶│ Digest Providers │──▶│  MerkleTree   │  │
//! │  │ SHA-256(D),   │   │ Tweakable (pfx)  │   │ root, audit & │  │
//! │  │ SHA-512, B3   │   │ Nonce (entropy)  │   │ size proofs   │  │
//! │  └───────────────┘   └──────────────────┘   └───────┬───────┘  │
//! │                                                     ▼          │
//! │                                            ┌───────────────┐   │
//! │                                            │  MerkleProof  │   │
//! │                                            │ calculate_root│   │
//! │                                            └───────────────┘   │
//! └────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod hash;
pub mod merkle;

pub use error::{CryptoError, MerkleError};
pub use hash::{DigestAlgorithm, DigestService, SecureHash};
pub use merkle::{
    IndexedMerkleLeaf, MerkleProof, MerkleProofType, MerkleTree, MerkleTreeHashDigestProvider,
    NONCE_PROVIDER_NAME, NonceHashDigestProvider, TWEAKABLE_PROVIDER_NAME,
    TweakableHashDigestProvider,
};
