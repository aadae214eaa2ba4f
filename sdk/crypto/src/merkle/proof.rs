//! Merkle Proofs
//!
//! Two proof shapes:
//!
//! - **Audit**: revealed leaves (index, nonce, data) plus the sibling hashes
//!   needed to climb to the root.
//! - **Size**: the leaf count and every leaf hash, with no leaf content.
//!
//! Verification replays the tree's level walk, including the rule that an
//! unpaired last node is carried up unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MerkleError;
use crate::hash::SecureHash;
use crate::merkle::provider::MerkleTreeHashDigestProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MerkleProofType {
    Audit,
    Size,
}

impl fmt::Display for MerkleProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerkleProofType::Audit => f.write_str("audit"),
            MerkleProofType::Size => f.write_str("size"),
        }
    }
}

/// A revealed leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedMerkleLeaf {
    /// Position in the original tree
    pub index: usize,
    pub nonce: Option<Vec<u8>>,
    #[serde(with = "serde_bytes")]
    pub leaf_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub proof_type: MerkleProofType,
    pub tree_size: usize,
    /// Sorted by index, no duplicates. Empty for size proofs.
    pub leaves: Vec<IndexedMerkleLeaf>,
    /// Sibling hashes for audit proofs; all leaf hashes for size proofs
    pub hashes: Vec<SecureHash>,
}

impl MerkleProof {
    /// Recompute the root this proof commits to
    pub fn calculate_root<P>(&self, provider: &P) -> Result<SecureHash, MerkleError>
    where
        P: MerkleTreeHashDigestProvider + ?Sized,
    {
        if self.tree_size == 0 {
            return Err(MerkleError::MalformedProof("tree size is zero".into()));
        }
        match self.proof_type {
            MerkleProofType::Audit => self.audit_root(provider),
            MerkleProofType::Size => self.size_root(provider),
        }
    }

    pub fn verify<P>(&self, root: &SecureHash, provider: &P) -> bool
    where
        P: MerkleTreeHashDigestProvider + ?Sized,
    {
        match self.calculate_root(provider) {
            Ok(calculated) => &calculated == root,
            Err(e) => {
                log::debug!("merkle proof rejected: {e}");
                false
            }
        }
    }

    /// Verify against a root whose leaf count is committed elsewhere
    ///
    /// A bare root does not pin the tree size: an unpaired node is carried up
    /// unchanged and interior hashes can pose as leaf hashes. Callers that
    /// report a size must check it here.
    pub fn verify_sized<P>(&self, root: &SecureHash, tree_size: usize, provider: &P) -> bool
    where
        P: MerkleTreeHashDigestProvider + ?Sized,
    {
        if self.tree_size != tree_size {
            log::debug!(
                "merkle proof claims {} leaves, expected {tree_size}",
                self.tree_size
            );
            return false;
        }
        self.verify(root, provider)
    }

    /// Revealed leaf data keyed by original index
    pub fn revealed(&self) -> BTreeMap<usize, &[u8]> {
        self.leaves
            .iter()
            .map(|leaf| (leaf.index, leaf.leaf_data.as_slice()))
            .collect()
    }

    fn size_root<P>(&self, provider: &P) -> Result<SecureHash, MerkleError>
    where
        P: MerkleTreeHashDigestProvider + ?Sized,
    {
        if !self.leaves.is_empty() {
            return Err(MerkleError::MalformedProof(
                "size proof must not reveal leaves".into(),
            ));
        }
        if self.hashes.len() != self.tree_size {
            return Err(MerkleError::MalformedProof(format!(
                "size proof carries {} leaf hashes for a tree of {}",
                self.hashes.len(),
                self.tree_size
            )));
        }

        let mut level = self.hashes.clone();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => provider.node_hash(left, right),
                    carried => carried[0].clone(),
                })
                .collect();
        }
        level
            .pop()
            .ok_or_else(|| MerkleError::MalformedProof("no leaf hashes".into()))
    }

    fn audit_root<P>(&self, provider: &P) -> Result<SecureHash, MerkleError>
    where
        P: MerkleTreeHashDigestProvider + ?Sized,
    {
        if self.leaves.is_empty() {
            return Err(MerkleError::MalformedProof(
                "audit proof reveals no leaves".into(),
            ));
        }
        if self
            .leaves
            .windows(2)
            .any(|pair| pair[0].index >= pair[1].index)
        {
            return Err(MerkleError::MalformedProof(
                "leaves are not strictly ascending".into(),
            ));
        }

        let mut known = BTreeMap::new();
        for leaf in &self.leaves {
            if leaf.index >= self.tree_size {
                return Err(MerkleError::IndexOutOfRange {
                    index: leaf.index,
                    size: self.tree_size,
                });
            }
            let hash = provider.leaf_hash(leaf.index, leaf.nonce.as_deref(), &leaf.leaf_data)?;
            known.insert(leaf.index, hash);
        }

        let mut hashes = self.hashes.iter();
        let mut next_hash = || {
            hashes
                .next()
                .cloned()
                .ok_or_else(|| MerkleError::MalformedProof("ran out of sibling hashes".into()))
        };

        let mut level_len = self.tree_size;
        while level_len > 1 {
            let mut parents = BTreeMap::new();
            let mut nodes = known.into_iter().peekable();
            while let Some((index, hash)) = nodes.next() {
                let parent = if index % 2 == 1 {
                    // a known left sibling would already have consumed this node
                    provider.node_hash(&next_hash()?, &hash)
                } else if index + 1 < level_len {
                    let right = match nodes.next_if(|(next, _)| *next == index + 1) {
                        Some((_, right)) => right,
                        None => next_hash()?,
                    };
                    provider.node_hash(&hash, &right)
                } else {
                    hash
                };
                parents.insert(index / 2, parent);
            }
            known = parents;
            level_len = level_len.div_ceil(2);
        }

        if next_hash().is_ok() {
            return Err(MerkleError::MalformedProof(
                "proof carries unused sibling hashes".into(),
            ));
        }
        known
            .remove(&0)
            .ok_or_else(|| MerkleError::MalformedProof("no root reached".into()))
    }
}
