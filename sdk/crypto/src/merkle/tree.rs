use std::collections::BTreeSet;

use crate::error::MerkleError;
use crate::hash::SecureHash;
use crate::merkle::proof::{IndexedMerkleLeaf, MerkleProof, MerkleProofType};
use crate::merkle::provider::MerkleTreeHashDigestProvider;

/// Merkle tree over ordered byte leaves
///
/// Every level is kept so proofs can be cut without rehashing.
pub struct MerkleTree<P> {
    leaves: Vec<Vec<u8>>,
    provider: P,
    /// levels[0] holds leaf hashes, the last level holds the root alone
    levels: Vec<Vec<SecureHash>>,
}

impl<P: MerkleTreeHashDigestProvider> MerkleTree<P> {
    pub fn build(leaves: Vec<Vec<u8>>, provider: P) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let leaf_hashes = leaves
            .iter()
            .enumerate()
            .map(|(index, leaf)| {
                let nonce = provider.leaf_nonce(index);
                provider.leaf_hash(index, nonce.as_deref(), leaf)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut levels = Vec::new();
        let mut current = leaf_hashes;
        while current.len() > 1 {
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => provider.node_hash(left, right),
                    carried => carried[0].clone(),
                })
                .collect();
            levels.push(std::mem::replace(&mut current, next));
        }
        levels.push(current);

        Ok(Self {
            leaves,
            provider,
            levels,
        })
    }

    pub fn root(&self) -> &SecureHash {
        // build() guarantees a non-empty top level
        &self.levels[self.levels.len() - 1][0]
    }

    pub fn leaves(&self) -> &[Vec<u8>] {
        &self.leaves
    }

    pub fn leaf_hashes(&self) -> &[SecureHash] {
        &self.levels[0]
    }

    pub fn size(&self) -> usize {
        self.leaves.len()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Reveal the leaves at `indices` along with the sibling hashes needed to
    /// rebuild the root.
    ///
    /// Hashes are emitted bottom-up; within a level, in ascending order of the
    /// known node whose sibling is missing.
    pub fn create_audit_proof(&self, indices: &[usize]) -> Result<MerkleProof, MerkleError> {
        if indices.is_empty() {
            return Err(MerkleError::EmptyIndices);
        }
        let size = self.size();
        if let Some(&index) = indices.iter().find(|&&index| index >= size) {
            return Err(MerkleError::IndexOutOfRange { index, size });
        }

        let mut known: BTreeSet<usize> = indices.iter().copied().collect();
        let leaves = known
            .iter()
            .map(|&index| IndexedMerkleLeaf {
                index,
                nonce: self.provider.leaf_nonce(index),
                leaf_data: self.leaves[index].clone(),
            })
            .collect();

        let mut hashes = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            for &index in &known {
                let sibling = index ^ 1;
                if sibling < level.len() && !known.contains(&sibling) {
                    hashes.push(level[sibling].clone());
                }
            }
            known = known.iter().map(|index| index / 2).collect();
        }

        Ok(MerkleProof {
            proof_type: MerkleProofType::Audit,
            tree_size: size,
            leaves,
            hashes,
        })
    }

    /// Prove the leaf count only: every leaf hash, no leaf content
    pub fn create_size_proof(&self) -> Result<MerkleProof, MerkleError> {
        if !self.provider.supports_size_proof() {
            return Err(MerkleError::UnsupportedProofKind {
                provider: self.provider.name(),
                kind: MerkleProofType::Size,
            });
        }
        Ok(MerkleProof {
            proof_type: MerkleProofType::Size,
            tree_size: self.size(),
            leaves: Vec::new(),
            hashes: self.leaf_hashes().to_vec(),
        })
    }
}

impl<P> std::fmt::Debug for MerkleTree<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerkleTree")
            .field("size", &self.leaves.len())
            .field("root", &self.levels.last().and_then(|level| level.first()))
            .finish()
    }
}
