//! Batch Signing
//!
//! Many transaction ids can be covered by one signature over the root of a
//! batch tree. Every transaction in the batch must agree on how that tree is
//! hashed, otherwise a verifier holding one transaction would rebuild a
//! different root.
//!
//! ```text
//!                 batch root  <── signed externally
//!                /          \
//!            node            node
//!           /    \          /    \
//!        id(tx0) id(tx1) id(tx2) id(tx3)
//! ```

use meridian_crypto::{
    MerkleProof, MerkleProofType, MerkleTree, SecureHash, TWEAKABLE_PROVIDER_NAME,
};

use crate::error::BatchError;
use crate::metadata::DigestSettings;
use crate::wire::WireTransaction;

// ============================================================================
// Signable
// ============================================================================

/// Anything whose id can be placed in a batch tree
pub trait BatchSignable {
    fn transaction_id(&self) -> &SecureHash;
    fn digest_settings(&self) -> &DigestSettings;
}

impl BatchSignable for WireTransaction {
    fn transaction_id(&self) -> &SecureHash {
        self.id()
    }

    fn digest_settings(&self) -> &DigestSettings {
        WireTransaction::digest_settings(self)
    }
}

// ============================================================================
// Consistency checks
// ============================================================================

/// Rejects batches whose members disagree on batch hashing
#[derive(Debug, Clone, Default)]
pub struct BatchChecker {
    defaults: DigestSettings,
}

impl BatchChecker {
    /// Checker enforcing the prefixes of `defaults`
    pub fn new(defaults: DigestSettings) -> Self {
        Self { defaults }
    }

    pub fn check<T: BatchSignable>(&self, transactions: &[T]) -> Result<(), BatchError> {
        let result = self.check_all(transactions);
        if let Err(e) = &result {
            log::warn!(
                "rejecting batch of {} transactions: {e}",
                transactions.len()
            );
        }
        result
    }

    fn check_all<T: BatchSignable>(&self, transactions: &[T]) -> Result<(), BatchError> {
        let first = transactions.first().ok_or(BatchError::EmptyBatch)?;
        let reference = first.digest_settings();
        let id_algorithm = first.transaction_id().algorithm();

        for tx in transactions {
            let settings = tx.digest_settings();
            let id = tx.transaction_id();

            if settings.batch_merkle_tree_digest_provider_name != TWEAKABLE_PROVIDER_NAME {
                return Err(BatchError::UnsupportedBatchProvider {
                    id: id.clone(),
                    provider: settings.batch_merkle_tree_digest_provider_name.clone(),
                    expected: TWEAKABLE_PROVIDER_NAME,
                });
            }
            if settings.batch_merkle_tree_digest_algorithm_name
                != reference.batch_merkle_tree_digest_algorithm_name
            {
                return Err(BatchError::BatchAlgorithmMismatch {
                    id: id.clone(),
                    expected: reference.batch_merkle_tree_digest_algorithm_name,
                    found: settings.batch_merkle_tree_digest_algorithm_name,
                });
            }
            if settings.batch_merkle_tree_leaf_prefix != reference.batch_merkle_tree_leaf_prefix {
                return Err(BatchError::BatchLeafPrefixMismatch { id: id.clone() });
            }
            if settings.batch_merkle_tree_node_prefix != reference.batch_merkle_tree_node_prefix {
                return Err(BatchError::BatchNodePrefixMismatch { id: id.clone() });
            }
            if settings.root_merkle_tree_digest_algorithm_name
                != reference.root_merkle_tree_digest_algorithm_name
            {
                return Err(BatchError::RootAlgorithmMismatch {
                    id: id.clone(),
                    expected: reference.root_merkle_tree_digest_algorithm_name,
                    found: settings.root_merkle_tree_digest_algorithm_name,
                });
            }
            if !prefixes_distinct(settings) {
                return Err(BatchError::SharedTreePrefix { id: id.clone() });
            }
            if id.algorithm() != id_algorithm {
                return Err(BatchError::IdAlgorithmMismatch {
                    id: id.clone(),
                    expected: id_algorithm,
                    found: id.algorithm(),
                });
            }
            if !self.uses_default_prefixes(settings) {
                return Err(BatchError::NonDefaultPrefix { id: id.clone() });
            }
        }
        Ok(())
    }

    fn uses_default_prefixes(&self, settings: &DigestSettings) -> bool {
        let defaults = &self.defaults;
        settings.batch_merkle_tree_leaf_prefix == defaults.batch_merkle_tree_leaf_prefix
            && settings.batch_merkle_tree_node_prefix == defaults.batch_merkle_tree_node_prefix
            && settings.root_merkle_tree_leaf_prefix == defaults.root_merkle_tree_leaf_prefix
            && settings.root_merkle_tree_node_prefix == defaults.root_merkle_tree_node_prefix
    }
}

fn prefixes_distinct(settings: &DigestSettings) -> bool {
    let prefixes = [
        &settings.root_merkle_tree_leaf_prefix,
        &settings.root_merkle_tree_node_prefix,
        &settings.batch_merkle_tree_leaf_prefix,
        &settings.batch_merkle_tree_node_prefix,
    ];
    prefixes
        .iter()
        .enumerate()
        .all(|(i, a)| prefixes[i + 1..].iter().all(|b| a != b))
}

// ============================================================================
// Batch tree
// ============================================================================

/// Root over a checked batch plus one inclusion proof per transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTree {
    root: SecureHash,
    proofs: Vec<MerkleProof>,
}

impl BatchTree {
    pub fn build<T: BatchSignable>(
        checker: &BatchChecker,
        transactions: &[T],
    ) -> Result<Self, BatchError> {
        checker.check(transactions)?;
        let settings = transactions[0].digest_settings();

        let leaves = transactions
            .iter()
            .map(|tx| tx.transaction_id().as_bytes().to_vec())
            .collect();
        let tree = MerkleTree::build(leaves, settings.batch_provider())?;
        let proofs = (0..tree.size())
            .map(|index| tree.create_audit_proof(&[index]))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "built batch root {} over {} transactions",
            tree.root(),
            transactions.len()
        );
        Ok(Self {
            root: tree.root().clone(),
            proofs,
        })
    }

    /// The value to sign
    pub fn root(&self) -> &SecureHash {
        &self.root
    }

    /// Inclusion proof for the transaction at `index` in the batch
    pub fn proof_for(&self, index: usize) -> Option<&MerkleProof> {
        self.proofs.get(index)
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    /// Check that `proof` places exactly `id` under `root`
    pub fn verify_inclusion(
        id: &SecureHash,
        proof: &MerkleProof,
        root: &SecureHash,
        settings: &DigestSettings,
    ) -> bool {
        let single_leaf = match proof.leaves.as_slice() {
            [leaf] => leaf.leaf_data == id.as_bytes(),
            _ => false,
        };
        single_leaf
            && proof.proof_type == MerkleProofType::Audit
            && proof.verify(root, &settings.batch_provider())
    }
}
