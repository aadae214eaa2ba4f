//! Filtered Transactions
//!
//! A filtered transaction is a partial view of a wire transaction that still
//! proves membership under the original id:
//!
//! ```text
//!   id ──── top-level audit proof (reveals root leaves of carried groups)
//!            │
//!            ├── g0 metadata   audit proof, always
//!            ├── g1 notary     audit proof (name, key, time window)
//!            ├── g2 ...        audit | size | removed
//!            └── gN ...
//! ```
//!
//! Removed groups leave only a sibling hash in the top-level proof. Size-only
//! groups disclose every leaf hash but no content or nonce. Each revealed root
//! leaf commits to the group count and the group's component count, and every
//! proof's claimed size is checked against them.

mod builder;
mod data;

use std::collections::{BTreeMap, BTreeSet};

use meridian_crypto::{MerkleProof, MerkleProofType, SecureHash};
use serde::{Deserialize, Serialize};

use crate::error::FilteredTransactionError;
use crate::group::{ComponentGroup, notary};
use crate::metadata::{DigestSettings, TransactionMetadata};
use crate::wire::GroupRootLeaf;

pub use builder::{Disclosure, FilteredTransactionBuilder};
pub use data::{ComponentDeserializer, FilteredData, JsonComponents, RawComponents};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransaction {
    id: SecureHash,
    top_level_merkle_proof: MerkleProof,
    filtered_component_groups: BTreeMap<usize, MerkleProof>,
}

impl FilteredTransaction {
    pub(crate) fn new(
        id: SecureHash,
        top_level_merkle_proof: MerkleProof,
        filtered_component_groups: BTreeMap<usize, MerkleProof>,
    ) -> Self {
        Self {
            id,
            top_level_merkle_proof,
            filtered_component_groups,
        }
    }

    /// Id of the source wire transaction
    pub fn id(&self) -> &SecureHash {
        &self.id
    }

    pub fn top_level_merkle_proof(&self) -> &MerkleProof {
        &self.top_level_merkle_proof
    }

    pub fn filtered_component_groups(&self) -> &BTreeMap<usize, MerkleProof> {
        &self.filtered_component_groups
    }

    pub fn component_group_proof(&self, index: usize) -> Option<&MerkleProof> {
        self.filtered_component_groups.get(&index)
    }

    /// Decode the always-revealed metadata component
    pub fn metadata(&self) -> Result<TransactionMetadata, FilteredTransactionError> {
        let index = ComponentGroup::Metadata.index();
        let proof = self
            .filtered_component_groups
            .get(&index)
            .ok_or_else(|| self.inconsistent("metadata group is missing"))?;

        let revealed = match proof.leaves.as_slice() {
            [leaf] if proof.proof_type == MerkleProofType::Audit
                && proof.tree_size == 1
                && leaf.index == 0 =>
            {
                &leaf.leaf_data
            }
            _ => {
                return Err(self.inconsistent(
                    "metadata group must be an audit proof revealing its single component",
                ));
            }
        };
        TransactionMetadata::from_bytes(revealed).map_err(|source| {
            FilteredTransactionError::Metadata {
                id: self.id.clone(),
                source,
            }
        })
    }

    /// Verify against the default digest settings
    pub fn verify(&self) -> Result<(), FilteredTransactionError> {
        self.verify_with(&DigestSettings::default())
    }

    /// Recompute the id from the carried proofs and check cross-group consistency
    pub fn verify_with(&self, supported: &DigestSettings) -> Result<(), FilteredTransactionError> {
        let result = self.check_proofs(supported).and_then(|()| self.check_output_consistency());
        if let Err(e) = &result {
            log::warn!("filtered transaction {} failed verification: {e}", self.id);
        }
        result
    }

    fn check_proofs(&self, supported: &DigestSettings) -> Result<(), FilteredTransactionError> {
        let metadata = self.metadata()?;
        let settings = &metadata.digest_settings;
        settings
            .ensure_supported(supported)
            .map_err(|source| FilteredTransactionError::Metadata {
                id: self.id.clone(),
                source,
            })?;

        let top = &self.top_level_merkle_proof;
        if top.proof_type != MerkleProofType::Audit {
            return Err(self.inconsistent("top-level proof must be an audit proof"));
        }
        let group_leaves = top
            .revealed()
            .into_iter()
            .map(|(group, bytes)| {
                GroupRootLeaf::from_bytes(bytes)
                    .map(|leaf| (group, leaf))
                    .ok_or_else(|| {
                        self.inconsistent(format!("root leaf of group {group} is truncated"))
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        let revealed: BTreeSet<usize> = group_leaves.keys().copied().collect();
        let carried: BTreeSet<usize> = self.filtered_component_groups.keys().copied().collect();
        if revealed != carried {
            return Err(self.inconsistent(format!(
                "top-level proof reveals groups {revealed:?} but groups {carried:?} are carried"
            )));
        }
        if !top.verify(&self.id, &settings.root_provider()) {
            return Err(self.inconsistent("group roots do not combine into the transaction id"));
        }
        // the metadata leaf is always revealed, so the group count is always checked
        if let Some((group, leaf)) = group_leaves
            .iter()
            .find(|(_, leaf)| leaf.group_count as usize != top.tree_size)
        {
            return Err(self.inconsistent(format!(
                "top-level proof claims {} groups but group {group} commits to {}",
                top.tree_size, leaf.group_count
            )));
        }

        let verifier = settings.component_verifier();
        for (&group, proof) in &self.filtered_component_groups {
            let leaf = &group_leaves[&group];
            let root = SecureHash::new(
                settings.component_merkle_tree_digest_algorithm_name,
                leaf.root.clone(),
            )
            .map_err(|e| self.inconsistent(format!("root of group {group} is malformed: {e}")))?;
            if !proof.verify_sized(&root, leaf.component_count as usize, &verifier) {
                return Err(self.inconsistent(format!(
                    "{} proof for group {group} does not match its root and size",
                    proof.proof_type
                )));
            }
        }
        Ok(())
    }

    /// Outputs and their info entries must be disclosed in lock-step
    fn check_output_consistency(&self) -> Result<(), FilteredTransactionError> {
        let outputs = ComponentGroup::Outputs.index();
        let info = ComponentGroup::OutputsInfo.index();
        let states = self.filtered_data(outputs);
        let infos = self.filtered_data(info);

        let reason = match (&states, &infos) {
            (FilteredData::SizeOnly { size: a }, FilteredData::SizeOnly { size: b })
            | (FilteredData::Audit { size: a, .. }, FilteredData::Audit { size: b, .. })
                if a != b =>
            {
                format!("group sizes {a} and {b} differ")
            }
            (FilteredData::Removed, FilteredData::Removed)
            | (FilteredData::SizeOnly { .. }, FilteredData::SizeOnly { .. }) => return Ok(()),
            (
                FilteredData::Audit { values: a, .. },
                FilteredData::Audit { values: b, .. },
            ) => {
                if a.keys().eq(b.keys()) {
                    return Ok(());
                }
                format!(
                    "revealed indices {:?} and {:?} differ",
                    a.keys().collect::<Vec<_>>(),
                    b.keys().collect::<Vec<_>>()
                )
            }
            _ => format!(
                "disclosed as {} and {}",
                disclosure_kind(&states),
                disclosure_kind(&infos)
            ),
        };
        Err(FilteredTransactionError::FilteredDataInconsistency {
            id: self.id.clone(),
            group: outputs,
            paired_group: info,
            reason,
        })
    }

    /// Raw disclosed content of one group
    pub fn filtered_data(&self, index: usize) -> FilteredData<Vec<u8>> {
        match self.filtered_component_groups.get(&index) {
            None => FilteredData::Removed,
            Some(proof) => match proof.proof_type {
                MerkleProofType::Size => FilteredData::SizeOnly {
                    size: proof.tree_size,
                },
                MerkleProofType::Audit => FilteredData::Audit {
                    size: proof.tree_size,
                    values: proof
                        .leaves
                        .iter()
                        .map(|leaf| (leaf.index, leaf.leaf_data.clone()))
                        .collect(),
                },
            },
        }
    }

    /// Disclosed content of one group, decoded with `deserializer`
    pub fn filtered_data_with<D: ComponentDeserializer>(
        &self,
        index: usize,
        deserializer: &D,
    ) -> Result<FilteredData<D::Component>, FilteredTransactionError> {
        self.filtered_data(index).try_map(|component, bytes| {
            deserializer.deserialize(index, &bytes).map_err(|e| {
                FilteredTransactionError::Deserialization {
                    group: index,
                    index: component,
                    source: Box::new(e),
                }
            })
        })
    }

    pub fn notary_name(&self) -> Option<&[u8]> {
        self.revealed_component(ComponentGroup::Notary.index(), notary::NAME)
    }

    pub fn notary_key(&self) -> Option<&[u8]> {
        self.revealed_component(ComponentGroup::Notary.index(), notary::KEY)
    }

    pub fn time_window(&self) -> Option<&[u8]> {
        self.revealed_component(ComponentGroup::Notary.index(), notary::TIME_WINDOW)
    }

    /// Output states paired with their info entries, by output index
    pub fn output_states(
        &self,
    ) -> Result<FilteredData<(Vec<u8>, Vec<u8>)>, FilteredTransactionError> {
        self.check_output_consistency()?;
        let mut infos = match self.filtered_data(ComponentGroup::OutputsInfo.index()) {
            FilteredData::Audit { values, .. } => values,
            FilteredData::Removed | FilteredData::SizeOnly { .. } => BTreeMap::new(),
        };
        self.filtered_data(ComponentGroup::Outputs.index())
            .try_map(|index, state| {
                infos
                    .remove(&index)
                    .map(|info| (state, info))
                    .ok_or_else(|| self.inconsistent(format!("output {index} has no info entry")))
            })
    }

    fn revealed_component(&self, group: usize, position: usize) -> Option<&[u8]> {
        let proof = self.filtered_component_groups.get(&group)?;
        proof
            .leaves
            .iter()
            .find(|leaf| leaf.index == position)
            .map(|leaf| leaf.leaf_data.as_slice())
    }

    fn inconsistent(&self, reason: impl Into<String>) -> FilteredTransactionError {
        FilteredTransactionError::InconsistentFilteredData {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }
}

fn disclosure_kind<T>(data: &FilteredData<T>) -> &'static str {
    match data {
        FilteredData::Removed => "removed",
        FilteredData::SizeOnly { .. } => "size-only",
        FilteredData::Audit { .. } => "audit",
    }
}
