//! Wire Transactions
//!
//! A wire transaction is a privacy salt plus ordered groups of serialized
//! components. Its id is the root of a two-level Merkle tree:
//!
//! ```text
//!                        id (root tree, tweakable prefixes)
//!                /            |              \
//!          leaf(g0)        leaf(g1)   ...   leaf(gN)
//!           |               /   \
//!       [metadata]       c0      c1    (component trees, nonce-salted
//!                                        with entropy derived for g)
//!
//! leaf(g) = group_count u32 BE || component_count(g) u32 BE || root(g)
//! ```
//!
//! Both counts sit inside the root-tree leaves, so every tree's size is
//! committed by the id and proofs cannot claim a different shape.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use meridian_crypto::{
    MerkleTree, NonceHashDigestProvider, SecureHash, TweakableHashDigestProvider,
};

use crate::error::TransactionError;
use crate::group::{ComponentGroup, notary};
use crate::metadata::{DigestSettings, TransactionMetadata};
use crate::salt::PrivacySalt;

/// Hard ceiling so group and leaf indices always fit the u32 nonce encoding
const MAX_INDEX: usize = u32::MAX as usize;

const DEFAULT_MAX_COMPONENT_GROUPS: usize = 64;
const DEFAULT_MAX_COMPONENTS_PER_GROUP: usize = 4096;

pub struct WireTransaction {
    privacy_salt: PrivacySalt,
    component_groups: Vec<Vec<Vec<u8>>>,
    metadata: TransactionMetadata,
    component_merkle_roots: OnceLock<Vec<SecureHash>>,
    id: OnceLock<SecureHash>,
}

impl WireTransaction {
    /// Validate and wrap already-serialized component groups.
    ///
    /// Fails without producing a transaction if any group or component is
    /// empty, or if the embedded digest settings are not `supported`.
    pub fn new(
        component_groups: Vec<Vec<Vec<u8>>>,
        privacy_salt: PrivacySalt,
        supported: &DigestSettings,
    ) -> Result<Self, TransactionError> {
        if component_groups.is_empty() {
            return Err(TransactionError::NoComponentGroups);
        }
        if component_groups.len() > MAX_INDEX {
            return Err(TransactionError::TooManyComponentGroups {
                count: component_groups.len(),
                max: MAX_INDEX,
            });
        }
        for (group, components) in component_groups.iter().enumerate() {
            if components.is_empty() {
                return Err(TransactionError::EmptyComponentGroup { group });
            }
            if components.len() > MAX_INDEX {
                return Err(TransactionError::TooManyComponents {
                    group,
                    count: components.len(),
                    max: MAX_INDEX,
                });
            }
            if let Some(index) = components.iter().position(|c| c.is_empty()) {
                return Err(TransactionError::EmptyComponent { group, index });
            }
        }

        let metadata_group = &component_groups[ComponentGroup::Metadata.index()];
        if metadata_group.len() != 1 {
            return Err(TransactionError::InvalidMetadataGroup {
                count: metadata_group.len(),
            });
        }
        let metadata = TransactionMetadata::from_bytes(&metadata_group[0])?;
        metadata.digest_settings.ensure_supported(supported)?;

        Ok(Self {
            privacy_salt,
            component_groups,
            metadata,
            component_merkle_roots: OnceLock::new(),
            id: OnceLock::new(),
        })
    }

    /// The transaction id, computed on first access
    pub fn id(&self) -> &SecureHash {
        self.id.get_or_init(|| {
            let id = self.root_merkle_tree().root().clone();
            log::debug!(
                "computed id {id} over {} component groups",
                self.component_groups.len()
            );
            id
        })
    }

    pub fn privacy_salt(&self) -> &PrivacySalt {
        &self.privacy_salt
    }

    pub fn metadata(&self) -> &TransactionMetadata {
        &self.metadata
    }

    pub fn digest_settings(&self) -> &DigestSettings {
        &self.metadata.digest_settings
    }

    pub fn component_groups(&self) -> &[Vec<Vec<u8>>] {
        &self.component_groups
    }

    pub fn component_group_count(&self) -> usize {
        self.component_groups.len()
    }

    pub fn component_group(&self, index: usize) -> Result<&[Vec<u8>], TransactionError> {
        self.component_groups
            .get(index)
            .map(Vec::as_slice)
            .ok_or(TransactionError::ComponentGroupOutOfRange {
                index,
                count: self.component_groups.len(),
            })
    }

    /// A well-known group, if the transaction has it
    pub fn group(&self, group: ComponentGroup) -> Option<&[Vec<u8>]> {
        self.component_groups.get(group.index()).map(Vec::as_slice)
    }

    pub fn notary_name(&self) -> Option<&[u8]> {
        self.notary_component(notary::NAME)
    }

    pub fn notary_key(&self) -> Option<&[u8]> {
        self.notary_component(notary::KEY)
    }

    pub fn time_window(&self) -> Option<&[u8]> {
        self.notary_component(notary::TIME_WINDOW)
    }

    fn notary_component(&self, position: usize) -> Option<&[u8]> {
        self.group(ComponentGroup::Notary)?
            .get(position)
            .map(Vec::as_slice)
    }

    /// Root of each component group's tree, in group order
    pub fn component_merkle_roots(&self) -> &[SecureHash] {
        self.component_merkle_roots.get_or_init(|| {
            (0..self.component_groups.len())
                .map(|index| self.component_merkle_tree_unchecked(index).root().clone())
                .collect()
        })
    }

    /// The nonce-salted tree over one group's components
    pub fn component_merkle_tree(
        &self,
        index: usize,
    ) -> Result<MerkleTree<NonceHashDigestProvider>, TransactionError> {
        self.component_group(index)?;
        Ok(self.component_merkle_tree_unchecked(index))
    }

    /// The tweakable tree over the encoded [`GroupRootLeaf`]s
    pub fn root_merkle_tree(&self) -> MerkleTree<TweakableHashDigestProvider> {
        // both counts were bounded by MAX_INDEX in new()
        let group_count = self.component_groups.len() as u32;
        let leaves = self
            .component_merkle_roots()
            .iter()
            .zip(&self.component_groups)
            .map(|(root, components)| {
                GroupRootLeaf {
                    group_count,
                    component_count: components.len() as u32,
                    root: root.as_bytes().to_vec(),
                }
                .to_bytes()
            })
            .collect();
        MerkleTree::build(leaves, self.digest_settings().root_provider())
            .expect("a wire transaction always has at least one component group")
    }

    fn component_merkle_tree_unchecked(&self, index: usize) -> MerkleTree<NonceHashDigestProvider> {
        let settings = self.digest_settings();
        // index <= MAX_INDEX was checked in new()
        let entropy = self.privacy_salt.component_group_entropy(
            index as u32,
            settings.component_merkle_tree_entropy_algorithm_name,
        );
        MerkleTree::build(
            self.component_groups[index].clone(),
            settings.component_provider(entropy),
        )
        .expect("component groups are validated non-empty")
    }
}

/// One leaf of the root tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRootLeaf {
    /// Number of component groups in the transaction
    pub group_count: u32,
    /// Number of components in this group
    pub component_count: u32,
    /// Root of this group's component tree
    pub root: Vec<u8>,
}

impl GroupRootLeaf {
    const HEADER_LEN: usize = 8;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::HEADER_LEN + self.root.len());
        bytes.extend_from_slice(&self.group_count.to_be_bytes());
        bytes.extend_from_slice(&self.component_count.to_be_bytes());
        bytes.extend_from_slice(&self.root);
        bytes
    }

    /// `None` when the header is truncated or the root is missing
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (group_count, rest) = bytes.split_first_chunk::<4>()?;
        let (component_count, root) = rest.split_first_chunk::<4>()?;
        if root.is_empty() {
            return None;
        }
        Some(Self {
            group_count: u32::from_be_bytes(*group_count),
            component_count: u32::from_be_bytes(*component_count),
            root: root.to_vec(),
        })
    }
}

impl PartialEq for WireTransaction {
    // Equal ids are only a hint; the salt and every component must match.
    fn eq(&self, other: &Self) -> bool {
        self.privacy_salt == other.privacy_salt && self.component_groups == other.component_groups
    }
}

impl Eq for WireTransaction {}

impl Clone for WireTransaction {
    fn clone(&self) -> Self {
        Self {
            privacy_salt: self.privacy_salt.clone(),
            component_groups: self.component_groups.clone(),
            metadata: self.metadata.clone(),
            component_merkle_roots: self.component_merkle_roots.clone(),
            id: self.id.clone(),
        }
    }
}

impl fmt::Debug for WireTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireTransaction")
            .field("id", self.id())
            .field(
                "group_sizes",
                &self.component_groups.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Caller-side bounds on transaction shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionLimits {
    pub max_component_groups: usize,
    pub max_components_per_group: usize,
}

impl Default for TransactionLimits {
    fn default() -> Self {
        Self {
            max_component_groups: DEFAULT_MAX_COMPONENT_GROUPS,
            max_components_per_group: DEFAULT_MAX_COMPONENTS_PER_GROUP,
        }
    }
}

impl TransactionLimits {
    pub fn check(&self, component_groups: &[Vec<Vec<u8>>]) -> Result<(), TransactionError> {
        if component_groups.len() > self.max_component_groups {
            return Err(TransactionError::TooManyComponentGroups {
                count: component_groups.len(),
                max: self.max_component_groups,
            });
        }
        for (group, components) in component_groups.iter().enumerate() {
            if components.len() > self.max_components_per_group {
                return Err(TransactionError::TooManyComponents {
                    group,
                    count: components.len(),
                    max: self.max_components_per_group,
                });
            }
        }
        Ok(())
    }
}

/// Configured entry point for building wire transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFactory {
    settings: DigestSettings,
    limits: TransactionLimits,
}

impl TransactionFactory {
    pub fn new(settings: DigestSettings, limits: TransactionLimits) -> Self {
        Self { settings, limits }
    }

    pub fn settings(&self) -> &DigestSettings {
        &self.settings
    }

    pub fn limits(&self) -> &TransactionLimits {
        &self.limits
    }

    /// Metadata carrying this factory's digest settings
    pub fn metadata(&self) -> TransactionMetadata {
        TransactionMetadata::new(self.settings.clone())
    }

    pub fn generate_salt(&self) -> PrivacySalt {
        PrivacySalt::random()
    }

    pub fn create(
        &self,
        component_groups: Vec<Vec<Vec<u8>>>,
        privacy_salt: PrivacySalt,
    ) -> Result<WireTransaction, TransactionError> {
        self.limits.check(&component_groups)?;
        WireTransaction::new(component_groups, privacy_salt, &self.settings)
    }
}

/// Assembles component groups by well-known position
///
/// Every group up to the highest populated one must end up non-empty, since
/// wire transactions carry no empty groups.
#[derive(Debug, Clone, Default)]
pub struct WireTransactionBuilder {
    metadata: Option<TransactionMetadata>,
    groups: BTreeMap<usize, Vec<Vec<u8>>>,
}

impl WireTransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: TransactionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_notary(self, name: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) -> Self {
        self.set_notary_component(notary::NAME, name.into())
            .set_notary_component(notary::KEY, key.into())
    }

    /// Place the time window at its fixed notary position
    ///
    /// The notary name and key occupy the positions before it, so this must be
    /// paired with [`with_notary`](Self::with_notary); otherwise `build` fails
    /// with [`TransactionError::EmptyComponent`] for the notary group.
    pub fn with_time_window(self, time_window: impl Into<Vec<u8>>) -> Self {
        self.set_notary_component(notary::TIME_WINDOW, time_window.into())
    }

    pub fn add_component(mut self, group: ComponentGroup, component: impl Into<Vec<u8>>) -> Self {
        self.groups
            .entry(group.index())
            .or_default()
            .push(component.into());
        self
    }

    pub fn add_components<I, C>(self, group: ComponentGroup, components: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        components
            .into_iter()
            .fold(self, |builder, component| builder.add_component(group, component))
    }

    /// Ordered groups with the encoded metadata in position 0
    pub fn component_groups(
        &self,
        factory: &TransactionFactory,
    ) -> Result<Vec<Vec<Vec<u8>>>, TransactionError> {
        let metadata = match &self.metadata {
            Some(metadata) => metadata.to_bytes()?,
            None => factory.metadata().to_bytes()?,
        };
        let last = self.groups.keys().next_back().copied().unwrap_or(0);
        let mut groups = vec![vec![metadata]];
        for index in 1..=last {
            groups.push(self.groups.get(&index).cloned().unwrap_or_default());
        }
        Ok(groups)
    }

    pub fn build(
        &self,
        factory: &TransactionFactory,
        privacy_salt: PrivacySalt,
    ) -> Result<WireTransaction, TransactionError> {
        factory.create(self.component_groups(factory)?, privacy_salt)
    }

    fn set_notary_component(mut self, position: usize, component: Vec<u8>) -> Self {
        let group = self.groups.entry(ComponentGroup::Notary.index()).or_default();
        if group.len() <= position {
            group.resize(position + 1, Vec::new());
        }
        group[position] = component;
        self
    }
}
