//! Transaction Metadata
//!
//! Group 0 of every wire transaction is a single JSON document describing the
//! ledger model and how the transaction is hashed. The document takes part in
//! hashing, so its encoding must stay byte-stable: fields serialize in
//! declaration order and prefixes as lowercase hex.

use meridian_crypto::{
    DigestAlgorithm, NONCE_PROVIDER_NAME, NonceHashDigestProvider, SecureHash,
    TWEAKABLE_PROVIDER_NAME, TweakableHashDigestProvider,
};
use serde::{Deserialize, Serialize};

use crate::error::TransactionError;

pub const DEFAULT_ROOT_LEAF_PREFIX: &[u8] = b"MERIDIAN_ROOT_LEAF";
pub const DEFAULT_ROOT_NODE_PREFIX: &[u8] = b"MERIDIAN_ROOT_NODE";
pub const DEFAULT_BATCH_LEAF_PREFIX: &[u8] = b"MERIDIAN_BATCH_LEAF";
pub const DEFAULT_BATCH_NODE_PREFIX: &[u8] = b"MERIDIAN_BATCH_NODE";

pub const LEDGER_MODEL_UTXO: &str = "meridian.ledger.utxo";
pub const LEDGER_VERSION: u32 = 1;
pub const PLATFORM_VERSION: u32 = 1;
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// How the batch, root and component Merkle trees are hashed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestSettings {
    pub batch_merkle_tree_digest_provider_name: String,
    pub batch_merkle_tree_digest_algorithm_name: DigestAlgorithm,
    #[serde(with = "hex::serde")]
    pub batch_merkle_tree_leaf_prefix: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub batch_merkle_tree_node_prefix: Vec<u8>,
    pub root_merkle_tree_digest_provider_name: String,
    pub root_merkle_tree_digest_algorithm_name: DigestAlgorithm,
    #[serde(with = "hex::serde")]
    pub root_merkle_tree_leaf_prefix: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub root_merkle_tree_node_prefix: Vec<u8>,
    pub component_merkle_tree_digest_provider_name: String,
    pub component_merkle_tree_digest_algorithm_name: DigestAlgorithm,
    pub component_merkle_tree_entropy_algorithm_name: DigestAlgorithm,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            batch_merkle_tree_digest_provider_name: TWEAKABLE_PROVIDER_NAME.into(),
            batch_merkle_tree_digest_algorithm_name: DigestAlgorithm::Sha256D,
            batch_merkle_tree_leaf_prefix: DEFAULT_BATCH_LEAF_PREFIX.to_vec(),
            batch_merkle_tree_node_prefix: DEFAULT_BATCH_NODE_PREFIX.to_vec(),
            root_merkle_tree_digest_provider_name: TWEAKABLE_PROVIDER_NAME.into(),
            root_merkle_tree_digest_algorithm_name: DigestAlgorithm::Sha256D,
            root_merkle_tree_leaf_prefix: DEFAULT_ROOT_LEAF_PREFIX.to_vec(),
            root_merkle_tree_node_prefix: DEFAULT_ROOT_NODE_PREFIX.to_vec(),
            component_merkle_tree_digest_provider_name: NONCE_PROVIDER_NAME.into(),
            component_merkle_tree_digest_algorithm_name: DigestAlgorithm::Sha256D,
            component_merkle_tree_entropy_algorithm_name: DigestAlgorithm::Sha256D,
        }
    }
}

impl DigestSettings {
    /// Provider for the tree of component group roots
    pub fn root_provider(&self) -> TweakableHashDigestProvider {
        TweakableHashDigestProvider::new(
            self.root_merkle_tree_digest_algorithm_name,
            self.root_merkle_tree_leaf_prefix.clone(),
            self.root_merkle_tree_node_prefix.clone(),
        )
    }

    /// Provider for the tree of transaction ids signed together
    pub fn batch_provider(&self) -> TweakableHashDigestProvider {
        TweakableHashDigestProvider::new(
            self.batch_merkle_tree_digest_algorithm_name,
            self.batch_merkle_tree_leaf_prefix.clone(),
            self.batch_merkle_tree_node_prefix.clone(),
        )
    }

    pub fn component_provider(&self, entropy: SecureHash) -> NonceHashDigestProvider {
        NonceHashDigestProvider::new(self.component_merkle_tree_digest_algorithm_name, entropy)
    }

    /// Component provider for checking proofs, without entropy
    pub fn component_verifier(&self) -> NonceHashDigestProvider {
        NonceHashDigestProvider::verifier(self.component_merkle_tree_digest_algorithm_name)
    }

    /// Reject anything other than `supported`, naming the first field that differs
    pub fn ensure_supported(&self, supported: &DigestSettings) -> Result<(), TransactionError> {
        if self.root_merkle_tree_digest_provider_name != TWEAKABLE_PROVIDER_NAME {
            return Err(TransactionError::UnsupportedDigestSettings(format!(
                "root merkle tree provider {} is not implemented",
                self.root_merkle_tree_digest_provider_name
            )));
        }
        if self.component_merkle_tree_digest_provider_name != NONCE_PROVIDER_NAME {
            return Err(TransactionError::UnsupportedDigestSettings(format!(
                "component merkle tree provider {} is not implemented",
                self.component_merkle_tree_digest_provider_name
            )));
        }
        if self == supported {
            return Ok(());
        }

        let field = if self.batch_merkle_tree_digest_provider_name
            != supported.batch_merkle_tree_digest_provider_name
        {
            "batchMerkleTreeDigestProviderName"
        } else if self.batch_merkle_tree_digest_algorithm_name
            != supported.batch_merkle_tree_digest_algorithm_name
        {
            "batchMerkleTreeDigestAlgorithmName"
        } else if self.batch_merkle_tree_leaf_prefix != supported.batch_merkle_tree_leaf_prefix {
            "batchMerkleTreeLeafPrefix"
        } else if self.batch_merkle_tree_node_prefix != supported.batch_merkle_tree_node_prefix {
            "batchMerkleTreeNodePrefix"
        } else if self.root_merkle_tree_digest_algorithm_name
            != supported.root_merkle_tree_digest_algorithm_name
        {
            "rootMerkleTreeDigestAlgorithmName"
        } else if self.root_merkle_tree_leaf_prefix != supported.root_merkle_tree_leaf_prefix {
            "rootMerkleTreeLeafPrefix"
        } else if self.root_merkle_tree_node_prefix != supported.root_merkle_tree_node_prefix {
            "rootMerkleTreeNodePrefix"
        } else if self.component_merkle_tree_digest_algorithm_name
            != supported.component_merkle_tree_digest_algorithm_name
        {
            "componentMerkleTreeDigestAlgorithmName"
        } else {
            "componentMerkleTreeEntropyAlgorithmName"
        };
        Err(TransactionError::UnsupportedDigestSettings(format!(
            "{field} differs from the supported configuration"
        )))
    }
}

/// Ledger model tags plus digest settings, stored as group 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    pub ledger_model: String,
    pub ledger_version: u32,
    pub transaction_subtype: Option<String>,
    pub platform_version: u32,
    pub digest_settings: DigestSettings,
    pub schema_version: u32,
}

impl TransactionMetadata {
    pub fn new(digest_settings: DigestSettings) -> Self {
        Self {
            ledger_model: LEDGER_MODEL_UTXO.into(),
            ledger_version: LEDGER_VERSION,
            transaction_subtype: None,
            platform_version: PLATFORM_VERSION,
            digest_settings,
            schema_version: METADATA_SCHEMA_VERSION,
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.transaction_subtype = Some(subtype.into());
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        serde_json::to_vec(self).map_err(|e| TransactionError::MalformedMetadata(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        serde_json::from_slice(bytes).map_err(|e| TransactionError::MalformedMetadata(e.to_string()))
    }
}

impl Default for TransactionMetadata {
    fn default() -> Self {
        Self::new(DigestSettings::default())
    }
}
