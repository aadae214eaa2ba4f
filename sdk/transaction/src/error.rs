use meridian_crypto::{DigestAlgorithm, MerkleError, SecureHash};
use thiserror::Error;

/// Error raised by a component deserializer
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wire transaction construction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid privacy salt: {0}")]
    InvalidPrivacySalt(String),

    #[error("transaction has no component groups")]
    NoComponentGroups,

    #[error("component group {group} is empty")]
    EmptyComponentGroup { group: usize },

    #[error("component {index} of group {group} is empty")]
    EmptyComponent { group: usize, index: usize },

    #[error("metadata group must hold exactly one component, found {count}")]
    InvalidMetadataGroup { count: usize },

    #[error("malformed transaction metadata: {0}")]
    MalformedMetadata(String),

    #[error("unsupported digest settings: {0}")]
    UnsupportedDigestSettings(String),

    #[error("component group {index} out of range, transaction has {count} groups")]
    ComponentGroupOutOfRange { index: usize, count: usize },

    #[error("too many component groups: {count} (max {max})")]
    TooManyComponentGroups { count: usize, max: usize },

    #[error("component group {group} holds {count} components (max {max})")]
    TooManyComponents {
        group: usize,
        count: usize,
        max: usize,
    },

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// Filtered transaction construction errors
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("component group {group} already has a disclosure directive")]
    DuplicateDirective { group: usize },

    #[error("failed to deserialize component {index} of group {group}")]
    Deserialization {
        group: usize,
        index: usize,
        #[source]
        source: BoxError,
    },

    #[error("cannot build a proof for component group {group}")]
    Proof {
        group: usize,
        #[source]
        source: MerkleError,
    },

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// Filtered transaction verification and access errors
#[derive(Debug, Error)]
pub enum FilteredTransactionError {
    #[error("inconsistent filtered data in transaction {id}: {reason}")]
    InconsistentFilteredData { id: SecureHash, reason: String },

    #[error(
        "filtered data inconsistency in transaction {id} between groups {group} and {paired_group}: {reason}"
    )]
    FilteredDataInconsistency {
        id: SecureHash,
        group: usize,
        paired_group: usize,
        reason: String,
    },

    #[error("metadata of transaction {id} is unusable")]
    Metadata {
        id: SecureHash,
        #[source]
        source: TransactionError,
    },

    #[error("failed to deserialize component {index} of group {group}")]
    Deserialization {
        group: usize,
        index: usize,
        #[source]
        source: BoxError,
    },
}

/// Batch signing rejections. Any of these aborts the whole batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("cannot sign an empty batch")]
    EmptyBatch,

    #[error(
        "transaction {id} uses batch digest provider {provider}, batch signing supports only {expected}"
    )]
    UnsupportedBatchProvider {
        id: SecureHash,
        provider: String,
        expected: &'static str,
    },

    #[error(
        "batch merkle tree digest algorithm mismatch: transaction {id} uses {found}, batch uses {expected}"
    )]
    BatchAlgorithmMismatch {
        id: SecureHash,
        expected: DigestAlgorithm,
        found: DigestAlgorithm,
    },

    #[error("batch merkle tree leaf prefix mismatch in transaction {id}")]
    BatchLeafPrefixMismatch { id: SecureHash },

    #[error("batch merkle tree node prefix mismatch in transaction {id}")]
    BatchNodePrefixMismatch { id: SecureHash },

    #[error(
        "root merkle tree digest algorithm mismatch: transaction {id} uses {found}, batch uses {expected}"
    )]
    RootAlgorithmMismatch {
        id: SecureHash,
        expected: DigestAlgorithm,
        found: DigestAlgorithm,
    },

    #[error("transaction {id} shares a prefix between its root and batch merkle trees")]
    SharedTreePrefix { id: SecureHash },

    #[error(
        "transaction id digest algorithm mismatch: transaction {id} uses {found}, batch uses {expected}"
    )]
    IdAlgorithmMismatch {
        id: SecureHash,
        expected: DigestAlgorithm,
        found: DigestAlgorithm,
    },

    #[error("transaction {id} uses non-default merkle tree prefixes")]
    NonDefaultPrefix { id: SecureHash },

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}
