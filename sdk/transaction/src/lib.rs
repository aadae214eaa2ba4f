//! Meridian Transaction SDK
//!
//! Wire transactions, their Merkle identity, and selective disclosure.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Transaction Layer                         │
//! │                                                                  │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐  │
//! │  │ PrivacySalt  │──▶│ WireTransaction  │──▶│ FilteredTx       │  │
//! │  │ + metadata   │   │ groups, id       │   │ Builder          │  │
//! │  └──────────────┘   └────────┬─────────┘   └────────┬─────────┘  │
//! │                              │                      ▼            │
//! │                              ▼             ┌──────────────────┐  │
//! │                     ┌──────────────────┐   │ FilteredTx       │  │
//! │                     │ BatchChecker /   │   │ verify, data     │  │
//! │                     │ BatchTree        │   └──────────────────┘  │
//! │                     └──────────────────┘                         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod error;
pub mod filtered;
pub mod group;
pub mod metadata;
pub mod salt;
pub mod wire;

pub use batch::{BatchChecker, BatchSignable, BatchTree};
pub use error::{BatchError, FilterError, FilteredTransactionError, TransactionError};
pub use filtered::{
    ComponentDeserializer, Disclosure, FilteredData, FilteredTransaction,
    FilteredTransactionBuilder, JsonComponents, RawComponents,
};
pub use group::ComponentGroup;
pub use metadata::{DigestSettings, TransactionMetadata};
pub use salt::PrivacySalt;
pub use wire::{
    GroupRootLeaf, TransactionFactory, TransactionLimits, WireTransaction, WireTransactionBuilder,
};
