//! The append-only inventory ledger.
//!
//! Producers build a [`LedgerWrite`] and hand it to the [`LedgerWriter`],
//! which deduplicates on the idempotency key, upgrades a matching
//! provisional row when one exists in the reconciliation window, and
//! otherwise inserts.

pub mod delta;
pub mod key;
pub mod matcher;
pub mod memory;
pub mod store;
pub mod writer;

pub use delta::{Sign, compute_delta};
pub use key::{KeyParts, derive_key};
pub use matcher::{ReconciliationMatcher, ReconciliationWindow};
pub use memory::MemoryLedgerStore;
pub use store::{LedgerStore, LedgerStoreError, StockScope};
pub use writer::{
    LedgerTally, LedgerWrite, LedgerWriteError, LedgerWriter, ObservedChange, WriteOutcome,
};
