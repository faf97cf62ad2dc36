//! Storage abstractions for the filing workflow engine.
//!
//! This crate defines the storage contract consumed by the audit and
//! workflow layers:
//! - an append-only audit ledger keyed by filing (never updated, never
//!   deleted once written)
//! - the mutable table of materialized filing records with version lineage
//!
//! Design stance:
//! - The ledger is the ground truth; the filing row's status is a cache of
//!   the ledger's last entry. Stores must serialize appends so that id
//!   assignment order equals timestamp order.
//! - The in-memory adapter is the deterministic reference; the SQLite
//!   adapter (feature `sqlite`) is the durable backend.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod model;
#[cfg(feature = "sqlite")]
pub mod sqlite;
mod traits;

pub use error::{StorageError, StorageResult};
pub use model::{AuditAppend, FilingFilter, NewFiling};
pub use traits::{AuditStore, ComplianceStorage, FilingStore, QueryWindow};
