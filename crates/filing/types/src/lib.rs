//! Shared domain types for the filing workflow engine.
//!
//! This crate defines the vocabulary every other crate speaks:
//!
//! - [`FilingStatus`] — the closed set of workflow states
//! - [`FilingType`] — SEC form types accepted by the system
//! - [`AuditEntry`] — one immutable record of an action taken on a filing
//! - [`FilingRecord`] — the materialized filing row with version lineage
//! - [`ValidationOutcome`] — the verdict produced by a content validator
//!
//! Types here carry no behavior beyond construction and serialization.
//! Workflow rules live in `filing-workflow`; persistence lives in
//! `filing-storage`.

#![deny(unsafe_code)]

mod audit;
mod filing;
mod status;
mod validation;

pub use audit::{AuditEntry, AuditEntryId, Metadata};
pub use filing::{FilingId, FilingRecord, VersionInfo};
pub use status::{FilingStatus, FilingType, UnknownFilingStatus, UnknownFilingType};
pub use validation::ValidationOutcome;
