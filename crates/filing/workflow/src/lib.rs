//! Workflow state machine for filing approvals.
//!
//! The engine owns the transition table and refuses any state change that
//! is not in it. Every accepted transition is written to the audit trail
//! *before* it is reported as successful; the materialized filing status is
//! only ever updated afterwards, so an externally observable status change
//! always has an attributable record behind it.
//!
//! Valid transitions:
//!
//! - `Draft → PendingReview` (submit for approval)
//! - `PendingReview → Approved` (terminal; approved filings are immutable)
//! - `PendingReview → Rejected`
//! - `PendingReview → Draft` (send back for revisions)
//! - `Rejected → Draft` (revise and resubmit)
//!
//! # Example
//!
//! ```rust
//! use filing_types::FilingStatus;
//! use filing_workflow::TransitionTable;
//!
//! let table = TransitionTable::standard();
//! assert!(table.contains(FilingStatus::Draft, FilingStatus::PendingReview));
//! assert!(table.allowed(FilingStatus::Approved).is_empty()); // terminal
//! ```

#![deny(unsafe_code)]

mod engine;
mod error;
mod service;
mod transitions;

pub use engine::{ApprovalFlowReport, WorkflowEngine, WorkflowStatusView};
pub use error::{WorkflowError, WorkflowResult};
pub use service::{
    ContentValidator, FilingService, NewFilingRequest, ReviewDecision, TransitionOutcome,
};
pub use transitions::{actions, TransitionTable};
