use filing_audit::AuditError;
use filing_storage::StorageError;
use filing_types::{FilingId, FilingStatus};
use thiserror::Error;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Workflow-layer errors. None of these are retried internally.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The attempted transition is not in the table. Carries the allowed
    /// set so callers can render a precise client error without string
    /// parsing.
    #[error("invalid transition: {current} -> {target}")]
    InvalidTransition {
        current: FilingStatus,
        target: FilingStatus,
        allowed: Vec<FilingStatus>,
    },

    #[error("filing {0} not found")]
    FilingNotFound(FilingId),

    #[error("actor identity must not be empty")]
    EmptyActor,

    /// Content validation rejected the filing before a transition was
    /// attempted.
    #[error("filing content failed validation")]
    ValidationFailed { missing_fields: Vec<String> },

    /// Audit history is structurally inconsistent with the expected
    /// workflow shape. Reported, never auto-corrected.
    #[error("audit integrity violation: {0}")]
    IntegrityViolation(String),

    /// A transition table row is missing for a status.
    #[error("transition table has no row for {0}")]
    IncompleteTable(FilingStatus),

    /// A transition table row contains its own state as a target.
    #[error("transition table contains a self-loop for {0}")]
    SelfLoop(FilingStatus),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
