//! The transition table: process-wide, immutable workflow configuration.
//!
//! Built once at startup and never mutated. [`TransitionTable::new`]
//! validates that the table is total over every status (terminal states map
//! to an empty row) and contains no self-loops.

use crate::error::{WorkflowError, WorkflowResult};
use filing_types::FilingStatus;
use std::collections::HashMap;

/// Symbolic action labels written to the audit trail.
pub mod actions {
    pub const CREATED: &str = "created";
    pub const SUBMITTED_FOR_REVIEW: &str = "submitted_for_review";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const RETURNED_FOR_REVISION: &str = "returned_for_revision";
    pub const REVISED: &str = "revised";
}

/// Immutable mapping from each status to its allowed targets.
#[derive(Clone, Debug)]
pub struct TransitionTable {
    allowed: HashMap<FilingStatus, Vec<FilingStatus>>,
}

impl TransitionTable {
    /// The authoritative filing approval table.
    pub fn standard() -> Self {
        let mut allowed = HashMap::new();
        allowed.insert(FilingStatus::Draft, vec![FilingStatus::PendingReview]);
        allowed.insert(
            FilingStatus::PendingReview,
            vec![
                FilingStatus::Approved,
                FilingStatus::Rejected,
                FilingStatus::Draft,
            ],
        );
        // Terminal: approved filings are immutable, revise into a new version.
        allowed.insert(FilingStatus::Approved, Vec::new());
        allowed.insert(FilingStatus::Rejected, vec![FilingStatus::Draft]);
        TransitionTable { allowed }
    }

    /// Build a custom table, rejecting rows that are missing or contain a
    /// state as its own target.
    pub fn new(allowed: HashMap<FilingStatus, Vec<FilingStatus>>) -> WorkflowResult<Self> {
        for status in FilingStatus::ALL {
            let row = allowed
                .get(&status)
                .ok_or(WorkflowError::IncompleteTable(status))?;
            if row.contains(&status) {
                return Err(WorkflowError::SelfLoop(status));
            }
        }
        Ok(TransitionTable { allowed })
    }

    /// The allowed targets from `current`. Empty slice signals a terminal
    /// state.
    pub fn allowed(&self, current: FilingStatus) -> &[FilingStatus] {
        self.allowed
            .get(&current)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `current -> target` is in the table.
    pub fn contains(&self, current: FilingStatus, target: FilingStatus) -> bool {
        self.allowed(current).contains(&target)
    }

    /// Human-meaningful action label for a transition.
    ///
    /// The generic `transition_<target>` fallback must be unreachable for
    /// any pair the standard table accepts; a named pair missing here is a
    /// configuration gap, not a new audit vocabulary.
    pub fn action_name(&self, current: FilingStatus, target: FilingStatus) -> String {
        match (current, target) {
            (FilingStatus::Draft, FilingStatus::PendingReview) => {
                actions::SUBMITTED_FOR_REVIEW.to_string()
            }
            (FilingStatus::PendingReview, FilingStatus::Approved) => actions::APPROVED.to_string(),
            (FilingStatus::PendingReview, FilingStatus::Rejected) => actions::REJECTED.to_string(),
            (FilingStatus::PendingReview, FilingStatus::Draft) => {
                actions::RETURNED_FOR_REVISION.to_string()
            }
            (FilingStatus::Rejected, FilingStatus::Draft) => actions::REVISED.to_string(),
            (_, target) => format!("transition_{}", target),
        }
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_total_and_loop_free() {
        let table = TransitionTable::standard();
        for status in FilingStatus::ALL {
            assert!(!table.allowed(status).contains(&status));
        }
        assert!(table.allowed(FilingStatus::Approved).is_empty());
    }

    #[test]
    fn standard_table_passes_its_own_validation() {
        let table = TransitionTable::standard();
        assert!(TransitionTable::new(table.allowed.clone()).is_ok());
    }

    #[test]
    fn missing_row_is_rejected() {
        let mut rows = TransitionTable::standard().allowed;
        rows.remove(&FilingStatus::Rejected);
        let result = TransitionTable::new(rows);
        assert!(matches!(
            result,
            Err(WorkflowError::IncompleteTable(FilingStatus::Rejected))
        ));
    }

    #[test]
    fn self_loop_is_rejected() {
        let mut rows = TransitionTable::standard().allowed;
        rows.insert(FilingStatus::Draft, vec![FilingStatus::Draft]);
        let result = TransitionTable::new(rows);
        assert!(matches!(
            result,
            Err(WorkflowError::SelfLoop(FilingStatus::Draft))
        ));
    }

    #[test]
    fn named_actions_cover_every_table_pair() {
        let table = TransitionTable::standard();
        for current in FilingStatus::ALL {
            for &target in table.allowed(current) {
                let action = table.action_name(current, target);
                assert!(
                    !action.starts_with("transition_"),
                    "table pair {current} -> {target} fell through to the generic label"
                );
            }
        }
    }

    #[test]
    fn fallback_label_names_the_target() {
        let table = TransitionTable::standard();
        let action = table.action_name(FilingStatus::Approved, FilingStatus::Draft);
        assert_eq!(action, "transition_draft");
    }
}
