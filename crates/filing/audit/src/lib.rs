//! Audit trail service for filing workflows.
//!
//! Every action on a filing is recorded here, and nothing recorded is ever
//! updated or deleted. The service is a facade over an [`AuditStore`]: a
//! dumb, trusted sink on the write side and a set of query surfaces on the
//! read side, including chain-of-custody verification.
//!
//! Ordering contracts are deliberate and asymmetric:
//! [`AuditService::filing_history`] is newest first, while
//! [`AuditService::status_changes`] is oldest first. Downstream computations
//! (time-to-approval, transition timelines) depend on the specific
//! convention, so the two are kept as distinct contracts.

#![deny(unsafe_code)]

use chrono::{DateTime, Utc};
use filing_storage::{AuditAppend, AuditStore, QueryWindow, StorageError};
use filing_types::{AuditEntry, AuditEntryId, FilingId, FilingStatus, Metadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// The audit trail facade.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Record one audit entry and return its store-assigned id.
    ///
    /// This call performs no business-rule validation; legality of
    /// transitions is the workflow engine's concern. The only failure mode
    /// is an unavailable store.
    pub async fn record(
        &self,
        filing_id: FilingId,
        action: impl Into<String>,
        actor: impl Into<String>,
        previous_status: Option<FilingStatus>,
        new_status: Option<FilingStatus>,
        metadata: Option<Metadata>,
    ) -> Result<AuditEntryId, AuditError> {
        let action = action.into();
        let entry = self
            .store
            .append(AuditAppend {
                filing_id,
                action: action.clone(),
                actor: actor.into(),
                previous_status,
                new_status,
                metadata,
            })
            .await?;
        tracing::debug!(filing_id = %filing_id, action = %action, entry_id = %entry.id, "audit entry recorded");
        Ok(entry.id)
    }

    /// Complete audit trail for a filing, newest first.
    pub async fn filing_history(&self, filing_id: FilingId) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self.store.entries_for_filing(filing_id).await?)
    }

    /// Status-change entries only, oldest first. Reconstructs the
    /// transition timeline.
    pub async fn status_changes(&self, filing_id: FilingId) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self.store.status_changes(filing_id).await?)
    }

    /// All actions by one actor across filings, newest first.
    pub async fn actor_history(
        &self,
        actor: &str,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self
            .store
            .entries_for_actor(actor, QueryWindow::limit(limit))
            .await?)
    }

    /// Recent activity across all filings, newest first.
    pub async fn recent_activity(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self.store.recent(QueryWindow::limit(limit)).await?)
    }

    /// Reconstruct the chain of custody for a filing.
    ///
    /// A filing with no history yields a soft failure rather than an error;
    /// absence of a trail is a finding, not a fault.
    pub async fn verify_chain_of_custody(
        &self,
        filing_id: FilingId,
    ) -> Result<CustodySummary, AuditError> {
        let history = self.filing_history(filing_id).await?;

        if history.is_empty() {
            return Ok(CustodySummary::missing());
        }

        let actors: BTreeSet<String> = history.iter().map(|e| e.actor.clone()).collect();
        let status_transitions = history.iter().filter(|e| e.is_status_change()).count();

        // History is newest first: creation is the last element, the
        // current status comes from the first.
        let created_at = history.last().map(|e| e.timestamp);
        let current_status = history.first().and_then(|e| e.new_status);

        let time_to_approval_seconds = history
            .iter()
            .find(|e| e.new_status == Some(FilingStatus::Approved))
            .zip(created_at)
            .map(|(approved, created)| (approved.timestamp - created).num_seconds());

        Ok(CustodySummary {
            valid: true,
            reason: None,
            total_actions: history.len(),
            unique_actors: actors,
            status_transitions,
            created_at,
            current_status,
            time_to_approval_seconds,
        })
    }
}

/// Chain-of-custody verification report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustodySummary {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub total_actions: usize,
    pub unique_actors: BTreeSet<String>,
    pub status_transitions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<FilingStatus>,
    /// Elapsed whole seconds from the creation entry to the approval entry,
    /// when an approval exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_approval_seconds: Option<i64>,
}

impl CustodySummary {
    fn missing() -> Self {
        CustodySummary {
            valid: false,
            reason: Some("No audit trail found".to_string()),
            total_actions: 0,
            unique_actors: BTreeSet::new(),
            status_transitions: 0,
            created_at: None,
            current_status: None,
            time_to_approval_seconds: None,
        }
    }
}

/// Audit-layer errors.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StorageError> for AuditError {
    fn from(value: StorageError) -> Self {
        AuditError::StoreUnavailable(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filing_storage::memory::InMemoryComplianceStorage;

    fn service() -> AuditService {
        AuditService::new(Arc::new(InMemoryComplianceStorage::new()))
    }

    #[tokio::test]
    async fn record_returns_distinct_ids_for_identical_calls() {
        let audit = service();
        let first = audit
            .record(FilingId(1), "created", "alice", None, Some(FilingStatus::Draft), None)
            .await
            .unwrap();
        let second = audit
            .record(FilingId(1), "created", "alice", None, Some(FilingStatus::Draft), None)
            .await
            .unwrap();
        assert_ne!(first, second);

        let history = audit.filing_history(FilingId(1)).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let audit = service();
        for (action, status) in [
            ("created", FilingStatus::Draft),
            ("submitted_for_review", FilingStatus::PendingReview),
            ("approved", FilingStatus::Approved),
        ] {
            audit
                .record(FilingId(3), action, "alice", None, Some(status), None)
                .await
                .unwrap();
        }

        let history = audit.filing_history(FilingId(3)).await.unwrap();
        assert_eq!(history[0].action, "approved");
        assert_eq!(history[2].action, "created");

        let changes = audit.status_changes(FilingId(3)).await.unwrap();
        assert_eq!(changes[0].action, "created");
        assert_eq!(changes[2].action, "approved");
    }

    #[tokio::test]
    async fn custody_without_history_is_invalid() {
        let audit = service();
        let summary = audit.verify_chain_of_custody(FilingId(42)).await.unwrap();
        assert!(!summary.valid);
        assert_eq!(summary.reason.as_deref(), Some("No audit trail found"));
        assert_eq!(summary.total_actions, 0);
    }

    #[tokio::test]
    async fn custody_single_entry_has_no_approval_time() {
        let audit = service();
        audit
            .record(FilingId(5), "created", "alice", None, Some(FilingStatus::Draft), None)
            .await
            .unwrap();

        let summary = audit.verify_chain_of_custody(FilingId(5)).await.unwrap();
        assert!(summary.valid);
        assert_eq!(summary.total_actions, 1);
        assert_eq!(summary.unique_actors.len(), 1);
        assert_eq!(summary.status_transitions, 1);
        assert_eq!(summary.current_status, Some(FilingStatus::Draft));
        assert!(summary.time_to_approval_seconds.is_none());
    }

    #[tokio::test]
    async fn custody_measures_approval_from_creation_entry() {
        let audit = service();
        audit
            .record(FilingId(9), "created", "alice", None, Some(FilingStatus::Draft), None)
            .await
            .unwrap();
        audit
            .record(
                FilingId(9),
                "submitted_for_review",
                "alice",
                Some(FilingStatus::Draft),
                Some(FilingStatus::PendingReview),
                None,
            )
            .await
            .unwrap();
        audit
            .record(
                FilingId(9),
                "approved",
                "bob",
                Some(FilingStatus::PendingReview),
                Some(FilingStatus::Approved),
                None,
            )
            .await
            .unwrap();

        let history = audit.filing_history(FilingId(9)).await.unwrap();
        let created = history.last().unwrap().timestamp;
        let approved = history
            .iter()
            .find(|e| e.new_status == Some(FilingStatus::Approved))
            .unwrap()
            .timestamp;

        let summary = audit.verify_chain_of_custody(FilingId(9)).await.unwrap();
        assert!(summary.valid);
        assert_eq!(summary.total_actions, 3);
        assert_eq!(summary.unique_actors.len(), 2);
        assert_eq!(summary.current_status, Some(FilingStatus::Approved));
        assert_eq!(
            summary.time_to_approval_seconds,
            Some((approved - created).num_seconds())
        );
    }

    #[tokio::test]
    async fn actor_history_and_recent_activity_respect_limits() {
        let audit = service();
        for i in 0..6 {
            audit
                .record(FilingId(i), "created", "alice", None, Some(FilingStatus::Draft), None)
                .await
                .unwrap();
        }

        let by_actor = audit.actor_history("alice", 4).await.unwrap();
        assert_eq!(by_actor.len(), 4);
        assert!(by_actor[0].id > by_actor[1].id);

        let recent = audit.recent_activity(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].filing_id, FilingId(5));
    }

    #[tokio::test]
    async fn metadata_is_returned_verbatim() {
        let audit = service();
        let mut metadata = Metadata::new();
        metadata.insert("comments".to_string(), serde_json::json!("looks good"));
        metadata.insert("approved".to_string(), serde_json::json!(true));

        audit
            .record(
                FilingId(1),
                "approved",
                "bob",
                Some(FilingStatus::PendingReview),
                Some(FilingStatus::Approved),
                Some(metadata.clone()),
            )
            .await
            .unwrap();

        let history = audit.filing_history(FilingId(1)).await.unwrap();
        assert_eq!(history[0].metadata.as_ref(), Some(&metadata));
    }
}
