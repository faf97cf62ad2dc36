//! In-memory reference implementation of the storage traits.
//!
//! Deterministic and test-friendly. Production deployments should use the
//! SQLite adapter (or another transactional backend) for source-of-truth
//! data.

use crate::model::{AuditAppend, FilingFilter, NewFiling};
use crate::traits::{AuditStore, FilingStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filing_types::{AuditEntry, AuditEntryId, FilingId, FilingRecord, FilingStatus};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage adapter.
#[derive(Default)]
pub struct InMemoryComplianceStorage {
    filings: RwLock<HashMap<FilingId, FilingRecord>>,
    ledger: RwLock<Ledger>,
}

/// The append-only audit ledger plus its sequencing state.
#[derive(Default)]
struct Ledger {
    entries: Vec<AuditEntry>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl InMemoryComplianceStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for InMemoryComplianceStorage {
    async fn append(&self, entry: AuditAppend) -> StorageResult<AuditEntry> {
        let mut guard = self
            .ledger
            .write()
            .map_err(|_| StorageError::Backend("ledger lock poisoned".to_string()))?;

        // Appends are serialized under this lock, so assignment order is
        // timestamp order. Clamp against the previous entry in case the
        // wall clock steps backwards.
        let now = Utc::now();
        let timestamp = match guard.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };

        let record = AuditEntry {
            id: AuditEntryId(guard.entries.len() as i64 + 1),
            filing_id: entry.filing_id,
            action: entry.action,
            actor: entry.actor,
            previous_status: entry.previous_status,
            new_status: entry.new_status,
            metadata: entry.metadata,
            timestamp,
        };

        guard.entries.push(record.clone());
        guard.last_timestamp = Some(timestamp);
        Ok(record)
    }

    async fn entries_for_filing(&self, filing_id: FilingId) -> StorageResult<Vec<AuditEntry>> {
        let guard = self
            .ledger
            .read()
            .map_err(|_| StorageError::Backend("ledger lock poisoned".to_string()))?;
        let mut entries: Vec<_> = guard
            .entries
            .iter()
            .filter(|e| e.filing_id == filing_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    async fn status_changes(&self, filing_id: FilingId) -> StorageResult<Vec<AuditEntry>> {
        let guard = self
            .ledger
            .read()
            .map_err(|_| StorageError::Backend("ledger lock poisoned".to_string()))?;
        let mut entries: Vec<_> = guard
            .entries
            .iter()
            .filter(|e| e.filing_id == filing_id && e.new_status.is_some())
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn entries_for_actor(
        &self,
        actor: &str,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditEntry>> {
        let guard = self
            .ledger
            .read()
            .map_err(|_| StorageError::Backend("ledger lock poisoned".to_string()))?;
        let mut entries: Vec<_> = guard
            .entries
            .iter()
            .filter(|e| e.actor == actor)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(apply_window(entries, window))
    }

    async fn recent(&self, window: QueryWindow) -> StorageResult<Vec<AuditEntry>> {
        let guard = self
            .ledger
            .read()
            .map_err(|_| StorageError::Backend("ledger lock poisoned".to_string()))?;
        let mut entries = guard.entries.clone();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(apply_window(entries, window))
    }
}

#[async_trait]
impl FilingStore for InMemoryComplianceStorage {
    async fn insert_filing(&self, filing: NewFiling) -> StorageResult<FilingRecord> {
        let mut guard = self
            .filings
            .write()
            .map_err(|_| StorageError::Backend("filings lock poisoned".to_string()))?;

        if let Some(parent_id) = filing.parent_filing_id {
            if !guard.contains_key(&parent_id) {
                return Err(StorageError::InvalidInput(format!(
                    "parent filing {} does not exist",
                    parent_id
                )));
            }
        }

        let record = FilingRecord {
            id: FilingId(guard.len() as i64 + 1),
            filing_name: filing.filing_name,
            filing_type: filing.filing_type,
            version: filing.version,
            status: filing.status,
            content: filing.content,
            created_at: Utc::now(),
            created_by: filing.created_by,
            parent_filing_id: filing.parent_filing_id,
        };
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_filing(&self, id: FilingId) -> StorageResult<Option<FilingRecord>> {
        let guard = self
            .filings
            .read()
            .map_err(|_| StorageError::Backend("filings lock poisoned".to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn current_status(&self, id: FilingId) -> StorageResult<Option<FilingStatus>> {
        let guard = self
            .filings
            .read()
            .map_err(|_| StorageError::Backend("filings lock poisoned".to_string()))?;
        Ok(guard.get(&id).map(|record| record.status))
    }

    async fn set_status(&self, id: FilingId, status: FilingStatus) -> StorageResult<()> {
        let mut guard = self
            .filings
            .write()
            .map_err(|_| StorageError::Backend("filings lock poisoned".to_string()))?;
        let record = guard
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("filing {} not found", id)))?;
        // Approved rows are immutable; corrections go through a new version.
        if record.status == FilingStatus::Approved {
            return Err(StorageError::Conflict(format!(
                "filing {} is approved and immutable",
                id
            )));
        }
        record.status = status;
        Ok(())
    }

    async fn list_filings(
        &self,
        filter: FilingFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<FilingRecord>> {
        let guard = self
            .filings
            .read()
            .map_err(|_| StorageError::Backend("filings lock poisoned".to_string()))?;
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| {
                filter.status.map_or(true, |s| record.status == s)
                    && filter.filing_type.map_or(true, |t| record.filing_type == t)
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(apply_window(records, window))
    }

    async fn version_chain(&self, id: FilingId) -> StorageResult<Vec<FilingRecord>> {
        let guard = self
            .filings
            .read()
            .map_err(|_| StorageError::Backend("filings lock poisoned".to_string()))?;

        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let record = guard
                .get(&current)
                .ok_or_else(|| StorageError::NotFound(format!("filing {} not found", current)))?;
            cursor = record.parent_filing_id;
            chain.push(record.clone());
        }
        chain.reverse();
        Ok(chain)
    }
}

fn apply_window<T>(values: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = values.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filing_types::FilingType;

    fn append_payload(filing_id: FilingId, action: &str, actor: &str) -> AuditAppend {
        AuditAppend {
            filing_id,
            action: action.to_string(),
            actor: actor.to_string(),
            previous_status: None,
            new_status: Some(FilingStatus::Draft),
            metadata: None,
        }
    }

    fn new_filing(version: u32, parent: Option<FilingId>) -> NewFiling {
        NewFiling {
            filing_name: "Q1 Holdings".to_string(),
            filing_type: FilingType::NPort,
            status: FilingStatus::Draft,
            content: serde_json::json!({"fund_name": "Test ETF"}),
            created_by: "analyst@example.com".to_string(),
            version,
            parent_filing_id: parent,
        }
    }

    #[tokio::test]
    async fn append_assigns_monotonic_ids_and_timestamps() {
        let storage = InMemoryComplianceStorage::new();
        let first = storage
            .append(append_payload(FilingId(1), "created", "a"))
            .await
            .unwrap();
        let second = storage
            .append(append_payload(FilingId(1), "submitted_for_review", "a"))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert!(second.timestamp >= first.timestamp);
    }

    #[tokio::test]
    async fn filing_history_is_newest_first_and_status_changes_oldest_first() {
        let storage = InMemoryComplianceStorage::new();
        for action in ["created", "submitted_for_review", "approved"] {
            storage
                .append(append_payload(FilingId(7), action, "a"))
                .await
                .unwrap();
        }

        let history = storage.entries_for_filing(FilingId(7)).await.unwrap();
        assert_eq!(history[0].action, "approved");
        assert_eq!(history[2].action, "created");

        let changes = storage.status_changes(FilingId(7)).await.unwrap();
        assert_eq!(changes[0].action, "created");
        assert_eq!(changes[2].action, "approved");
    }

    #[tokio::test]
    async fn windows_bound_actor_and_recent_queries() {
        let storage = InMemoryComplianceStorage::new();
        for i in 0..5 {
            storage
                .append(append_payload(FilingId(i), "created", "reviewer"))
                .await
                .unwrap();
        }

        let recent = storage.recent(QueryWindow::limit(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].id > recent[1].id);

        let by_actor = storage
            .entries_for_actor("reviewer", QueryWindow::limit(3))
            .await
            .unwrap();
        assert_eq!(by_actor.len(), 3);

        let nobody = storage
            .entries_for_actor("ghost", QueryWindow::limit(3))
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn version_chain_walks_parents_oldest_first() {
        let storage = InMemoryComplianceStorage::new();
        let v1 = storage.insert_filing(new_filing(1, None)).await.unwrap();
        let v2 = storage
            .insert_filing(new_filing(2, Some(v1.id)))
            .await
            .unwrap();
        let v3 = storage
            .insert_filing(new_filing(3, Some(v2.id)))
            .await
            .unwrap();

        let chain = storage.version_chain(v3.id).await.unwrap();
        let versions: Vec<u32> = chain.iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn insert_rejects_unknown_parent() {
        let storage = InMemoryComplianceStorage::new();
        let result = storage
            .insert_filing(new_filing(2, Some(FilingId(99))))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn set_status_on_approved_filing_is_a_conflict() {
        let storage = InMemoryComplianceStorage::new();
        let filing = storage.insert_filing(new_filing(1, None)).await.unwrap();
        storage
            .set_status(filing.id, FilingStatus::Approved)
            .await
            .unwrap();

        let result = storage.set_status(filing.id, FilingStatus::Draft).await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert_eq!(
            storage.current_status(filing.id).await.unwrap(),
            Some(FilingStatus::Approved)
        );
    }

    #[tokio::test]
    async fn list_filings_filters_by_status() {
        let storage = InMemoryComplianceStorage::new();
        let a = storage.insert_filing(new_filing(1, None)).await.unwrap();
        storage.insert_filing(new_filing(1, None)).await.unwrap();
        storage
            .set_status(a.id, FilingStatus::PendingReview)
            .await
            .unwrap();

        let pending = storage
            .list_filings(
                FilingFilter {
                    status: Some(FilingStatus::PendingReview),
                    filing_type: None,
                },
                QueryWindow::limit(10),
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);
    }
}
