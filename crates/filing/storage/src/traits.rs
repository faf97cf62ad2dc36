use crate::model::{AuditAppend, FilingFilter, NewFiling};
use crate::StorageResult;
use async_trait::async_trait;
use filing_types::{AuditEntry, FilingId, FilingRecord, FilingStatus};

/// Generic query window for paged reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    /// Window returning at most `limit` rows from the start.
    pub fn limit(limit: usize) -> Self {
        QueryWindow { limit, offset: 0 }
    }
}

/// Storage interface for the append-only audit ledger.
///
/// Implementations must serialize appends so that id assignment order
/// equals timestamp order; callers never supply ids or timestamps.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one entry and return the stored record.
    async fn append(&self, entry: AuditAppend) -> StorageResult<AuditEntry>;

    /// All entries for a filing, newest first.
    async fn entries_for_filing(&self, filing_id: FilingId) -> StorageResult<Vec<AuditEntry>>;

    /// Entries with `new_status` present, oldest first.
    ///
    /// Note the ordering asymmetry with [`AuditStore::entries_for_filing`];
    /// it is part of the contract, not an accident.
    async fn status_changes(&self, filing_id: FilingId) -> StorageResult<Vec<AuditEntry>>;

    /// Entries attributed to an actor across all filings, newest first.
    async fn entries_for_actor(
        &self,
        actor: &str,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditEntry>>;

    /// Most recent entries across all filings, newest first.
    async fn recent(&self, window: QueryWindow) -> StorageResult<Vec<AuditEntry>>;
}

/// Storage interface for materialized filing records.
#[async_trait]
pub trait FilingStore: Send + Sync {
    /// Insert a new filing version and return the stored record.
    async fn insert_filing(&self, filing: NewFiling) -> StorageResult<FilingRecord>;

    /// Fetch one filing by id.
    async fn get_filing(&self, id: FilingId) -> StorageResult<Option<FilingRecord>>;

    /// Read just the materialized status of a filing.
    async fn current_status(&self, id: FilingId) -> StorageResult<Option<FilingStatus>>;

    /// Update the materialized status.
    ///
    /// Callers must write the corresponding audit entry first; the status
    /// row is a cache of the ledger's last entry. Updating an approved
    /// filing fails with [`crate::StorageError::Conflict`].
    async fn set_status(&self, id: FilingId, status: FilingStatus) -> StorageResult<()>;

    /// List filings newest first, with optional status/type filters.
    async fn list_filings(
        &self,
        filter: FilingFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<FilingRecord>>;

    /// The filing's version lineage (followed through `parent_filing_id`),
    /// oldest version first, ending at the given filing.
    async fn version_chain(&self, id: FilingId) -> StorageResult<Vec<FilingRecord>>;
}

/// Unified storage bundle consumed by the service layer.
pub trait ComplianceStorage: AuditStore + FilingStore + Send + Sync {}

impl<T> ComplianceStorage for T where T: AuditStore + FilingStore + Send + Sync {}
