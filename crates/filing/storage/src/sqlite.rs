//! SQLite adapter for filing storage.
//!
//! This adapter is the durable source-of-truth backend. Writes to the
//! audit ledger run inside a transaction that also reads the previous
//! entry, so id assignment order equals timestamp order even when the
//! wall clock steps backwards.

use crate::model::{AuditAppend, FilingFilter, NewFiling};
use crate::traits::{AuditStore, FilingStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filing_types::{AuditEntry, AuditEntryId, FilingId, FilingRecord, FilingStatus, Metadata};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

/// SQLite-backed storage adapter.
#[derive(Clone)]
pub struct SqliteComplianceStorage {
    pool: SqlitePool,
}

impl SqliteComplianceStorage {
    /// Connect to SQLite and initialize the required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to connect sqlite: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an adapter from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS filings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filing_name TEXT NOT NULL,
                filing_type TEXT NOT NULL,
                version INTEGER NOT NULL,
                status TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                parent_filing_id INTEGER REFERENCES filings(id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filing_id INTEGER NOT NULL,
                action TEXT NOT NULL,
                actor TEXT NOT NULL,
                previous_status TEXT,
                new_status TEXT,
                metadata TEXT,
                timestamp TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_audit_filing ON audit_log(filing_id)",
            "CREATE INDEX IF NOT EXISTS idx_audit_actor ON audit_log(actor)",
        ];

        for statement in ddl {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for SqliteComplianceStorage {
    async fn append(&self, entry: AuditAppend) -> StorageResult<AuditEntry> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let previous: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT timestamp FROM audit_log ORDER BY id DESC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;

        let now = Utc::now();
        let timestamp = match previous {
            Some(last) if last > now => last,
            _ => now,
        };

        let metadata_json = match &entry.metadata {
            Some(map) => Some(
                serde_json::to_string(map)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            ),
            None => None,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO audit_log
                (filing_id, action, actor, previous_status, new_status, metadata, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.filing_id.0)
        .bind(&entry.action)
        .bind(&entry.actor)
        .bind(entry.previous_status.map(|s| s.as_str()))
        .bind(entry.new_status.map(|s| s.as_str()))
        .bind(metadata_json)
        .bind(timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(AuditEntry {
            id: AuditEntryId(result.last_insert_rowid()),
            filing_id: entry.filing_id,
            action: entry.action,
            actor: entry.actor,
            previous_status: entry.previous_status,
            new_status: entry.new_status,
            metadata: entry.metadata,
            timestamp,
        })
    }

    async fn entries_for_filing(&self, filing_id: FilingId) -> StorageResult<Vec<AuditEntry>> {
        let rows = sqlx::query("SELECT * FROM audit_log WHERE filing_id = ? ORDER BY id DESC")
            .bind(filing_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn status_changes(&self, filing_id: FilingId) -> StorageResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM audit_log
            WHERE filing_id = ? AND new_status IS NOT NULL
            ORDER BY id ASC
            "#,
        )
        .bind(filing_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn entries_for_actor(
        &self,
        actor: &str,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_log WHERE actor = ? ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(actor)
        .bind(sql_limit(window))
        .bind(window.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn recent(&self, window: QueryWindow) -> StorageResult<Vec<AuditEntry>> {
        let rows = sqlx::query("SELECT * FROM audit_log ORDER BY id DESC LIMIT ? OFFSET ?")
            .bind(sql_limit(window))
            .bind(window.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        rows.iter().map(audit_from_row).collect()
    }
}

#[async_trait]
impl FilingStore for SqliteComplianceStorage {
    async fn insert_filing(&self, filing: NewFiling) -> StorageResult<FilingRecord> {
        if let Some(parent_id) = filing.parent_filing_id {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM filings WHERE id = ?")
                .bind(parent_id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            if exists.is_none() {
                return Err(StorageError::InvalidInput(format!(
                    "parent filing {} does not exist",
                    parent_id
                )));
            }
        }

        let created_at = Utc::now();
        let content_json = serde_json::to_string(&filing.content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO filings
                (filing_name, filing_type, version, status, content, created_at, created_by, parent_filing_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&filing.filing_name)
        .bind(filing.filing_type.as_str())
        .bind(filing.version as i64)
        .bind(filing.status.as_str())
        .bind(content_json)
        .bind(created_at)
        .bind(&filing.created_by)
        .bind(filing.parent_filing_id.map(|id| id.0))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(FilingRecord {
            id: FilingId(result.last_insert_rowid()),
            filing_name: filing.filing_name,
            filing_type: filing.filing_type,
            version: filing.version,
            status: filing.status,
            content: filing.content,
            created_at,
            created_by: filing.created_by,
            parent_filing_id: filing.parent_filing_id,
        })
    }

    async fn get_filing(&self, id: FilingId) -> StorageResult<Option<FilingRecord>> {
        let row = sqlx::query("SELECT * FROM filings WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        row.as_ref().map(filing_from_row).transpose()
    }

    async fn current_status(&self, id: FilingId) -> StorageResult<Option<FilingStatus>> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM filings WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        parse_status(status)
    }

    async fn set_status(&self, id: FilingId, status: FilingStatus) -> StorageResult<()> {
        let current = self
            .current_status(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("filing {} not found", id)))?;
        // Approved rows are immutable; corrections go through a new version.
        if current == FilingStatus::Approved {
            return Err(StorageError::Conflict(format!(
                "filing {} is approved and immutable",
                id
            )));
        }
        sqlx::query("UPDATE filings SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn list_filings(
        &self,
        filter: FilingFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<FilingRecord>> {
        let mut builder: sqlx::QueryBuilder<'_, sqlx::Sqlite> =
            sqlx::QueryBuilder::new("SELECT * FROM filings WHERE 1=1");
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(filing_type) = filter.filing_type {
            builder
                .push(" AND filing_type = ")
                .push_bind(filing_type.as_str());
        }
        builder
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(sql_limit(window))
            .push(" OFFSET ")
            .push_bind(window.offset as i64);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        rows.iter().map(filing_from_row).collect()
    }

    async fn version_chain(&self, id: FilingId) -> StorageResult<Vec<FilingRecord>> {
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE filing_chain AS (
                SELECT * FROM filings WHERE id = ?
                UNION ALL
                SELECT f.* FROM filings f
                INNER JOIN filing_chain fc ON f.id = fc.parent_filing_id
            )
            SELECT * FROM filing_chain ORDER BY version ASC
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        if rows.is_empty() {
            return Err(StorageError::NotFound(format!("filing {} not found", id)));
        }
        rows.iter().map(filing_from_row).collect()
    }
}

// SQLite treats a negative LIMIT as "no limit"; a zero-limit window means
// the caller wants everything past the offset.
fn sql_limit(window: QueryWindow) -> i64 {
    if window.limit == 0 {
        -1
    } else {
        window.limit as i64
    }
}

fn parse_status(value: Option<String>) -> StorageResult<Option<FilingStatus>> {
    value
        .map(|s| {
            s.parse().map_err(|e: filing_types::UnknownFilingStatus| {
                StorageError::Serialization(e.to_string())
            })
        })
        .transpose()
}

fn audit_from_row(row: &SqliteRow) -> StorageResult<AuditEntry> {
    let metadata: Option<Metadata> = row
        .try_get::<Option<String>, _>("metadata")
        .map_err(|e| StorageError::Backend(e.to_string()))?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    Ok(AuditEntry {
        id: AuditEntryId(
            row.try_get("id")
                .map_err(|e| StorageError::Backend(e.to_string()))?,
        ),
        filing_id: FilingId(
            row.try_get("filing_id")
                .map_err(|e| StorageError::Backend(e.to_string()))?,
        ),
        action: row
            .try_get("action")
            .map_err(|e| StorageError::Backend(e.to_string()))?,
        actor: row
            .try_get("actor")
            .map_err(|e| StorageError::Backend(e.to_string()))?,
        previous_status: parse_status(
            row.try_get("previous_status")
                .map_err(|e| StorageError::Backend(e.to_string()))?,
        )?,
        new_status: parse_status(
            row.try_get("new_status")
                .map_err(|e| StorageError::Backend(e.to_string()))?,
        )?,
        metadata,
        timestamp: row
            .try_get("timestamp")
            .map_err(|e| StorageError::Backend(e.to_string()))?,
    })
}

fn filing_from_row(row: &SqliteRow) -> StorageResult<FilingRecord> {
    let filing_type: String = row
        .try_get("filing_type")
        .map_err(|e| StorageError::Backend(e.to_string()))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| StorageError::Backend(e.to_string()))?;
    let content: String = row
        .try_get("content")
        .map_err(|e| StorageError::Backend(e.to_string()))?;

    Ok(FilingRecord {
        id: FilingId(
            row.try_get("id")
                .map_err(|e| StorageError::Backend(e.to_string()))?,
        ),
        filing_name: row
            .try_get("filing_name")
            .map_err(|e| StorageError::Backend(e.to_string()))?,
        filing_type: filing_type
            .parse()
            .map_err(|e: filing_types::UnknownFilingType| {
                StorageError::Serialization(e.to_string())
            })?,
        version: row
            .try_get::<i64, _>("version")
            .map_err(|e| StorageError::Backend(e.to_string()))? as u32,
        status: status
            .parse()
            .map_err(|e: filing_types::UnknownFilingStatus| {
                StorageError::Serialization(e.to_string())
            })?,
        content: serde_json::from_str(&content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| StorageError::Backend(e.to_string()))?,
        created_by: row
            .try_get("created_by")
            .map_err(|e| StorageError::Backend(e.to_string()))?,
        parent_filing_id: row
            .try_get::<Option<i64>, _>("parent_filing_id")
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .map(FilingId),
    })
}
