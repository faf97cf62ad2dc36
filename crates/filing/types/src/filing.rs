//! Materialized filing records and version lineage.

use crate::{FilingStatus, FilingType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a filing version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilingId(pub i64);

impl fmt::Display for FilingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The current materialized state of one filing version.
///
/// Each revision is a fresh record referencing its parent through
/// `parent_filing_id`; approved versions are never edited in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilingRecord {
    pub id: FilingId,
    pub filing_name: String,
    pub filing_type: FilingType,
    pub version: u32,
    pub status: FilingStatus,
    /// Structured filing content. Opaque to the workflow core.
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_filing_id: Option<FilingId>,
}

/// One element of a filing's version lineage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionInfo {
    pub filing_id: FilingId,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_filing_id: Option<FilingId>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub status: FilingStatus,
}

impl From<&FilingRecord> for VersionInfo {
    fn from(record: &FilingRecord) -> Self {
        VersionInfo {
            filing_id: record.id,
            version: record.version,
            parent_filing_id: record.parent_filing_id,
            created_at: record.created_at,
            created_by: record.created_by.clone(),
            status: record.status,
        }
    }
}
