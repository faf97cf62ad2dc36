//! Audit trail records.
//!
//! An [`AuditEntry`] is written once and never updated or deleted. Every
//! workflow transition produces exactly one entry; non-transition actions
//! (filing creation, revision) produce entries with no `previous_status`.

use crate::{FilingId, FilingStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of an audit entry.
///
/// Assignment is monotonic within a store, so ids double as a stable
/// ordering key alongside timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditEntryId(pub i64);

impl fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, order-preserving key/value payload attached to an entry.
///
/// The audit layer stores and returns this verbatim and never interprets
/// its contents.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One immutable record of an action taken on a filing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub filing_id: FilingId,
    /// Short symbolic label, e.g. `submitted_for_review` or `created`.
    pub action: String,
    /// Caller-supplied identity. Never validated at this layer.
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<FilingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<FilingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Assigned at write time; non-decreasing within a filing's sequence.
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Whether this entry landed the filing in some status. Creation and
    /// revision entries count (they set `new_status` with no prior status);
    /// purely informational entries do not.
    pub fn is_status_change(&self) -> bool {
        self.new_status.is_some()
    }
}
