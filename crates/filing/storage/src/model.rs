use filing_types::{FilingId, FilingStatus, FilingType, Metadata};
use serde::{Deserialize, Serialize};

/// Audit append payload. Entry id and timestamp are assigned by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditAppend {
    pub filing_id: FilingId,
    pub action: String,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<FilingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<FilingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Insert payload for a new filing version. The id is assigned by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFiling {
    pub filing_name: String,
    pub filing_type: FilingType,
    pub status: FilingStatus,
    pub content: serde_json::Value,
    pub created_by: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_filing_id: Option<FilingId>,
}

/// Optional filters for filing listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilingFilter {
    pub status: Option<FilingStatus>,
    pub filing_type: Option<FilingType>,
}
