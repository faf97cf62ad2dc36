//! Filing statuses and form types.
//!
//! `FilingStatus` is the closed vocabulary of the approval state machine.
//! Statuses compare by identity only; there is no derived ordering, because
//! "approved" is not "greater than" "draft" in any meaningful sense.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Workflow state of a filing.
///
/// `Approved` is terminal: an approved filing is immutable and a new
/// version must be created instead. `Rejected` is recoverable via revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Draft,
    PendingReview,
    Approved,
    Rejected,
}

impl FilingStatus {
    /// Every member of the enumeration, in declaration order.
    pub const ALL: [FilingStatus; 4] = [
        FilingStatus::Draft,
        FilingStatus::PendingReview,
        FilingStatus::Approved,
        FilingStatus::Rejected,
    ];

    /// Canonical wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Draft => "draft",
            FilingStatus::PendingReview => "pending_review",
            FilingStatus::Approved => "approved",
            FilingStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when decoding a status string that is not part of the enumeration.
#[derive(Debug, Error)]
#[error("unknown filing status: {0}")]
pub struct UnknownFilingStatus(pub String);

impl FromStr for FilingStatus {
    type Err = UnknownFilingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(FilingStatus::Draft),
            "pending_review" => Ok(FilingStatus::PendingReview),
            "approved" => Ok(FilingStatus::Approved),
            "rejected" => Ok(FilingStatus::Rejected),
            other => Err(UnknownFilingStatus(other.to_string())),
        }
    }
}

/// SEC filing form types for ETFs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingType {
    #[serde(rename = "N-PORT")]
    NPort,
    #[serde(rename = "N-CEN")]
    NCen,
    #[serde(rename = "485BPOS")]
    Form485Bpos,
    #[serde(rename = "497")]
    Form497,
    #[serde(rename = "N-SAR")]
    FormNsar,
}

impl FilingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingType::NPort => "N-PORT",
            FilingType::NCen => "N-CEN",
            FilingType::Form485Bpos => "485BPOS",
            FilingType::Form497 => "497",
            FilingType::FormNsar => "N-SAR",
        }
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when decoding a form type string that is not recognized.
#[derive(Debug, Error)]
#[error("unknown filing type: {0}")]
pub struct UnknownFilingType(pub String);

impl FromStr for FilingType {
    type Err = UnknownFilingType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N-PORT" => Ok(FilingType::NPort),
            "N-CEN" => Ok(FilingType::NCen),
            "485BPOS" => Ok(FilingType::Form485Bpos),
            "497" => Ok(FilingType::Form497),
            "N-SAR" => Ok(FilingType::FormNsar),
            other => Err(UnknownFilingType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in FilingStatus::ALL {
            let parsed: FilingStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&FilingStatus::PendingReview).unwrap();
        assert_eq!(json, "\"pending_review\"");
        let back: FilingStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FilingStatus::PendingReview);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = "published".parse::<FilingStatus>();
        assert!(result.is_err());
    }

    #[test]
    fn filing_type_uses_sec_form_names() {
        assert_eq!(FilingType::NPort.as_str(), "N-PORT");
        assert_eq!(
            serde_json::to_string(&FilingType::Form485Bpos).unwrap(),
            "\"485BPOS\""
        );
        let parsed: FilingType = "N-SAR".parse().unwrap();
        assert_eq!(parsed, FilingType::FormNsar);
    }
}
