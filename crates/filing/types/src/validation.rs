//! Content validation verdicts.
//!
//! Validation itself (rule checks, optional AI quality pass) happens in an
//! external collaborator. The workflow core only consumes the verdict: a
//! hard pass/fail plus advisory warnings that travel into audit metadata.

use serde::{Deserialize, Serialize};

/// Structured verdict from a content validator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    /// Required fields absent from the content payload.
    #[serde(default)]
    pub missing_fields: Vec<String>,
    /// Advisory findings. Never fatal to a transition decision.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Optional free-form improvement suggestion (e.g. from an AI pass).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationOutcome {
    /// A passing verdict with no findings.
    pub fn valid() -> Self {
        ValidationOutcome {
            is_valid: true,
            ..ValidationOutcome::default()
        }
    }
}
