//! Filing lifecycle service.
//!
//! Coordinates the filing repository, the content validator, and the
//! workflow engine for each lifecycle operation. The one rule it never
//! bends: the audit entry for a transition is durably written before the
//! materialized status row is touched. A crash between the two leaves the
//! status one step behind the ledger, and the ledger is the ground truth.
//!
//! Per-filing serialization of transition attempts is the caller's concern;
//! the service re-reads the current status immediately before each attempt
//! but provides no cross-process locking.

use crate::engine::{WorkflowEngine, WorkflowStatusView};
use crate::error::{WorkflowError, WorkflowResult};
use crate::transitions::actions;
use async_trait::async_trait;
use filing_audit::AuditService;
use filing_storage::{ComplianceStorage, FilingFilter, NewFiling, QueryWindow};
use filing_types::{
    AuditEntry, AuditEntryId, FilingId, FilingRecord, FilingStatus, FilingType, Metadata,
    ValidationOutcome, VersionInfo,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// External content validator collaborator.
///
/// Implementations may run rule checks and an optional AI quality pass;
/// the service consumes the verdict as-is. Warnings are advisory and never
/// veto an allowed transition — only `is_valid == false` does.
#[async_trait]
pub trait ContentValidator: Send + Sync {
    async fn validate(&self, filing_type: FilingType, content: &Value) -> ValidationOutcome;
}

/// Request payload for creating a filing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewFilingRequest {
    pub filing_name: String,
    pub filing_type: FilingType,
    pub content: Value,
    pub created_by: String,
}

/// Reviewer's verdict on a filing pending review.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub approved: bool,
    pub reviewer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Outcome of an executed transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub filing_id: FilingId,
    pub new_status: FilingStatus,
    pub audit_entry_id: AuditEntryId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Facade over storage, validation, and the workflow engine.
pub struct FilingService {
    storage: Arc<dyn ComplianceStorage>,
    engine: WorkflowEngine,
    audit: AuditService,
    validator: Option<Arc<dyn ContentValidator>>,
}

impl FilingService {
    pub fn new<S>(storage: Arc<S>) -> Self
    where
        S: ComplianceStorage + 'static,
    {
        let audit = AuditService::new(storage.clone());
        let engine = WorkflowEngine::new(audit.clone());
        Self {
            storage,
            engine,
            audit,
            validator: None,
        }
    }

    /// Attach a content validator consulted before create/submit/revise.
    pub fn with_validator(mut self, validator: Arc<dyn ContentValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn audit(&self) -> &AuditService {
        &self.audit
    }

    /// Create a new filing in `Draft`, with a `created` audit entry.
    pub async fn create_filing(&self, request: NewFilingRequest) -> WorkflowResult<FilingRecord> {
        if request.created_by.trim().is_empty() {
            return Err(WorkflowError::EmptyActor);
        }
        let validation = self
            .check_content(request.filing_type, &request.content)
            .await?;

        let record = self
            .storage
            .insert_filing(NewFiling {
                filing_name: request.filing_name,
                filing_type: request.filing_type,
                status: FilingStatus::Draft,
                content: request.content,
                created_by: request.created_by.clone(),
                version: 1,
                parent_filing_id: None,
            })
            .await?;

        self.audit
            .record(
                record.id,
                actions::CREATED,
                request.created_by,
                None,
                Some(FilingStatus::Draft),
                validation_metadata(&validation),
            )
            .await?;

        tracing::info!(filing_id = %record.id, filing_type = %record.filing_type, "filing created");
        Ok(record)
    }

    /// Submit a draft for review (`Draft -> PendingReview`).
    pub async fn submit_for_review(
        &self,
        filing_id: FilingId,
        actor: &str,
    ) -> WorkflowResult<TransitionOutcome> {
        let filing = self.require_filing(filing_id).await?;
        let validation = self.check_content(filing.filing_type, &filing.content).await?;

        let metadata = if validation.warnings.is_empty() {
            None
        } else {
            let mut metadata = Metadata::new();
            metadata.insert(
                "validation_warnings".to_string(),
                serde_json::json!(validation.warnings),
            );
            Some(metadata)
        };

        // Audit entry first, status row second.
        let entry_id = self
            .engine
            .transition(
                filing_id,
                filing.status,
                FilingStatus::PendingReview,
                actor,
                metadata,
            )
            .await?;
        self.storage
            .set_status(filing_id, FilingStatus::PendingReview)
            .await?;

        Ok(TransitionOutcome {
            filing_id,
            new_status: FilingStatus::PendingReview,
            audit_entry_id: entry_id,
            warnings: validation.warnings,
        })
    }

    /// Approve or reject a filing pending review.
    pub async fn review(
        &self,
        filing_id: FilingId,
        decision: ReviewDecision,
    ) -> WorkflowResult<TransitionOutcome> {
        let filing = self.require_filing(filing_id).await?;
        let target = if decision.approved {
            FilingStatus::Approved
        } else {
            FilingStatus::Rejected
        };

        let mut metadata = Metadata::new();
        if let Some(comments) = &decision.comments {
            metadata.insert("comments".to_string(), serde_json::json!(comments));
        }
        metadata.insert("approved".to_string(), serde_json::json!(decision.approved));

        // Audit entry first, status row second.
        let entry_id = self
            .engine
            .transition(
                filing_id,
                filing.status,
                target,
                &decision.reviewer,
                Some(metadata),
            )
            .await?;
        self.storage.set_status(filing_id, target).await?;

        Ok(TransitionOutcome {
            filing_id,
            new_status: target,
            audit_entry_id: entry_id,
            warnings: Vec::new(),
        })
    }

    /// Create a new draft version of a filing, referencing its parent.
    pub async fn revise(
        &self,
        filing_id: FilingId,
        content: Value,
        updated_by: &str,
    ) -> WorkflowResult<FilingRecord> {
        if updated_by.trim().is_empty() {
            return Err(WorkflowError::EmptyActor);
        }
        let parent = self.require_filing(filing_id).await?;
        self.check_content(parent.filing_type, &content).await?;

        let record = self
            .storage
            .insert_filing(NewFiling {
                filing_name: parent.filing_name,
                filing_type: parent.filing_type,
                status: FilingStatus::Draft,
                content,
                created_by: updated_by.to_string(),
                version: parent.version + 1,
                parent_filing_id: Some(parent.id),
            })
            .await?;

        let mut metadata = Metadata::new();
        metadata.insert(
            "parent_filing_id".to_string(),
            serde_json::json!(parent.id.0),
        );
        metadata.insert("version".to_string(), serde_json::json!(record.version));

        self.audit
            .record(
                record.id,
                actions::REVISED,
                updated_by,
                None,
                Some(FilingStatus::Draft),
                Some(metadata),
            )
            .await?;

        tracing::info!(
            filing_id = %record.id,
            parent_filing_id = %parent.id,
            version = record.version,
            "filing revision created"
        );
        Ok(record)
    }

    pub async fn get_filing(&self, filing_id: FilingId) -> WorkflowResult<FilingRecord> {
        self.require_filing(filing_id).await
    }

    pub async fn list_filings(
        &self,
        filter: FilingFilter,
        limit: usize,
    ) -> WorkflowResult<Vec<FilingRecord>> {
        Ok(self
            .storage
            .list_filings(filter, QueryWindow::limit(limit))
            .await?)
    }

    /// Complete audit trail for a filing, newest first.
    pub async fn filing_history(&self, filing_id: FilingId) -> WorkflowResult<Vec<AuditEntry>> {
        self.require_filing(filing_id).await?;
        Ok(self.audit.filing_history(filing_id).await?)
    }

    /// Current workflow position, computed from the stored status.
    pub async fn workflow_status(&self, filing_id: FilingId) -> WorkflowResult<WorkflowStatusView> {
        let filing = self.require_filing(filing_id).await?;
        self.engine.workflow_status(filing_id, filing.status).await
    }

    /// Version lineage of a filing, oldest first.
    pub async fn version_history(&self, filing_id: FilingId) -> WorkflowResult<Vec<VersionInfo>> {
        self.require_filing(filing_id).await?;
        let chain = self.storage.version_chain(filing_id).await?;
        Ok(chain.iter().map(VersionInfo::from).collect())
    }

    async fn require_filing(&self, filing_id: FilingId) -> WorkflowResult<FilingRecord> {
        self.storage
            .get_filing(filing_id)
            .await?
            .ok_or(WorkflowError::FilingNotFound(filing_id))
    }

    async fn check_content(
        &self,
        filing_type: FilingType,
        content: &Value,
    ) -> WorkflowResult<ValidationOutcome> {
        let Some(validator) = &self.validator else {
            return Ok(ValidationOutcome::valid());
        };
        let outcome = validator.validate(filing_type, content).await;
        if !outcome.is_valid {
            return Err(WorkflowError::ValidationFailed {
                missing_fields: outcome.missing_fields,
            });
        }
        Ok(outcome)
    }
}

fn validation_metadata(outcome: &ValidationOutcome) -> Option<Metadata> {
    if outcome.warnings.is_empty() && outcome.suggestion.is_none() {
        return None;
    }
    let mut metadata = Metadata::new();
    metadata.insert(
        "warnings".to_string(),
        serde_json::json!(outcome.warnings),
    );
    if let Some(suggestion) = &outcome.suggestion {
        metadata.insert("suggestion".to_string(), serde_json::json!(suggestion));
    }
    Some(metadata)
}
