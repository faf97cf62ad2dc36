//! The workflow engine: validates and executes status transitions.
//!
//! The engine never touches the materialized filing row. It decides whether
//! a transition is legal, writes the audit entry for it, and hands the
//! status update back to the caller — strictly in that order, so a crash
//! can leave the status one step behind the ledger but never the reverse.

use crate::error::{WorkflowError, WorkflowResult};
use crate::transitions::{actions, TransitionTable};
use filing_audit::AuditService;
use filing_types::{AuditEntryId, FilingId, FilingStatus, Metadata};
use serde::{Deserialize, Serialize};

/// State machine for the filing approval workflow.
pub struct WorkflowEngine {
    table: TransitionTable,
    audit: AuditService,
}

impl WorkflowEngine {
    /// Engine over the standard transition table.
    pub fn new(audit: AuditService) -> Self {
        Self::with_table(TransitionTable::standard(), audit)
    }

    /// Engine over a custom (already validated) table.
    pub fn with_table(table: TransitionTable, audit: AuditService) -> Self {
        Self { table, audit }
    }

    /// Whether `current -> target` is a legal transition. Pure and total;
    /// never fails.
    pub fn can_transition(&self, current: FilingStatus, target: FilingStatus) -> bool {
        self.table.contains(current, target)
    }

    /// Allowed targets from `current`. Empty slice signals a terminal state.
    pub fn allowed_transitions(&self, current: FilingStatus) -> &[FilingStatus] {
        self.table.allowed(current)
    }

    /// Execute a transition: validate it, then write exactly one audit
    /// entry and return its id.
    ///
    /// The caller persists the new materialized status *after* this call
    /// returns successfully. An invalid pair writes nothing.
    pub async fn transition(
        &self,
        filing_id: FilingId,
        current: FilingStatus,
        target: FilingStatus,
        actor: &str,
        metadata: Option<Metadata>,
    ) -> WorkflowResult<AuditEntryId> {
        if actor.trim().is_empty() {
            return Err(WorkflowError::EmptyActor);
        }
        if !self.can_transition(current, target) {
            return Err(WorkflowError::InvalidTransition {
                current,
                target,
                allowed: self.allowed_transitions(current).to_vec(),
            });
        }

        let action = self.table.action_name(current, target);
        let entry_id = self
            .audit
            .record(
                filing_id,
                action.clone(),
                actor,
                Some(current),
                Some(target),
                metadata,
            )
            .await?;

        tracing::info!(
            filing_id = %filing_id,
            action = %action,
            from = %current,
            to = %target,
            actor = %actor,
            "filing transition executed"
        );
        Ok(entry_id)
    }

    /// Current workflow position and available actions for a filing.
    pub async fn workflow_status(
        &self,
        filing_id: FilingId,
        current: FilingStatus,
    ) -> WorkflowResult<WorkflowStatusView> {
        let history = self.audit.filing_history(filing_id).await?;
        let approval_count = history
            .iter()
            .filter(|e| e.action == actions::APPROVED)
            .count();
        let allowed = self.allowed_transitions(current).to_vec();

        Ok(WorkflowStatusView {
            filing_id,
            current_status: current,
            is_terminal: allowed.is_empty(),
            allowed_transitions: allowed,
            requires_approval: current == FilingStatus::PendingReview,
            approval_count,
        })
    }

    /// Verify that a filing's audit history is consistent with the
    /// expected workflow shape.
    ///
    /// This is a separate pass over the ledger, decoupled from the
    /// transition path, so it also catches histories produced by writing
    /// around the engine. It reports findings and never blocks new
    /// transitions.
    pub async fn validate_approval_flow(
        &self,
        filing_id: FilingId,
        required_approvers: Option<&[String]>,
    ) -> WorkflowResult<ApprovalFlowReport> {
        let history = self.audit.filing_history(filing_id).await?;

        if history.is_empty() {
            return Ok(ApprovalFlowReport::invalid("No audit trail found"));
        }

        let status_changes: Vec<_> = history.iter().filter(|e| e.is_status_change()).collect();

        let mut states_visited = Vec::new();
        for entry in &status_changes {
            if let Some(status) = entry.new_status {
                if !states_visited.contains(&status) {
                    states_visited.push(status);
                }
            }
        }

        // History is newest first, so the first status change is current.
        let current_status = status_changes.first().and_then(|e| e.new_status);

        let mut report = ApprovalFlowReport {
            valid: true,
            reason: None,
            states_visited,
            total_transitions: status_changes.len(),
            current_status,
            missing_approvers: Vec::new(),
        };

        // An approved filing with no recorded pending-review state means the
        // history was tampered with or the engine was bypassed.
        if current_status == Some(FilingStatus::Approved)
            && !report.states_visited.contains(&FilingStatus::PendingReview)
        {
            report.valid = false;
            report.reason = Some("Approved filing missing PendingReview state".to_string());
            return Ok(report);
        }

        if let Some(required) = required_approvers {
            let approvers: Vec<&str> = history
                .iter()
                .filter(|e| e.action == actions::APPROVED)
                .map(|e| e.actor.as_str())
                .collect();
            report.missing_approvers = required
                .iter()
                .filter(|candidate| !approvers.contains(&candidate.as_str()))
                .cloned()
                .collect();
            if !report.missing_approvers.is_empty() {
                report.valid = false;
                report.reason = Some("Required approvers missing".to_string());
            }
        }

        Ok(report)
    }
}

/// Derived projection of a filing's workflow position. Computed on demand,
/// never cached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowStatusView {
    pub filing_id: FilingId,
    pub current_status: FilingStatus,
    pub allowed_transitions: Vec<FilingStatus>,
    pub is_terminal: bool,
    pub requires_approval: bool,
    pub approval_count: usize,
}

/// Result of the approval-flow integrity check.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalFlowReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub states_visited: Vec<FilingStatus>,
    pub total_transitions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<FilingStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_approvers: Vec<String>,
}

impl ApprovalFlowReport {
    fn invalid(reason: &str) -> Self {
        ApprovalFlowReport {
            valid: false,
            reason: Some(reason.to_string()),
            states_visited: Vec::new(),
            total_transitions: 0,
            current_status: None,
            missing_approvers: Vec::new(),
        }
    }

    /// Escalate a failed report into a hard error for callers that treat
    /// integrity findings as fatal.
    pub fn ensure(&self) -> WorkflowResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(WorkflowError::IntegrityViolation(
                self.reason
                    .clone()
                    .unwrap_or_else(|| "approval flow invalid".to_string()),
            ))
        }
    }
}
