// crates/bmad-core/src/core/escalation.rs
// ============================================================================
// Module: BMAD Escalation
// Description: Escalation record shape shared between the decision engine,
// escalation queue, and CLI.
// Purpose: Define the Escalation entity independent of its storage backend.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The escalation queue crate owns persistence; this module defines the
//! record shape so callers can construct and inspect escalations without
//! depending on the storage crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::confidence::Confidence;
use super::identifiers::EscalationId;
use super::identifiers::WorkflowId;
use super::time::Timestamp;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Resolution status of an escalation.
///
/// # Invariants
/// - Transitions are monotone: `Pending -> (Resolved | Cancelled)`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    /// Awaiting a human response.
    Pending,
    /// A response has been recorded.
    Resolved,
    /// Withdrawn without a response.
    Cancelled,
}

impl EscalationStatus {
    /// Returns the lowercase label used in persisted logs and CLI output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Response
// ============================================================================

/// A human's answer to an escalated question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationResponse {
    /// The decision the human made.
    pub decision: String,
    /// Free-text rationale accompanying the decision.
    pub rationale: String,
}

// ============================================================================
// SECTION: Escalation
// ============================================================================

/// A durable record of a question the decision engine could not answer with
/// sufficient confidence.
///
/// # Invariants
/// - `resolved_at` and `response` are set if and only if `status == Resolved`.
/// - When resolved, `resolution_time_ms == resolved_at - created_at` (in the
///   timestamp's own unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    /// Identifier in `esc-<unix-ms>-<rand>` form.
    pub id: EscalationId,
    /// Workflow this escalation was raised from.
    pub workflow_id: WorkflowId,
    /// 1-based step position that triggered the escalation.
    pub step: u32,
    /// The question posed to the human.
    pub question: String,
    /// The AI's reasoning for why it could not decide autonomously.
    pub ai_reasoning: String,
    /// The confidence that fell below threshold.
    pub confidence: Confidence,
    /// Arbitrary context snapshot captured at escalation time.
    pub context: Value,
    /// Current status.
    pub status: EscalationStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Resolution time, set only when resolved.
    pub resolved_at: Option<Timestamp>,
    /// The human's response, set only when resolved.
    pub response: Option<EscalationResponse>,
    /// Milliseconds between creation and resolution, set only when resolved.
    pub resolution_time_ms: Option<i64>,
}

impl Escalation {
    /// Creates a new pending escalation.
    #[must_use]
    pub fn new(
        id: EscalationId,
        workflow_id: WorkflowId,
        step: u32,
        question: impl Into<String>,
        ai_reasoning: impl Into<String>,
        confidence: Confidence,
        context: Value,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            workflow_id,
            step,
            question: question.into(),
            ai_reasoning: ai_reasoning.into(),
            confidence,
            context,
            status: EscalationStatus::Pending,
            created_at,
            resolved_at: None,
            response: None,
            resolution_time_ms: None,
        }
    }

    /// Returns whether this escalation can still be responded to.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, EscalationStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::Escalation;
    use super::EscalationStatus;
    use crate::core::confidence::Confidence;
    use crate::core::identifiers::EscalationId;
    use crate::core::identifiers::WorkflowId;
    use crate::core::time::Timestamp;
    use serde_json::json;

    #[test]
    fn new_escalation_is_pending_with_no_resolution_fields() {
        let esc = Escalation::new(
            EscalationId::from("esc-1-a"),
            WorkflowId::from("prd"),
            3,
            "Use microservices?",
            "ambiguous requirement",
            Confidence::new(0.69),
            json!({}),
            Timestamp::UnixMillis(1_000),
        );
        assert_eq!(esc.status, EscalationStatus::Pending);
        assert!(esc.is_pending());
        assert!(esc.resolved_at.is_none());
        assert!(esc.response.is_none());
    }
}
