// crates/bmad-core/src/core/workflow.rs
// ============================================================================
// Module: BMAD Workflow State
// Description: Shared workflow state and status types persisted by the state store.
// Purpose: Give the workflow engine, template processor, and CLI a single
// workflow state shape to read and write.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`WorkflowState`] is the one piece of durable per-project state every
//! other component reads: the template processor's variable resolver reads
//! it at priority tier two, the workflow engine owns writing it, and the
//! state store persists it atomically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::identifiers::ProjectId;
use super::identifiers::WorkflowId;
use super::time::Timestamp;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Lifecycle status of a workflow run.
///
/// # Invariants
/// - Transitions only flow `running -> {paused, completed, failed}` or
///   `paused -> running`; `completed` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Steps are actively being executed.
    Running,
    /// Execution suspended awaiting an `ask`/`elicit-required` response or an escalation.
    Paused,
    /// All steps processed successfully.
    Completed,
    /// A step failed; the last good state remains on disk.
    Failed,
}

impl WorkflowStatus {
    /// Returns whether this status is terminal (no further steps will run).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the lowercase label used in persisted logs and CLI output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Workflow State
// ============================================================================

/// Durable per-project workflow execution state.
///
/// # Invariants
/// - `current_step <= total known steps` for the owning workflow definition.
/// - When `status == Completed`, `current_step` equals the last step's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Project this run belongs to.
    pub project_id: ProjectId,
    /// Workflow definition driving this run.
    pub workflow_id: WorkflowId,
    /// Current lifecycle status.
    pub status: WorkflowStatus,
    /// 1-based position of the last step processed; `0` before any step runs.
    pub current_step: u32,
    /// Accumulated variables visible to guard expressions and templates.
    pub variables: BTreeMap<String, Value>,
    /// Time the run was first created.
    pub started_at: Timestamp,
    /// Time of the most recent persisted update.
    pub updated_at: Timestamp,
}

impl WorkflowState {
    /// Creates a fresh, unstarted workflow state.
    #[must_use]
    pub fn new(project_id: ProjectId, workflow_id: WorkflowId, started_at: Timestamp) -> Self {
        Self {
            project_id,
            workflow_id,
            status: WorkflowStatus::Running,
            current_step: 0,
            variables: BTreeMap::new(),
            started_at,
            updated_at: started_at,
        }
    }

    /// Returns whether a resume starting at `current_step + 1` has any work left,
    /// given a workflow with `total_steps` steps.
    #[must_use]
    pub const fn has_remaining_steps(&self, total_steps: u32) -> bool {
        self.current_step < total_steps
    }
}

#[cfg(test)]
mod tests {
    use super::WorkflowState;
    use super::WorkflowStatus;
    use crate::core::identifiers::ProjectId;
    use crate::core::identifiers::WorkflowId;
    use crate::core::time::Timestamp;

    #[test]
    fn new_state_starts_at_step_zero_and_running() {
        let state = WorkflowState::new(
            ProjectId::from("proj-1"),
            WorkflowId::from("prd"),
            Timestamp::Logical(1),
        );
        assert_eq!(state.current_step, 0);
        assert_eq!(state.status, WorkflowStatus::Running);
        assert!(state.has_remaining_steps(3));
    }

    #[test]
    fn completed_status_is_terminal() {
        assert!(WorkflowStatus::Completed.is_terminal());
        assert!(WorkflowStatus::Failed.is_terminal());
        assert!(!WorkflowStatus::Running.is_terminal());
        assert!(!WorkflowStatus::Paused.is_terminal());
    }
}
