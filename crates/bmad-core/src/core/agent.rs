// crates/bmad-core/src/core/agent.rs
// ============================================================================
// Module: BMAD Agent
// Description: Agent lifecycle state and context shared across the pool and callers.
// Purpose: Define the Agent/AgentContext shapes without owning pool scheduling.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The agent pool crate owns scheduling and concurrency; this module defines
//! the data shapes (`Agent`, `AgentContext`, `AgentLifecycle`) so that pool,
//! decision engine, and CLI crates can share one vocabulary without a
//! circular dependency on the pool itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::identifiers::AgentId;
use super::time::Timestamp;
use super::workflow::WorkflowState;

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Lifecycle state of a single agent instance.
///
/// # Invariants
/// - Transitions only follow `Started -> Invoked -> (Completed | Failed)`,
///   with `Invoked` re-entrant on a successful retry after `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentLifecycle {
    /// Admitted into the pool; not yet invoked.
    Started,
    /// At least one invocation has been issued.
    Invoked,
    /// Destroyed after successful use.
    Completed,
    /// Destroyed as part of a pool shutdown or explicit cancellation.
    Cancelled,
    /// The most recent invocation failed; the agent remains retrievable.
    Failed,
}

impl AgentLifecycle {
    /// Returns whether `next` is a legal transition from `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Started, Self::Invoked)
                | (Self::Invoked, Self::Invoked)
                | (Self::Invoked, Self::Completed)
                | (Self::Invoked, Self::Failed)
                | (Self::Failed, Self::Invoked)
                | (Self::Started | Self::Invoked | Self::Failed, Self::Cancelled)
        )
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Immutable context handed to an agent for the lifetime of its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    /// Paths or identifiers of onboarding documents visible to this agent.
    pub onboarding_docs: Vec<String>,
    /// Snapshot of the owning workflow's state at agent creation time.
    pub workflow_state: WorkflowState,
    /// Human-readable description of the task this agent is performing.
    pub task_description: String,
    /// Arbitrary caller-supplied overlay values, merged over defaults by
    /// callers that build prompts from this context.
    pub overlay: BTreeMap<String, Value>,
}

// ============================================================================
// SECTION: Agent
// ============================================================================

/// A running or recently-completed agent instance.
///
/// # Invariants
/// - `estimated_cost` is monotonically non-decreasing over the agent's life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique id assigned by the pool.
    pub id: AgentId,
    /// Persona name (e.g. `"mary"`, `"winston"`).
    pub name: String,
    /// Full persona prompt text.
    pub persona: String,
    /// Context this agent was created with.
    pub context: AgentContext,
    /// Accumulated cost in the provider's billing currency units.
    pub estimated_cost: f64,
    /// Current lifecycle state.
    pub lifecycle: AgentLifecycle,
    /// Timestamp of the agent's most recent admission or invocation.
    pub last_active: Timestamp,
}

impl Agent {
    /// Adds `cost` to the accumulator, rejecting negative deltas.
    pub fn accrue_cost(&mut self, cost: f64) {
        if cost.is_finite() && cost > 0.0 {
            self.estimated_cost += cost;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AgentLifecycle;

    #[test]
    fn started_may_only_advance_to_invoked_or_cancelled() {
        assert!(AgentLifecycle::Started.can_transition_to(AgentLifecycle::Invoked));
        assert!(AgentLifecycle::Started.can_transition_to(AgentLifecycle::Cancelled));
        assert!(!AgentLifecycle::Started.can_transition_to(AgentLifecycle::Completed));
    }

    #[test]
    fn failed_may_retry_back_into_invoked() {
        assert!(AgentLifecycle::Failed.can_transition_to(AgentLifecycle::Invoked));
        assert!(!AgentLifecycle::Completed.can_transition_to(AgentLifecycle::Invoked));
    }
}
