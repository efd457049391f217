// crates/bmad-events/src/event.rs
// ============================================================================
// Module: BMAD Event Kinds
// Description: Typed events emitted by the agent pool and the CIS router.
// Purpose: Replace string-keyed listeners with a small tagged union every
// sink can serialize and every caller can match exhaustively.
// Dependencies: bmad-core, serde
// ============================================================================

//! ## Overview
//! Every event the agent pool or CIS router emits is one variant of
//! [`EventKind`]. There is no dynamic registration by event name; a sink
//! either cares about a variant or ignores it in its match arm.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bmad_core::AgentId;
use bmad_core::Confidence;
use bmad_core::EscalationId;
use bmad_core::Timestamp;
use bmad_core::WorkflowId;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Agent Events
// ============================================================================

/// Lifecycle events emitted by the agent pool.
///
/// # Invariants
/// - For a single `agent_id`, events are observed in the order
///   `Started -> Invoked -> (Completed | Cancelled | Failed)`, with `Invoked`
///   re-entrant on retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// An agent was admitted into the pool.
    Started {
        /// The agent that started.
        agent_id: AgentId,
        /// Persona name.
        name: String,
        /// When the event occurred.
        at: Timestamp,
    },
    /// An agent was invoked.
    Invoked {
        /// The agent that was invoked.
        agent_id: AgentId,
        /// When the event occurred.
        at: Timestamp,
    },
    /// An agent completed successfully and was destroyed.
    Completed {
        /// The agent that completed.
        agent_id: AgentId,
        /// Total accumulated cost at completion.
        total_cost: f64,
        /// When the event occurred.
        at: Timestamp,
    },
    /// An agent was cancelled (pool shutdown or explicit cancellation).
    Cancelled {
        /// The agent that was cancelled.
        agent_id: AgentId,
        /// When the event occurred.
        at: Timestamp,
    },
    /// An agent's invocation failed.
    Failed {
        /// The agent that failed.
        agent_id: AgentId,
        /// The failure reason.
        reason: String,
        /// When the event occurred.
        at: Timestamp,
    },
}

// ============================================================================
// SECTION: Escalation Queue Events
// ============================================================================

/// Events emitted by the escalation queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscalationEvent {
    /// A new escalation was raised and is awaiting a response.
    Raised {
        /// The raised escalation's id.
        id: EscalationId,
        /// The workflow that raised it.
        workflow_id: WorkflowId,
        /// The question posed to the human.
        question: String,
        /// The confidence score that triggered the escalation.
        confidence: Confidence,
        /// When the event occurred.
        at: Timestamp,
    },
}

// ============================================================================
// SECTION: CIS Router Events
// ============================================================================

/// Events emitted by the CIS agent router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CisEvent {
    /// A routed decision succeeded.
    Success {
        /// The persona agent that handled the decision.
        agent: String,
        /// The decision's question text.
        decision: String,
        /// The invocation count so far this workflow, after this call.
        count: u32,
    },
    /// A routed decision failed.
    Error {
        /// The persona agent that was attempted.
        agent: String,
        /// The decision's question text.
        decision: String,
        /// The error message.
        error: String,
    },
    /// A routed decision was rejected because the per-workflow cap was reached.
    LimitExceeded {
        /// The decision's question text.
        decision: String,
        /// The invocation count at rejection time.
        count: u32,
        /// The configured cap.
        limit: u32,
    },
}

// ============================================================================
// SECTION: Event Kind
// ============================================================================

/// The union of every event BMAD emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EventKind {
    /// An agent pool lifecycle event.
    Agent(AgentEvent),
    /// A CIS router event.
    Cis(CisEvent),
    /// An escalation queue event.
    Escalation(EscalationEvent),
}
