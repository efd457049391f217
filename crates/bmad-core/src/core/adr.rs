// crates/bmad-core/src/core/adr.rs
// ============================================================================
// Module: BMAD Technical Decision Records
// Description: ADR entity shared between the validators crate's decision
// logger and the CLI.
// Purpose: Define the TechnicalDecision shape and its sequential id discipline.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`TechnicalDecision`] is an architecture decision record. Ids are
//! allocated sequentially starting at 1 and are never reused, even across a
//! save-then-reload cycle: reload restores the allocator to `max(existing) + 1`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use super::identifiers::DecisionId;
use super::identifiers::RequirementId;
use super::time::Timestamp;

// ============================================================================
// SECTION: Status and Authorship
// ============================================================================

/// Lifecycle status of a technical decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Drafted but not yet ratified.
    Proposed,
    /// Ratified and in effect.
    Accepted,
    /// Replaced by a later decision.
    Superseded,
}

impl DecisionStatus {
    /// Returns the lowercase label used in rendered decision tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Superseded => "superseded",
        }
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Who made a technical decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionMaker {
    /// The architect persona.
    Winston,
    /// The lead engineer persona.
    Murat,
    /// The CIS routing agent.
    CisAgent,
    /// A human user.
    User,
}

impl DecisionMaker {
    /// Returns the kebab-case label used in rendered decision tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Winston => "winston",
            Self::Murat => "murat",
            Self::CisAgent => "cis-agent",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for DecisionMaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Alternatives
// ============================================================================

/// One alternative considered and rejected (or accepted) for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    /// Short name of the option.
    pub option: String,
    /// Advantages of this option.
    pub pros: Vec<String>,
    /// Disadvantages of this option.
    pub cons: Vec<String>,
}

// ============================================================================
// SECTION: Technical Decision
// ============================================================================

/// An architecture decision record.
///
/// # Invariants
/// - `id` is allocated sequentially and never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDecision {
    /// Sequential `ADR-NNN` identifier.
    pub id: DecisionId,
    /// Short title.
    pub title: String,
    /// Context motivating the decision.
    pub context: String,
    /// The decision text itself.
    pub decision: String,
    /// Alternatives considered.
    pub alternatives: Vec<Alternative>,
    /// Why this option was chosen over the alternatives.
    pub rationale: String,
    /// Expected consequences, positive and negative.
    pub consequences: Vec<String>,
    /// Current status.
    pub status: DecisionStatus,
    /// Who made the decision.
    pub decision_maker: DecisionMaker,
    /// When the decision was recorded.
    pub date: Timestamp,
    /// Optional confidence, when the decision was machine-assisted.
    pub confidence: Option<f64>,
    /// PRD requirements this decision traces back to.
    pub prd_requirements: Vec<RequirementId>,
}

/// Allocates sequential [`DecisionId`]s, restoring from persisted state.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionIdAllocator {
    next: u32,
}

impl DecisionIdAllocator {
    /// Creates a fresh allocator starting at `ADR-001`.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Restores an allocator from a set of already-persisted decisions, so
    /// the next id is `max(existing) + 1`.
    #[must_use]
    pub fn restore_from<'a>(existing: impl IntoIterator<Item = &'a TechnicalDecision>) -> Self {
        let max_seq = existing.into_iter().map(|d| d.id.sequence()).max().unwrap_or(0);
        Self { next: max_seq + 1 }
    }

    /// Allocates and returns the next id.
    pub fn allocate(&mut self) -> DecisionId {
        let id = DecisionId::new(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::Alternative;
    use super::DecisionIdAllocator;
    use super::DecisionMaker;
    use super::DecisionStatus;
    use super::TechnicalDecision;
    use crate::core::time::Timestamp;

    fn decision(id: super::DecisionId) -> TechnicalDecision {
        TechnicalDecision {
            id,
            title: "Use REST over gRPC".into(),
            context: "external partner integrations".into(),
            decision: "Use REST".into(),
            alternatives: vec![Alternative { option: "gRPC".into(), pros: vec![], cons: vec![] }],
            rationale: "partner tooling".into(),
            consequences: vec![],
            status: DecisionStatus::Accepted,
            decision_maker: DecisionMaker::Winston,
            date: Timestamp::Logical(1),
            confidence: None,
            prd_requirements: vec![],
        }
    }

    #[test]
    fn allocator_starts_at_one() {
        let mut allocator = DecisionIdAllocator::new();
        assert_eq!(allocator.allocate().sequence(), 1);
        assert_eq!(allocator.allocate().sequence(), 2);
    }

    #[test]
    fn restore_resumes_after_max_existing_id() {
        let existing = vec![decision(super::DecisionId::new(1)), decision(super::DecisionId::new(3))];
        let mut allocator = DecisionIdAllocator::restore_from(&existing);
        assert_eq!(allocator.allocate().sequence(), 4);
    }

    proptest::proptest! {
        /// Allocating `n` ids in a row from a fresh allocator always yields a
        /// strictly increasing run starting at 1, regardless of `n`.
        #[test]
        fn sequential_allocation_is_strictly_monotone(n in 1u32..200) {
            let mut allocator = DecisionIdAllocator::new();
            let mut previous = 0u32;
            for _ in 0..n {
                let sequence = allocator.allocate().sequence();
                assert!(sequence > previous);
                previous = sequence;
            }
        }

        /// After save -> clear -> load, the next captured id is always
        /// `max(loaded) + 1`, for any non-empty set of existing sequence numbers.
        #[test]
        fn restore_always_resumes_one_past_the_maximum(sequences in proptest::collection::vec(1u32..5000, 1..30)) {
            let existing: Vec<TechnicalDecision> = sequences.iter().map(|&seq| decision(super::DecisionId::new(seq))).collect();
            let expected_next = sequences.iter().copied().max().unwrap_or(0) + 1;
            let mut allocator = DecisionIdAllocator::restore_from(&existing);
            assert_eq!(allocator.allocate().sequence(), expected_next);
        }
    }
}
