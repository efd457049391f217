// crates/bmad-core/src/core/identifiers.rs
// ============================================================================
// Module: BMAD Identifiers
// Description: Canonical opaque identifiers for projects, workflows, agents,
// escalations, decisions, and stories.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every entity that crosses a component boundary is referenced by an opaque,
//! string-backed identifier rather than a bare `String`. This keeps call sites
//! honest about which kind of id they are holding and gives every id a single
//! `Display`/serde representation.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(ProjectId, "Identifies a project root that owns one `.bmad` directory.");
string_id!(WorkflowId, "Identifies a workflow definition (e.g. `prd`, `architecture`).");
string_id!(StepId, "Identifies an instruction step by its declared position.");
string_id!(AgentId, "Identifies a live agent instance held by the agent pool.");
string_id!(EscalationId, "Identifies a pending or resolved escalation (`esc-<ms>-<rand>`).");
string_id!(RequirementId, "Identifies a functional requirement (e.g. `FR-012`).");
string_id!(StoryId, "Identifies a story node inside a dependency graph.");
string_id!(CorrelationId, "Opaque correlation id threaded through audit trails.");

/// Sequential ADR identifier (`ADR-NNN`, 1-based, never reused).
///
/// # Invariants
/// - `0` is never a valid sequence number; the first ADR is `ADR-001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(u32);

impl DecisionId {
    /// Creates an ADR id from a 1-based sequence number.
    #[must_use]
    pub const fn new(seq: u32) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub const fn sequence(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ADR-{:03}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::DecisionId;
    use super::EscalationId;

    #[test]
    fn decision_id_formats_with_padding() {
        assert_eq!(DecisionId::new(1).to_string(), "ADR-001");
        assert_eq!(DecisionId::new(42).to_string(), "ADR-042");
        assert_eq!(DecisionId::new(1000).to_string(), "ADR-1000");
    }

    #[test]
    fn string_id_round_trips_through_display() {
        let id = EscalationId::from("esc-1700000000000-ab12");
        assert_eq!(id.as_str(), "esc-1700000000000-ab12");
        assert_eq!(id.to_string(), "esc-1700000000000-ab12");
    }
}
