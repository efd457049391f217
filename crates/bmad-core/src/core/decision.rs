// crates/bmad-core/src/core/decision.rs
// ============================================================================
// Module: BMAD Decision
// Description: Decision record shape produced by the decision engine.
// Purpose: Give escalation and audit consumers a shared Decision type.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Decision`] is the result of one decision-engine call: either an
//! onboarding-document match (confidence pinned to `0.95`) or an LLM
//! invocation (confidence self-reported and clamped). The engine appends
//! every decision it makes to its own in-memory audit trail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::confidence::Confidence;
use super::time::Timestamp;

// ============================================================================
// SECTION: Source
// ============================================================================

/// Where a decision's answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Matched against a configured onboarding document.
    Onboarding,
    /// Answered by invoking the configured LLM.
    Llm,
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// A single answered question, with enough provenance to audit or escalate it.
///
/// # Invariants
/// - `confidence` is always in `[0.0, 1.0]`.
/// - `source == Onboarding` implies `confidence == Confidence::ONBOARDING`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The question that was asked.
    pub question: String,
    /// The decision text returned to the caller.
    pub decision_text: String,
    /// Confidence in `decision_text`.
    pub confidence: Confidence,
    /// Explanation for the decision; carries the escalation marker when
    /// confidence falls below the caller's threshold.
    pub reasoning: String,
    /// Where the answer came from.
    pub source: DecisionSource,
    /// When the decision was made.
    pub timestamp: Timestamp,
    /// A snapshot of whatever context informed the decision.
    pub context: Value,
}

#[cfg(test)]
mod tests {
    use super::Decision;
    use super::DecisionSource;
    use crate::core::confidence::Confidence;
    use crate::core::time::Timestamp;
    use serde_json::json;

    #[test]
    fn onboarding_decision_pins_confidence() {
        let decision = Decision {
            question: "How do I set up the project?".to_string(),
            decision_text: "Follow setup.md".to_string(),
            confidence: Confidence::ONBOARDING,
            reasoning: "matched setup.md".to_string(),
            source: DecisionSource::Onboarding,
            timestamp: Timestamp::UnixMillis(0),
            context: json!({}),
        };
        assert_eq!(decision.confidence.value(), 0.95);
        assert_eq!(decision.source, DecisionSource::Onboarding);
    }
}
