// crates/bmad-core/src/core/confidence.rs
// ============================================================================
// Module: BMAD Confidence
// Description: Bounded confidence scores and their provenance.
// Purpose: Give decisions and validators a single, clamped confidence type.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Confidence`] is always in `[0.0, 1.0]`; it is never constructed with an
//! out-of-range value, it is clamped on the way in. Components that gate on
//! confidence (the decision engine, validators) compare against their own
//! configured threshold rather than a single global constant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Confidence
// ============================================================================

/// Literal marker a caller can scan for in reasoning text to detect an
/// escalation-worthy decision without re-deriving the threshold comparison.
pub const ESCALATION_REQUIRED_MARKER: &str = "ESCALATION REQUIRED";

/// A confidence score clamped to `[0.0, 1.0]`.
///
/// # Invariants
/// - `value()` always returns a finite number in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// Confidence pinned for onboarding-document matches.
    pub const ONBOARDING: Self = Self(0.95);

    /// Clamps `value` into `[0.0, 1.0]`. Non-finite input clamps to `0.0`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    /// Returns the raw clamped value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns whether this confidence is below `threshold`, the condition
    /// under which a caller should enqueue an escalation.
    #[must_use]
    pub fn below(self, threshold: ConfidenceThreshold) -> bool {
        self.0 < threshold.value()
    }
}

/// A named, per-component confidence gate.
///
/// Different components gate at different levels (§9 open question): the
/// decision engine's escalation threshold defaults to `0.75`, while several
/// validator pass/regenerate checks use `0.85`. Each caller constructs its
/// own threshold rather than comparing against a shared constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceThreshold(f64);

impl ConfidenceThreshold {
    /// Default escalation threshold used by the decision engine.
    pub const DECISION_ESCALATION: Self = Self(0.75);

    /// Default pass/regenerate gate used by document validators.
    pub const VALIDATOR_GATE: Self = Self(0.85);

    /// Creates a threshold clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    /// Returns the raw threshold value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Formats the standard escalation marker for reasoning text.
#[must_use]
pub fn escalation_marker(threshold: ConfidenceThreshold) -> String {
    format!("{ESCALATION_REQUIRED_MARKER} (threshold: {:.2})", threshold.value())
}

#[cfg(test)]
mod tests {
    use super::Confidence;
    use super::ConfidenceThreshold;
    use super::escalation_marker;

    #[test]
    fn confidence_clamps_out_of_range_values() {
        assert_eq!(Confidence::new(1.5).value(), 1.0);
        assert_eq!(Confidence::new(-0.5).value(), 0.0);
        assert_eq!(Confidence::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn below_threshold_detects_low_confidence() {
        let c = Confidence::new(0.6);
        assert!(c.below(ConfidenceThreshold::DECISION_ESCALATION));
        assert!(!c.below(ConfidenceThreshold::new(0.5)));
    }

    #[test]
    fn escalation_marker_contains_literal_marker_text() {
        let marker = escalation_marker(ConfidenceThreshold::DECISION_ESCALATION);
        assert!(marker.contains("ESCALATION REQUIRED"));
        assert!(marker.contains("0.75"));
    }
}
