// crates/bmad-core/src/core/validation.rs
// ============================================================================
// Module: BMAD Validation Report
// Description: Scored, per-dimension validation output shared by all validators.
// Purpose: Give every validator one report shape regardless of gate threshold.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each validator (architecture, PRD, security gate) produces a
//! [`ValidationReport`] with one [`DimensionScore`] per analysis dimension.
//! The report itself does not know its gate threshold; callers compare
//! `overall_score` against the threshold appropriate to that validator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use super::time::Timestamp;

// ============================================================================
// SECTION: Findings
// ============================================================================

/// One issue, gap, or recommendation surfaced for a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Short machine-stable category tag (e.g. `"missing-section"`).
    pub category: String,
    /// Human-readable description.
    pub message: String,
}

/// A single analysis dimension's score and findings.
///
/// # Invariants
/// - `score` is always in `[0.0, 100.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Dimension name (e.g. `"completeness"`, `"consistency"`).
    pub name: String,
    /// Score in `[0, 100]`.
    pub score: f64,
    /// Issues found in this dimension.
    pub issues: Vec<Finding>,
    /// Gaps (missing coverage) found in this dimension.
    pub gaps: Vec<Finding>,
    /// Actionable recommendations.
    pub recommendations: Vec<Finding>,
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// The output of one validator run.
///
/// # Invariants
/// - `overall_score` is always in `[0.0, 100.0]`.
/// - `passed` reflects a caller-specific gate comparison already applied by
///   the producing validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Aggregate score across all dimensions, in `[0, 100]`.
    pub overall_score: f64,
    /// Per-dimension breakdown.
    pub dimensions: Vec<DimensionScore>,
    /// Whether `overall_score` met the producing validator's gate.
    pub passed: bool,
    /// When the validation ran.
    pub timestamp: Timestamp,
}

impl ValidationReport {
    /// Builds a report from dimension scores using equal weighting, gated at `threshold`.
    #[must_use]
    pub fn from_equal_weighted_dimensions(dimensions: Vec<DimensionScore>, threshold: f64, timestamp: Timestamp) -> Self {
        let overall_score = if dimensions.is_empty() {
            0.0
        } else {
            dimensions.iter().map(|d| d.score).sum::<f64>() / dimensions.len() as f64
        };
        Self {
            passed: overall_score >= threshold,
            overall_score,
            dimensions,
            timestamp,
        }
    }
}
