// crates/bmad-validators/src/prd.rs
// ============================================================================
// Module: BMAD PRD Validator
// Description: Scores a PRD document's completeness, requirement quality,
// consistency, and gap coverage, gated at 85%.
// Purpose: Catch vague requirements, missing sections, and unaddressed
// security/error-handling implications before a PRD moves to architecture.
// Dependencies: bmad-core
// ============================================================================

//! ## Overview
//! [`PrdValidator::validate`] mirrors [`crate::architecture::ArchitectureValidator`]'s
//! shape: four equally-weighted dimensions, one [`ValidationReport`]. Every
//! scanner here is line-oriented; none require a full CommonMark parser.

use bmad_core::DimensionScore;
use bmad_core::Finding;
use bmad_core::Timestamp;
use bmad_core::ValidationReport;

use crate::architecture::default_contradiction_pairs;
use crate::scan::contains_any;
use crate::scan::heading_sections;

/// The PRD validator's pass/fail gate, as a percentage.
pub const GATE_THRESHOLD: f64 = 85.0;

/// Required PRD section names, matched case-insensitively.
const REQUIRED_SECTIONS: &[&str] = &["executive summary", "success criteria", "mvp scope", "functional requirements", "success metrics"];

/// Vague language flagged in requirement text, with a human-readable reason.
const VAGUE_TERMS: &[(&str, &str)] = &[
    ("better", "comparative with no baseline named"),
    ("improve", "no measurable target given"),
    ("properly", "no concrete acceptance criterion implied"),
];

/// Feature keywords that imply a security or error-handling concern should
/// be addressed somewhere in the document.
const IMPLIES_SECURITY: &[&str] = &["login", "payment", "upload", "authentication", "user data", "password"];

/// Scores a PRD document across four equally-weighted dimensions.
#[derive(Debug, Default)]
pub struct PrdValidator;

impl PrdValidator {
    /// Creates a PRD validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validates `prd` text.
    #[must_use]
    pub fn validate(&self, prd: &str, now: Timestamp) -> ValidationReport {
        let dimensions = vec![self.completeness(prd), self.requirement_quality(prd), self.consistency(prd), self.gap_analysis(prd)];
        ValidationReport::from_equal_weighted_dimensions(dimensions, GATE_THRESHOLD, now)
    }

    fn completeness(&self, prd: &str) -> DimensionScore {
        let sections = heading_sections(prd);
        let mut gaps = Vec::new();
        let mut present = 0u32;
        for required in REQUIRED_SECTIONS {
            if sections.iter().any(|section| section.title.to_lowercase() == *required) {
                present += 1;
            } else {
                gaps.push(Finding { category: "completeness".to_string(), message: format!("required section '{required}' is missing") });
            }
        }
        DimensionScore {
            name: "completeness".to_string(),
            score: 100.0 * f64::from(present) / REQUIRED_SECTIONS.len() as f64,
            issues: Vec::new(),
            gaps,
            recommendations: Vec::new(),
        }
    }

    fn requirement_quality(&self, prd: &str) -> DimensionScore {
        let requirements = find_functional_requirements(prd);
        let mut issues = Vec::new();

        for requirement in &requirements {
            if !requirement.has_acceptance_criteria {
                issues.push(Finding {
                    category: "requirement-quality".to_string(),
                    message: format!("{} has no stated acceptance criteria", requirement.id),
                });
            }
            let lower = requirement.text.to_lowercase();
            for (term, reason) in VAGUE_TERMS {
                if lower.contains(term) {
                    issues.push(Finding {
                        category: "requirement-quality".to_string(),
                        message: format!("{} uses vague language '{term}': {reason}", requirement.id),
                    });
                }
            }
        }

        let score = if requirements.is_empty() {
            0.0
        } else {
            let clean = requirements.iter().filter(|requirement| requirement.has_acceptance_criteria).count();
            100.0 * clean as f64 / requirements.len() as f64
        };

        DimensionScore { name: "requirement-quality".to_string(), score, issues, gaps: Vec::new(), recommendations: Vec::new() }
    }

    fn consistency(&self, prd: &str) -> DimensionScore {
        let lower = prd.to_lowercase();
        let mut issues = Vec::new();
        for (a, b) in default_contradiction_pairs() {
            if lower.contains(a.as_str()) && lower.contains(b.as_str()) {
                issues.push(Finding { category: "consistency".to_string(), message: format!("both '{a}' and '{b}' are mentioned without a reconciling decision") });
            }
        }
        let score = if issues.is_empty() { 100.0 } else { 0.0 };
        DimensionScore { name: "consistency".to_string(), score, issues, gaps: Vec::new(), recommendations: Vec::new() }
    }

    fn gap_analysis(&self, prd: &str) -> DimensionScore {
        let lower = prd.to_lowercase();
        let mut gaps = Vec::new();
        let mut recommendations = Vec::new();

        let implies_security = contains_any(&lower, IMPLIES_SECURITY);
        let mentions_security = contains_any(&lower, &["security", "authorization", "encryption"]);
        if implies_security && !mentions_security {
            gaps.push(Finding { category: "security".to_string(), message: "document describes features implying security needs but never addresses security".to_string() });
            recommendations.push(Finding { category: "security".to_string(), message: "add a section addressing authentication, authorization, or data protection".to_string() });
        }

        let mentions_error_handling = contains_any(&lower, &["error handling", "failure mode", "error case"]);
        if !mentions_error_handling {
            gaps.push(Finding { category: "error-handling".to_string(), message: "document never discusses error handling or failure modes".to_string() });
            recommendations.push(Finding { category: "error-handling".to_string(), message: "add expected behavior for failure and edge cases per requirement".to_string() });
        }

        let score = 100.0 - 50.0 * gaps.len() as f64;
        DimensionScore { name: "gap-analysis".to_string(), score: score.max(0.0), issues: Vec::new(), gaps, recommendations }
    }
}

/// A `FR-NNN` requirement extracted from PRD text.
struct FunctionalRequirement {
    id: String,
    text: String,
    has_acceptance_criteria: bool,
}

/// Scans for `FR-NNN` lines and records whether an "acceptance criteria"
/// marker appears on the same line or within the following two lines.
fn find_functional_requirements(prd: &str) -> Vec<FunctionalRequirement> {
    let lines: Vec<&str> = prd.lines().collect();
    let mut requirements = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(fr_pos) = line.find("FR-") else { continue };
        let digits: String = line[fr_pos + 3..].chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            continue;
        }
        let id = format!("FR-{digits}");
        let lookahead = lines[index..(index + 3).min(lines.len())].join(" ").to_lowercase();
        let has_acceptance_criteria = lookahead.contains("acceptance criteria") || lookahead.contains("given") && lookahead.contains("then");
        requirements.push(FunctionalRequirement { id, text: line.to_string(), has_acceptance_criteria });
    }
    requirements
}
