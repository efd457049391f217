// crates/bmad-validators/src/architecture.rs
// ============================================================================
// Module: BMAD Architecture Validator
// Description: Four-dimension architecture document scorer gated at 85%.
// Purpose: Score completeness, PRD traceability, test strategy, and
// consistency, equally weighted.
// Dependencies: bmad-core
// ============================================================================

//! ## Overview
//! [`ArchitectureValidator::validate`] produces a [`ValidationReport`] with
//! one [`DimensionScore`] per dimension. Contradiction vocabulary is
//! configurable, since the pairs this workspace ships with (monolith vs
//! microservices, sync vs async, SQL vs NoSQL, stateless vs stateful) are
//! suggestive, not exhaustive.

use bmad_core::DimensionScore;
use bmad_core::Finding;
use bmad_core::Timestamp;
use bmad_core::ValidationReport;

use crate::scan::bulleted_lines;
use crate::scan::contains_any;
use crate::scan::heading_sections;
use crate::scan::keyword_tokens;
use crate::scan::prose_word_count;

/// The architecture validator's pass/fail gate, as a percentage.
pub const GATE_THRESHOLD: f64 = 85.0;

/// Required architecture section names, matched case-insensitively.
const REQUIRED_SECTIONS: &[&str] = &[
    "system overview",
    "component architecture",
    "data models",
    "api specifications",
    "non-functional requirements",
    "test strategy",
    "technical decisions",
];

/// Minimum prose word count for a required section to count as complete.
const MIN_SECTION_WORDS: usize = 40;

/// The five elements a complete test strategy section must mention.
const TEST_STRATEGY_ELEMENTS: &[(&str, &[&str])] = &[
    ("frameworks", &["jest", "pytest", "cargo test", "testing framework", "test framework", "junit"]),
    ("pyramid", &["test pyramid", "unit tests", "integration tests", "end-to-end"]),
    ("ci/cd pipeline", &["ci/cd", "continuous integration", "pipeline"]),
    ("quality gates", &["quality gate"]),
    ("atdd", &["atdd", "acceptance test"]),
];

/// Markers treated as evidence that a contradictory pair was deliberately resolved.
const RESOLUTION_MARKERS: &[&str] = &["decision:", "we will use", "chosen:", "adr-"];

/// Contradiction vocabulary checked by the consistency dimension. Suggestive,
/// not exhaustive; replace via [`ArchitectureValidator::with_contradiction_pairs`].
pub fn default_contradiction_pairs() -> Vec<(String, String)> {
    vec![
        ("monolith".to_string(), "microservices".to_string()),
        ("synchronous".to_string(), "asynchronous".to_string()),
        ("sql".to_string(), "nosql".to_string()),
        ("stateless".to_string(), "stateful".to_string()),
    ]
}

/// Scores an architecture document across four equally-weighted dimensions.
pub struct ArchitectureValidator {
    /// Contradiction term pairs checked by the consistency dimension.
    contradiction_pairs: Vec<(String, String)>,
}

impl Default for ArchitectureValidator {
    fn default() -> Self {
        Self { contradiction_pairs: default_contradiction_pairs() }
    }
}

impl ArchitectureValidator {
    /// Creates a validator using the default contradiction vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the contradiction vocabulary checked by the consistency dimension.
    #[must_use]
    pub fn with_contradiction_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        self.contradiction_pairs = pairs;
        self
    }

    /// Validates `architecture` against the required sections and `prd` for traceability.
    #[must_use]
    pub fn validate(&self, architecture: &str, prd: &str, now: Timestamp) -> ValidationReport {
        let dimensions = vec![
            self.completeness(architecture),
            self.prd_traceability(architecture, prd),
            self.test_strategy(architecture),
            self.consistency(architecture),
        ];
        ValidationReport::from_equal_weighted_dimensions(dimensions, GATE_THRESHOLD, now)
    }

    fn completeness(&self, architecture: &str) -> DimensionScore {
        let sections = heading_sections(architecture);
        let mut gaps = Vec::new();
        let mut complete = 0u32;

        for required in REQUIRED_SECTIONS {
            let matched = sections.iter().find(|section| section.title.to_lowercase() == *required);
            match matched {
                Some(section) if prose_word_count(&section.body) >= MIN_SECTION_WORDS => complete += 1,
                Some(_) => gaps.push(Finding {
                    category: "completeness".to_string(),
                    message: format!("section '{required}' is present but below the {MIN_SECTION_WORDS}-word floor"),
                }),
                None => gaps.push(Finding {
                    category: "completeness".to_string(),
                    message: format!("required section '{required}' is missing"),
                }),
            }
        }

        DimensionScore {
            name: "completeness".to_string(),
            score: 100.0 * f64::from(complete) / REQUIRED_SECTIONS.len() as f64,
            issues: Vec::new(),
            gaps,
            recommendations: Vec::new(),
        }
    }

    fn prd_traceability(&self, architecture: &str, prd: &str) -> DimensionScore {
        let requirements = bulleted_lines(prd);
        if requirements.is_empty() {
            return DimensionScore {
                name: "prd-traceability".to_string(),
                score: 100.0,
                issues: Vec::new(),
                gaps: Vec::new(),
                recommendations: Vec::new(),
            };
        }

        let arch_keywords = keyword_tokens(architecture);
        let mut gaps = Vec::new();
        let mut covered = 0u32;
        for requirement in &requirements {
            let requirement_keywords = keyword_tokens(requirement);
            if requirement_keywords.intersection(&arch_keywords).next().is_some() {
                covered += 1;
            } else {
                gaps.push(Finding {
                    category: "prd-traceability".to_string(),
                    message: format!("requirement '{requirement}' has no matching architecture coverage"),
                });
            }
        }

        DimensionScore {
            name: "prd-traceability".to_string(),
            score: 100.0 * f64::from(covered) / requirements.len() as f64,
            issues: Vec::new(),
            gaps,
            recommendations: Vec::new(),
        }
    }

    fn test_strategy(&self, architecture: &str) -> DimensionScore {
        let lower = architecture.to_lowercase();
        let mut gaps = Vec::new();
        let mut present = 0u32;

        for (name, keywords) in TEST_STRATEGY_ELEMENTS {
            if contains_any(&lower, keywords) {
                present += 1;
            } else {
                gaps.push(Finding {
                    category: "test-strategy".to_string(),
                    message: format!("no mention of {name}"),
                });
            }
        }

        DimensionScore {
            name: "test-strategy".to_string(),
            score: 20.0 * f64::from(present),
            issues: Vec::new(),
            gaps,
            recommendations: Vec::new(),
        }
    }

    fn consistency(&self, architecture: &str) -> DimensionScore {
        let lower = architecture.to_lowercase();
        let mut issues = Vec::new();

        for (a, b) in &self.contradiction_pairs {
            if !(lower.contains(a.as_str()) && lower.contains(b.as_str())) {
                continue;
            }
            if !pair_is_resolved(&lower, a, b) {
                issues.push(Finding {
                    category: "consistency".to_string(),
                    message: format!("unresolved contradiction between '{a}' and '{b}'"),
                });
            }
        }

        let score = if issues.is_empty() { 100.0 } else { 0.0 };
        DimensionScore {
            name: "consistency".to_string(),
            score,
            issues,
            gaps: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// Returns whether some paragraph mentioning both `a` and `b` also carries a
/// resolution marker, treating the pair as a deliberate, recorded decision
/// rather than an unresolved contradiction.
fn pair_is_resolved(lower: &str, a: &str, b: &str) -> bool {
    lower.split("\n\n").any(|paragraph| paragraph.contains(a) && paragraph.contains(b) && contains_any(paragraph, RESOLUTION_MARKERS))
}

#[cfg(test)]
mod tests {
    use super::ArchitectureValidator;
    use bmad_core::Timestamp;

    const COMPLETE_ARCHITECTURE: &str = "
## System Overview
This system is a multi-phase software delivery pipeline orchestrator built around a workflow engine, an agent pool, and a decision and escalation subsystem that together drive documents from draft to final approval. It coordinates persona agents, human escalations, and template-driven document assembly across the full lifecycle of a project, from initial requirements gathering through architecture review and on to implementation handoff.

## Component Architecture
The workflow engine drives instruction steps, the agent pool manages LLM-backed persona agents with capacity limits, and the template processor assembles documents from markdown templates with frontmatter and section markers. The decision engine answers questions autonomously when possible and escalates to a human reviewer when confidence falls below a configured threshold, keeping every component's mutable state owned by exactly one crate.

## Data Models
WorkflowState, Agent, Escalation, Decision, and Document are the core shared shapes, each owned by bmad-core and consumed by every other crate in the workspace without duplication. Every entity identifier is a newtype over a string, and every timestamp is an explicit value supplied by the caller rather than read from the wall clock, which keeps replay and testing fully deterministic across every component.

## API Specifications
Each capability is exposed as a narrow trait: StepExecutor, LlmClient, Sink, and StateStore, so callers depend on capabilities rather than concrete adapters. Provider-specific adapters and in-memory test doubles both implement the same trait, and no component reaches for a global registry or an ambient singleton to obtain one.

## Non-Functional Requirements
The system must persist state after every workflow step, recover from a crash at the last completed step, and keep every shared mutable structure guarded by the component that owns it. State files are single-writer per project, escalations are one file per entry for multi-writer safety, and every external invocation accepts an effective timeout that the caller can override.

## Test Strategy
We use cargo test as our testing framework, following the test pyramid with unit tests and integration tests, wired into a continuous integration pipeline with quality gates and ATDD acceptance tests before any change merges into the main branch. Property-style tests cover invariants like identifier monotonicity and section-replacement idempotence across every crate boundary in the workspace.

## Technical Decisions
We will use microservices for the agent pool and monolith for the template processor, since the agent pool benefits from independent scaling per persona while the template processor has no such requirement. Decision: the workflow engine remains a monolith for now, documented as ADR-004, and the agent pool is split into microservices per persona once the persona count justifies the added operational cost.
";

    const PRD_WITH_REQUIREMENTS: &str = "- FR-001: The workflow engine must support resuming a paused run\n- FR-002: The agent pool must queue requests past capacity\n";

    #[test]
    fn complete_document_scores_full_marks_on_every_dimension() {
        let report = ArchitectureValidator::new().validate(COMPLETE_ARCHITECTURE, PRD_WITH_REQUIREMENTS, Timestamp::Logical(1));
        assert!(report.passed, "expected pass, got {report:?}");
        assert!((report.overall_score - 100.0).abs() < 1.0);
    }

    #[test]
    fn missing_sections_fail_the_gate() {
        let report = ArchitectureValidator::new().validate("## System Overview\nshort\n", "", Timestamp::Logical(1));
        assert!(!report.passed);
    }

    #[test]
    fn unresolved_contradiction_zeroes_the_consistency_dimension() {
        let architecture = "## Technical Decisions\nWe debated monolith versus microservices at length without settling it.\n";
        let report = ArchitectureValidator::new().validate(architecture, "", Timestamp::Logical(1));
        let consistency = report.dimensions.iter().find(|d| d.name == "consistency").expect("dimension present");
        assert_eq!(consistency.score, 0.0);
    }

    #[test]
    fn empty_prd_scores_traceability_as_full() {
        let report = ArchitectureValidator::new().validate(COMPLETE_ARCHITECTURE, "", Timestamp::Logical(1));
        let traceability = report.dimensions.iter().find(|d| d.name == "prd-traceability").expect("dimension present");
        assert_eq!(traceability.score, 100.0);
    }
}
