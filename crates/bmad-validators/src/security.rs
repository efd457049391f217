// crates/bmad-validators/src/security.rs
// ============================================================================
// Module: BMAD Security Gate Validator
// Description: Twenty keyword-matched checks across six categories, gated
// at 95%.
// Purpose: Catch missing baseline security coverage in an architecture or
// design document before implementation starts.
// Dependencies: bmad-core
// ============================================================================

//! ## Overview
//! Each category owns a fixed set of checks; `overall_score` is
//! `5 * satisfied_checks` across all twenty, not an average of category
//! scores, since categories have unequal check counts.

use bmad_core::DimensionScore;
use bmad_core::Finding;
use bmad_core::Timestamp;
use bmad_core::ValidationReport;

use crate::scan::contains_any;

/// The security gate's pass/fail threshold, as a percentage.
pub const GATE_THRESHOLD: f64 = 95.0;

/// Total number of checks across all categories.
pub const TOTAL_CHECKS: u32 = 20;

struct SecurityCheck {
    description: &'static str,
    keywords: &'static [&'static str],
    recommendation: &'static str,
}

struct SecurityCategory {
    name: &'static str,
    checks: &'static [SecurityCheck],
}

const CATEGORIES: &[SecurityCategory] = &[
    SecurityCategory {
        name: "authentication-authorization",
        checks: &[
            SecurityCheck { description: "authentication mechanism documented", keywords: &["authentication"], recommendation: "document how users and services authenticate" },
            SecurityCheck { description: "authorization model documented", keywords: &["authorization"], recommendation: "document how access decisions are made" },
            SecurityCheck { description: "role-based access control", keywords: &["role-based access", "rbac"], recommendation: "define roles and the permissions each grants" },
            SecurityCheck { description: "multi-factor authentication", keywords: &["multi-factor", "mfa", "2fa"], recommendation: "require a second factor for privileged accounts" },
        ],
    },
    SecurityCategory {
        name: "secrets-management",
        checks: &[
            SecurityCheck { description: "dedicated secrets storage", keywords: &["secrets manager", "vault"], recommendation: "store credentials in a dedicated secrets manager, not config files" },
            SecurityCheck { description: "no hardcoded secrets", keywords: &["no hardcoded secrets", "environment variable"], recommendation: "load secrets from environment or a secret store, never source" },
            SecurityCheck { description: "secret rotation policy", keywords: &["key rotation", "secret rotation", "credential rotation"], recommendation: "define a rotation schedule for long-lived credentials" },
        ],
    },
    SecurityCategory {
        name: "input-validation",
        checks: &[
            SecurityCheck { description: "input validation strategy", keywords: &["input validation"], recommendation: "validate all externally supplied input at the system boundary" },
            SecurityCheck { description: "sanitization of untrusted content", keywords: &["sanitiz"], recommendation: "sanitize untrusted content before rendering or storage" },
            SecurityCheck { description: "injection attack mitigation", keywords: &["injection", "parameterized quer"], recommendation: "use parameterized queries and escape output to prevent injection" },
        ],
    },
    SecurityCategory {
        name: "api-security",
        checks: &[
            SecurityCheck { description: "rate limiting", keywords: &["rate limit"], recommendation: "rate-limit public endpoints to blunt abuse" },
            SecurityCheck { description: "CORS policy", keywords: &["cors"], recommendation: "define an explicit cross-origin policy" },
            SecurityCheck { description: "API authentication", keywords: &["api key", "oauth", "bearer token"], recommendation: "require a credential on every API call" },
            SecurityCheck { description: "transport encryption", keywords: &["https", "tls"], recommendation: "require TLS for every network call" },
        ],
    },
    SecurityCategory {
        name: "encryption",
        checks: &[
            SecurityCheck { description: "encryption at rest", keywords: &["encryption at rest", "encrypted at rest"], recommendation: "encrypt sensitive data at rest" },
            SecurityCheck { description: "encryption in transit", keywords: &["encryption in transit", "encrypted in transit"], recommendation: "encrypt sensitive data in transit" },
            SecurityCheck { description: "password hashing", keywords: &["bcrypt", "argon2", "password hash"], recommendation: "hash passwords with a memory-hard algorithm" },
        ],
    },
    SecurityCategory {
        name: "threat-model",
        checks: &[
            SecurityCheck { description: "threat model documented", keywords: &["threat model"], recommendation: "document a threat model for this system" },
            SecurityCheck { description: "attack surface analysis", keywords: &["stride", "attack surface"], recommendation: "enumerate the attack surface and mitigations per entry point" },
            SecurityCheck { description: "independent security review", keywords: &["security review", "penetration test"], recommendation: "schedule an independent security review or penetration test" },
        ],
    },
];

/// Scores a document against twenty keyword-matched security checks.
#[derive(Debug, Default)]
pub struct SecurityGateValidator;

impl SecurityGateValidator {
    /// Creates a security gate validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validates `text`, grouping gaps by category with a recommendation per unmet check.
    #[must_use]
    pub fn validate(&self, text: &str, now: Timestamp) -> ValidationReport {
        let lower = text.to_lowercase();
        let mut dimensions = Vec::with_capacity(CATEGORIES.len());
        let mut satisfied_total = 0u32;

        for category in CATEGORIES {
            let mut gaps = Vec::new();
            let mut recommendations = Vec::new();
            let mut satisfied = 0u32;

            for check in category.checks {
                if contains_any(&lower, check.keywords) {
                    satisfied += 1;
                    satisfied_total += 1;
                } else {
                    gaps.push(Finding { category: category.name.to_string(), message: format!("missing: {}", check.description) });
                    recommendations.push(Finding { category: category.name.to_string(), message: check.recommendation.to_string() });
                }
            }

            dimensions.push(DimensionScore {
                name: category.name.to_string(),
                score: 100.0 * f64::from(satisfied) / category.checks.len() as f64,
                issues: Vec::new(),
                gaps,
                recommendations,
            });
        }

        let overall_score = 5.0 * f64::from(satisfied_total);
        ValidationReport { overall_score, passed: overall_score >= GATE_THRESHOLD, dimensions, timestamp: now }
    }
}

#[cfg(test)]
mod tests {
    use super::SecurityGateValidator;
    use super::TOTAL_CHECKS;
    use bmad_core::Timestamp;

    #[test]
    fn no_coverage_scores_zero() {
        let report = SecurityGateValidator::new().validate("A document with no security content at all.", Timestamp::Logical(1));
        assert_eq!(report.overall_score, 0.0);
        assert!(!report.passed);
        let total_gaps: usize = report.dimensions.iter().map(|dimension| dimension.gaps.len()).sum();
        assert_eq!(total_gaps, TOTAL_CHECKS as usize);
    }

    #[test]
    fn score_is_five_times_satisfied_checks() {
        let text = "We use authentication and authorization with role-based access and multi-factor authentication.";
        let report = SecurityGateValidator::new().validate(text, Timestamp::Logical(1));
        assert_eq!(report.overall_score, 20.0);
    }

    #[test]
    fn full_coverage_passes_the_gate() {
        let text = "\
            authentication authorization role-based access mfa \
            secrets manager no hardcoded secrets key rotation \
            input validation sanitization injection parameterized query \
            rate limit cors oauth https \
            encryption at rest encryption in transit bcrypt \
            threat model attack surface security review";
        let report = SecurityGateValidator::new().validate(text, Timestamp::Logical(1));
        assert!(report.passed, "expected pass, got {report:?}");
    }
}
