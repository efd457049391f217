// crates/bmad-template/src/validation.rs
// ============================================================================
// Module: BMAD Template Structural Validation
// Description: Checks a template for frontmatter, required sections, and
// balanced placeholder markers.
// Purpose: Give callers a {valid, errors[], warnings[]} report before a
// template is used to drive document assembly.
// Dependencies: bmad-core
// ============================================================================

//! ## Overview
//! [`validate_structure`] never panics on malformed input; every defect is
//! reported as an error or warning entry. Required sections are a caller
//! supplied set, since different template kinds (architecture, PRD, security)
//! declare different required sections.

use bmad_core::has_frontmatter;
use bmad_core::scan_sections;

/// Template variables whose absence is a warning, not an error.
const RECOMMENDED_VARIABLES: &[&str] = &["project_name", "date", "user_name"];

/// Outcome of structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuralReport {
    /// Whether the template passed every required check.
    pub valid: bool,
    /// Defects that make the template unusable.
    pub errors: Vec<String>,
    /// Defects that do not block use but should be surfaced.
    pub warnings: Vec<String>,
}

/// Validates a template's structure: frontmatter fence, required section
/// markers, matched section start/end pairs, and balanced `{{`/`}}` pairs.
/// Recommended variables absent from the template body produce warnings only.
#[must_use]
pub fn validate_structure(template: &str, required_sections: &[&str]) -> StructuralReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !has_frontmatter(template) {
        errors.push("template does not begin with a YAML frontmatter fence".to_string());
    }

    match scan_sections(template) {
        Ok(spans) => {
            let present: std::collections::BTreeSet<&str> = spans.iter().map(|span| span.name.as_str()).collect();
            for required in required_sections {
                if !present.contains(required) {
                    errors.push(format!("missing required section '{required}'"));
                }
            }
        }
        Err(err) => errors.push(err.to_string()),
    }

    let open_count = template.matches("{{").count();
    let close_count = template.matches("}}").count();
    if open_count != close_count {
        errors.push(format!("unbalanced placeholder markers: {open_count} '{{{{' vs {close_count} '}}}}'"));
    }

    for recommended in RECOMMENDED_VARIABLES {
        let placeholder = format!("{{{{{recommended}}}}}");
        if !template.contains(&placeholder) {
            warnings.push(format!("recommended variable '{recommended}' is not referenced"));
        }
    }

    StructuralReport { valid: errors.is_empty(), errors, warnings }
}

#[cfg(test)]
mod tests {
    use super::validate_structure;

    const VALID: &str = "---\ntitle: x\n---\n# {{project_name}}\nDate: {{date}}\nBy: {{user_name}}\n<!-- SECTION: overview -->\nbody\n<!-- END SECTION: overview -->\n";

    #[test]
    fn well_formed_template_has_no_errors_or_warnings() {
        let report = validate_structure(VALID, &["overview"]);
        assert!(report.valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        let report = validate_structure("# no frontmatter", &[]);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("frontmatter")));
    }

    #[test]
    fn missing_required_section_is_an_error() {
        let report = validate_structure("---\na: 1\n---\nbody", &["overview"]);
        assert!(report.errors.iter().any(|e| e.contains("overview")));
    }

    #[test]
    fn unbalanced_braces_is_an_error() {
        let report = validate_structure("---\na: 1\n---\n{{oops", &[]);
        assert!(report.errors.iter().any(|e| e.contains("unbalanced")));
    }

    #[test]
    fn missing_recommended_variable_is_warning_only() {
        let report = validate_structure("---\na: 1\n---\nno placeholders here", &[]);
        assert!(report.valid);
        assert!(!report.warnings.is_empty());
    }
}
