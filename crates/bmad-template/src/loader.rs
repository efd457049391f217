// crates/bmad-template/src/loader.rs
// ============================================================================
// Module: BMAD Template Loader
// Description: Loads a template, preferring a validated custom override over
// the default.
// Purpose: Give callers a single load path that degrades from custom to
// default without ever returning an invalid template.
// Dependencies: bmad-core, thiserror
// ============================================================================

//! ## Overview
//! [`load_template`] tries the custom path first; if it is unreadable or
//! fails structural validation, it falls back to the default text and
//! records which source ultimately won in [`LoadedTemplate::source`].

use std::path::Path;

use thiserror::Error;

use crate::validation::StructuralReport;
use crate::validation::validate_structure;

/// Errors raised while loading a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Neither the custom override nor the default template validated.
    #[error("template failed structural validation: {0:?}")]
    Invalid(Vec<String>),
}

/// Which source a loaded template ultimately came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    /// The built-in default template text.
    Default,
    /// A caller-supplied override path.
    Custom,
}

/// A template loaded and validated, along with which source won.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTemplate {
    /// The template text to use.
    pub text: String,
    /// Which source this text came from.
    pub source: TemplateSource,
    /// The structural validation report for `text`.
    pub report: StructuralReport,
}

/// Loads a template, preferring `custom_path` when it exists and validates;
/// falling back to `default_text` otherwise.
///
/// # Errors
///
/// Returns [`TemplateError::Invalid`] only if `default_text` itself fails
/// structural validation, since a broken custom override always falls back.
pub fn load_template(custom_path: Option<&Path>, default_text: &str, required_sections: &[&str]) -> Result<LoadedTemplate, TemplateError> {
    if let Some(path) = custom_path {
        if let Ok(custom_text) = std::fs::read_to_string(path) {
            let report = validate_structure(&custom_text, required_sections);
            if report.valid {
                return Ok(LoadedTemplate { text: custom_text, source: TemplateSource::Custom, report });
            }
        }
    }

    let report = validate_structure(default_text, required_sections);
    if !report.valid {
        return Err(TemplateError::Invalid(report.errors));
    }
    Ok(LoadedTemplate { text: default_text.to_string(), source: TemplateSource::Default, report })
}

#[cfg(test)]
mod tests {
    use super::TemplateSource;
    use super::load_template;

    const DEFAULT: &str = "---\ntitle: x\n---\n<!-- SECTION: overview -->\ndefault body\n<!-- END SECTION: overview -->\n";

    #[test]
    fn valid_custom_override_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let custom_path = dir.path().join("custom.md");
        std::fs::write(&custom_path, "---\ntitle: y\n---\n<!-- SECTION: overview -->\ncustom body\n<!-- END SECTION: overview -->\n")
            .expect("write custom template");

        let loaded = load_template(Some(&custom_path), DEFAULT, &["overview"]).expect("loads");
        assert_eq!(loaded.source, TemplateSource::Custom);
        assert!(loaded.text.contains("custom body"));
    }

    #[test]
    fn invalid_custom_override_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let custom_path = dir.path().join("custom.md");
        std::fs::write(&custom_path, "not a valid template").expect("write custom template");

        let loaded = load_template(Some(&custom_path), DEFAULT, &["overview"]).expect("loads");
        assert_eq!(loaded.source, TemplateSource::Default);
        assert!(loaded.text.contains("default body"));
    }

    #[test]
    fn missing_custom_path_falls_back_to_default() {
        let loaded = load_template(Some(std::path::Path::new("/no/such/file.md")), DEFAULT, &["overview"]).expect("loads");
        assert_eq!(loaded.source, TemplateSource::Default);
    }

    #[test]
    fn no_custom_path_uses_default() {
        let loaded = load_template(None, DEFAULT, &["overview"]).expect("loads");
        assert_eq!(loaded.source, TemplateSource::Default);
    }
}
