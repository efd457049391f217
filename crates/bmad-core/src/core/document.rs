// crates/bmad-core/src/core/document.rs
// ============================================================================
// Module: BMAD Document
// Description: Markdown document shape with YAML frontmatter and marker-delimited sections.
// Purpose: Share one section-marker scanner between the template processor and validators.
// Dependencies: none (std only)
// ============================================================================

//! ## Overview
//! A [`Document`] is markdown text with an optional YAML frontmatter block and
//! zero or more marker-delimited sections (`<!-- SECTION: name -->` ...
//! `<!-- END SECTION: name -->`). This module only scans structure; it does
//! not interpret YAML or substitute variables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while scanning a document's section markers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// A `SECTION:` start marker has no matching `END SECTION:` marker.
    #[error("section '{0}' has a start marker but no matching end marker")]
    SectionEndMarkerNotFound(String),
    /// A referenced section name has no `SECTION:` start marker at all.
    #[error("section '{0}' has no start marker")]
    SectionStartMarkerNotFound(String),
    /// The same section name starts more than once.
    #[error("section '{0}' starts more than once")]
    DuplicateSection(String),
}

// ============================================================================
// SECTION: Section Spans
// ============================================================================

/// The byte range of one marker-delimited section within a document, including
/// both markers themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    /// The section's declared name.
    pub name: String,
    /// Byte offset where the start marker line begins.
    pub start_marker_offset: usize,
    /// Byte offset immediately after the start marker line's newline.
    pub body_start: usize,
    /// Byte offset where the section body ends (exclusive), i.e. where the end marker begins.
    pub body_end: usize,
    /// Byte offset immediately after the end marker line.
    pub end_marker_end: usize,
}

impl fmt::Display for SectionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section '{}'", self.name)
    }
}

const SECTION_START_PREFIX: &str = "<!-- SECTION: ";
const SECTION_END_PREFIX: &str = "<!-- END SECTION: ";
const MARKER_SUFFIX: &str = " -->";

/// Scans `text` for every `<!-- SECTION: name --> ... <!-- END SECTION: name -->`
/// pair, in document order.
///
/// # Errors
///
/// Returns [`DocumentError::DuplicateSection`] when a name starts twice, or
/// [`DocumentError::SectionEndMarkerNotFound`] when a start has no matching end.
pub fn scan_sections(text: &str) -> Result<Vec<SectionSpan>, DocumentError> {
    let mut spans = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    let mut cursor = 0usize;

    while let Some(rel_start) = text[cursor..].find(SECTION_START_PREFIX) {
        let start_marker_offset = cursor + rel_start;
        let name_start = start_marker_offset + SECTION_START_PREFIX.len();
        let Some(rel_name_end) = text[name_start..].find(MARKER_SUFFIX) else {
            break;
        };
        let name_end = name_start + rel_name_end;
        let name = text[name_start..name_end].trim().to_string();
        if !seen.insert(name.clone()) {
            return Err(DocumentError::DuplicateSection(name));
        }
        let body_start = name_end + MARKER_SUFFIX.len();

        let end_prefix = format!("{SECTION_END_PREFIX}{name}{MARKER_SUFFIX}");
        let Some(rel_end) = text[body_start..].find(end_prefix.as_str()) else {
            return Err(DocumentError::SectionEndMarkerNotFound(name));
        };
        let body_end = body_start + rel_end;
        let end_marker_end = body_end + end_prefix.len();

        spans.push(SectionSpan {
            name,
            start_marker_offset,
            body_start,
            body_end,
            end_marker_end,
        });
        cursor = end_marker_end;
    }

    Ok(spans)
}

/// Replaces the body of the unique section named `name` with `replacement`,
/// preserving both markers.
///
/// # Errors
///
/// Returns [`DocumentError::SectionStartMarkerNotFound`] when no section with
/// `name` exists, or propagates scan errors from malformed markers elsewhere
/// in the document.
pub fn replace_section(text: &str, name: &str, replacement: &str) -> Result<String, DocumentError> {
    let spans = scan_sections(text)?;
    let span = spans
        .iter()
        .find(|span| span.name == name)
        .ok_or_else(|| DocumentError::SectionStartMarkerNotFound(name.to_string()))?;

    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..span.body_start]);
    out.push_str(replacement);
    out.push_str(&text[span.body_end..]);
    Ok(out)
}

/// Returns whether `text` begins with a `---` frontmatter fence followed by a
/// second `---` fence line.
#[must_use]
pub fn has_frontmatter(text: &str) -> bool {
    let mut lines = text.lines();
    if lines.next() != Some("---") {
        return false;
    }
    lines.any(|line| line == "---")
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// A markdown document with optional YAML frontmatter and marker-delimited
/// sections.
///
/// # Invariants
/// - `text` is whatever was last written; `Document` does not cache section
///   spans, since every write invalidates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full markdown source, including any frontmatter fence.
    pub text: String,
}

impl Document {
    /// Wraps raw markdown text as a document.
    #[must_use]
    pub const fn new(text: String) -> Self {
        Self { text }
    }

    /// Returns whether the document opens with a valid frontmatter fence pair.
    #[must_use]
    pub fn has_frontmatter(&self) -> bool {
        has_frontmatter(&self.text)
    }

    /// Returns the document's section spans in document order.
    ///
    /// # Errors
    ///
    /// Propagates [`DocumentError`] for duplicate or unterminated sections.
    pub fn sections(&self) -> Result<Vec<SectionSpan>, DocumentError> {
        scan_sections(&self.text)
    }

    /// Replaces the named section's body in place, preserving both markers.
    ///
    /// # Errors
    ///
    /// Propagates [`DocumentError`] when the section is missing or malformed.
    pub fn replace_section(&mut self, name: &str, replacement: &str) -> Result<(), DocumentError> {
        self.text = replace_section(&self.text, name, replacement)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::has_frontmatter;
    use super::replace_section;
    use super::scan_sections;

    const DOC: &str = "---\ntitle: x\n---\n# Doc\n<!-- SECTION: overview -->\nold content\n<!-- END SECTION: overview -->\ntail\n";

    #[test]
    fn scans_a_single_section() {
        let spans = scan_sections(DOC).expect("scan succeeds");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "overview");
    }

    #[test]
    fn replace_section_preserves_markers_and_swaps_body() {
        let replaced = replace_section(DOC, "overview", "Updated overview").expect("replace succeeds");
        assert!(replaced.contains("<!-- SECTION: overview -->"));
        assert!(replaced.contains("<!-- END SECTION: overview -->"));
        assert!(replaced.contains("Updated overview"));
        assert!(!replaced.contains("old content"));
    }

    #[test]
    fn replace_section_is_idempotent_under_equal_content() {
        let once = replace_section(DOC, "overview", "same").expect("first replace");
        let twice = replace_section(&once, "overview", "same").expect("second replace");
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_section_is_an_error() {
        assert!(replace_section(DOC, "missing", "x").is_err());
    }

    #[test]
    fn frontmatter_requires_two_fence_lines() {
        assert!(has_frontmatter("---\na: 1\n---\nbody"));
        assert!(!has_frontmatter("# no frontmatter"));
    }

    proptest::proptest! {
        /// Replacing a section's body with the same content twice is a no-op
        /// the second time, for any replacement text free of marker syntax.
        #[test]
        fn replace_section_is_idempotent_for_arbitrary_marker_free_content(replacement in "[a-zA-Z0-9 .,\n]{0,80}") {
            let once = replace_section(DOC, "overview", &replacement).expect("first replace");
            let twice = replace_section(&once, "overview", &replacement).expect("second replace");
            assert_eq!(once, twice);
        }
    }
}
