// crates/bmad-validators/src/scan.rs
// ============================================================================
// Module: BMAD Document Scanners
// Description: Small heading and word-count scanners shared across validators.
// Purpose: A regex-free scanner suite is sufficient for PRD/architecture
// validation; this module is the one place that logic lives.
// Dependencies: none (std only)
// ============================================================================

//! ## Overview
//! Validators never need a full CommonMark parser: they need headings, the
//! word count of a heading's body with fenced code blocks excluded, and
//! bulleted-line extraction. This module is tolerant of mixed heading case
//! and arbitrary heading levels.

/// One markdown heading and the raw text beneath it, up to the next heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingSection {
    /// Heading text with leading `#` markers stripped, not case-normalized.
    pub title: String,
    /// Body text beneath the heading, excluding the heading line itself.
    pub body: String,
}

/// Splits `text` into heading sections at every line whose first
/// non-whitespace character is `#`.
#[must_use]
pub fn heading_sections(text: &str) -> Vec<HeadingSection> {
    let mut sections = Vec::new();
    let mut current_title: Option<String> = None;
    let mut current_body = String::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            if let Some(title) = current_title.take() {
                sections.push(HeadingSection { title, body: std::mem::take(&mut current_body) });
            }
            current_title = Some(rest.trim_start_matches('#').trim().to_string());
        } else if current_title.is_some() {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    if let Some(title) = current_title {
        sections.push(HeadingSection { title, body: current_body });
    }
    sections
}

/// Removes the content of fenced code blocks (delimited by lines starting
/// with ` ``` `), keeping the surrounding prose.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::new();
    let mut in_fence = false;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Counts words in `text` after stripping fenced code blocks.
#[must_use]
pub fn prose_word_count(text: &str) -> usize {
    strip_code_fences(text).split_whitespace().count()
}

/// Extracts the text of every top-level bulleted line (`-` or `*` prefix,
/// ignoring indentation).
#[must_use]
pub fn bulleted_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .map(|rest| rest.trim().to_string())
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Returns whether any keyword in `keywords` occurs in `haystack_lower`,
/// which must already be lowercased.
#[must_use]
pub fn contains_any(haystack_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack_lower.contains(keyword))
}

/// Splits text into keyword tokens: lowercase alphanumeric runs longer than
/// two characters, with common stopwords removed.
#[must_use]
pub fn keyword_tokens(text: &str) -> std::collections::HashSet<String> {
    const STOPWORDS: &[&str] = &["the", "a", "an", "is", "are", "to", "for", "of", "in", "on", "and", "or", "with", "this", "that"];
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| word.len() > 2 && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::bulleted_lines;
    use super::heading_sections;
    use super::prose_word_count;

    #[test]
    fn splits_headings_at_any_level() {
        let text = "# Title\nintro\n## Sub\nbody words here\n";
        let sections = heading_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Title");
        assert_eq!(sections[1].title, "Sub");
    }

    #[test]
    fn word_count_excludes_fenced_code() {
        let text = "one two three\n```\ncode code code code\n```\nfour";
        assert_eq!(prose_word_count(text), 4);
    }

    #[test]
    fn extracts_top_level_bullets() {
        let text = "- FR-001: do a thing\n  note not a bullet\n* FR-002: do another\n";
        let bullets = bulleted_lines(text);
        assert_eq!(bullets, vec!["FR-001: do a thing", "FR-002: do another"]);
    }
}
