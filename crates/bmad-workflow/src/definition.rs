// crates/bmad-workflow/src/definition.rs
// ============================================================================
// Module: BMAD Workflow Definition
// Description: Workflow YAML and instruction-markup parsing.
// Purpose: Turn a workflow's YAML manifest and XML-like instructions file
// into an ordered, validated InstructionStep sequence.
// Dependencies: serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! Instructions markup is XML-like, not strict XML: [`parse_instructions`] is
//! a tolerant line-oriented scanner, not a general XML parser, matching how
//! this workspace treats markdown section markers. Unknown elements are
//! ignored rather than rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while parsing a workflow definition or its instructions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The workflow YAML manifest could not be deserialized.
    #[error("invalid workflow manifest: {0}")]
    InvalidManifest(String),
    /// A `<step n="...">` tag is missing its position attribute or it does not parse as an integer.
    #[error("step at byte offset {0} has a missing or non-numeric 'n' attribute")]
    InvalidStepNumber(usize),
    /// Step numbers did not increase monotonically from 1 with no duplicates.
    #[error("step numbers must increase monotonically from 1 with no duplicates, found {0} after {1}")]
    OutOfOrderStep(u32, u32),
    /// A `<template-output>` tag is missing its `file` attribute.
    #[error("template-output tag at byte offset {0} is missing a 'file' attribute")]
    MissingOutputFile(usize),
}

// ============================================================================
// SECTION: Workflow Definition
// ============================================================================

/// A workflow's YAML manifest: name, description, instructions reference, and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Workflow name, e.g. `"prd"`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Path to the instructions markup file, relative to `installed_path`.
    pub instructions: String,
    /// Default variables merged at the lowest resolution priority.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// Filesystem path this workflow was installed to.
    #[serde(default)]
    pub installed_path: String,
    /// Whether this workflow can run independently of an orchestrator.
    #[serde(default)]
    pub standalone: bool,
}

impl WorkflowDefinition {
    /// Parses a workflow manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidManifest`] when the YAML does not
    /// deserialize into the expected shape.
    pub fn from_yaml(text: &str) -> Result<Self, DefinitionError> {
        serde_yaml::from_str(text).map_err(|err| DefinitionError::InvalidManifest(err.to_string()))
    }
}

// ============================================================================
// SECTION: Instruction Steps
// ============================================================================

/// One action within a step's body, in textual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// A free-text action description; execution is delegated to a [`crate::executor::StepExecutor`].
    Action(String),
    /// A conditional block; its nested actions run only when the guard is true.
    Check {
        /// Guard expression text.
        guard: String,
        /// Actions that run only when the guard evaluates true.
        actions: Vec<StepAction>,
    },
    /// Requests free-form human input; skipped under YOLO mode.
    Ask,
    /// Requests required human input; skipped under YOLO mode.
    ElicitRequired,
    /// Writes assembled document content to `file`; auto-approved under YOLO mode.
    TemplateOutput {
        /// Destination file path.
        file: String,
    },
    /// Descriptive output marker with no execution semantics.
    Output,
}

/// One step in a workflow's instruction sequence.
///
/// # Invariants
/// - `n` values are monotonically increasing from 1 across a parsed sequence, no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionStep {
    /// 1-based position.
    pub n: u32,
    /// Short description of the step's purpose.
    pub goal: String,
    /// Whether the step may be skipped without failing the workflow.
    pub optional: bool,
    /// Step-level guard; a false guard skips the whole step.
    pub guard: Option<String>,
    /// Body actions, in textual order.
    pub body: Vec<StepAction>,
}

// ============================================================================
// SECTION: Instruction Markup Scanner
// ============================================================================

/// Parses the XML-like instructions markup into an ordered, validated step sequence.
///
/// # Errors
///
/// Returns [`DefinitionError`] when step numbering is invalid or a recognized
/// tag is missing a required attribute. Unknown tags are ignored.
pub fn parse_instructions(text: &str) -> Result<Vec<InstructionStep>, DefinitionError> {
    let mut steps = Vec::new();
    let mut cursor = 0usize;
    let mut last_n = 0u32;

    while let Some(rel_open) = text[cursor..].find("<step") {
        let open_start = cursor + rel_open;
        let Some(rel_tag_end) = text[open_start..].find('>') else { break };
        let tag_end = open_start + rel_tag_end;
        let tag = &text[open_start..=tag_end];

        let n = read_u32_attribute(tag, "n").ok_or(DefinitionError::InvalidStepNumber(open_start))?;
        if n != last_n + 1 {
            return Err(DefinitionError::OutOfOrderStep(n, last_n));
        }
        last_n = n;

        let goal = read_string_attribute(tag, "goal").unwrap_or_default();
        let optional = read_string_attribute(tag, "optional").is_some_and(|value| value == "true");
        let guard = read_string_attribute(tag, "if");

        let body_start = tag_end + 1;
        let close_tag = "</step>";
        let Some(rel_close) = text[body_start..].find(close_tag) else { break };
        let body_end = body_start + rel_close;
        let body = parse_body(&text[body_start..body_end])?;

        steps.push(InstructionStep { n, goal, optional, guard, body });
        cursor = body_end + close_tag.len();
    }

    Ok(steps)
}

/// Parses one step's body text into a sequence of [`StepAction`]s.
fn parse_body(body: &str) -> Result<Vec<StepAction>, DefinitionError> {
    let mut actions = Vec::new();
    let mut cursor = 0usize;

    while let Some(rel_open) = body[cursor..].find('<') {
        let open_start = cursor + rel_open;
        if body[open_start..].starts_with("</") {
            cursor = open_start + 2;
            continue;
        }
        let Some(rel_tag_end) = body[open_start..].find('>') else { break };
        let tag_end = open_start + rel_tag_end;
        let self_closing = body[..tag_end].ends_with('/');
        let tag = &body[open_start..=tag_end];
        let name = read_tag_name(tag);

        if self_closing {
            if let Some(action) = leaf_action(&name, tag, "", open_start)? {
                actions.push(action);
            }
            cursor = tag_end + 1;
            continue;
        }

        if name == "check" {
            let guard = read_string_attribute(tag, "if").unwrap_or_default();
            let close_tag = "</check>";
            let content_start = tag_end + 1;
            let Some(rel_close) = body[content_start..].find(close_tag) else { break };
            let content_end = content_start + rel_close;
            let nested = parse_body(&body[content_start..content_end])?;
            actions.push(StepAction::Check { guard, actions: nested });
            cursor = content_end + close_tag.len();
            continue;
        }

        let close_tag = format!("</{name}>");
        let content_start = tag_end + 1;
        if let Some(rel_close) = body[content_start..].find(close_tag.as_str()) {
            let content_end = content_start + rel_close;
            let content = body[content_start..content_end].trim();
            if let Some(action) = leaf_action(&name, tag, content, open_start)? {
                actions.push(action);
            }
            cursor = content_end + close_tag.len();
        } else {
            if let Some(action) = leaf_action(&name, tag, "", open_start)? {
                actions.push(action);
            }
            cursor = tag_end + 1;
        }
    }

    Ok(actions)
}

/// Builds the `StepAction` for a recognized leaf tag; unknown tags yield `None`.
fn leaf_action(name: &str, tag: &str, content: &str, offset: usize) -> Result<Option<StepAction>, DefinitionError> {
    match name {
        "action" => Ok(Some(StepAction::Action(content.to_string()))),
        "ask" => Ok(Some(StepAction::Ask)),
        "elicit-required" => Ok(Some(StepAction::ElicitRequired)),
        "template-output" => {
            let file = read_string_attribute(tag, "file").ok_or(DefinitionError::MissingOutputFile(offset))?;
            Ok(Some(StepAction::TemplateOutput { file }))
        }
        "output" => Ok(Some(StepAction::Output)),
        _ => Ok(None),
    }
}

/// Extracts the tag name from a `<name ...>` or `<name/>` opening tag.
fn read_tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Reads a `key="value"` attribute's raw string value from a tag's source text.
fn read_string_attribute(tag: &str, key: &str) -> Option<String> {
    let needle = format!("{key}=\"");
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')? + start;
    Some(tag[start..end].to_string())
}

/// Reads a `key="value"` attribute and parses it as `u32`.
fn read_u32_attribute(tag: &str, key: &str) -> Option<u32> {
    read_string_attribute(tag, key)?.parse().ok()
}
