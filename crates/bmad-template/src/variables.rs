// crates/bmad-template/src/variables.rs
// ============================================================================
// Module: BMAD Template Variable Resolution
// Description: Five-tier variable resolution for document templates.
// Purpose: Merge explicit arguments, workflow state, project config, git
// identity, and system defaults into one variable map, highest priority wins.
// Dependencies: bmad-core, serde_json, serde_yaml, time
// ============================================================================

//! ## Overview
//! [`resolve_variables`] applies five sources in descending priority: explicit
//! arguments, the workflow state snapshot, project-config YAML, git identity,
//! and system defaults. A missing or unparseable lower-priority source
//! degrades silently; only explicit arguments are guaranteed to win.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use bmad_core::Timestamp;
use bmad_core::WorkflowState;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves template variables from all five sources, highest priority first.
///
/// `project_config_path`, when given, is read as YAML; a missing or
/// unparseable file is treated as an absent source rather than an error.
/// `now` seeds the system-default `date`/`timestamp`/`year` entries.
#[must_use]
pub fn resolve_variables(
    explicit_args: &BTreeMap<String, Value>,
    workflow_state: Option<&WorkflowState>,
    project_config_path: Option<&Path>,
    now: Timestamp,
) -> BTreeMap<String, Value> {
    let mut resolved = system_defaults(now);

    if let Some((name, email)) = probe_git_identity() {
        resolved.insert("user_name".to_string(), json!(name));
        resolved.insert("user_email".to_string(), json!(email));
    }

    if let Some(path) = project_config_path {
        for (key, value) in load_project_config_variables(path) {
            resolved.insert(key, value);
        }
    }

    if let Some(state) = workflow_state {
        resolved.insert("project_id".to_string(), json!(state.project_id.as_str()));
        resolved.insert("workflow_id".to_string(), json!(state.workflow_id.as_str()));
        resolved.insert("current_step".to_string(), json!(state.current_step));
        for (key, value) in &state.variables {
            resolved.insert(key.clone(), value.clone());
        }
    }

    for (key, value) in explicit_args {
        resolved.insert(key.clone(), value.clone());
    }

    resolved
}

/// System-default variables: `date` (`YYYY-MM-DD`), `timestamp` (RFC 3339), `year`.
fn system_defaults(now: Timestamp) -> BTreeMap<String, Value> {
    let mut defaults = BTreeMap::new();
    defaults.insert("timestamp".to_string(), json!(now.to_rfc3339()));

    if let Some(millis) = now.as_unix_millis() {
        let nanos = i128::from(millis) * 1_000_000;
        if let Ok(dt) = OffsetDateTime::from_unix_timestamp_nanos(nanos) {
            defaults.insert("date".to_string(), json!(format!("{:04}-{:02}-{:02}", dt.year(), u8::from(dt.month()), dt.day())));
            defaults.insert("year".to_string(), json!(dt.year()));
        }
    }

    defaults
}

/// Reads `user.name`/`user.email` from the local git configuration, if `git`
/// is installed and a value is set. Returns `None` on any failure.
fn probe_git_identity() -> Option<(String, String)> {
    let name = run_git_config("user.name")?;
    let email = run_git_config("user.email")?;
    Some((name, email))
}

/// Runs `git config --get <key>` and returns the trimmed value, or `None` on
/// any failure (git not installed, not a repo, key unset).
fn run_git_config(key: &str) -> Option<String> {
    let output = Command::new("git").args(["config", "--get", key]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// Reads top-level scalar/sequence entries from a YAML project config file as
/// template variables. Returns an empty map on any read or parse failure.
fn load_project_config_variables(path: &Path) -> BTreeMap<String, Value> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return BTreeMap::new();
    };
    let Ok(parsed) = serde_yaml::from_str::<Value>(&contents) else {
        return BTreeMap::new();
    };
    let Value::Object(map) = flatten_project_config(parsed) else {
        return BTreeMap::new();
    };
    map.into_iter().collect()
}

/// Flattens one level of nesting so `project.name` in YAML becomes the
/// `project_name` template variable, matching the dotted keys templates use.
fn flatten_project_config(value: Value) -> Value {
    let Value::Object(top) = value else { return Value::Null };
    let mut flat = serde_json::Map::new();
    for (section, body) in top {
        match body {
            Value::Object(fields) => {
                for (field, field_value) in fields {
                    flat.insert(format!("{section}_{field}"), field_value);
                }
            }
            other => {
                flat.insert(section, other);
            }
        }
    }
    Value::Object(flat)
}
