// crates/bmad-template/src/substitution.rs
// ============================================================================
// Module: BMAD Template Substitution
// Description: Replaces {{name}} placeholders with resolved variable values.
// Purpose: Provide a single substitution pass independent of section-marker
// replacement so the two can commute.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`substitute`] is a single left-to-right scan for `{{name}}` placeholders.
//! A placeholder with no entry in `variables` is left untouched in the
//! output, since a caller with a partial variable set should be able to run
//! substitution more than once as more variables become known.

use std::collections::BTreeMap;

use serde_json::Value;

/// Renders a scalar JSON value the way a template placeholder expects:
/// strings unquoted, everything else via its `Display`-like JSON rendering.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replaces every `{{name}}` placeholder in `template` with its resolved
/// value from `variables`. Placeholders with no matching entry are left
/// unchanged.
#[must_use]
pub fn substitute(template: &str, variables: &BTreeMap<String, Value>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            output.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = after_open[..end].trim();
        match variables.get(name) {
            Some(value) => output.push_str(&render_value(value)),
            None => {
                output.push_str("{{");
                output.push_str(&after_open[..end]);
                output.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::substitute;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn replaces_every_provided_placeholder() {
        let mut vars = BTreeMap::new();
        vars.insert("project_name".to_string(), json!("Orion"));
        vars.insert("year".to_string(), json!(2026));

        let rendered = substitute("# {{project_name}} ({{year}})", &vars);
        assert_eq!(rendered, "# Orion (2026)");
    }

    #[test]
    fn unprovided_placeholder_is_left_untouched() {
        let vars = BTreeMap::new();
        let rendered = substitute("Owner: {{owner}}", &vars);
        assert_eq!(rendered, "Owner: {{owner}}");
    }

    #[test]
    fn unterminated_placeholder_is_copied_verbatim() {
        let vars = BTreeMap::new();
        let rendered = substitute("broken {{oops", &vars);
        assert_eq!(rendered, "broken {{oops");
    }
}
