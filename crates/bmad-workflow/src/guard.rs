// crates/bmad-workflow/src/guard.rs
// ============================================================================
// Module: BMAD Guard Expressions
// Description: Minimal flat-comparison guard expression evaluator.
// Purpose: Evaluate step-level and check-level `if="..."` guards against
// workflow state variables without a general expression grammar.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Guards are a single comparison, never a boolean tree: an identifier or
//! literal, an optional operator, and a right-hand identifier or literal.
//! Recognized operators are `==`, `!=`, `<`, `<=`, `>`, `>=`, `is`, and
//! `is not` (the latter two as aliases of `==`/`!=`). The bare literals
//! `true` and `false` are also valid complete guards.

use std::collections::BTreeMap;

use serde_json::Value;

/// Operators a flat comparison guard may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    /// `==` and `is`.
    Eq,
    /// `!=` and `is not`.
    NotEq,
    /// `<`.
    Lt,
    /// `<=`.
    LtEq,
    /// `>`.
    Gt,
    /// `>=`.
    GtEq,
}

/// Operator tokens in match-priority order, so `is not` is tried before `is`.
const OPERATOR_TOKENS: &[(&str, Operator)] = &[
    ("is not", Operator::NotEq),
    ("==", Operator::Eq),
    ("!=", Operator::NotEq),
    ("<=", Operator::LtEq),
    (">=", Operator::GtEq),
    ("<", Operator::Lt),
    (">", Operator::Gt),
    ("is", Operator::Eq),
];

/// Evaluates a guard expression against `variables`.
///
/// Unknown identifiers resolve to [`Value::Null`] rather than erroring, so a
/// guard referencing a variable not yet set simply evaluates to `false` for
/// equality/ordering comparisons.
#[must_use]
pub fn evaluate(expr: &str, variables: &BTreeMap<String, Value>) -> bool {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed == "true" {
        return true;
    }
    if trimmed == "false" {
        return false;
    }

    let Some((lhs, operator, rhs)) = split_on_operator(trimmed) else {
        return !resolve(trimmed, variables).is_null();
    };

    let lhs_value = resolve(lhs.trim(), variables);
    let rhs_value = resolve(rhs.trim(), variables);
    apply(operator, &lhs_value, &rhs_value)
}

/// Finds the first recognized operator token in `expr` and splits around it.
fn split_on_operator(expr: &str) -> Option<(&str, Operator, &str)> {
    for (token, operator) in OPERATOR_TOKENS {
        if let Some(pos) = find_word_boundary_token(expr, token) {
            let lhs = &expr[..pos];
            let rhs = &expr[pos + token.len()..];
            return Some((lhs, *operator, rhs));
        }
    }
    None
}

/// Finds `token` in `expr`, requiring word-boundary edges for alphabetic
/// tokens (`is`, `is not`) so it does not match inside an identifier.
fn find_word_boundary_token(expr: &str, token: &str) -> Option<usize> {
    let is_word_token = token.chars().all(|c| c.is_alphabetic() || c == ' ');
    let mut search_from = 0usize;
    while let Some(rel_pos) = expr[search_from..].find(token) {
        let pos = search_from + rel_pos;
        if !is_word_token {
            return Some(pos);
        }
        let before_ok = pos == 0 || !expr.as_bytes()[pos - 1].is_ascii_alphanumeric();
        let after_index = pos + token.len();
        let after_ok = after_index >= expr.len() || !expr.as_bytes()[after_index].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return Some(pos);
        }
        search_from = pos + token.len();
    }
    None
}

/// Resolves one operand: a single-quoted string literal, a number, a boolean
/// literal, or an identifier looked up in `variables`.
fn resolve(token: &str, variables: &BTreeMap<String, Value>) -> Value {
    if let Some(inner) = token.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return Value::String(inner.to_string());
    }
    if token == "true" {
        return Value::Bool(true);
    }
    if token == "false" {
        return Value::Bool(false);
    }
    if let Ok(number) = token.parse::<f64>() {
        return serde_json::Number::from_f64(number).map_or(Value::Null, Value::Number);
    }
    variables.get(token).cloned().unwrap_or(Value::Null)
}

/// Applies a comparison operator; ordering operators require both operands
/// to be numbers and otherwise evaluate to `false`.
fn apply(operator: Operator, lhs: &Value, rhs: &Value) -> bool {
    match operator {
        Operator::Eq => lhs == rhs,
        Operator::NotEq => lhs != rhs,
        Operator::Lt | Operator::LtEq | Operator::Gt | Operator::GtEq => {
            let (Some(left), Some(right)) = (lhs.as_f64(), rhs.as_f64()) else {
                return false;
            };
            match operator {
                Operator::Lt => left < right,
                Operator::LtEq => left <= right,
                Operator::Gt => left > right,
                Operator::GtEq => left >= right,
                Operator::Eq | Operator::NotEq => unreachable!("handled above"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::evaluate;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn vars(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn bare_boolean_literals() {
        assert!(evaluate("true", &BTreeMap::new()));
        assert!(!evaluate("false", &BTreeMap::new()));
    }

    #[test]
    fn numeric_threshold_comparison() {
        let variables = vars(&[("confidence", json!(0.8))]);
        assert!(evaluate("confidence >= 0.75", &variables));
        assert!(!evaluate("confidence < 0.75", &variables));
    }

    #[test]
    fn string_equality_with_single_quotes() {
        let variables = vars(&[("status", json!("paused"))]);
        assert!(evaluate("status == 'paused'", &variables));
        assert!(!evaluate("status == 'completed'", &variables));
    }

    #[test]
    fn is_and_is_not_aliases() {
        let variables = vars(&[("mode", json!("yolo"))]);
        assert!(evaluate("mode is 'yolo'", &variables));
        assert!(evaluate("mode is not 'interactive'", &variables));
    }

    #[test]
    fn undefined_identifier_resolves_to_null_and_inequality_holds() {
        let variables = BTreeMap::new();
        assert!(evaluate("missing_var != 'anything'", &variables));
        assert!(!evaluate("missing_var", &variables));
    }

    #[test]
    fn bare_identifier_is_truthy_when_bound_and_non_null() {
        let variables = vars(&[("needs_clarification", json!(true))]);
        assert!(evaluate("needs_clarification", &variables));
    }
}
