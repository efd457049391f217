// crates/bmad-decision/src/engine.rs
// ============================================================================
// Module: BMAD Decision Engine
// Description: Answers a question with a confidence-scored Decision, checking
// onboarding documents before falling back to an LLM.
// Purpose: Implement the onboarding-priority decision algorithm with a
// per-instance audit trail.
// Dependencies: bmad-core, thiserror
// ============================================================================

//! ## Overview
//! [`DecisionEngine`] first scans any configured onboarding directory for a
//! keyword match; a match short-circuits to `source = onboarding` at a
//! pinned confidence of `0.95`. Otherwise it invokes the configured
//! [`LlmClient`] and parses a structured response. Every call appends one
//! entry to an in-memory audit trail scoped to the engine instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use bmad_core::Confidence;
use bmad_core::ConfidenceThreshold;
use bmad_core::Decision;
use bmad_core::DecisionSource;
use bmad_core::LlmClient;
use bmad_core::LlmError;
use bmad_core::Timestamp;
use bmad_core::escalation_marker;
use cap_std::fs::Dir;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

const LLM_TEMPERATURE: f64 = 0.3;
const STOPWORDS: &[&str] = &["the", "a", "an", "is", "are", "how", "do", "i", "to", "for", "of", "in", "on", "and", "or"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the decision engine.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The LLM invocation failed.
    #[error(transparent)]
    Llm(#[from] LlmError),
    /// The onboarding directory could not be scanned.
    #[error("failed to scan onboarding directory: {0}")]
    OnboardingScan(String),
}

// ============================================================================
// SECTION: Structured LLM Response
// ============================================================================

/// The structured fields a decision-seeking LLM prompt asks for.
#[derive(Debug, Clone, serde::Deserialize)]
struct StructuredResponse {
    decision: String,
    reasoning: String,
    confidence: f64,
}

impl Default for StructuredResponse {
    fn default() -> Self {
        Self {
            decision: "No recommendation provided".to_string(),
            reasoning: "the model response could not be parsed".to_string(),
            confidence: 0.0,
        }
    }
}

/// Parses an LLM response that may be raw JSON or JSON wrapped in a
/// ```json fence. A response that cannot be parsed degrades to
/// [`StructuredResponse::default`] rather than propagating an error.
fn parse_structured_response(raw: &str) -> StructuredResponse {
    let trimmed = raw.trim();
    let candidate = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(str::trim_start)
        .and_then(|body| body.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    serde_json::from_str(candidate).unwrap_or_default()
}

// ============================================================================
// SECTION: Onboarding Matching
// ============================================================================

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| word.len() > 2 && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// Returns the name of the first onboarding document whose content shares a
/// keyword with `question`, if any.
fn find_onboarding_match(root: &Dir, question: &str) -> Result<Option<(String, String)>, DecisionError> {
    let question_keywords: std::collections::HashSet<String> = tokenize(question).into_iter().collect();
    if question_keywords.is_empty() {
        return Ok(None);
    }

    let entries = match root.entries() {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(DecisionError::OnboardingScan(err.to_string())),
    };

    for entry in entries {
        let entry = entry.map_err(|err| DecisionError::OnboardingScan(err.to_string()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy().to_string();
        if !name.ends_with(".md") {
            continue;
        }
        let Ok(bytes) = root.read(&name) else { continue };
        let content = String::from_utf8_lossy(&bytes);
        let doc_keywords: std::collections::HashSet<String> = tokenize(&content).into_iter().collect();
        if question_keywords.intersection(&doc_keywords).next().is_some() {
            return Ok(Some((name, content.to_string())));
        }
    }
    Ok(None)
}

// ============================================================================
// SECTION: Decision Engine
// ============================================================================

/// Answers questions autonomously, consulting onboarding documents before an LLM.
pub struct DecisionEngine {
    onboarding_root: Option<Dir>,
    llm_client: Arc<dyn LlmClient>,
    escalation_threshold: ConfidenceThreshold,
    audit_trail: Mutex<Vec<Decision>>,
}

impl DecisionEngine {
    /// Creates a decision engine with an optional onboarding directory and
    /// the given escalation threshold.
    #[must_use]
    pub fn new(onboarding_root: Option<Dir>, llm_client: Arc<dyn LlmClient>, escalation_threshold: ConfidenceThreshold) -> Self {
        Self {
            onboarding_root,
            llm_client,
            escalation_threshold,
            audit_trail: Mutex::new(Vec::new()),
        }
    }

    /// Answers `question`, preferring an onboarding-document match over an
    /// LLM invocation, and records the result in the audit trail.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if onboarding scanning or LLM invocation fails.
    pub async fn attempt_autonomous_decision(&self, question: &str, now: Timestamp) -> Result<Decision, DecisionError> {
        let decision = if let Some(root) = &self.onboarding_root {
            if let Some((doc_name, _)) = find_onboarding_match(root, question)? {
                Decision {
                    question: question.to_string(),
                    decision_text: format!("See {doc_name}"),
                    confidence: Confidence::ONBOARDING,
                    reasoning: format!("matched onboarding document '{doc_name}'"),
                    source: DecisionSource::Onboarding,
                    timestamp: now,
                    context: json!({ "onboarding_document": doc_name }),
                }
            } else {
                self.decide_via_llm(question, now).await?
            }
        } else {
            self.decide_via_llm(question, now).await?
        };

        self.audit_trail.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(decision.clone());
        Ok(decision)
    }

    async fn decide_via_llm(&self, question: &str, now: Timestamp) -> Result<Decision, DecisionError> {
        let prompt = format!(
            "Answer the following question. Respond as JSON with fields \
             \"decision\", \"reasoning\", and \"confidence\" (0.0-1.0).\n\nQuestion: {question}"
        );
        let raw = self.llm_client.invoke(&prompt, LLM_TEMPERATURE).await?;
        let parsed = parse_structured_response(&raw);
        let confidence = Confidence::new(parsed.confidence);

        let reasoning = if confidence.below(self.escalation_threshold) {
            format!("{} — {}", parsed.reasoning, escalation_marker(self.escalation_threshold))
        } else {
            parsed.reasoning
        };

        Ok(Decision {
            question: question.to_string(),
            decision_text: parsed.decision,
            confidence,
            reasoning,
            source: DecisionSource::Llm,
            timestamp: now,
            context: Value::Null,
        })
    }

    /// Returns a snapshot of every decision made by this engine instance.
    #[must_use]
    pub fn audit_trail(&self) -> Vec<Decision> {
        self.audit_trail.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::DecisionEngine;
    use bmad_core::ConfidenceThreshold;
    use bmad_core::DecisionSource;
    use bmad_core::StubLlmClient;
    use bmad_core::Timestamp;
    use cap_std::ambient_authority;
    use cap_std::fs::Dir;
    use std::sync::Arc;

    fn open_temp_root() -> (tempfile::TempDir, Dir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cap = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("open ambient dir");
        (dir, cap)
    }

    #[tokio::test]
    async fn onboarding_match_wins_over_llm() {
        let (_guard, root) = open_temp_root();
        root.write("setup.md", b"Project setup steps: run install then configure the environment.")
            .expect("write onboarding doc");

        let llm = Arc::new(StubLlmClient::new("{}"));
        let engine = DecisionEngine::new(Some(root), llm, ConfidenceThreshold::DECISION_ESCALATION);

        let decision = engine
            .attempt_autonomous_decision("How do I set up the project?", Timestamp::Logical(1))
            .await
            .expect("decision succeeds");
        assert_eq!(decision.source, DecisionSource::Onboarding);
        assert_eq!(decision.confidence.value(), 0.95);
    }

    #[tokio::test]
    async fn unrelated_question_falls_back_to_llm() {
        let (_guard, root) = open_temp_root();
        root.write("setup.md", b"Project setup steps: run install then configure the environment.")
            .expect("write onboarding doc");

        let llm = Arc::new(StubLlmClient::new(
            r#"{"decision": "yes", "reasoning": "strong signal", "confidence": 0.9}"#,
        ));
        let engine = DecisionEngine::new(Some(root), llm, ConfidenceThreshold::DECISION_ESCALATION);

        let decision = engine
            .attempt_autonomous_decision("Should we migrate the payment gateway?", Timestamp::Logical(1))
            .await
            .expect("decision succeeds");
        assert_eq!(decision.source, DecisionSource::Llm);
        assert!((decision.confidence.value() - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn low_confidence_llm_answer_carries_escalation_marker() {
        let llm = Arc::new(StubLlmClient::new(
            r#"{"decision": "unclear", "reasoning": "ambiguous requirement", "confidence": 0.4}"#,
        ));
        let engine = DecisionEngine::new(None, llm, ConfidenceThreshold::DECISION_ESCALATION);

        let decision = engine
            .attempt_autonomous_decision("Use microservices?", Timestamp::Logical(1))
            .await
            .expect("decision succeeds");
        assert!(decision.reasoning.contains("ESCALATION REQUIRED"));
    }

    #[tokio::test]
    async fn response_wrapped_in_code_fence_is_parsed() {
        let llm = Arc::new(StubLlmClient::new(
            "```json\n{\"decision\": \"yes\", \"reasoning\": \"fenced\", \"confidence\": 0.8}\n```",
        ));
        let engine = DecisionEngine::new(None, llm, ConfidenceThreshold::DECISION_ESCALATION);

        let decision = engine
            .attempt_autonomous_decision("Any question", Timestamp::Logical(1))
            .await
            .expect("decision succeeds");
        assert_eq!(decision.decision_text, "yes");
    }

    #[tokio::test]
    async fn unparsable_response_degrades_to_defaults() {
        let llm = Arc::new(StubLlmClient::new("not json at all"));
        let engine = DecisionEngine::new(None, llm, ConfidenceThreshold::DECISION_ESCALATION);

        let decision = engine
            .attempt_autonomous_decision("Any question", Timestamp::Logical(1))
            .await
            .expect("decision succeeds");
        assert_eq!(decision.decision_text, "No recommendation provided");
    }
}
