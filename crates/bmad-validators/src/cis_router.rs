// crates/bmad-validators/src/cis_router.rs
// ============================================================================
// Module: BMAD CIS Agent Router
// Description: Classifies a question into one of four categories, routes it
// to the matching persona agent, and enforces a per-workflow invocation cap.
// Purpose: Replace string-keyed dynamic dispatch with a typed category enum
// and a hard invocation limit enforced in one place.
// Dependencies: bmad-core, bmad-events, tokio
// ============================================================================

//! ## Overview
//! [`CisRouter::route_decision`] classifies by weighted keyword scoring
//! (ties default to technical), invokes the persona's [`LlmClient`] under a
//! configurable timeout, and tolerates a JSON response wrapped in a
//! ` ```json ` fence. The fourth call within a single router instance's
//! lifetime is rejected without ever reaching the LLM.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use bmad_core::LlmClient;
use bmad_core::LlmError;
use bmad_events::CisEvent;
use bmad_events::EventKind;
use bmad_events::Sink;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

/// Default hard cap on CIS invocations within one workflow.
pub const DEFAULT_INVOCATION_LIMIT: u32 = 3;

/// Default LLM invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the CIS router.
#[derive(Debug, Error)]
pub enum CisError {
    /// The per-workflow invocation cap was already reached.
    #[error("CIS invocation limit exceeded: {count} of {limit}")]
    LimitExceeded {
        /// Invocations already recorded.
        count: u32,
        /// The configured cap.
        limit: u32,
    },
    /// The underlying LLM invocation failed.
    #[error(transparent)]
    Llm(#[from] LlmError),
    /// The invocation did not complete within the configured timeout.
    #[error("CIS invocation timed out after {0:?}")]
    Timeout(Duration),
}

// ============================================================================
// SECTION: Category
// ============================================================================

/// The four decision categories the router classifies a question into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CisCategory {
    /// Architecture, infrastructure, and implementation questions.
    Technical,
    /// User experience and interaction design questions.
    Ux,
    /// Market, roadmap, and business questions.
    Product,
    /// Novel or exploratory questions with no established playbook.
    Innovation,
}

impl CisCategory {
    /// Returns the persona agent name this category routes to.
    #[must_use]
    pub const fn persona(self) -> &'static str {
        match self {
            Self::Technical => "murat",
            Self::Ux => "sally",
            Self::Product => "john",
            Self::Innovation => "winston",
        }
    }
}

const TECHNICAL_KEYWORDS: &[&str] = &["architecture", "database", "api", "performance", "scalability", "infrastructure", "algorithm", "latency"];
const UX_KEYWORDS: &[&str] = &["user experience", "usability", "interface", "design", "accessibility", "interaction", "wireframe"];
const PRODUCT_KEYWORDS: &[&str] = &["market", "roadmap", "feature", "pricing", "customer", "business", "strategy"];
const INNOVATION_KEYWORDS: &[&str] = &["novel", "experiment", "prototype", "emerging", "disrupt", "research", "cutting-edge"];

/// Classifies `question` by weighted keyword overlap; ties default to
/// [`CisCategory::Technical`] since it is checked first and strictly greater
/// scores are required to displace it.
#[must_use]
pub fn classify(question: &str) -> CisCategory {
    let lower = question.to_lowercase();
    let scores = [
        (CisCategory::Technical, count_matches(&lower, TECHNICAL_KEYWORDS)),
        (CisCategory::Ux, count_matches(&lower, UX_KEYWORDS)),
        (CisCategory::Product, count_matches(&lower, PRODUCT_KEYWORDS)),
        (CisCategory::Innovation, count_matches(&lower, INNOVATION_KEYWORDS)),
    ];
    let mut best = scores[0];
    for candidate in &scores[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    best.0
}

fn count_matches(lower: &str, keywords: &[&str]) -> u32 {
    let mut count = 0u32;
    for keyword in keywords {
        if lower.contains(keyword) {
            count += 1;
        }
    }
    count
}

// ============================================================================
// SECTION: Response Parsing
// ============================================================================

/// Parses an LLM response that may be raw JSON or JSON wrapped in a
/// ` ```json ` fence. A response that cannot be parsed degrades to a
/// default object rather than propagating an error.
#[must_use]
pub fn parse_tolerant_json(raw: &str) -> Value {
    let trimmed = raw.trim();
    let candidate = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(str::trim_start)
        .and_then(|body| body.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    serde_json::from_str(candidate).unwrap_or_else(|_| json!({ "recommendation": "No recommendation provided" }))
}

// ============================================================================
// SECTION: Invocation History
// ============================================================================

/// One recorded CIS invocation attempt.
#[derive(Debug, Clone)]
pub struct CisInvocationRecord {
    /// The question routed.
    pub decision: String,
    /// The category it was classified into.
    pub category: CisCategory,
    /// The persona agent invoked.
    pub agent: String,
    /// Whether the invocation succeeded.
    pub success: bool,
}

/// The parsed result of a successful routed decision.
#[derive(Debug, Clone)]
pub struct CisResponse {
    /// The category the question was classified into.
    pub category: CisCategory,
    /// The persona agent that answered.
    pub agent: String,
    /// The parsed (or degraded-default) JSON content.
    pub content: Value,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Configuration for a [`CisRouter`].
#[derive(Debug, Clone, Copy)]
pub struct CisRouterConfig {
    /// Hard cap on invocations across this router's lifetime.
    pub invocation_limit: u32,
    /// Per-invocation LLM timeout.
    pub timeout: Duration,
}

impl Default for CisRouterConfig {
    fn default() -> Self {
        Self { invocation_limit: DEFAULT_INVOCATION_LIMIT, timeout: DEFAULT_TIMEOUT }
    }
}

struct RouterState {
    count: u32,
    history: Vec<CisInvocationRecord>,
}

/// Classifies questions, routes them to a persona agent, and enforces the
/// per-workflow invocation cap.
pub struct CisRouter {
    config: CisRouterConfig,
    llm_client: Arc<dyn LlmClient>,
    sinks: Vec<Box<dyn Sink>>,
    state: Mutex<RouterState>,
}

impl CisRouter {
    /// Creates a router with the given configuration, LLM client, and event sinks.
    #[must_use]
    pub fn new(config: CisRouterConfig, llm_client: Arc<dyn LlmClient>, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { config, llm_client, sinks, state: Mutex::new(RouterState { count: 0, history: Vec::new() }) }
    }

    fn emit(&self, event: &EventKind) {
        for sink in &self.sinks {
            let _ = sink.emit(event);
        }
    }

    /// Classifies and routes `question`, enforcing the invocation cap.
    ///
    /// # Errors
    ///
    /// Returns [`CisError::LimitExceeded`] if the cap is already reached,
    /// [`CisError::Timeout`] if the LLM does not respond in time, or
    /// [`CisError::Llm`] on an underlying provider failure.
    pub async fn route_decision(&self, question: &str, prompt: &str) -> Result<CisResponse, CisError> {
        {
            let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if state.count >= self.config.invocation_limit {
                let count = state.count;
                let limit = self.config.invocation_limit;
                drop(state);
                self.emit(&EventKind::Cis(CisEvent::LimitExceeded { decision: question.to_string(), count, limit }));
                return Err(CisError::LimitExceeded { count, limit });
            }
        }

        let category = classify(question);
        let agent = category.persona().to_string();

        let outcome = tokio::time::timeout(self.config.timeout, self.llm_client.invoke(prompt, 0.3)).await;

        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match outcome {
            Ok(Ok(raw)) => {
                state.count += 1;
                let count = state.count;
                state.history.push(CisInvocationRecord { decision: question.to_string(), category, agent: agent.clone(), success: true });
                drop(state);
                self.emit(&EventKind::Cis(CisEvent::Success { agent: agent.clone(), decision: question.to_string(), count }));
                Ok(CisResponse { category, agent, content: parse_tolerant_json(&raw) })
            }
            Ok(Err(err)) => {
                state.count += 1;
                state.history.push(CisInvocationRecord { decision: question.to_string(), category, agent: agent.clone(), success: false });
                drop(state);
                self.emit(&EventKind::Cis(CisEvent::Error { agent: agent.clone(), decision: question.to_string(), error: err.to_string() }));
                Err(CisError::Llm(err))
            }
            Err(_elapsed) => {
                state.count += 1;
                state.history.push(CisInvocationRecord { decision: question.to_string(), category, agent: agent.clone(), success: false });
                drop(state);
                let timeout = self.config.timeout;
                self.emit(&EventKind::Cis(CisEvent::Error { agent, decision: question.to_string(), error: format!("timed out after {timeout:?}") }));
                Err(CisError::Timeout(timeout))
            }
        }
    }

    /// Returns a snapshot of every invocation attempted so far, in call order.
    #[must_use]
    pub fn history(&self) -> Vec<CisInvocationRecord> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).history.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::CisCategory;
    use super::classify;
    use super::parse_tolerant_json;

    #[test]
    fn classifies_by_keyword_overlap() {
        assert!(matches!(classify("How should we structure the database architecture?"), CisCategory::Technical));
        assert!(matches!(classify("Is the new onboarding interface usable?"), CisCategory::Ux));
        assert!(matches!(classify("What pricing strategy fits this market?"), CisCategory::Product));
    }

    #[test]
    fn tie_defaults_to_technical() {
        assert!(matches!(classify("What should we do next?"), CisCategory::Technical));
    }

    #[test]
    fn fenced_json_response_parses() {
        let value = parse_tolerant_json("```json\n{\"decision\": \"yes\"}\n```");
        assert_eq!(value["decision"], "yes");
    }

    #[test]
    fn unparsable_response_degrades_to_default() {
        let value = parse_tolerant_json("not json");
        assert_eq!(value["recommendation"], "No recommendation provided");
    }
}
