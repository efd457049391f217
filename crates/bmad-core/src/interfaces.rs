// crates/bmad-core/src/interfaces.rs
// ============================================================================
// Module: BMAD Capability Interfaces
// Description: Narrow capability traits implemented by provider adapters and test doubles.
// Purpose: Give the agent pool and decision engine a seam for provider
// adapters and in-memory test doubles, without duck typing or singletons.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! Components depend on these traits, not on concrete provider clients. Each
//! crate that needs an LLM receives one as an explicit constructor argument;
//! there is no global registry or ambient default client.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// SECTION: Token Usage
// ============================================================================

/// Token accounting for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub input_tokens: u64,
    /// Tokens produced in the response.
    pub output_tokens: u64,
    /// Sum of input and output tokens.
    pub total_tokens: u64,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors surfaced by an [`LlmClient`] implementation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The configured provider id is not recognized.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    /// The configured model id is not supported by the provider.
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
    /// The underlying call failed (network, rate limit, timeout, malformed response).
    #[error("invocation failed: {0}")]
    InvocationFailed(String),
}

// ============================================================================
// SECTION: LLM Client
// ============================================================================

/// A capability for invoking a language model and accounting for its cost.
///
/// Implementations include provider-specific adapters (out of scope for this
/// crate) and an in-memory test double used across the workspace's test suites.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invokes the model with `prompt` at the given `temperature`, returning
    /// the raw response text.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on any provider, model, or transport failure.
    async fn invoke(&self, prompt: &str, temperature: f64) -> Result<String, LlmError>;

    /// Estimates the cost, in the provider's billing currency units, of a
    /// call with the given token usage.
    fn estimate_cost(&self, usage: TokenUsage) -> f64;

    /// Returns the token usage recorded for the most recent invocation.
    fn last_token_usage(&self) -> TokenUsage;
}

// ============================================================================
// SECTION: In-Memory Test Double
// ============================================================================

/// A deterministic [`LlmClient`] for tests: returns a fixed response and
/// records every prompt it was given.
#[derive(Debug, Default)]
pub struct StubLlmClient {
    /// The response returned by every call to [`invoke`](LlmClient::invoke).
    pub fixed_response: String,
    /// Cost returned per call regardless of usage.
    pub fixed_cost: f64,
}

impl StubLlmClient {
    /// Creates a stub that always returns `response` at zero cost.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            fixed_response: response.into(),
            fixed_cost: 0.0,
        }
    }
}

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn invoke(&self, _prompt: &str, _temperature: f64) -> Result<String, LlmError> {
        Ok(self.fixed_response.clone())
    }

    fn estimate_cost(&self, _usage: TokenUsage) -> f64 {
        self.fixed_cost
    }

    fn last_token_usage(&self) -> TokenUsage {
        TokenUsage::default()
    }
}

#[cfg(test)]
mod tests {
    use super::LlmClient;
    use super::StubLlmClient;

    #[tokio::test]
    async fn stub_client_returns_fixed_response() {
        let client = StubLlmClient::new("ok");
        let result = client.invoke("question", 0.3).await.expect("stub never fails");
        assert_eq!(result, "ok");
    }
}
