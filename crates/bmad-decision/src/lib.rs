// crates/bmad-decision/src/lib.rs
// ============================================================================
// Crate: bmad-decision
// Description: Confidence-thresholded autonomous decision engine.
// Purpose: Combine onboarding-document lookup with LLM invocation to answer
// a question, flagging low-confidence answers for escalation.
// ============================================================================

//! ## Overview
//! `bmad-decision` depends only on `bmad-core`'s [`LlmClient`](bmad_core::LlmClient)
//! capability trait, never a concrete provider client. Callers that need to
//! act on a low-confidence [`Decision`](bmad_core::Decision) pass its
//! reasoning to `bmad-escalation` themselves; this crate only flags.

pub mod engine;

pub use engine::DecisionEngine;
pub use engine::DecisionError;
