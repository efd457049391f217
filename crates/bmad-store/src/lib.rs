// crates/bmad-store/src/lib.rs
// ============================================================================
// Crate: bmad-store
// Description: Atomic, per-project filesystem persistence for workflow state.
// Purpose: Give the workflow engine a crash-safe save/load/purge cycle behind
// a capability-scoped directory handle.
// ============================================================================

//! ## Overview
//! `bmad-store` owns exactly one durable concern: [`WorkflowState`](bmad_core::WorkflowState)
//! persistence. Escalations are persisted independently by `bmad-escalation`,
//! since each escalation is its own file and does not need the cache or
//! whole-state atomicity this crate provides.

pub mod store;

pub use store::StateStore;
pub use store::StoreError;
