// crates/bmad-pool/src/lib.rs
// ============================================================================
// Crate: bmad-pool
// Description: Capacity-limited agent pool with FIFO queueing and cost
// accounting.
// Purpose: Own agent scheduling and lifecycle event emission, separate from
// the data shapes defined in bmad-core.
// ============================================================================

//! ## Overview
//! `bmad-pool` depends on `bmad-core` for the `Agent`/`AgentContext` shapes
//! and `LlmClient` capability, and on `bmad-events` for lifecycle event
//! delivery. It owns no persistence; callers that need durable agent history
//! consume the emitted events themselves.

pub mod engine;

pub use engine::AgentPool;
pub use engine::AgentPoolConfig;
pub use engine::DEFAULT_HEARTBEAT_TIMEOUT;
pub use engine::PoolError;
