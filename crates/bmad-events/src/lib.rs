// crates/bmad-events/src/lib.rs
// ============================================================================
// Crate: bmad-events
// Description: Typed event kinds and sink implementations for the agent pool
// and CIS router.
// Purpose: Replace dynamic, string-keyed event listeners with a small tagged
// union delivered through an explicit Sink trait.
// Dependencies: bmad-core, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Components that emit events (the agent pool, the CIS router) hold a
//! `Vec<Box<dyn Sink>>` passed in at construction and call `emit` on every
//! sink for every event. There is no broker, no dynamic registration by
//! event name, and no ambient global dispatcher.

pub mod event;
pub mod sink;

pub use event::AgentEvent;
pub use event::CisEvent;
pub use event::EscalationEvent;
pub use event::EventKind;
pub use sink::CallbackSink;
pub use sink::ChannelSink;
pub use sink::LogSink;
pub use sink::Sink;
pub use sink::SinkError;
