// crates/bmad-events/src/sink/mod.rs
// ============================================================================
// Module: BMAD Event Sinks
// Description: Sink trait and reference implementations for event delivery.
// Purpose: Deliver typed events to a log, a channel, or a callback.
// Dependencies: bmad-core, thiserror, std
// ============================================================================

//! ## Overview
//! A [`Sink`] delivers one [`EventKind`](crate::event::EventKind) at a time.
//! There is no broker or dynamic listener registry: a component holds a
//! `Box<dyn Sink>` (or several) passed in at construction and calls `emit`
//! directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::event::EventKind;

// ============================================================================
// SECTION: Sink Errors
// ============================================================================

/// Errors emitted by event sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The log sink failed to write a line.
    #[error("log write failed: {0}")]
    LogWriteFailed(String),
    /// The channel sink's receiver has been dropped.
    #[error("channel send failed: {0}")]
    ChannelClosed(String),
    /// The callback sink's closure returned an error.
    #[error("callback failed: {0}")]
    CallbackFailed(String),
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Delivers one event to wherever the sink is configured to send it.
pub trait Sink: Send + Sync {
    /// Delivers `event`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when delivery fails. A failing sink must not
    /// partially deliver; callers that fan an event out to multiple sinks
    /// treat each sink independently.
    fn emit(&self, event: &EventKind) -> Result<(), SinkError>;
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod callback;
pub mod channel;
pub mod log;

pub use callback::CallbackSink;
pub use channel::ChannelSink;
pub use log::LogSink;
