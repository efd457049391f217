// crates/bmad-events/src/sink/callback.rs
// ============================================================================
// Module: BMAD Callback Sink
// Description: Delivers events to an arbitrary closure.
// Purpose: Give tests and embedders a zero-setup sink.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`CallbackSink`] wraps a `Fn(&EventKind) -> Result<(), SinkError>` closure.
//! Most test suites use this instead of standing up a channel or a writer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::event::EventKind;
use crate::sink::Sink;
use crate::sink::SinkError;

// ============================================================================
// SECTION: Callback Sink
// ============================================================================

/// Delivers events to a user-supplied closure.
#[derive(Clone)]
pub struct CallbackSink {
    callback: Arc<dyn Fn(&EventKind) -> Result<(), SinkError> + Send + Sync>,
}

impl CallbackSink {
    /// Creates a callback sink wrapping `callback`.
    pub fn new(callback: impl Fn(&EventKind) -> Result<(), SinkError> + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl Sink for CallbackSink {
    fn emit(&self, event: &EventKind) -> Result<(), SinkError> {
        (self.callback)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::CallbackSink;
    use crate::event::AgentEvent;
    use crate::event::EventKind;
    use crate::sink::Sink;
    use bmad_core::AgentId;
    use bmad_core::Timestamp;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[test]
    fn invokes_the_wrapped_closure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = CallbackSink::new(move |event| {
            seen_clone.lock().expect("lock").push(event.clone());
            Ok(())
        });
        let event = EventKind::Agent(AgentEvent::Completed {
            agent_id: AgentId::from("agent-1"),
            total_cost: 0.42,
            at: Timestamp::Logical(2),
        });
        sink.emit(&event).expect("callback succeeds");
        assert_eq!(seen.lock().expect("lock").len(), 1);
    }
}
