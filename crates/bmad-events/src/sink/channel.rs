// crates/bmad-events/src/sink/channel.rs
// ============================================================================
// Module: BMAD Channel Sink
// Description: Delivers events over a tokio mpsc channel.
// Purpose: Let an async observer consume events without polling a log file.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`ChannelSink`] wraps a bounded `tokio::sync::mpsc::Sender`. Delivery is
//! synchronous from the emitter's point of view (`try_send`); a full channel
//! is a delivery failure rather than a blocking point, so a slow consumer
//! cannot stall the agent pool or CIS router.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;

use crate::event::EventKind;
use crate::sink::Sink;
use crate::sink::SinkError;

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Delivers events to a bounded `tokio::sync::mpsc` channel.
pub struct ChannelSink {
    sender: Sender<EventKind>,
}

impl ChannelSink {
    /// Creates a channel sink wrapping `sender`.
    #[must_use]
    pub const fn new(sender: Sender<EventKind>) -> Self {
        Self { sender }
    }
}

impl Sink for ChannelSink {
    fn emit(&self, event: &EventKind) -> Result<(), SinkError> {
        self.sender.try_send(event.clone()).map_err(|err| match err {
            TrySendError::Full(_) => SinkError::ChannelClosed("channel full".to_string()),
            TrySendError::Closed(_) => SinkError::ChannelClosed("receiver dropped".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ChannelSink;
    use crate::event::AgentEvent;
    use crate::event::EventKind;
    use crate::sink::Sink;
    use bmad_core::AgentId;
    use bmad_core::Timestamp;

    #[tokio::test]
    async fn delivers_event_to_receiver() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let sink = ChannelSink::new(tx);
        let event = EventKind::Agent(AgentEvent::Invoked {
            agent_id: AgentId::from("agent-1"),
            at: Timestamp::Logical(1),
        });
        sink.emit(&event).expect("channel has capacity");
        let received = rx.recv().await.expect("receiver open");
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn closed_receiver_is_a_delivery_error() {
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        drop(rx);
        let sink = ChannelSink::new(tx);
        let event = EventKind::Agent(AgentEvent::Invoked {
            agent_id: AgentId::from("agent-1"),
            at: Timestamp::Logical(1),
        });
        assert!(sink.emit(&event).is_err());
    }
}
