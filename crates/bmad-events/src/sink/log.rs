// crates/bmad-events/src/sink/log.rs
// ============================================================================
// Module: BMAD Log Sink
// Description: Writes newline-delimited JSON events to a shared writer.
// Purpose: Replace ad hoc console logging with a structured, swappable sink.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! [`LogSink`] serializes each event to one line of JSON and writes it to any
//! `Write` implementation behind a mutex, so it can back a file, stdout, or
//! an in-memory buffer in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use crate::event::EventKind;
use crate::sink::Sink;
use crate::sink::SinkError;

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Writes one line of JSON per event to a shared writer.
pub struct LogSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LogSink<W> {
    /// Creates a log sink writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> Sink for LogSink<W> {
    fn emit(&self, event: &EventKind) -> Result<(), SinkError> {
        let line = serde_json::to_string(event).map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        writeln!(writer, "{line}").map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        writer.flush().map_err(|err| SinkError::LogWriteFailed(err.to_string()))
    }
}
