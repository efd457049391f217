// crates/bmad-core/src/core/time.rs
// ============================================================================
// Module: BMAD Time Model
// Description: Canonical timestamp representations for workflow and audit records.
// Purpose: Provide deterministic, replayable time values across pipeline records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! BMAD threads explicit time values through workflow state, escalations, and
//! decisions to keep replay deterministic. Core logic never reads wall-clock
//! time directly; hosts supply timestamps when recording events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in BMAD workflow, escalation, and audit records.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value, used for deterministic tests and replays.
    Logical(u64),
}

impl Timestamp {
    /// Returns the timestamp as unix milliseconds when available.
    #[must_use]
    pub const fn as_unix_millis(&self) -> Option<i64> {
        match self {
            Self::UnixMillis(value) => Some(*value),
            Self::Logical(_) => None,
        }
    }

    /// Returns the timestamp as logical time when available.
    #[must_use]
    pub const fn as_logical(&self) -> Option<u64> {
        match self {
            Self::UnixMillis(_) => None,
            Self::Logical(value) => Some(*value),
        }
    }

    /// Renders the timestamp as an RFC 3339 string, used for document
    /// frontmatter and escalation logs.
    ///
    /// Logical timestamps have no calendar meaning and render as `logical:<n>`.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        match self {
            Self::UnixMillis(millis) => {
                let nanos = i128::from(*millis) * 1_000_000;
                OffsetDateTime::from_unix_timestamp_nanos(nanos)
                    .ok()
                    .and_then(|dt| dt.format(&Rfc3339).ok())
                    .unwrap_or_else(|| format!("unix_millis:{millis}"))
            }
            Self::Logical(value) => format!("logical:{value}"),
        }
    }
}
