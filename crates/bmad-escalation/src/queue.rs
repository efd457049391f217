// crates/bmad-escalation/src/queue.rs
// ============================================================================
// Module: BMAD Escalation Queue
// Description: Filesystem-backed durable queue of pending human-input requests.
// Purpose: Implement add/respond/getById/list/getMetrics over one JSON file
// per escalation, with no global lock required across escalations.
// Dependencies: bmad-core, cap-std, rand, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every escalation is its own file named `<id>.json` under a capability-
//! scoped directory. `add` creates a new file; `respond` rewrites an existing
//! one; `list` and `getMetrics` enumerate the directory and see a snapshot at
//! the time of enumeration. A filesystem-backed queue has enough semantics
//! for this workload: single-consumer-per-id, multi-producer, no shared lock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use bmad_core::Confidence;
use bmad_core::Escalation;
use bmad_core::EscalationId;
use bmad_core::EscalationResponse;
use bmad_core::EscalationStatus;
use bmad_core::Timestamp;
use bmad_core::WorkflowId;
use bmad_events::EscalationEvent;
use bmad_events::EventKind;
use bmad_events::Sink;
use cap_std::fs::Dir;
use rand::Rng;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the escalation queue.
#[derive(Debug, Error)]
pub enum EscalationError {
    /// No escalation exists with the given id.
    #[error("escalation not found: {0}")]
    NotFound(EscalationId),
    /// `respond` was called on an escalation that is not pending.
    #[error("escalation is not pending: {0}")]
    NotPending(EscalationId),
    /// A filesystem operation failed.
    #[error("escalation queue io error: {0}")]
    Io(String),
    /// The escalation record could not be (de)serialized.
    #[error("escalation queue serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for EscalationError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// ============================================================================
// SECTION: Id Generation
// ============================================================================

/// Generates an id of the form `esc-<unix-ms>-<rand>`.
///
/// `created_at` must be a [`Timestamp::UnixMillis`] value; other variants
/// render their logical value in place of the millisecond component.
fn generate_id(created_at: Timestamp) -> EscalationId {
    let millis = created_at
        .as_unix_millis()
        .or_else(|| created_at.as_logical().and_then(|logical| i64::try_from(logical).ok()))
        .unwrap_or(0);
    let suffix: String = {
        let mut rng = rand::thread_rng();
        (0..6).map(|_| char::from(rng.sample(rand::distributions::Alphanumeric))).collect()
    };
    EscalationId::from(format!("esc-{millis}-{}", suffix.to_lowercase()))
}

// ============================================================================
// SECTION: Queue
// ============================================================================

/// A durable, filesystem-backed escalation queue.
pub struct EscalationQueue {
    root: Dir,
    /// Notification destinations, invoked on every new escalation.
    sinks: Vec<Box<dyn Sink>>,
}

/// Optional filters for [`EscalationQueue::list`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Restrict to escalations with this status.
    pub status: Option<EscalationStatus>,
    /// Restrict to escalations from this workflow.
    pub workflow_id: Option<WorkflowId>,
}

/// Aggregate operational metrics over all escalations.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationMetrics {
    /// Total escalations ever created.
    pub total_escalations: usize,
    /// Number resolved.
    pub resolved_count: usize,
    /// Mean resolution time in milliseconds, over resolved escalations only.
    pub average_resolution_time_ms: f64,
    /// Count of escalations per workflow id.
    pub category_breakdown: BTreeMap<String, usize>,
}

impl EscalationQueue {
    /// Creates a queue rooted at `root`, the `.bmad/escalations` directory
    /// capability, notifying `sinks` on every new escalation.
    #[must_use]
    pub fn new(root: Dir, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { root, sinks }
    }

    /// Delivers `event` to every configured sink, ignoring individual sink failures.
    fn notify(&self, event: EscalationEvent) {
        let kind = EventKind::Escalation(event);
        for sink in &self.sinks {
            let _ = sink.emit(&kind);
        }
    }

    fn file_name(id: &EscalationId) -> String {
        format!("{id}.json")
    }

    fn read_all(&self) -> Result<Vec<Escalation>, EscalationError> {
        let mut escalations = Vec::new();
        let entries = match self.root.entries() {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.ends_with(".json") {
                continue;
            }
            let bytes = self.root.read(name.as_ref())?;
            let escalation: Escalation =
                serde_json::from_slice(&bytes).map_err(|err| EscalationError::Serialization(err.to_string()))?;
            escalations.push(escalation);
        }
        Ok(escalations)
    }

    fn write(&self, escalation: &Escalation) -> Result<(), EscalationError> {
        let bytes = serde_json::to_vec_pretty(escalation).map_err(|err| EscalationError::Serialization(err.to_string()))?;
        let name = Self::file_name(&escalation.id);
        let tmp_name = format!("{name}.tmp");
        {
            use std::io::Write;
            let mut tmp = self.root.create(&tmp_name)?;
            tmp.write_all(&bytes)?;
            tmp.sync_all()?;
        }
        self.root.rename(&tmp_name, &self.root, &name)?;
        Ok(())
    }

    /// Creates and persists a new pending escalation, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError`] on filesystem or serialization failure.
    #[allow(clippy::too_many_arguments, reason = "mirrors the escalation record's own field count")]
    pub fn add(
        &self,
        workflow_id: WorkflowId,
        step: u32,
        question: impl Into<String>,
        ai_reasoning: impl Into<String>,
        confidence: Confidence,
        context: Value,
        created_at: Timestamp,
    ) -> Result<EscalationId, EscalationError> {
        let id = generate_id(created_at);
        let escalation = Escalation::new(id.clone(), workflow_id, step, question, ai_reasoning, confidence, context, created_at);
        self.write(&escalation)?;
        self.notify(EscalationEvent::Raised {
            id: id.clone(),
            workflow_id: escalation.workflow_id.clone(),
            question: escalation.question.clone(),
            confidence: escalation.confidence,
            at: created_at,
        });
        Ok(id)
    }

    /// Loads a single escalation by id.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::NotFound`] if no such escalation exists.
    pub fn get_by_id(&self, id: &EscalationId) -> Result<Escalation, EscalationError> {
        let name = Self::file_name(id);
        let bytes = match self.root.read(&name) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(EscalationError::NotFound(id.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&bytes).map_err(|err| EscalationError::Serialization(err.to_string()))
    }

    /// Records a human response, transitioning the escalation to resolved.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError::NotFound`] if the id is unknown, or
    /// [`EscalationError::NotPending`] if it has already been resolved or cancelled.
    pub fn respond(
        &self,
        id: &EscalationId,
        response: EscalationResponse,
        resolved_at: Timestamp,
    ) -> Result<Escalation, EscalationError> {
        let mut escalation = self.get_by_id(id)?;
        if !escalation.is_pending() {
            return Err(EscalationError::NotPending(id.clone()));
        }

        let resolution_time_ms = match (escalation.created_at.as_unix_millis(), resolved_at.as_unix_millis()) {
            (Some(created), Some(resolved)) => Some(resolved - created),
            _ => None,
        };

        escalation.status = EscalationStatus::Resolved;
        escalation.response = Some(response);
        escalation.resolved_at = Some(resolved_at);
        escalation.resolution_time_ms = resolution_time_ms;

        self.write(&escalation)?;
        Ok(escalation)
    }

    /// Lists escalations matching `filter`, enumerated at call time.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError`] on filesystem or deserialization failure.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Escalation>, EscalationError> {
        let all = self.read_all()?;
        Ok(all
            .into_iter()
            .filter(|esc| filter.status.is_none_or(|status| esc.status == status))
            .filter(|esc| filter.workflow_id.as_ref().is_none_or(|id| &esc.workflow_id == id))
            .collect())
    }

    /// Computes aggregate metrics across every escalation.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationError`] on filesystem or deserialization failure.
    pub fn get_metrics(&self) -> Result<EscalationMetrics, EscalationError> {
        let all = self.read_all()?;
        let total_escalations = all.len();
        let resolved: Vec<&Escalation> = all.iter().filter(|esc| esc.status == EscalationStatus::Resolved).collect();
        let resolved_count = resolved.len();

        let average_resolution_time_ms = if resolved.is_empty() {
            0.0
        } else {
            let sum: i64 = resolved.iter().filter_map(|esc| esc.resolution_time_ms).sum();
            sum as f64 / resolved.len() as f64
        };

        let mut category_breakdown = BTreeMap::new();
        for escalation in &all {
            *category_breakdown.entry(escalation.workflow_id.to_string()).or_insert(0) += 1;
        }

        Ok(EscalationMetrics {
            total_escalations,
            resolved_count,
            average_resolution_time_ms,
            category_breakdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::EscalationQueue;
    use super::ListFilter;
    use bmad_core::Confidence;
    use bmad_core::EscalationResponse;
    use bmad_core::Timestamp;
    use bmad_core::WorkflowId;
    use cap_std::ambient_authority;
    use cap_std::fs::Dir;
    use serde_json::json;

    fn open_temp_root() -> (tempfile::TempDir, Dir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cap = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("open ambient dir");
        (dir, cap)
    }

    #[test]
    fn responding_twice_fails_with_not_pending() {
        let (_guard, root) = open_temp_root();
        let queue = EscalationQueue::new(root, Vec::new());
        let id = queue
            .add(WorkflowId::from("prd"), 1, "q", "r", Confidence::new(0.5), json!({}), Timestamp::UnixMillis(0))
            .expect("add succeeds");
        let response = EscalationResponse { decision: "yes".to_string(), rationale: "ok".to_string() };
        queue.respond(&id, response.clone(), Timestamp::UnixMillis(10)).expect("first respond succeeds");
        let second = queue.respond(&id, response, Timestamp::UnixMillis(20));
        assert!(second.is_err());
    }

    #[test]
    fn get_metrics_computes_average_resolution_time() {
        let (_guard, root) = open_temp_root();
        let queue = EscalationQueue::new(root, Vec::new());
        let id_a = queue
            .add(WorkflowId::from("prd"), 1, "a", "r", Confidence::new(0.5), json!({}), Timestamp::UnixMillis(0))
            .expect("add a");
        let id_b = queue
            .add(WorkflowId::from("architecture"), 1, "b", "r", Confidence::new(0.5), json!({}), Timestamp::UnixMillis(0))
            .expect("add b");
        let response = EscalationResponse { decision: "yes".to_string(), rationale: "ok".to_string() };
        queue.respond(&id_a, response.clone(), Timestamp::UnixMillis(100)).expect("respond a");
        queue.respond(&id_b, response, Timestamp::UnixMillis(300)).expect("respond b");

        let metrics = queue.get_metrics().expect("metrics succeed");
        assert_eq!(metrics.total_escalations, 2);
        assert_eq!(metrics.resolved_count, 2);
        assert!((metrics.average_resolution_time_ms - 200.0).abs() < f64::EPSILON);
        assert_eq!(metrics.category_breakdown.get("prd"), Some(&1));
    }

    #[test]
    fn list_on_empty_directory_is_empty_not_an_error() {
        let (_guard, root) = open_temp_root();
        let queue = EscalationQueue::new(root, Vec::new());
        let result = queue.list(&ListFilter::default()).expect("list succeeds on empty dir");
        assert!(result.is_empty());
    }
}
