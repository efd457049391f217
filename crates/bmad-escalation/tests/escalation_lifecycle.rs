// crates/bmad-escalation/tests/escalation_lifecycle.rs
// ============================================================================
// Module: Escalation Lifecycle Integration Test
// Description: End-to-end raise-list-respond flow over a real filesystem root.
// Purpose: Exercise EscalationQueue across its public API the way a workflow
// orchestrator actually drives it, rather than unit-testing one method at a time.
// Dependencies: bmad-escalation, bmad-core, bmad-events, cap-std, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Raises an escalation, confirms it is listed as pending, resolves it, and
//! confirms the resolution time and pending-list membership update together.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

use bmad_core::Confidence;
use bmad_core::EscalationResponse;
use bmad_core::EscalationStatus;
use bmad_core::Timestamp;
use bmad_core::WorkflowId;
use bmad_escalation::EscalationQueue;
use bmad_escalation::ListFilter;
use bmad_events::CallbackSink;
use bmad_events::EventKind;
use bmad_events::Sink;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex;

fn open_temp_root() -> (tempfile::TempDir, Dir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let cap = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("open ambient dir");
    (dir, cap)
}

#[test]
fn escalation_lifecycle_matches_the_documented_scenario() {
    let (_guard, root) = open_temp_root();
    let raised: Arc<Mutex<Vec<EventKind>>> = Arc::new(Mutex::new(Vec::new()));
    let raised_clone = Arc::clone(&raised);
    let sink: Box<dyn Sink> = Box::new(CallbackSink::new(move |event| {
        raised_clone.lock().unwrap().push(event.clone());
        Ok(())
    }));
    let queue = EscalationQueue::new(root, vec![sink]);

    let id = queue
        .add(
            WorkflowId::from("prd"),
            3,
            "Use microservices?",
            "ambiguous scale requirement",
            Confidence::new(0.69),
            json!({}),
            Timestamp::UnixMillis(1_000),
        )
        .expect("add succeeds");

    assert_eq!(raised.lock().unwrap().len(), 1, "add notifies its sinks exactly once");

    let pending = queue.list(&ListFilter { status: Some(EscalationStatus::Pending), ..Default::default() }).expect("list succeeds");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);

    let response = EscalationResponse { decision: "yes".to_string(), rationale: "scale requirements confirmed".to_string() };
    let resolved = queue.respond(&id, response.clone(), Timestamp::UnixMillis(1_500)).expect("respond succeeds");
    assert_eq!(resolved.status, EscalationStatus::Resolved);
    assert_eq!(resolved.response, Some(response));
    assert_eq!(resolved.resolution_time_ms, Some(500));

    let pending_after = queue.list(&ListFilter { status: Some(EscalationStatus::Pending), ..Default::default() }).expect("list succeeds");
    assert!(pending_after.is_empty());
}
