// crates/bmad-validators/tests/cis_invocation_cap.rs
// ============================================================================
// Module: CIS Invocation Cap Integration Test
// Description: Confirms the router rejects a fourth invocation within its
// lifetime and notifies its sinks with the limit-exceeded payload.
// Purpose: Exercise CisRouter across route_decision/history the way a
// workflow step actually drives repeated decision routing.
// Dependencies: bmad-validators, bmad-core, bmad-events, tokio
// ============================================================================

//! ## Overview
//! Routes three decisions successfully, then confirms the fourth is rejected
//! with `CisError::LimitExceeded` and that a `CisEvent::LimitExceeded` event
//! carrying the decision, count, and limit reaches a registered sink.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

use bmad_core::StubLlmClient;
use bmad_events::CallbackSink;
use bmad_events::CisEvent;
use bmad_events::EventKind;
use bmad_events::Sink;
use bmad_validators::CisError;
use bmad_validators::CisRouter;
use bmad_validators::CisRouterConfig;
use std::sync::Arc;
use std::sync::Mutex;

#[tokio::test]
async fn fourth_invocation_is_rejected() {
    let captured: Arc<Mutex<Vec<EventKind>>> = Arc::new(Mutex::new(Vec::new()));
    let captured_clone = Arc::clone(&captured);
    let sink: Box<dyn Sink> = Box::new(CallbackSink::new(move |event| {
        captured_clone.lock().unwrap().push(event.clone());
        Ok(())
    }));

    let llm = Arc::new(StubLlmClient::new(r#"{"decision":"ok"}"#));
    let router = CisRouter::new(CisRouterConfig::default(), llm, vec![sink]);

    for n in 1..=3 {
        let result = router.route_decision(&format!("Decision {n}"), "prompt").await;
        assert!(result.is_ok(), "invocation {n} should succeed");
    }

    let fourth = router.route_decision("Decision 4", "prompt").await;
    assert!(matches!(fourth, Err(CisError::LimitExceeded { count: 3, limit: 3 })));
    assert_eq!(router.history().len(), 3);

    let captured = captured.lock().unwrap();
    let limit_exceeded = captured
        .iter()
        .find_map(|event| match event {
            EventKind::Cis(CisEvent::LimitExceeded { decision, count, limit }) => Some((decision.clone(), *count, *limit)),
            _ => None,
        })
        .expect("a LimitExceeded event was emitted");
    assert_eq!(limit_exceeded, ("Decision 4".to_string(), 3, 3));
}
