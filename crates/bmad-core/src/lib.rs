// crates/bmad-core/src/lib.rs
// ============================================================================
// Crate: bmad-core
// Description: Shared identifiers, data model, and capability interfaces for
// the BMAD pipeline orchestration workspace.
// Purpose: Give every other BMAD crate one dependency-free vocabulary.
// ============================================================================

//! ## Overview
//! `bmad-core` has no dependency on any other crate in this workspace. It
//! defines:
//! - opaque identifiers ([`core::identifiers`]) and the deterministic
//!   [`core::time::Timestamp`] value;
//! - canonical content hashing ([`core::hashing`]);
//! - the shared entity shapes consumed across crate boundaries
//!   ([`core::workflow`], [`core::agent`], [`core::escalation`],
//!   [`core::decision`], [`core::document`], [`core::validation`],
//!   [`core::dependency_graph`], [`core::adr`]);
//! - narrow capability traits ([`interfaces`]) that provider adapters and
//!   test doubles implement.

/// Core identifiers, data model, and shared entity shapes.
pub mod core;
/// Narrow capability traits implemented by provider adapters and test doubles.
pub mod interfaces;

pub use core::adr::Alternative;
pub use core::adr::DecisionIdAllocator;
pub use core::adr::DecisionMaker;
pub use core::adr::DecisionStatus;
pub use core::adr::TechnicalDecision;
pub use core::agent::Agent;
pub use core::agent::AgentContext;
pub use core::agent::AgentLifecycle;
pub use core::confidence::Confidence;
pub use core::confidence::ConfidenceThreshold;
pub use core::confidence::ESCALATION_REQUIRED_MARKER;
pub use core::confidence::escalation_marker;
pub use core::decision::Decision;
pub use core::decision::DecisionSource;
pub use core::dependency_graph::DEFAULT_BOTTLENECK_THRESHOLD;
pub use core::dependency_graph::DependencyGraph;
pub use core::dependency_graph::DependencyGraphError;
pub use core::dependency_graph::Edge;
pub use core::dependency_graph::EdgeType;
pub use core::document::Document;
pub use core::document::DocumentError;
pub use core::document::SectionSpan;
pub use core::document::has_frontmatter;
pub use core::document::replace_section;
pub use core::document::scan_sections;
pub use core::escalation::Escalation;
pub use core::escalation::EscalationResponse;
pub use core::escalation::EscalationStatus;
pub use core::hashing::DEFAULT_HASH_ALGORITHM;
pub use core::hashing::HashAlgorithm;
pub use core::hashing::HashDigest;
pub use core::hashing::HashError;
pub use core::hashing::hash_bytes;
pub use core::hashing::hash_canonical_json;
pub use core::hashing::hash_canonical_json_with_limit;
pub use core::identifiers::AgentId;
pub use core::identifiers::CorrelationId;
pub use core::identifiers::DecisionId;
pub use core::identifiers::EscalationId;
pub use core::identifiers::ProjectId;
pub use core::identifiers::RequirementId;
pub use core::identifiers::StepId;
pub use core::identifiers::StoryId;
pub use core::identifiers::WorkflowId;
pub use core::time::Timestamp;
pub use core::validation::DimensionScore;
pub use core::validation::Finding;
pub use core::validation::ValidationReport;
pub use core::workflow::WorkflowState;
pub use core::workflow::WorkflowStatus;
pub use interfaces::LlmClient;
pub use interfaces::LlmError;
pub use interfaces::StubLlmClient;
pub use interfaces::TokenUsage;
