// crates/bmad-validators/src/lib.rs
// ============================================================================
// Crate: bmad-validators
// Description: Architecture, PRD, and security gate validators, the
// technical decision logger, and the CIS agent router.
// Purpose: Own every scored-document check and cross-agent decision routing
// concern, separate from workflow control flow.
// ============================================================================

//! ## Overview
//! `bmad-validators` depends on `bmad-core` for shared shapes
//! ([`bmad_core::ValidationReport`], [`bmad_core::TechnicalDecision`]) and on
//! `bmad-events` for the CIS router's event stream. Nothing here reads or
//! writes a workflow's execution state; callers feed it document text and
//! persist the resulting reports themselves.

pub mod architecture;
pub mod cis_router;
pub mod decision_log;
pub mod prd;
pub mod scan;
pub mod security;

pub use architecture::ArchitectureValidator;
pub use cis_router::CisCategory;
pub use cis_router::CisError;
pub use cis_router::CisInvocationRecord;
pub use cis_router::CisResponse;
pub use cis_router::CisRouter;
pub use cis_router::CisRouterConfig;
pub use decision_log::ProposedDecision;
pub use decision_log::TechnicalDecisionLogger;
pub use prd::PrdValidator;
pub use security::SecurityGateValidator;
