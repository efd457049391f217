// crates/bmad-validators/src/decision_log.rs
// ============================================================================
// Module: BMAD Technical Decision Logger
// Description: Captures ADR-numbered technical decisions, merges proposals
// from multiple agents, and renders a summary table plus a PRD traceability map.
// Purpose: Give every workflow one place decisions land with a stable,
// never-reused sequential id.
// Dependencies: bmad-core
// ============================================================================

//! ## Overview
//! [`TechnicalDecisionLogger`] wraps [`DecisionIdAllocator`] with storage and
//! rendering. [`TechnicalDecisionLogger::restore`] rebuilds the allocator
//! from already-persisted decisions so a reload resumes at `max(existing) + 1`.

use std::collections::BTreeMap;
use std::sync::Mutex;

use bmad_core::Alternative;
use bmad_core::DecisionId;
use bmad_core::DecisionIdAllocator;
use bmad_core::DecisionMaker;
use bmad_core::DecisionStatus;
use bmad_core::RequirementId;
use bmad_core::TechnicalDecision;
use bmad_core::Timestamp;

/// A decision proposed by an agent, missing only its allocated id.
#[derive(Debug, Clone)]
pub struct ProposedDecision {
    /// Short title.
    pub title: String,
    /// Context motivating the decision.
    pub context: String,
    /// The decision text itself.
    pub decision: String,
    /// Alternatives considered.
    pub alternatives: Vec<Alternative>,
    /// Why this option was chosen.
    pub rationale: String,
    /// Expected consequences.
    pub consequences: Vec<String>,
    /// Current status.
    pub status: DecisionStatus,
    /// Who proposed the decision.
    pub decision_maker: DecisionMaker,
    /// When the decision was recorded.
    pub date: Timestamp,
    /// Optional confidence, when machine-assisted.
    pub confidence: Option<f64>,
    /// PRD requirements this decision traces back to.
    pub prd_requirements: Vec<RequirementId>,
}

/// Captures sequential ADR-numbered decisions and renders summaries.
pub struct TechnicalDecisionLogger {
    allocator: Mutex<DecisionIdAllocator>,
    decisions: Mutex<Vec<TechnicalDecision>>,
}

impl Default for TechnicalDecisionLogger {
    fn default() -> Self {
        Self { allocator: Mutex::new(DecisionIdAllocator::new()), decisions: Mutex::new(Vec::new()) }
    }
}

impl TechnicalDecisionLogger {
    /// Creates a fresh logger starting at `ADR-001`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a logger from already-persisted decisions, resuming id
    /// allocation at `max(existing) + 1`.
    #[must_use]
    pub fn restore(existing: Vec<TechnicalDecision>) -> Self {
        let allocator = DecisionIdAllocator::restore_from(&existing);
        Self { allocator: Mutex::new(allocator), decisions: Mutex::new(existing) }
    }

    /// Captures one proposed decision, allocating the next sequential id.
    pub fn capture(&self, proposal: ProposedDecision) -> TechnicalDecision {
        let id = self.allocator.lock().unwrap_or_else(std::sync::PoisonError::into_inner).allocate();
        let decision = TechnicalDecision {
            id,
            title: proposal.title,
            context: proposal.context,
            decision: proposal.decision,
            alternatives: proposal.alternatives,
            rationale: proposal.rationale,
            consequences: proposal.consequences,
            status: proposal.status,
            decision_maker: proposal.decision_maker,
            date: proposal.date,
            confidence: proposal.confidence,
            prd_requirements: proposal.prd_requirements,
        };
        self.decisions.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(decision.clone());
        decision
    }

    /// Merges proposals from multiple agents in order, assigning each the
    /// next sequential id as it is captured.
    pub fn merge(&self, proposals: Vec<ProposedDecision>) -> Vec<TechnicalDecision> {
        proposals.into_iter().map(|proposal| self.capture(proposal)).collect()
    }

    /// Returns a snapshot of every decision captured so far, in id order.
    #[must_use]
    pub fn decisions(&self) -> Vec<TechnicalDecision> {
        self.decisions.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Renders a markdown summary table: id, title, status, decision maker.
    #[must_use]
    pub fn summary_table(&self) -> String {
        let decisions = self.decisions();
        let mut out = String::from("| ID | Title | Status | Decision Maker |\n| --- | --- | --- | --- |\n");
        for decision in &decisions {
            out.push_str(&format!("| {} | {} | {} | {} |\n", decision.id, decision.title, decision.status, decision.decision_maker));
        }
        out
    }

    /// Renders one decision as a standalone markdown document, if it exists.
    #[must_use]
    pub fn decision_markdown(&self, id: &DecisionId) -> Option<String> {
        let decisions = self.decisions();
        let decision = decisions.iter().find(|decision| &decision.id == id)?;
        let mut out = format!("# {}: {}\n\n## Context\n{}\n\n## Decision\n{}\n\n## Alternatives\n", decision.id, decision.title, decision.context, decision.decision);
        for alternative in &decision.alternatives {
            out.push_str(&format!("- **{}** — pros: {}; cons: {}\n", alternative.option, alternative.pros.join(", "), alternative.cons.join(", ")));
        }
        out.push_str(&format!("\n## Rationale\n{}\n\n## Consequences\n", decision.rationale));
        for consequence in &decision.consequences {
            out.push_str(&format!("- {consequence}\n"));
        }
        Some(out)
    }

    /// Builds a traceability map from PRD requirement to the ids of every
    /// decision that names it.
    #[must_use]
    pub fn traceability_map(&self) -> BTreeMap<RequirementId, Vec<DecisionId>> {
        let mut map: BTreeMap<RequirementId, Vec<DecisionId>> = BTreeMap::new();
        for decision in self.decisions() {
            for requirement in decision.prd_requirements {
                map.entry(requirement).or_default().push(decision.id.clone());
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::ProposedDecision;
    use super::TechnicalDecisionLogger;
    use bmad_core::DecisionId;
    use bmad_core::DecisionMaker;
    use bmad_core::DecisionStatus;
    use bmad_core::RequirementId;
    use bmad_core::Timestamp;

    fn proposal(title: &str, requirement: &str) -> ProposedDecision {
        ProposedDecision {
            title: title.to_string(),
            context: "context".to_string(),
            decision: "decision text".to_string(),
            alternatives: vec![],
            rationale: "rationale".to_string(),
            consequences: vec![],
            status: DecisionStatus::Accepted,
            decision_maker: DecisionMaker::Winston,
            date: Timestamp::Logical(1),
            confidence: None,
            prd_requirements: vec![RequirementId::from(requirement)],
        }
    }

    #[test]
    fn captured_ids_are_sequential() {
        let logger = TechnicalDecisionLogger::new();
        let first = logger.capture(proposal("Use REST", "FR-001"));
        let second = logger.capture(proposal("Use Postgres", "FR-002"));
        assert_eq!(first.id.sequence(), 1);
        assert_eq!(second.id.sequence(), 2);
    }

    #[test]
    fn merge_assigns_ids_to_every_proposal_in_order() {
        let logger = TechnicalDecisionLogger::new();
        let decisions = logger.merge(vec![proposal("A", "FR-001"), proposal("B", "FR-002"), proposal("C", "FR-001")]);
        assert_eq!(decisions.iter().map(|d| d.id.sequence()).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn restore_resumes_after_max_existing_id() {
        let logger = TechnicalDecisionLogger::new();
        let first_batch = logger.merge(vec![proposal("A", "FR-001"), proposal("B", "FR-002")]);

        let restored = TechnicalDecisionLogger::restore(first_batch);
        let next = restored.capture(proposal("C", "FR-003"));
        assert_eq!(next.id.sequence(), 3);
    }

    #[test]
    fn traceability_map_groups_decisions_by_requirement() {
        let logger = TechnicalDecisionLogger::new();
        logger.merge(vec![proposal("A", "FR-001"), proposal("B", "FR-001")]);
        let map = logger.traceability_map();
        let ids = map.get(&RequirementId::from("FR-001")).expect("requirement present");
        assert_eq!(ids, &vec![DecisionId::new(1), DecisionId::new(2)]);
    }

    #[test]
    fn summary_table_lists_every_decision() {
        let logger = TechnicalDecisionLogger::new();
        logger.capture(proposal("Use REST", "FR-001"));
        let table = logger.summary_table();
        assert!(table.contains("ADR-001"));
        assert!(table.contains("Use REST"));
    }
}
