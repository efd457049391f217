// crates/bmad-core/src/core/dependency_graph.rs
// ============================================================================
// Module: BMAD Dependency Graph
// Description: Story dependency graph shape produced by the solutioning phase.
// Purpose: Give callers a DAG over story ids with cycle detection and a
// topological critical path.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`DependencyGraph`] is a DAG over [`StoryId`] nodes. This module provides
//! cycle detection and critical-path/bottleneck computation; it does not know
//! how the graph was derived.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::identifiers::StoryId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while validating or analyzing a dependency graph.
#[derive(Debug, Error)]
pub enum DependencyGraphError {
    /// An edge references a node not present in `nodes`.
    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),
    /// The graph contains at least one cycle.
    #[error("dependency graph contains a cycle")]
    CycleDetected,
}

// ============================================================================
// SECTION: Edges
// ============================================================================

/// Strength of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// `to` cannot start before `from` completes.
    Hard,
    /// `to` is recommended to follow `from` but is not strictly blocked.
    Soft,
}

/// One directed dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Upstream story.
    pub from: StoryId,
    /// Downstream story.
    pub to: StoryId,
    /// Edge strength.
    pub edge_type: EdgeType,
    /// Whether `to` is blocked from starting until `from` completes.
    pub blocking: bool,
    /// Why this edge exists.
    pub reasoning: String,
}

// ============================================================================
// SECTION: Graph
// ============================================================================

/// A story dependency graph.
///
/// # Invariants
/// - Acyclic: validated by [`DependencyGraph::validate`].
/// - Every edge endpoint is a known node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// All story nodes in the graph.
    pub nodes: Vec<StoryId>,
    /// Directed edges between nodes.
    pub edges: Vec<Edge>,
}

impl DependencyGraph {
    /// Validates that every edge endpoint is known and the graph is acyclic.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyGraphError::UnknownNode`] or
    /// [`DependencyGraphError::CycleDetected`].
    pub fn validate(&self) -> Result<(), DependencyGraphError> {
        let known: BTreeSet<&StoryId> = self.nodes.iter().collect();
        for edge in &self.edges {
            if !known.contains(&edge.from) {
                return Err(DependencyGraphError::UnknownNode(edge.from.to_string()));
            }
            if !known.contains(&edge.to) {
                return Err(DependencyGraphError::UnknownNode(edge.to.to_string()));
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Returns a topological ordering of the nodes via Kahn's algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyGraphError::CycleDetected`] if a total order does
    /// not exist.
    pub fn topological_order(&self) -> Result<Vec<StoryId>, DependencyGraphError> {
        let mut in_degree: BTreeMap<&StoryId, usize> = self.nodes.iter().map(|n| (n, 0)).collect();
        let mut adjacency: BTreeMap<&StoryId, Vec<&StoryId>> = BTreeMap::new();
        for edge in &self.edges {
            adjacency.entry(&edge.from).or_default().push(&edge.to);
            *in_degree.entry(&edge.to).or_insert(0) += 1;
        }

        let mut queue: VecDeque<&StoryId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            order.push(node.clone());
            if let Some(successors) = adjacency.get(node) {
                for successor in successors {
                    if let Some(degree) = in_degree.get_mut(successor) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(successor);
                        }
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err(DependencyGraphError::CycleDetected)
        }
    }

    /// Returns nodes whose out-degree is at least `threshold`, the default
    /// bottleneck definition ("blocks >= 4 others").
    #[must_use]
    pub fn bottlenecks(&self, threshold: usize) -> Vec<StoryId> {
        let mut out_degree: BTreeMap<&StoryId, usize> = BTreeMap::new();
        for edge in &self.edges {
            *out_degree.entry(&edge.from).or_insert(0) += 1;
        }
        out_degree
            .into_iter()
            .filter(|(_, degree)| *degree >= threshold)
            .map(|(node, _)| node.clone())
            .collect()
    }
}

/// Default out-degree threshold used to classify a node as a bottleneck.
pub const DEFAULT_BOTTLENECK_THRESHOLD: usize = 4;

#[cfg(test)]
mod tests {
    use super::DEFAULT_BOTTLENECK_THRESHOLD;
    use super::DependencyGraph;
    use super::Edge;
    use super::EdgeType;
    use crate::core::identifiers::StoryId;

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            from: StoryId::from(from),
            to: StoryId::from(to),
            edge_type: EdgeType::Hard,
            blocking: true,
            reasoning: "test".into(),
        }
    }

    #[test]
    fn acyclic_graph_validates_and_orders_topologically() {
        let graph = DependencyGraph {
            nodes: vec![StoryId::from("a"), StoryId::from("b"), StoryId::from("c")],
            edges: vec![edge("a", "b"), edge("b", "c")],
        };
        assert!(graph.validate().is_ok());
        let order = graph.topological_order().expect("acyclic graph orders");
        assert_eq!(order, vec![StoryId::from("a"), StoryId::from("b"), StoryId::from("c")]);
    }

    #[test]
    fn cycle_is_detected() {
        let graph = DependencyGraph {
            nodes: vec![StoryId::from("a"), StoryId::from("b")],
            edges: vec![edge("a", "b"), edge("b", "a")],
        };
        assert!(graph.validate().is_err());
    }

    #[test]
    fn bottleneck_threshold_matches_spec_default() {
        let graph = DependencyGraph {
            nodes: vec![
                StoryId::from("hub"),
                StoryId::from("a"),
                StoryId::from("b"),
                StoryId::from("c"),
                StoryId::from("d"),
            ],
            edges: vec![edge("hub", "a"), edge("hub", "b"), edge("hub", "c"), edge("hub", "d")],
        };
        assert_eq!(graph.bottlenecks(DEFAULT_BOTTLENECK_THRESHOLD), vec![StoryId::from("hub")]);
    }

    proptest::proptest! {
        /// Any graph built from `n` nodes with edges only from a lower index to
        /// a strictly higher one is acyclic by construction: it validates, and
        /// its topological order is a permutation of every node.
        #[test]
        fn edges_only_increasing_by_index_are_always_acyclic(n in 2usize..12, seeds in proptest::collection::vec(0usize..144, 0..20)) {
            let nodes: Vec<StoryId> = (0..n).map(|i| StoryId::from(format!("story-{i}"))).collect();
            let edges: Vec<Edge> = seeds
                .into_iter()
                .filter_map(|seed| {
                    let from = seed % n;
                    let remaining = n - from - 1;
                    if remaining == 0 {
                        return None;
                    }
                    let to = from + 1 + (seed / n) % remaining;
                    Some(edge(&format!("story-{from}"), &format!("story-{to}")))
                })
                .collect();
            let graph = DependencyGraph { nodes: nodes.clone(), edges };

            let order = graph.validate().and_then(|()| graph.topological_order());
            let order = order.expect("monotone-index edges are always acyclic");

            let mut sorted_nodes = nodes.clone();
            sorted_nodes.sort();
            let mut sorted_order = order;
            sorted_order.sort();
            assert_eq!(sorted_nodes, sorted_order);
        }
    }
}
