//! Topology terms: a single step, or an AND/OR group of steps.
//!
//! Terms are the keys and values of ordering maps. An AND group means every
//! member participates (fork branches, join inputs); an OR group means exactly
//! one member participates (decision branches, merge inputs). Groups are flat
//! sets of distinct steps with at least two members; a singleton candidate set
//! collapses to a leaf.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::step::StepId;
use crate::graph::BehaviorGraph;

/// A reference to one step or to a group of steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "steps", rename_all = "lowercase")]
pub enum TopologyTerm {
    /// A single step.
    Leaf(StepId),
    /// All members take part, each independently ordered.
    And(BTreeSet<StepId>),
    /// Exactly one member takes part.
    Or(BTreeSet<StepId>),
}

impl TopologyTerm {
    /// Build an AND group. Returns `None` for an empty candidate set.
    pub fn and(steps: impl IntoIterator<Item = StepId>) -> Option<Self> {
        Self::group(steps, TopologyTerm::And)
    }

    /// Build an OR group. Returns `None` for an empty candidate set.
    pub fn or(steps: impl IntoIterator<Item = StepId>) -> Option<Self> {
        Self::group(steps, TopologyTerm::Or)
    }

    fn group(
        steps: impl IntoIterator<Item = StepId>,
        make: fn(BTreeSet<StepId>) -> Self,
    ) -> Option<Self> {
        let set: BTreeSet<StepId> = steps.into_iter().collect();
        match set.len() {
            0 => None,
            1 => set.into_iter().next().map(TopologyTerm::Leaf),
            _ => Some(make(set)),
        }
    }

    /// Member steps in declaration order.
    pub fn steps(&self) -> Vec<StepId> {
        match self {
            TopologyTerm::Leaf(id) => vec![*id],
            TopologyTerm::And(set) | TopologyTerm::Or(set) => set.iter().copied().collect(),
        }
    }

    /// Whether `step` is this leaf or a member of this group.
    pub fn contains(&self, step: StepId) -> bool {
        match self {
            TopologyTerm::Leaf(id) => *id == step,
            TopologyTerm::And(set) | TopologyTerm::Or(set) => set.contains(&step),
        }
    }

    /// Render the term with step names from `graph`.
    pub fn display<'a>(&'a self, graph: &'a BehaviorGraph) -> TermDisplay<'a> {
        TermDisplay { term: self, graph }
    }
}

/// Name-based rendering of a [`TopologyTerm`], e.g. `AND(p2, p3)`.
pub struct TermDisplay<'a> {
    term: &'a TopologyTerm,
    graph: &'a BehaviorGraph,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, set) = match self.term {
            TopologyTerm::Leaf(id) => return write!(f, "{}", self.graph.step_name(*id)),
            TopologyTerm::And(set) => ("AND", set),
            TopologyTerm::Or(set) => ("OR", set),
        };
        let names: Vec<&str> = set.iter().map(|id| self.graph.step_name(*id)).collect();
        write!(f, "{label}({})", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;

    #[test]
    fn empty_group_is_none() {
        assert!(TopologyTerm::and(Vec::new()).is_none());
        assert!(TopologyTerm::or(Vec::new()).is_none());
    }

    #[test]
    fn singleton_group_collapses_to_leaf() {
        let term = TopologyTerm::or([StepId(3)]).unwrap();
        assert_eq!(term, TopologyTerm::Leaf(StepId(3)));
    }

    #[test]
    fn duplicate_members_are_merged() {
        let term = TopologyTerm::and([StepId(2), StepId(1), StepId(2)]).unwrap();
        assert_eq!(term.steps(), vec![StepId(1), StepId(2)]);
        assert!(term.contains(StepId(1)));
        assert!(!term.contains(StepId(0)));
    }

    #[test]
    fn display_uses_step_names() {
        let mut builder = GraphBuilder::new();
        builder.steps(&["p1", "p2", "p3"], "T").unwrap();
        let graph = builder.build();

        let term = TopologyTerm::or([StepId(2), StepId(1)]).unwrap();
        assert_eq!(term.display(&graph).to_string(), "OR(p2, p3)");
        let leaf = TopologyTerm::Leaf(StepId(0));
        assert_eq!(leaf.display(&graph).to_string(), "p1");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let term = TopologyTerm::and([StepId(0), StepId(1)]).unwrap();
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(json["kind"], "and");
    }
}
