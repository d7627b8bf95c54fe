//! Name-based construction API for behavior graphs.
//!
//! # Example
//!
//! ```rust
//! use actrel_core::builder::GraphBuilder;
//!
//! let mut builder = GraphBuilder::new();
//! builder.steps(&["p1", "p2", "p3"], "AtomicBehavior").unwrap();
//!
//! // p1 forks into p2 and p3
//! builder.precede("p1", "p2").unwrap();
//! builder.precede("p1", "p3").unwrap();
//!
//! let graph = builder.build();
//! assert_eq!(graph.step_count(), 3);
//! assert_eq!(graph.edge_count(), 2);
//! ```

use crate::graph::edge::{EdgeId, PrecedenceEdge};
use crate::graph::step::{Step, StepId};
use crate::graph::{BehaviorGraph, GraphError};

/// A builder that refers to steps by name instead of id.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: BehaviorGraph,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a step.
    pub fn step(&mut self, name: &str, target_type: &str) -> Result<StepId, GraphError> {
        self.graph.add_step(Step::new(name, target_type))
    }

    /// Declare several steps sharing one type, in the given order.
    pub fn steps(&mut self, names: &[&str], target_type: &str) -> Result<Vec<StepId>, GraphError> {
        names
            .iter()
            .map(|name| self.step(name, target_type))
            .collect()
    }

    /// Add an untagged precedence edge `from -> to`.
    pub fn precede(&mut self, from: &str, to: &str) -> Result<EdgeId, GraphError> {
        self.connect(from, to, false)
    }

    /// Add an exclusive-choice precedence edge `from -> to`.
    pub fn choice(&mut self, from: &str, to: &str) -> Result<EdgeId, GraphError> {
        self.connect(from, to, true)
    }

    /// Add a precedence edge with an explicit tag.
    pub fn connect(&mut self, from: &str, to: &str, exclusive_choice: bool) -> Result<EdgeId, GraphError> {
        let source = self.graph.require_step(from)?;
        let target = self.graph.require_step(to)?;
        self.graph.add_edge(PrecedenceEdge {
            source,
            target,
            exclusive_choice,
        })
    }

    /// Finish construction.
    pub fn build(self) -> BehaviorGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_by_name() {
        let mut builder = GraphBuilder::new();
        builder.steps(&["a", "b"], "T").unwrap();
        builder.choice("a", "b").unwrap();
        let graph = builder.build();

        let edge = graph.edges().next().unwrap();
        assert!(edge.exclusive_choice);
        assert_eq!(graph.step_name(edge.source), "a");
        assert_eq!(graph.step_name(edge.target), "b");
    }

    #[test]
    fn unknown_step_name() {
        let mut builder = GraphBuilder::new();
        builder.step("a", "T").unwrap();
        let err = builder.precede("a", "missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
