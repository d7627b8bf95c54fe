//! Behavior graph: steps connected by directed precedence edges.
//!
//! The graph is an owned value with adjacency indices keyed by stable step
//! ids. It is fully materialized before inference starts and never mutated by
//! it.

pub mod edge;
pub mod step;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::edge::{EdgeId, PrecedenceEdge};
use self::step::{Step, StepId};

/// Errors that can occur during graph construction.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("step not found: {0}")]
    StepNotFound(String),

    #[error("duplicate step name: {0}")]
    DuplicateStep(String),

    #[error("dangling edge: source step {src} or target step {dst} not in graph")]
    DanglingEdge { src: StepId, dst: StepId },
}

/// Which side of a step an edge set is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "outgoing"),
            Direction::Incoming => write!(f, "incoming"),
        }
    }
}

/// The behavior graph of one class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorGraph {
    steps: Vec<Step>,
    edges: Vec<PrecedenceEdge>,

    /// Index: step name -> step id
    by_name: HashMap<String, StepId>,
    /// Index: step -> outgoing edges (edges where this step is the source)
    outgoing: Vec<Vec<EdgeId>>,
    /// Index: step -> incoming edges (edges where this step is the target)
    incoming: Vec<Vec<EdgeId>>,
}

impl BehaviorGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a step, assigning it the next id in declaration order.
    pub fn add_step(&mut self, mut step: Step) -> Result<StepId, GraphError> {
        if self.by_name.contains_key(&step.name) {
            return Err(GraphError::DuplicateStep(step.name));
        }
        let id = StepId(self.steps.len() as u32);
        step.id = id;
        self.by_name.insert(step.name.clone(), id);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.steps.push(step);
        Ok(id)
    }

    /// Insert an edge. Both end steps must exist.
    pub fn add_edge(&mut self, edge: PrecedenceEdge) -> Result<EdgeId, GraphError> {
        if edge.source.index() >= self.steps.len() || edge.target.index() >= self.steps.len() {
            return Err(GraphError::DanglingEdge {
                src: edge.source,
                dst: edge.target,
            });
        }
        let id = EdgeId(self.edges.len() as u32);
        self.outgoing[edge.source.index()].push(id);
        self.incoming[edge.target.index()].push(id);
        self.edges.push(edge);
        Ok(id)
    }

    /// Look up a step by id.
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id.index())
    }

    /// Name of a step, or `"?"` for an id that does not belong to this graph.
    pub fn step_name(&self, id: StepId) -> &str {
        self.step(id).map(|s| s.name.as_str()).unwrap_or("?")
    }

    /// Look up a step id by name.
    pub fn step_id(&self, name: &str) -> Option<StepId> {
        self.by_name.get(name).copied()
    }

    /// Look up a step id by name, failing with [`GraphError::StepNotFound`].
    pub fn require_step(&self, name: &str) -> Result<StepId, GraphError> {
        self.step_id(name)
            .ok_or_else(|| GraphError::StepNotFound(name.to_string()))
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&PrecedenceEdge> {
        self.edges.get(id.0 as usize)
    }

    /// Iterate over all steps in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Iterate over all step ids in declaration order.
    pub fn step_ids(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.iter().map(|s| s.id)
    }

    /// Iterate over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &PrecedenceEdge> {
        self.edges.iter()
    }

    /// All edges leaving a step, self-loops included.
    pub fn outgoing_edges(&self, id: StepId) -> impl Iterator<Item = &PrecedenceEdge> + '_ {
        self.indexed(&self.outgoing, id)
    }

    /// All edges entering a step, self-loops included.
    pub fn incoming_edges(&self, id: StepId) -> impl Iterator<Item = &PrecedenceEdge> + '_ {
        self.indexed(&self.incoming, id)
    }

    /// Edges on one side of a step, with loop back-edges removed.
    pub fn flow_edges(&self, id: StepId, direction: Direction) -> Vec<&PrecedenceEdge> {
        let index = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        self.indexed(index, id)
            .filter(|e| !e.is_self_loop())
            .collect()
    }

    /// Steps with at least one edge and no incoming edge other than self-loops.
    pub fn entry_steps(&self) -> Vec<StepId> {
        self.step_ids()
            .filter(|&id| {
                self.flow_edges(id, Direction::Incoming).is_empty()
                    && !self.flow_edges(id, Direction::Outgoing).is_empty()
            })
            .collect()
    }

    /// Return the total number of steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Return the total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn indexed<'a>(
        &'a self,
        index: &'a [Vec<EdgeId>],
        id: StepId,
    ) -> impl Iterator<Item = &'a PrecedenceEdge> + 'a {
        index
            .get(id.index())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|e| self.edge(*e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_steps() -> (BehaviorGraph, StepId, StepId) {
        let mut graph = BehaviorGraph::new();
        let a = graph.add_step(Step::new("p1", "AtomicBehavior")).unwrap();
        let b = graph.add_step(Step::new("p2", "AtomicBehavior")).unwrap();
        (graph, a, b)
    }

    #[test]
    fn empty_graph() {
        let graph = BehaviorGraph::new();
        assert_eq!(graph.step_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.entry_steps().is_empty());
    }

    #[test]
    fn ids_follow_declaration_order() {
        let (graph, a, b) = two_steps();
        assert_eq!(a, StepId(0));
        assert_eq!(b, StepId(1));
        assert_eq!(graph.step_name(b), "p2");
        assert_eq!(graph.step_id("p1"), Some(a));
    }

    #[test]
    fn duplicate_step_rejected() {
        let (mut graph, _, _) = two_steps();
        let err = graph.add_step(Step::new("p1", "Other")).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateStep(ref n) if n == "p1"));
    }

    #[test]
    fn dangling_edge_rejected() {
        let (mut graph, a, _) = two_steps();
        let result = graph.add_edge(PrecedenceEdge::new(a, StepId(9)));
        assert!(matches!(result, Err(GraphError::DanglingEdge { .. })));
    }

    #[test]
    fn adjacency_indices() {
        let (mut graph, a, b) = two_steps();
        graph.add_edge(PrecedenceEdge::new(a, b)).unwrap();
        assert_eq!(graph.outgoing_edges(a).count(), 1);
        assert_eq!(graph.incoming_edges(b).count(), 1);
        assert_eq!(graph.incoming_edges(a).count(), 0);
        assert_eq!(graph.entry_steps(), vec![a]);
    }

    #[test]
    fn flow_edges_skip_self_loops() {
        let (mut graph, a, b) = two_steps();
        graph.add_edge(PrecedenceEdge::choice(a, b)).unwrap();
        graph.add_edge(PrecedenceEdge::choice(b, b)).unwrap();
        assert_eq!(graph.outgoing_edges(b).count(), 1);
        assert!(graph.flow_edges(b, Direction::Outgoing).is_empty());
        assert_eq!(graph.flow_edges(b, Direction::Incoming).len(), 1);
    }

    #[test]
    fn require_missing_step() {
        let (graph, _, _) = two_steps();
        assert!(matches!(
            graph.require_step("p9"),
            Err(GraphError::StepNotFound(_))
        ));
    }
}
