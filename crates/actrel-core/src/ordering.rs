//! Ordering inference: recover control patterns from graph topology.
//!
//! Two passes over a [`BehaviorGraph`] each produce an [`OrderingMap`]. The
//! forward pass classifies every step by its outgoing edges, the inverse pass
//! by its incoming edges:
//!
//! | edges on the inspected side          | forward               | inverse               |
//! |--------------------------------------|-----------------------|-----------------------|
//! | one untagged edge                    | sequence `s -> t`     | sequence `s -> t`     |
//! | several untagged edges               | fork `s -> AND(..)`   | join `AND(..) -> t`   |
//! | one exclusive-choice edge            | merge `OR(..) -> t`   | decision `s -> OR(..)`|
//! | several exclusive-choice edges       | decision `s -> OR(..)`| merge `OR(..) -> t`   |
//!
//! A forward merge marks every one of its sources visited, and an inverse
//! decision marks every one of its alternatives visited. A step that takes part
//! in both shapes is therefore classified by whichever is reached first in
//! declaration order.
//!
//! Self-loops are loop back-edges. They are dropped before degrees and
//! candidate sets are computed so that a loop is not read as an extra branch.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::graph::edge::PrecedenceEdge;
use crate::graph::step::StepId;
use crate::graph::{BehaviorGraph, Direction};
use crate::topology::TopologyTerm;

/// Errors raised when a graph cannot be classified.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("step '{step}' mixes exclusive-choice and untagged {direction} edges")]
    MixedTags { step: String, direction: Direction },

    #[error("conflicting {map} ordering for {key}: already maps to {existing}, cannot also map to {new}")]
    ConflictingEntry {
        map: OrderingDirection,
        key: String,
        existing: String,
        new: String,
    },
}

/// Which happens-before function a map describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingDirection {
    /// Keyed by the `before` side: every step's successors.
    Forward,
    /// Keyed by the `after` side: every step's predecessors.
    Inverse,
}

impl fmt::Display for OrderingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingDirection::Forward => write!(f, "forward"),
            OrderingDirection::Inverse => write!(f, "inverse"),
        }
    }
}

/// One `before -> after` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingEntry {
    pub before: TopologyTerm,
    pub after: TopologyTerm,
}

/// An inferred happens-before function.
///
/// Entries keep insertion order. The key side depends on the direction; a key
/// never maps to two different values.
#[derive(Debug, Clone)]
pub struct OrderingMap {
    direction: OrderingDirection,
    entries: Vec<OrderingEntry>,
    index: HashMap<TopologyTerm, usize>,
}

impl OrderingMap {
    /// Create an empty map.
    pub fn new(direction: OrderingDirection) -> Self {
        Self {
            direction,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn direction(&self) -> OrderingDirection {
        self.direction
    }

    /// Insert `before -> after`.
    ///
    /// Returns `Ok(false)` when the identical entry is already present.
    pub fn insert(
        &mut self,
        graph: &BehaviorGraph,
        before: TopologyTerm,
        after: TopologyTerm,
    ) -> Result<bool, TopologyError> {
        let (key, value) = match self.direction {
            OrderingDirection::Forward => (&before, &after),
            OrderingDirection::Inverse => (&after, &before),
        };
        if let Some(&at) = self.index.get(key) {
            let existing = self.value_of(&self.entries[at]);
            if existing == value {
                return Ok(false);
            }
            return Err(TopologyError::ConflictingEntry {
                map: self.direction,
                key: key.display(graph).to_string(),
                existing: existing.display(graph).to_string(),
                new: value.display(graph).to_string(),
            });
        }

        debug!(
            map = %self.direction,
            before = %before.display(graph),
            after = %after.display(graph),
            "ordering entry"
        );
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(OrderingEntry { before, after });
        Ok(true)
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &TopologyTerm) -> Option<&TopologyTerm> {
        self.index
            .get(key)
            .map(|&at| self.value_of(&self.entries[at]))
    }

    /// Whether the map holds exactly `before -> after`.
    pub fn contains(&self, before: &TopologyTerm, after: &TopologyTerm) -> bool {
        self.entries
            .iter()
            .any(|e| &e.before == before && &e.after == after)
    }

    /// Iterate entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &OrderingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn value_of<'a>(&self, entry: &'a OrderingEntry) -> &'a TopologyTerm {
        match self.direction {
            OrderingDirection::Forward => &entry.after,
            OrderingDirection::Inverse => &entry.before,
        }
    }
}

/// Both inferred maps of one graph.
#[derive(Debug, Clone)]
pub struct Orderings {
    pub forward: OrderingMap,
    pub inverse: OrderingMap,
}

/// Run both passes.
pub fn infer(graph: &BehaviorGraph) -> Result<Orderings, TopologyError> {
    Ok(Orderings {
        forward: infer_forward(graph)?,
        inverse: infer_inverse(graph)?,
    })
}

/// Forward pass: classify each step by its outgoing edges.
pub fn infer_forward(graph: &BehaviorGraph) -> Result<OrderingMap, TopologyError> {
    check_uniform_tags(graph, Direction::Outgoing)?;

    let mut map = OrderingMap::new(OrderingDirection::Forward);
    let mut visited = vec![false; graph.step_count()];

    for s in graph.step_ids() {
        if visited[s.index()] {
            continue;
        }
        visited[s.index()] = true;

        let outs = graph.flow_edges(s, Direction::Outgoing);
        let Some(first) = outs.first() else {
            continue; // terminal step
        };

        match (first.exclusive_choice, outs.len()) {
            // Merge: the single alternative edge leads into t, so every
            // source of t is one of the mutually exclusive inputs.
            (true, 1) => {
                let t = first.target;
                check_step_tags(graph, t, Direction::Incoming)?;
                let sources = sources_of(graph, t);
                for &src in &sources {
                    visited[src.index()] = true;
                }
                if let Some(before) = TopologyTerm::or(sources) {
                    map.insert(graph, before, TopologyTerm::Leaf(t))?;
                }
            }
            // Decision
            (true, _) => {
                if let Some(after) = TopologyTerm::or(targets(&outs)) {
                    map.insert(graph, TopologyTerm::Leaf(s), after)?;
                }
            }
            // Sequence, or a branch feeding a join
            (false, 1) => {
                map.insert(graph, TopologyTerm::Leaf(s), TopologyTerm::Leaf(first.target))?;
            }
            // Fork
            (false, _) => {
                if let Some(after) = TopologyTerm::and(targets(&outs)) {
                    map.insert(graph, TopologyTerm::Leaf(s), after)?;
                }
            }
        }
    }

    Ok(map)
}

/// Inverse pass: classify each step by its incoming edges.
pub fn infer_inverse(graph: &BehaviorGraph) -> Result<OrderingMap, TopologyError> {
    check_uniform_tags(graph, Direction::Incoming)?;

    let mut map = OrderingMap::new(OrderingDirection::Inverse);
    let mut visited = vec![false; graph.step_count()];

    for t in graph.step_ids() {
        if visited[t.index()] {
            continue;
        }
        visited[t.index()] = true;

        let ins = graph.flow_edges(t, Direction::Incoming);
        let Some(first) = ins.first() else {
            continue; // entry step
        };

        match (first.exclusive_choice, ins.len()) {
            // Decision seen from one of its branches: t is reached from s
            // alone, so every target of s is one of the alternatives.
            (true, 1) => {
                let s = first.source;
                check_step_tags(graph, s, Direction::Outgoing)?;
                let alternatives = targets_of(graph, s);
                for &alt in &alternatives {
                    visited[alt.index()] = true;
                }
                if let Some(after) = TopologyTerm::or(alternatives) {
                    map.insert(graph, TopologyTerm::Leaf(s), after)?;
                }
            }
            // Merge
            (true, _) => {
                if let Some(before) = TopologyTerm::or(sources(&ins)) {
                    map.insert(graph, before, TopologyTerm::Leaf(t))?;
                }
            }
            // Sequence, or a branch leaving a fork
            (false, 1) => {
                map.insert(graph, TopologyTerm::Leaf(first.source), TopologyTerm::Leaf(t))?;
            }
            // Join
            (false, _) => {
                if let Some(before) = TopologyTerm::and(sources(&ins)) {
                    map.insert(graph, before, TopologyTerm::Leaf(t))?;
                }
            }
        }
    }

    Ok(map)
}

/// Reject steps whose edges on one side mix exclusive-choice and untagged edges.
pub fn check_uniform_tags(graph: &BehaviorGraph, direction: Direction) -> Result<(), TopologyError> {
    graph
        .step_ids()
        .try_for_each(|step| check_step_tags(graph, step, direction))
}

fn check_step_tags(
    graph: &BehaviorGraph,
    step: StepId,
    direction: Direction,
) -> Result<(), TopologyError> {
    let edges = graph.flow_edges(step, direction);
    let tagged = edges.iter().filter(|e| e.exclusive_choice).count();
    if tagged != 0 && tagged != edges.len() {
        return Err(TopologyError::MixedTags {
            step: graph.step_name(step).to_string(),
            direction,
        });
    }
    Ok(())
}

fn targets(edges: &[&PrecedenceEdge]) -> Vec<StepId> {
    edges.iter().map(|e| e.target).collect()
}

fn sources(edges: &[&PrecedenceEdge]) -> Vec<StepId> {
    edges.iter().map(|e| e.source).collect()
}

fn sources_of(graph: &BehaviorGraph, t: StepId) -> Vec<StepId> {
    sources(&graph.flow_edges(t, Direction::Incoming))
}

fn targets_of(graph: &BehaviorGraph, s: StepId) -> Vec<StepId> {
    targets(&graph.flow_edges(s, Direction::Outgoing))
}
