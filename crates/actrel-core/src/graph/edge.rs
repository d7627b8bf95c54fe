//! Precedence edges between steps.
//!
//! An edge states that its source step happens before its target step. Edges
//! tagged as exclusive choice are one of several mutually exclusive
//! alternatives (the branches of a decision or the inputs of a merge).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::step::StepId;

/// Edge identifier (index into the owning graph's edge table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

/// A directed "happens-before" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceEdge {
    /// The step that happens first.
    pub source: StepId,
    /// The step that happens afterwards.
    pub target: StepId,
    /// Whether this edge is one of several mutually exclusive alternatives.
    pub exclusive_choice: bool,
}

impl PrecedenceEdge {
    /// Create an untagged (sequence, fork or join) edge.
    pub fn new(source: StepId, target: StepId) -> Self {
        Self {
            source,
            target,
            exclusive_choice: false,
        }
    }

    /// Create an edge tagged as an exclusive-choice alternative.
    pub fn choice(source: StepId, target: StepId) -> Self {
        Self {
            source,
            target,
            exclusive_choice: true,
        }
    }

    /// A self-loop is a loop back-edge and never contributes to classification.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for PrecedenceEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.exclusive_choice { "-?->" } else { "-->" };
        write!(f, "{} {arrow} {}", self.source, self.target)
    }
}
