//! Steps: the atomic behavior occurrences of a behavior graph.
//!
//! A step is a typed attribute of the class under translation. Its id is a
//! dense index assigned in declaration order, so iterating ids reproduces the
//! order in which the model reader declared the steps.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable step identifier (index into the owning graph's step table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepId(pub u32);

impl StepId {
    /// The position of this step in declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single step of a behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Identifier, assigned by the graph on insertion.
    pub id: StepId,
    /// Step name (the attribute name in the owning class).
    pub name: String,
    /// Declared type of the step (the attribute's target class).
    pub target_type: String,
}

impl Step {
    /// Create a step description. The id is overwritten by [`crate::graph::BehaviorGraph::add_step`].
    pub fn new(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            id: StepId(0),
            name: name.into(),
            target_type: target_type.into(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.target_type)
    }
}
