//! Ordering report: the inferred maps of one class, by step name.

use std::fmt;

use actrel_core::{infer, BehaviorGraph, OrderingMap};
use actrel_model::ModelSource;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub before: String,
    pub after: String,
}

/// Forward and inverse ordering maps of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderingReport {
    pub class: String,
    pub steps: Vec<String>,
    pub forward: Vec<EntryReport>,
    pub inverse: Vec<EntryReport>,
}

impl OrderingReport {
    /// Infer the orderings of `class` and describe them.
    pub fn for_class(source: &ModelSource, class: &str) -> Result<Self> {
        let graph = source.graph(class)?;
        let orderings = infer(&graph)?;
        Ok(Self {
            class: class.to_string(),
            steps: graph.steps().map(|s| s.name.clone()).collect(),
            forward: entries(&graph, &orderings.forward),
            inverse: entries(&graph, &orderings.inverse),
        })
    }
}

fn entries(graph: &BehaviorGraph, map: &OrderingMap) -> Vec<EntryReport> {
    map.entries()
        .map(|e| EntryReport {
            before: e.before.display(graph).to_string(),
            after: e.after.display(graph).to_string(),
        })
        .collect()
}

impl fmt::Display for OrderingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} steps)", self.class, self.steps.len())?;
        for (label, items) in [("forward", &self.forward), ("inverse", &self.inverse)] {
            writeln!(f, "  {label}:")?;
            if items.is_empty() {
                writeln!(f, "    (none)")?;
            }
            for entry in items {
                writeln!(f, "    {} -> {}", entry.before, entry.after)?;
            }
        }
        Ok(())
    }
}
