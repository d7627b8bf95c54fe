//! Behavior graph model and ordering inference for actrel.
//!
//! A behavior is a graph of steps joined by precedence edges. The
//! [`ordering`] passes classify every step as part of a sequence, fork, join,
//! decision, merge or loop, and express the result as forward and inverse
//! happens-before maps over [`TopologyTerm`]s.

pub mod builder;
pub mod graph;
pub mod ordering;
pub mod topology;

pub use builder::GraphBuilder;
pub use graph::edge::{EdgeId, PrecedenceEdge};
pub use graph::step::{Step, StepId};
pub use graph::{BehaviorGraph, Direction, GraphError};
pub use ordering::{
    infer, infer_forward, infer_inverse, OrderingDirection, OrderingEntry, OrderingMap, Orderings,
    TopologyError,
};
pub use topology::TopologyTerm;
