//! Signal graph arena and per-sample evaluator.
//!
//! The graph stores every node of a patch in one arena addressed by
//! [`NodeId`]. Edges are `(upstream, downstream)` pairs recorded on both
//! endpoints and may be added or removed at any time between evaluation
//! steps; this is how release chains are spliced onto running chains.
//!
//! # Evaluation
//!
//! [`SignalGraph::evaluate`] performs one sample step for the sub-graph
//! reachable from a root node. The step order is compiled once per root and
//! recompiled whenever an edge changes, so the per-sample path only walks a
//! precomputed list:
//!
//! 1. Every node reachable from the root is stepped exactly once.
//! 2. A node is stepped only after all its reachable upstream nodes.
//! 3. Source nodes compute from their age; all other nodes from the
//!    arithmetic mean of their upstream values.
//!
//! # Example
//!
//! ```rust
//! use gatesynth_core::{EvalEnv, InputVector, NodeKind, Parameter, SignalGraph};
//! use gatesynth_core::nodes::{Filter, Sine};
//!
//! let mut graph = SignalGraph::new(19200.0);
//! let sine = graph.add_node(NodeKind::Sine(Sine::new(Parameter::constant(480.0))));
//! let gain = graph.add_node(NodeKind::Filter(Filter::new(Parameter::constant(0.5))));
//! graph.connect(sine, gain).unwrap();
//!
//! let inputs = InputVector::new();
//! let env = EvalEnv::new(&[], &inputs);
//! for _ in 0..10 {
//!     graph.evaluate(sine, &env);
//! }
//! assert!((graph.value(gain) - 0.5).abs() < 1e-12);
//! ```

mod node;
pub(crate) mod schedule;
mod signal;

pub use node::NodeId;
pub use signal::SignalGraph;

pub(crate) use node::NodeData;

use crate::input::InputVector;

/// Errors that can occur while editing the signal graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// Adding this edge would create a cycle.
    #[error("connecting {from} to {to} would create a cycle")]
    CycleDetected {
        /// Upstream end of the rejected edge.
        from: NodeId,
        /// Downstream end of the rejected edge.
        to: NodeId,
    },
    /// A duplicate edge already exists between these nodes.
    #[error("edge from {0} to {1} already exists")]
    DuplicateEdge(NodeId, NodeId),
}

/// External state read while stepping nodes.
#[derive(Clone, Copy)]
pub struct EvalEnv<'a> {
    /// Active termination node of each chain, indexed by chain.
    pub taps: &'a [NodeId],
    /// External input slots.
    pub inputs: &'a InputVector,
}

impl<'a> EvalEnv<'a> {
    /// Bundles chain taps and inputs for evaluation.
    pub fn new(taps: &'a [NodeId], inputs: &'a InputVector) -> Self {
        Self { taps, inputs }
    }
}
