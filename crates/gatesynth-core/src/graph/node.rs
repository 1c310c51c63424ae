//! Node handles and per-node bookkeeping for the signal graph.

use core::fmt;

use crate::nodes::NodeKind;

/// Stable handle to a node in a [`SignalGraph`](super::SignalGraph).
///
/// Node IDs are assigned sequentially and never reused; the graph has no
/// node removal, so a handle stays valid for the life of the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Internal bookkeeping for a node in the graph.
///
/// The node's current value lives in the graph's value table rather than
/// here, so parameter resolution can read every value while one node is
/// being stepped.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    /// Upstream nodes in registration order.
    pub upstream: Vec<NodeId>,
    /// Downstream nodes in registration order.
    pub downstream: Vec<NodeId>,
    /// Steps since the last reset.
    pub age: u64,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            upstream: Vec::new(),
            downstream: Vec::new(),
            age: 0,
        }
    }
}
