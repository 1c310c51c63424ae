//! Per-root evaluation order.
//!
//! A schedule is the list of nodes reachable from one root, ordered so that
//! every node comes after all of its upstream nodes that are also reachable
//! from that root. Nodes reached along several paths (diamond fan-in) appear
//! once. Upstream nodes outside the reachable set are read at whatever value
//! they last held.

use std::collections::VecDeque;

use super::node::{NodeData, NodeId};

/// Compiles the level-order schedule rooted at `root`.
///
/// Kahn's algorithm restricted to the reachable sub-graph, processed
/// breadth-first so nodes are emitted level by level from the root.
pub(crate) fn level_order(nodes: &[NodeData], root: NodeId) -> Vec<NodeId> {
    let n = nodes.len();
    if root.index() >= n {
        return Vec::new();
    }

    // Reachable set.
    let mut reachable = vec![false; n];
    let mut stack = vec![root];
    reachable[root.index()] = true;
    while let Some(id) = stack.pop() {
        for &ds in &nodes[id.index()].downstream {
            if !reachable[ds.index()] {
                reachable[ds.index()] = true;
                stack.push(ds);
            }
        }
    }

    // In-degree counting only reachable upstream nodes.
    let mut pending = vec![0usize; n];
    for (i, node) in nodes.iter().enumerate() {
        if reachable[i] {
            pending[i] = node
                .upstream
                .iter()
                .filter(|up| reachable[up.index()])
                .count();
        }
    }

    let mut order = Vec::with_capacity(reachable.iter().filter(|r| **r).count());
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &ds in &nodes[id.index()].downstream {
            let slot = &mut pending[ds.index()];
            *slot -= 1;
            if *slot == 0 {
                queue.push_back(ds);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeKind;

    fn graph(edges: &[(u32, u32)], count: usize) -> Vec<NodeData> {
        let mut nodes: Vec<NodeData> = (0..count)
            .map(|_| NodeData::new(NodeKind::Passthrough))
            .collect();
        for &(a, b) in edges {
            nodes[a as usize].downstream.push(NodeId(b));
            nodes[b as usize].upstream.push(NodeId(a));
        }
        nodes
    }

    #[test]
    fn linear_chain_in_order() {
        let nodes = graph(&[(0, 1), (1, 2)], 3);
        assert_eq!(level_order(&nodes, NodeId(0)), vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn diamond_emits_merge_once_and_last() {
        let nodes = graph(&[(0, 1), (0, 2), (1, 3), (2, 3)], 4);
        let order = level_order(&nodes, NodeId(0));
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], NodeId(0));
        assert_eq!(order[3], NodeId(3));
    }

    #[test]
    fn uneven_paths_wait_for_longest() {
        // 0 -> 1 -> 2 -> 3 and 0 -> 3: node 3 must follow node 2.
        let nodes = graph(&[(0, 1), (1, 2), (2, 3), (0, 3)], 4);
        let order = level_order(&nodes, NodeId(0));
        assert_eq!(order, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn unreachable_upstream_does_not_block() {
        // Node 3 feeds node 2 but is not reachable from 0.
        let nodes = graph(&[(0, 1), (1, 2), (3, 2)], 4);
        let order = level_order(&nodes, NodeId(0));
        assert_eq!(order, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn out_of_range_root_is_empty() {
        let nodes = graph(&[], 1);
        assert!(level_order(&nodes, NodeId(5)).is_empty());
    }
}
