use super::node::{NodeData, NodeId};
use super::schedule::level_order;
use super::{EvalEnv, GraphError};
use crate::nodes::{NodeKind, Transfer};
use crate::param::{ParamContext, Parameter};

/// Arena of nodes with runtime-editable edges and cached evaluation order.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add nodes with [`add_node()`](Self::add_node)
/// 3. Wire them with [`connect()`](Self::connect)
/// 4. Step a sub-graph with [`evaluate()`](Self::evaluate), and return it to
///    its initial state with [`reset_from()`](Self::reset_from)
#[derive(Debug, Clone)]
pub struct SignalGraph {
    nodes: Vec<NodeData>,
    values: Vec<f64>,
    /// Compiled schedule per root, indexed by the root's node index.
    schedules: Vec<Option<Vec<NodeId>>>,
    sample_rate: f64,
}

impl SignalGraph {
    /// Creates an empty graph evaluated at `sample_rate`.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            nodes: Vec::new(),
            values: Vec::new(),
            schedules: Vec::new(),
            sample_rate,
        }
    }

    /// Sample rate passed to time-based transfer functions.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if `id` names a node of this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Iterates over every node handle in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Adds a node. Its initial value is the transfer function at age 0.
    pub fn add_node(&mut self, mut kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let value = {
            let inputs = crate::input::InputVector::new();
            let ctx = ParamContext::new(&self.values, &[], &inputs, self.sample_rate);
            kind.transfer(0.0, 0, &ctx)
        };
        self.nodes.push(NodeData::new(kind));
        self.values.push(value);
        self.schedules.push(None);
        tracing::debug!(node = %id, "graph_add_node");
        id
    }

    /// Node variant and parameters.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    /// Mutable node variant. Edges are unaffected.
    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id.index()).map(|n| &mut n.kind)
    }

    /// Last computed output of a node, `0.0` for an unknown handle.
    #[inline]
    pub fn value(&self, id: NodeId) -> f64 {
        self.values.get(id.index()).copied().unwrap_or(0.0)
    }

    /// Resolves a parameter against the current node values.
    #[inline]
    pub fn resolve(&self, param: &Parameter, env: &EvalEnv<'_>) -> f64 {
        let ctx = ParamContext::new(&self.values, env.taps, env.inputs, self.sample_rate);
        param.resolve(&ctx)
    }

    /// Steps taken by a node since its last reset.
    pub fn age(&self, id: NodeId) -> u64 {
        self.nodes.get(id.index()).map_or(0, |n| n.age)
    }

    /// Upstream nodes in registration order.
    pub fn upstream(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.index()).map_or(&[], |n| &n.upstream)
    }

    /// Downstream nodes in registration order.
    pub fn downstream(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.index()).map_or(&[], |n| &n.downstream)
    }

    /// Returns `true` if the edge `from -> to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.downstream(from).contains(&to)
    }

    /// Connects two nodes with a directed edge.
    ///
    /// Returns an error if:
    /// - Either node doesn't exist
    /// - The edge would create a cycle
    /// - A duplicate edge already exists
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.check(from)?;
        self.check(to)?;

        if self.has_edge(from, to) {
            return Err(GraphError::DuplicateEdge(from, to));
        }

        // A cycle exists if `to` can already reach `from`.
        if from == to || self.can_reach(to, from) {
            return Err(GraphError::CycleDetected { from, to });
        }

        self.nodes[from.index()].downstream.push(to);
        self.nodes[to.index()].upstream.push(from);
        self.recompile();

        tracing::debug!(%from, %to, "graph_connect");
        Ok(())
    }

    /// Removes the edge `from -> to`.
    ///
    /// Returns `false` without touching the graph if the edge does not exist.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.has_edge(from, to) {
            return false;
        }
        self.nodes[from.index()].downstream.retain(|&d| d != to);
        self.nodes[to.index()].upstream.retain(|&u| u != from);
        self.recompile();

        tracing::debug!(%from, %to, "graph_disconnect");
        true
    }

    /// Compiles and caches the schedule for `root` ahead of the first
    /// evaluation.
    pub fn prepare(&mut self, root: NodeId) -> Result<(), GraphError> {
        self.check(root)?;
        self.schedules[root.index()] = Some(level_order(&self.nodes, root));
        Ok(())
    }

    /// Cached evaluation order for `root`, if one has been compiled.
    pub fn schedule(&self, root: NodeId) -> Option<&[NodeId]> {
        self.schedules.get(root.index())?.as_deref()
    }

    /// Performs one sample step of every node reachable from `root`.
    ///
    /// Compiles the schedule on first use if [`prepare()`](Self::prepare)
    /// was not called. An unknown root is ignored.
    pub fn evaluate(&mut self, root: NodeId, env: &EvalEnv<'_>) {
        let Some(schedule) = self.take_schedule(root) else {
            return;
        };
        for &id in &schedule {
            self.step(id, env);
        }
        self.schedules[root.index()] = Some(schedule);
    }

    /// Resets every node reachable from `root`: age 0, generator state
    /// reseeded and value equal to the transfer function at age 0.
    pub fn reset_from(&mut self, root: NodeId, env: &EvalEnv<'_>) {
        let Some(schedule) = self.take_schedule(root) else {
            return;
        };
        for &id in &schedule {
            let node = &mut self.nodes[id.index()];
            node.age = 0;
            node.kind.reset();
            let ctx = ParamContext::new(&self.values, env.taps, env.inputs, self.sample_rate);
            let value = node.kind.transfer(0.0, 0, &ctx);
            self.values[id.index()] = value;
        }
        self.schedules[root.index()] = Some(schedule);
        tracing::debug!(%root, "graph_reset");
    }

    #[inline]
    fn step(&mut self, id: NodeId, env: &EvalEnv<'_>) {
        let idx = id.index();
        let node = &mut self.nodes[idx];
        node.age += 1;
        let input = if node.kind.is_source() || node.upstream.is_empty() {
            0.0
        } else {
            let sum: f64 = node.upstream.iter().map(|up| self.values[up.index()]).sum();
            sum / node.upstream.len() as f64
        };
        let ctx = ParamContext::new(&self.values, env.taps, env.inputs, self.sample_rate);
        let value = node.kind.transfer(input, node.age, &ctx);
        self.values[idx] = value;
    }

    fn take_schedule(&mut self, root: NodeId) -> Option<Vec<NodeId>> {
        let slot = self.schedules.get_mut(root.index())?;
        Some(match slot.take() {
            Some(schedule) => schedule,
            None => level_order(&self.nodes, root),
        })
    }

    fn recompile(&mut self) {
        for root in 0..self.schedules.len() {
            if self.schedules[root].is_some() {
                self.schedules[root] = Some(level_order(&self.nodes, NodeId(root as u32)));
            }
        }
    }

    fn check(&self, id: NodeId) -> Result<(), GraphError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(id))
        }
    }

    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            stack.extend_from_slice(&self.nodes[id.index()].downstream);
        }
        false
    }
}
