//! Patch: the signal graph, its chains and the chain state machine.
//!
//! A [`Patch`] owns everything the render callback and the control scheduler
//! share. All lifecycle transitions happen here, under whatever lock guards
//! the patch; stream handles produced or released by a transition are handed
//! back to the caller so the audio sink is never called with the lock held.
//!
//! # Transitions
//!
//! - **Stopped → Playing**: [`play()`](Patch::play). The caller opens a
//!   stream and [`attach_stream()`](Patch::attach_stream)es it.
//! - **Playing → Terminating**: a stop request on a chain whose termination
//!   node owns a bounded release chain. The release chain's source is
//!   connected behind the termination node, the chain's tap moves to the
//!   release chain's termination, and the release duration is added to the
//!   chain's duration.
//! - **Playing/Terminating → Stopped**: hard stop. The stream handle is
//!   returned for closing, the original termination is restored, any release
//!   chain it owns is unlinked and reset, and the chain's sub-graph is reset
//!   to age 0.
//!
//! A stop request on a bounded chain whose duration has not yet elapsed is
//! deferred; the duration timer stops it later. Repeated play or stop
//! requests are no-ops.

use crate::chain::{Chain, ChainId, ChainState};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::{EvalEnv, GraphError, NodeId, SignalGraph};
use crate::input::InputVector;
use crate::nodes::NodeKind;
use crate::sink::{StreamControl, StreamHandle};

/// Result of [`Patch::play`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The chain moved from Stopped to Playing.
    Started {
        /// Play generation to pass to the render callback.
        generation: u64,
    },
    /// The chain was already Playing or Terminating.
    AlreadyActive,
}

/// Result of [`Patch::request_stop`].
#[derive(Debug)]
pub enum StopOutcome {
    /// The chain was not playing.
    AlreadyStopped,
    /// A release tail is already running.
    AlreadyTerminating,
    /// The chain's duration has not elapsed yet.
    Deferred,
    /// A release chain was spliced in.
    Released {
        /// The spliced release chain.
        release: ChainId,
    },
    /// The chain was hard-stopped; the stream, if any, must be closed.
    Stopped(Option<StreamHandle>),
}

/// A stream-level consequence of a control tick.
#[derive(Debug)]
pub enum Transition {
    /// A chain started and needs a stream.
    Open {
        /// Chain that started.
        chain: ChainId,
        /// Play generation the stream renders for.
        generation: u64,
    },
    /// A release chain was spliced onto a playing chain.
    Release {
        /// Chain now terminating.
        chain: ChainId,
        /// Release chain spliced in.
        release: ChainId,
    },
    /// A chain stopped; its stream must be closed.
    Close {
        /// Chain that stopped.
        chain: ChainId,
        /// Stream to close, if one was attached.
        stream: Option<StreamHandle>,
    },
}

/// Transitions produced by one control tick, in the order they occurred.
#[derive(Debug, Default)]
pub struct ControlPlan {
    /// Stream work for the caller.
    pub transitions: Vec<Transition>,
}

impl ControlPlan {
    /// Returns `true` if the tick changed nothing.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Signal graph plus the chains played from it.
pub struct Patch {
    name: String,
    config: EngineConfig,
    graph: SignalGraph,
    chains: Vec<Chain>,
    /// Active termination node per chain; parameter resolution reads these.
    taps: Vec<NodeId>,
    /// Chain-start nodes polled every control tick.
    gates: Vec<NodeId>,
    inputs: InputVector,
}

impl Patch {
    /// Creates an empty patch reading external controls from `inputs`.
    pub fn new(name: impl Into<String>, config: EngineConfig, inputs: InputVector) -> Self {
        Self {
            name: name.into(),
            graph: SignalGraph::new(config.sample_rate),
            config,
            chains: Vec::new(),
            taps: Vec::new(),
            gates: Vec::new(),
            inputs,
        }
    }

    /// Patch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine configuration the patch was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared signal graph.
    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    /// External input slots.
    pub fn inputs(&self) -> &InputVector {
        &self.inputs
    }

    /// All chains in creation order.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// A chain by handle.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id.index())
    }

    /// Finds a chain by name.
    pub fn chain_by_name(&self, name: &str) -> Option<ChainId> {
        self.chains
            .iter()
            .position(|c| c.name == name)
            .map(|i| ChainId(i as u32))
    }

    /// Handle the next [`add_chain()`](Self::add_chain) call will return.
    pub fn next_chain_id(&self) -> ChainId {
        ChainId(self.chains.len() as u32)
    }

    /// Chain-start nodes polled by [`control_tick()`](Self::control_tick).
    pub fn gates(&self) -> &[NodeId] {
        &self.gates
    }

    /// Current output of a chain, `0.0` for an unknown chain.
    pub fn chain_value(&self, id: ChainId) -> f64 {
        self.taps
            .get(id.index())
            .map_or(0.0, |&tap| self.graph.value(tap))
    }

    /// Adds a node. Chain-start nodes are registered as gates.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let is_gate = matches!(kind, NodeKind::ChainStart(_));
        let id = self.graph.add_node(kind);
        if is_gate {
            self.gates.push(id);
        }
        id
    }

    /// Connects two nodes. See [`SignalGraph::connect`].
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.graph.connect(from, to)
    }

    /// Removes an edge; `false` if it did not exist.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) -> bool {
        self.graph.disconnect(from, to)
    }

    /// Registers a chain from `source` to `termination`.
    ///
    /// `duration` is in samples; `None` means the chain only stops when its
    /// gate closes. A chain-start source is bound to the new chain so its
    /// gate controls it. The sub-graph is reset before the chain is returned.
    pub fn add_chain(
        &mut self,
        name: impl Into<String>,
        source: NodeId,
        termination: NodeId,
        duration: Option<f64>,
    ) -> Result<ChainId, GraphError> {
        for node in [source, termination] {
            if !self.graph.contains(node) {
                return Err(GraphError::NodeNotFound(node));
            }
        }
        let id = self.next_chain_id();
        if let Some(NodeKind::ChainStart(start)) = self.graph.kind_mut(source) {
            start.chain = Some(id);
        }
        self.graph.prepare(source)?;

        let chain = Chain::new(name, source, termination, duration);
        tracing::debug!(chain = %id, name = chain.name(), %source, %termination, "chain_added");
        self.chains.push(chain);
        self.taps.push(termination);

        let env = EvalEnv::new(&self.taps, &self.inputs);
        self.graph.reset_from(source, &env);
        Ok(id)
    }

    /// Adds `head` followed by `tail`, wires them in sequence and registers
    /// the result as a chain ending at the last node.
    pub fn build_linear(
        &mut self,
        name: impl Into<String>,
        head: NodeKind,
        tail: impl IntoIterator<Item = NodeKind>,
        duration: Option<f64>,
    ) -> Result<ChainId, GraphError> {
        let source = self.add_node(head);
        let mut last = source;
        for kind in tail {
            let node = self.add_node(kind);
            self.graph.connect(last, node)?;
            last = node;
        }
        self.add_chain(name, source, last, duration)
    }

    /// Starts a stopped chain.
    pub fn play(&mut self, id: ChainId) -> Result<PlayOutcome, EngineError> {
        let chain = self
            .chains
            .get_mut(id.index())
            .ok_or(EngineError::UnknownChain(id))?;
        if chain.is_active() {
            return Ok(PlayOutcome::AlreadyActive);
        }
        chain.state = ChainState::Playing;
        chain.generation += 1;
        tracing::info!(chain = %id, name = chain.name(), "chain_play");
        Ok(PlayOutcome::Started {
            generation: chain.generation,
        })
    }

    /// Asks a playing chain to stop.
    ///
    /// Depending on its duration and termination node this defers, splices
    /// a release chain, or hard-stops.
    pub fn request_stop(&mut self, id: ChainId) -> Result<StopOutcome, EngineError> {
        let chain = self
            .chains
            .get(id.index())
            .ok_or(EngineError::UnknownChain(id))?;
        Ok(match chain.state {
            ChainState::Stopped => StopOutcome::AlreadyStopped,
            ChainState::Terminating => StopOutcome::AlreadyTerminating,
            ChainState::Playing => self.stop_inner(id),
        })
    }

    /// Hard-stops every active chain, returning the streams to close.
    pub fn stop_all(&mut self) -> Vec<(ChainId, StreamHandle)> {
        let mut streams = Vec::new();
        for i in 0..self.chains.len() {
            if !self.chains[i].is_active() {
                continue;
            }
            let id = ChainId(i as u32);
            if let Some(stream) = self.hard_stop(id) {
                streams.push((id, stream));
            }
        }
        streams
    }

    /// Stores the stream opened for a play generation.
    ///
    /// Returns the handle back if the chain has since stopped or restarted,
    /// in which case the caller must close it.
    pub fn attach_stream(
        &mut self,
        id: ChainId,
        generation: u64,
        stream: StreamHandle,
    ) -> Option<StreamHandle> {
        match self.chains.get_mut(id.index()) {
            Some(chain)
                if chain.is_active() && chain.generation == generation && chain.stream.is_none() =>
            {
                chain.stream = Some(stream);
                None
            }
            _ => Some(stream),
        }
    }

    /// Returns a chain whose stream failed to open to the Stopped state.
    pub fn abort_play(&mut self, id: ChainId, generation: u64) {
        let current = self
            .chains
            .get(id.index())
            .is_some_and(|c| c.is_active() && c.generation == generation);
        if current {
            tracing::warn!(chain = %id, "chain_play_aborted");
            // No stream was attached for this generation.
            drop(self.hard_stop(id));
        }
    }

    /// Runs one control-rate tick.
    ///
    /// Every gate is compared against its threshold (opening starts the
    /// chain, closing requests a stop), then every active bounded chain
    /// advances its elapsed time by one control step and stops once it
    /// exceeds its duration.
    pub fn control_tick(&mut self) -> ControlPlan {
        let mut plan = ControlPlan::default();

        for gate in 0..self.gates.len() {
            let node = self.gates[gate];
            let Some(NodeKind::ChainStart(start)) = self.graph.kind(node) else {
                continue;
            };
            let Some(chain) = start.chain else {
                continue;
            };
            let env = EvalEnv::new(&self.taps, &self.inputs);
            let level = self.graph.resolve(&start.start_param, &env);
            let open = start.is_open(level);
            let state = self.chains[chain.index()].state;

            if open && state == ChainState::Stopped {
                if let Ok(PlayOutcome::Started { generation }) = self.play(chain) {
                    plan.transitions.push(Transition::Open { chain, generation });
                }
            } else if !open && state == ChainState::Playing {
                let outcome = self.stop_inner(chain);
                push_stop(&mut plan, chain, outcome);
            }
        }

        let step = self.config.control_step();
        for i in 0..self.chains.len() {
            let chain = &mut self.chains[i];
            if !chain.is_active() || !chain.is_bounded() {
                continue;
            }
            chain.time_elapsed += step;
            if chain.time_elapsed > chain.duration {
                let id = ChainId(i as u32);
                let outcome = self.stop_inner(id);
                push_stop(&mut plan, id, outcome);
            }
        }

        plan
    }

    /// Renders one buffer of a chain for the given play generation.
    ///
    /// Writes `termination value * volume` per frame. A chain that is not
    /// active, or that has been restarted since this stream was opened,
    /// renders silence and reports [`StreamControl::Complete`] without
    /// touching the graph.
    pub fn render(&mut self, id: ChainId, generation: u64, out: &mut [f32]) -> StreamControl {
        let Some(chain) = self.chains.get(id.index()) else {
            out.fill(0.0);
            return StreamControl::Complete;
        };
        if !chain.is_active() || chain.generation != generation {
            out.fill(0.0);
            return StreamControl::Complete;
        }
        let source = chain.source;
        let volume = self.config.volume;
        let env = EvalEnv::new(&self.taps, &self.inputs);
        for sample in out.iter_mut() {
            self.graph.evaluate(source, &env);
            // The tap can only move between buffers, while the lock is released.
            *sample = (self.graph.value(env.taps[id.index()]) * volume) as f32;
        }
        StreamControl::Continue
    }

    fn stop_inner(&mut self, id: ChainId) -> StopOutcome {
        let chain = &self.chains[id.index()];
        if chain.is_bounded() && chain.time_elapsed < chain.duration {
            tracing::debug!(chain = %id, "chain_stop_deferred");
            return StopOutcome::Deferred;
        }

        if chain.state != ChainState::Terminating {
            if let Some(release) = self.eligible_release(id, chain.termination) {
                let term = chain.termination;
                let rel = &self.chains[release.index()];
                let (rel_source, rel_term, rel_duration) =
                    (rel.source, rel.original_termination, rel.duration);
                match self.graph.connect(term, rel_source) {
                    Ok(()) => {
                        let chain = &mut self.chains[id.index()];
                        chain.termination = rel_term;
                        chain.duration = chain.duration.max(0.0) + rel_duration;
                        chain.state = ChainState::Terminating;
                        self.taps[id.index()] = rel_term;
                        tracing::info!(
                            chain = %id,
                            release = %release,
                            duration = chain.duration,
                            "chain_release_spliced"
                        );
                        return StopOutcome::Released { release };
                    }
                    Err(e) => {
                        tracing::warn!(chain = %id, release = %release, error = %e, "release splice failed");
                    }
                }
            }
        }

        StopOutcome::Stopped(self.hard_stop(id))
    }

    /// Release chain owned by `termination`, if it exists, is another chain,
    /// and has a bounded duration.
    fn eligible_release(&self, id: ChainId, termination: NodeId) -> Option<ChainId> {
        let release = self.graph.kind(termination)?.release_chain()?;
        if release == id {
            return None;
        }
        let rel = self.chains.get(release.index())?;
        rel.is_bounded().then_some(release)
    }

    fn hard_stop(&mut self, id: ChainId) -> Option<StreamHandle> {
        let idx = id.index();
        let stream = self.chains[idx].stream.take();
        let source = self.chains[idx].source;
        let original = self.chains[idx].original_termination;

        self.chains[idx].reset_state();
        self.taps[idx] = original;

        if let Some(release) = self
            .graph
            .kind(original)
            .and_then(NodeKind::release_chain)
            .filter(|r| r.index() < self.chains.len())
        {
            let rel_source = self.chains[release.index()].source;
            self.graph.disconnect(original, rel_source);
            let env = EvalEnv::new(&self.taps, &self.inputs);
            self.graph.reset_from(rel_source, &env);
        }

        let env = EvalEnv::new(&self.taps, &self.inputs);
        self.graph.reset_from(source, &env);

        tracing::info!(chain = %id, name = self.chains[idx].name(), "chain_stopped");
        stream
    }
}

fn push_stop(plan: &mut ControlPlan, chain: ChainId, outcome: StopOutcome) {
    match outcome {
        StopOutcome::Released { release } => {
            plan.transitions.push(Transition::Release { chain, release });
        }
        StopOutcome::Stopped(stream) => {
            plan.transitions.push(Transition::Close { chain, stream });
        }
        StopOutcome::AlreadyStopped | StopOutcome::AlreadyTerminating | StopOutcome::Deferred => {}
    }
}

impl std::fmt::Debug for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patch")
            .field("name", &self.name)
            .field("nodes", &self.graph.node_count())
            .field("chains", &self.chains.len())
            .finish_non_exhaustive()
    }
}
