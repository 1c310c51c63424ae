//! Playable chains and their lifecycle state.
//!
//! A [`Chain`] names one source node and one termination node of the shared
//! [`SignalGraph`](crate::SignalGraph). The state machine that drives it lives
//! in [`Patch`](crate::Patch), which owns both the graph and the chains; the
//! chain itself is plain bookkeeping.

use core::fmt;

use crate::graph::NodeId;
use crate::sink::StreamHandle;

/// Stable handle to a chain in a [`Patch`](crate::Patch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub(crate) u32);

impl ChainId {
    /// Handle for the chain at `index`, in the order chains are added to a
    /// patch. Builders use it to reference chains that are added later.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the chain in its patch.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self.0)
    }
}

/// Lifecycle state of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChainState {
    /// Silent, reset, no stream open.
    #[default]
    Stopped,
    /// Rendering through an open stream.
    Playing,
    /// Rendering a spliced release tail; stops once the extended duration
    /// elapses.
    Terminating,
}

impl ChainState {
    /// Returns `true` while the chain renders audio.
    #[inline]
    pub fn is_active(self) -> bool {
        !matches!(self, ChainState::Stopped)
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainState::Stopped => "stopped",
            ChainState::Playing => "playing",
            ChainState::Terminating => "terminating",
        };
        f.write_str(name)
    }
}

/// One source-to-termination sub-graph played as a unit.
///
/// Durations are sample counts at the engine sample rate; a negative
/// duration means the chain never stops on its own.
#[derive(Debug)]
pub struct Chain {
    pub(crate) name: String,
    pub(crate) source: NodeId,
    pub(crate) termination: NodeId,
    pub(crate) original_termination: NodeId,
    pub(crate) state: ChainState,
    pub(crate) time_elapsed: f64,
    pub(crate) duration: f64,
    pub(crate) base_duration: f64,
    pub(crate) stream: Option<StreamHandle>,
    /// Bumped on every play so a stale stream can tell it is no longer current.
    pub(crate) generation: u64,
}

impl Chain {
    pub(crate) fn new(
        name: impl Into<String>,
        source: NodeId,
        termination: NodeId,
        duration: Option<f64>,
    ) -> Self {
        let duration = duration.unwrap_or(-1.0);
        Self {
            name: name.into(),
            source,
            termination,
            original_termination: termination,
            state: ChainState::Stopped,
            time_elapsed: 0.0,
            duration,
            base_duration: duration,
            stream: None,
            generation: 0,
        }
    }

    /// Chain name, unique within its patch.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root node the chain is evaluated from.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Current output tap; differs from [`original_termination`](Self::original_termination)
    /// while a release chain is spliced in.
    pub fn termination(&self) -> NodeId {
        self.termination
    }

    /// Termination node the chain was built with.
    pub fn original_termination(&self) -> NodeId {
        self.original_termination
    }

    /// Lifecycle state.
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Returns `true` while Playing or Terminating.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Samples elapsed since play, advanced at the control rate.
    pub fn time_elapsed(&self) -> f64 {
        self.time_elapsed
    }

    /// Current duration, including any spliced release tail.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Configured duration restored on reset.
    pub fn base_duration(&self) -> f64 {
        self.base_duration
    }

    /// Returns `true` if the chain stops on its own.
    pub fn is_bounded(&self) -> bool {
        self.duration >= 0.0
    }

    /// Returns `true` if an audio stream is attached.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Clears play bookkeeping. Graph values are reset separately.
    pub(crate) fn reset_state(&mut self) {
        self.state = ChainState::Stopped;
        self.time_elapsed = 0.0;
        self.duration = self.base_duration;
        self.termination = self.original_termination;
    }
}
