//! Gatesynth Core - gated modular signal synthesis
//!
//! This crate provides the engine behind gatesynth: a directed graph of
//! signal-generating and signal-shaping nodes, re-evaluated once per audio
//! sample, grouped into playable chains that are started and stopped by
//! external control inputs.
//!
//! # Core Abstractions
//!
//! ## Signal Graph
//!
//! - [`SignalGraph`] - Arena of nodes addressed by [`NodeId`], with runtime
//!   edge insertion/removal and compiled per-root evaluation order
//! - [`NodeKind`] - Closed set of node variants (oscillators, percussion,
//!   clock, filter, envelope, chain start/termination)
//!
//! ## Parameters and Inputs
//!
//! - [`Parameter`] - Constant, live chain output, or external input slot
//! - [`InputVector`] - Eight lock-free scalar slots written by an input
//!   acquisition process and read from the audio path
//!
//! ## Chains
//!
//! - [`Chain`] - Source-to-termination sub-graph with a
//!   Stopped / Playing / Terminating lifecycle
//! - [`Patch`] - Graph, chains and gate registrations; implements the play,
//!   release-splice and hard-stop transitions
//! - [`ControlScheduler`] - Control-rate loop that ticks gates and chains and
//!   opens/closes audio streams through an [`AudioSink`]
//!
//! # Example
//!
//! ```rust
//! use gatesynth_core::{
//!     ControlScheduler, EngineConfig, InputVector, NodeKind, OfflineSink, Parameter, Patch,
//!     nodes::{ChainStart, Sine},
//! };
//!
//! let inputs = InputVector::new();
//! let mut patch = Patch::new("demo", EngineConfig::default(), inputs.clone());
//!
//! let start = patch.add_node(NodeKind::ChainStart(ChainStart::new(Parameter::input(1))));
//! let sine = patch.add_node(NodeKind::Sine(Sine::new(Parameter::constant(440.0))));
//! let out = patch.add_node(NodeKind::termination());
//! patch.connect(start, sine).unwrap();
//! patch.connect(sine, out).unwrap();
//! let chain = patch.add_chain("tone", start, out, None).unwrap();
//!
//! let sink = OfflineSink::new();
//! let mut scheduler = ControlScheduler::new(patch, Box::new(sink.clone()));
//!
//! inputs.set(1, 1.0);
//! let report = scheduler.tick().unwrap();
//! assert_eq!(report.started, vec![chain]);
//! let samples = sink.pull(150);
//! assert_eq!(samples.len(), 150);
//! ```
//!
//! # Design Principles
//!
//! - **No allocation per sample**: evaluation order is compiled when edges change
//! - **Block-boundary mutation**: the render callback holds the patch lock for
//!   a whole buffer, so splicing never interleaves with sample evaluation
//! - **Idempotent transitions**: repeated play/stop requests are no-ops, not errors

pub mod chain;
pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod nodes;
pub mod param;
pub mod patch;
pub mod scheduler;
pub mod sink;
pub mod tempo;

// Re-export main types at crate root
pub use chain::{Chain, ChainId, ChainState};
pub use config::{
    CONTROL_RATE, EngineConfig, FRAMES_PER_BUFFER, INPUT_SLOTS, SAMPLE_RATE, VOLUME,
};
pub use error::EngineError;
pub use graph::{EvalEnv, GraphError, NodeId, SignalGraph};
pub use input::InputVector;
pub use nodes::NodeKind;
pub use param::{ParamContext, Parameter};
pub use patch::{ControlPlan, Patch, PlayOutcome, StopOutcome, Transition};
pub use scheduler::{ControlScheduler, TickReport, render_callback};
pub use sink::{
    AudioSink, OfflineSink, RenderCallback, RenderConfig, RenderStream, SinkError, StreamControl,
    StreamHandle, render_ticks,
};
pub use tempo::{
    BEAT_8TH, BEAT_16TH, BEAT_32ND, BEAT_4TH, BEAT_HALF, BEAT_WHOLE, NoteValue,
};
