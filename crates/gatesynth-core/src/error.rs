//! Engine-level errors.

use crate::chain::ChainId;
use crate::graph::GraphError;
use crate::sink::SinkError;

/// Errors surfaced by patch operations and the control scheduler.
///
/// A failed stream operation always leaves the chain in a consistent state
/// (Stopped after a failed open) before the error is returned.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Graph edit failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The sink could not open a stream for a chain that was starting.
    #[error("failed to open stream for {chain}: {source}")]
    StreamOpen {
        /// Chain whose play attempt was aborted.
        chain: ChainId,
        /// Sink failure.
        source: SinkError,
    },

    /// The sink reported a failure while closing a stopped chain's stream.
    #[error("failed to close stream for {chain}: {source}")]
    StreamClose {
        /// Chain that was stopped.
        chain: ChainId,
        /// Sink failure.
        source: SinkError,
    },

    /// No chain with this handle exists in the patch.
    #[error("unknown chain {0}")]
    UnknownChain(ChainId),
}
