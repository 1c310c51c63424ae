//! Error types for patch loading and building.

use std::path::PathBuf;

use gatesynth_core::GraphError;
use thiserror::Error;

/// Errors that can occur while loading or building a patch.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Neither a factory patch nor a readable file
    #[error("patch not found: {0}")]
    PatchNotFound(String),

    /// Two chains share a name
    #[error("duplicate chain name: {0}")]
    DuplicateChain(String),

    /// Two nodes in one chain share an id
    #[error("duplicate node '{node}' in chain '{chain}'")]
    DuplicateNode {
        /// Chain containing the nodes.
        chain: String,
        /// The repeated id.
        node: String,
    },

    /// A node input names a node that does not exist in the chain
    #[error("unknown node '{node}' referenced in chain '{chain}'")]
    UnknownNode {
        /// Chain containing the reference.
        chain: String,
        /// The missing node id.
        node: String,
    },

    /// A parameter or release names a chain that does not exist
    #[error("unknown chain '{reference}' referenced in chain '{chain}'")]
    UnknownChain {
        /// Chain containing the reference.
        chain: String,
        /// The missing chain name.
        reference: String,
    },

    /// An input parameter addresses a slot outside `1..=8`
    #[error("invalid input slot {slot} in chain '{chain}' (expected 1..=8)")]
    InvalidInputSlot {
        /// Chain containing the parameter.
        chain: String,
        /// The requested slot.
        slot: usize,
    },

    /// A duration names an unknown note value
    #[error("unknown note value '{0}'")]
    UnknownNoteValue(String),

    /// A chain has no nodes and no gate
    #[error("chain '{0}' has no nodes")]
    EmptyChain(String),

    /// A chain does not have exactly one termination node
    #[error("chain '{chain}' must have exactly one termination node, found {count}")]
    Termination {
        /// The offending chain.
        chain: String,
        /// Number of termination nodes found.
        count: usize,
    },

    /// An ungated chain does not have exactly one node without inputs
    #[error("ungated chain '{chain}' must have exactly one node without inputs, found {count}")]
    ChainRoot {
        /// The offending chain.
        chain: String,
        /// Number of nodes without inputs.
        count: usize,
    },

    /// Wiring the chain into the graph failed
    #[error("invalid wiring in chain '{chain}': {source}")]
    Graph {
        /// The offending chain.
        chain: String,
        /// Underlying graph error.
        #[source]
        source: GraphError,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a graph error for a chain.
    pub fn graph(chain: impl Into<String>, source: GraphError) -> Self {
        ConfigError::Graph {
            chain: chain.into(),
            source,
        }
    }
}
